//! Maps loose capability names onto canonical registry names.
//!
//! Tiers are checked in a fixed order and the first hit wins:
//!
//! 1. exact canonical name
//! 2. domain-qualified candidate after punctuation/case normalization
//! 3. alias table (declared aliases, then aliases derived from names)
//! 4. fuzzy match over canonical names and aliases, above a threshold
//!
//! Resolution never fails; an unresolved candidate yields `None`.

pub mod alias;
pub mod similarity;

use crate::registry::CapabilityRegistry;
use serde::{Deserialize, Serialize};
use similarity::{SimilarityScorer, TokenwiseScorer};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub use alias::{alias_key, derive_aliases, qualified_form};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.75;

const DECLARED_PRIORITY: u8 = 0;
const DERIVED_PRIORITY: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionTier {
    Exact,
    Normalized,
    Alias,
    Fuzzy,
}

/// Outcome of resolving one candidate. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasEntry {
    pub candidate: String,
    pub resolved_name: Option<String>,
    pub tier: Option<ResolutionTier>,
    /// Similarity score, only set for fuzzy matches.
    pub score: Option<f64>,
}

impl AliasEntry {
    fn unresolved(candidate: &str) -> Self {
        Self {
            candidate: candidate.to_string(),
            resolved_name: None,
            tier: None,
            score: None,
        }
    }

    fn resolved(candidate: &str, name: &str, tier: ResolutionTier, score: Option<f64>) -> Self {
        Self {
            candidate: candidate.to_string(),
            resolved_name: Some(name.to_string()),
            tier: Some(tier),
            score,
        }
    }
}

#[derive(Debug, Clone)]
struct AliasTarget {
    priority: u8,
    canonical: String,
}

pub struct AliasResolver {
    registry: Arc<CapabilityRegistry>,
    aliases: HashMap<String, AliasTarget>,
    fuzzy_targets: Vec<(String, String)>,
    scorer: Box<dyn SimilarityScorer>,
    threshold: f64,
}

impl AliasResolver {
    pub fn new(registry: Arc<CapabilityRegistry>) -> Self {
        let mut resolver = Self {
            registry,
            aliases: HashMap::new(),
            fuzzy_targets: Vec::new(),
            scorer: Box::new(TokenwiseScorer::<similarity::LevenshteinScorer>::default()),
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        };
        resolver.build_index();
        resolver
    }

    pub fn with_scorer(mut self, scorer: impl SimilarityScorer + 'static) -> Self {
        self.scorer = Box::new(scorer);
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    /// Swap in a new registry snapshot and rebuild the alias index.
    pub fn rebuild(&mut self, registry: Arc<CapabilityRegistry>) {
        self.registry = registry;
        self.build_index();
    }

    pub fn resolve(&self, candidate: &str) -> Option<String> {
        self.resolve_detailed(candidate).resolved_name
    }

    pub fn resolve_detailed(&self, candidate: &str) -> AliasEntry {
        let entry = self.resolve_tiers(candidate);
        debug!(
            candidate,
            resolved = entry.resolved_name.as_deref().unwrap_or("-"),
            tier = ?entry.tier,
            "resolved capability candidate"
        );
        entry
    }

    /// Alias table as sorted `(key, canonical)` pairs, for diagnostics.
    pub fn alias_table(&self) -> Vec<(String, String)> {
        let mut table: Vec<(String, String)> = self
            .aliases
            .iter()
            .map(|(key, target)| (key.clone(), target.canonical.clone()))
            .collect();
        table.sort();
        table
    }

    fn resolve_tiers(&self, candidate: &str) -> AliasEntry {
        if self.registry.contains(candidate) {
            return AliasEntry::resolved(candidate, candidate, ResolutionTier::Exact, None);
        }

        if let Some(qualified) = qualified_form(candidate) {
            if self.registry.contains(&qualified) {
                return AliasEntry::resolved(candidate, &qualified, ResolutionTier::Normalized, None);
            }
        }

        let key = alias_key(candidate);
        if key.is_empty() {
            return AliasEntry::unresolved(candidate);
        }

        if let Some(target) = self.aliases.get(&key) {
            return AliasEntry::resolved(candidate, &target.canonical, ResolutionTier::Alias, None);
        }

        match self.best_fuzzy_match(&key) {
            Some((canonical, score)) => {
                AliasEntry::resolved(candidate, &canonical, ResolutionTier::Fuzzy, Some(score))
            }
            None => AliasEntry::unresolved(candidate),
        }
    }

    fn best_fuzzy_match(&self, key: &str) -> Option<(String, f64)> {
        let mut best: Option<(&str, f64)> = None;

        for (target_key, canonical) in &self.fuzzy_targets {
            let score = self.scorer.score(key, target_key);
            if score <= self.threshold {
                continue;
            }
            best = match best {
                None => Some((canonical.as_str(), score)),
                Some((current, current_score)) => {
                    if score > current_score
                        || (score == current_score && outranks(canonical, current))
                    {
                        Some((canonical.as_str(), score))
                    } else {
                        Some((current, current_score))
                    }
                }
            };
        }

        best.map(|(canonical, score)| (canonical.to_string(), score))
    }

    fn build_index(&mut self) {
        self.aliases.clear();
        self.fuzzy_targets.clear();

        for tool in self.registry.get_all_tools() {
            let name = tool.name().to_string();

            for declared in tool.aliases() {
                self.insert_alias(alias_key(&declared), DECLARED_PRIORITY, &name);
            }
            for derived in derive_aliases(&name) {
                self.insert_alias(derived, DERIVED_PRIORITY, &name);
            }

            self.fuzzy_targets.push((name.replace('.', "_"), name.clone()));
        }

        for (key, target) in &self.aliases {
            self.fuzzy_targets.push((key.clone(), target.canonical.clone()));
        }
        self.fuzzy_targets.sort();
        self.fuzzy_targets.dedup();

        debug!(
            tools = self.registry.count(),
            aliases = self.aliases.len(),
            "built alias index"
        );
    }

    fn insert_alias(&mut self, key: String, priority: u8, canonical: &str) {
        if key.is_empty() {
            return;
        }
        let replace = match self.aliases.get(&key) {
            None => true,
            Some(existing) => {
                priority < existing.priority
                    || (priority == existing.priority && outranks(canonical, &existing.canonical))
            }
        };
        if replace {
            self.aliases.insert(
                key,
                AliasTarget {
                    priority,
                    canonical: canonical.to_string(),
                },
            );
        }
    }
}

/// Tie-break between two canonical names: shorter wins, then lexical order.
fn outranks(candidate: &str, incumbent: &str) -> bool {
    (candidate.len(), candidate) < (incumbent.len(), incumbent)
}
