//! Candidate normalization and alias derivation.
//!
//! Alias keys are lowercase tokens joined by `_`, with filler words removed
//! and plurals folded to their singular form, so `"Create new Contacts"`,
//! `"create-contact"` and `"createContact"` all share the key
//! `create_contact`.

use crate::descriptor::{action_of, domain_of};

const FILLER_WORDS: &[&str] = &[
    "a", "an", "the", "to", "for", "my", "our", "me", "please", "new", "of", "in", "on",
    "with", "some", "up",
];

const QUALIFIER_SEPARATORS: &[char] = &['.', '/', ':'];

/// Split on non-alphanumerics and on lower-to-upper camelCase boundaries.
pub fn split_words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut previous_lower = false;

    for c in input.chars() {
        if c.is_alphanumeric() {
            if c.is_uppercase() && previous_lower && !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            previous_lower = c.is_lowercase() || c.is_ascii_digit();
            current.extend(c.to_lowercase());
        } else {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            previous_lower = false;
        }
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
}

pub fn singularize(word: &str) -> String {
    if word.len() <= 3 || !word.is_ascii() {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix("ies") {
        return format!("{}y", stem);
    }
    if word.ends_with("sses") || word.ends_with("ches") || word.ends_with("shes") || word.ends_with("xes") {
        return word[..word.len() - 2].to_string();
    }
    if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
        return word.to_string();
    }
    match word.strip_suffix('s') {
        Some(stem) => stem.to_string(),
        None => word.to_string(),
    }
}

fn is_filler(word: &str) -> bool {
    FILLER_WORDS.contains(&word)
}

/// Significant, singular tokens of `input`.
pub fn key_tokens(input: &str) -> Vec<String> {
    split_words(input)
        .into_iter()
        .filter(|word| !is_filler(word))
        .map(|word| singularize(&word))
        .collect()
}

/// Alias-table key for `input`; empty when nothing significant remains.
pub fn alias_key(input: &str) -> String {
    key_tokens(input).join("_")
}

/// Canonical-looking form of a domain-qualified candidate.
///
/// `"Calendar/Create-Event"` becomes `calendar.create_event`. Returns `None`
/// when the candidate has no domain separator or fewer than two non-empty
/// segments.
pub fn qualified_form(candidate: &str) -> Option<String> {
    if !candidate.contains(QUALIFIER_SEPARATORS) {
        return None;
    }
    let segments: Vec<String> = candidate
        .split(QUALIFIER_SEPARATORS)
        .map(|segment| split_words(segment).join("_"))
        .filter(|segment| !segment.is_empty())
        .collect();
    if segments.len() < 2 {
        return None;
    }
    Some(segments.join("."))
}

/// Plausible alias keys for a canonical name, most specific first.
///
/// For `calendar.create_event` this yields `calendar_create_event`,
/// `create_event`, `create_event_calendar`, `create_calendar_event` and
/// `calendar_create`. Single-token actions never produce a bare action
/// alias, so `contact.create` does not claim `create`.
pub fn derive_aliases(name: &str) -> Vec<String> {
    let domain = key_tokens(domain_of(name));
    let action = key_tokens(action_of(name));
    if domain.is_empty() || action.is_empty() {
        return Vec::new();
    }

    let mut forms: Vec<Vec<&str>> = Vec::new();
    let d: Vec<&str> = domain.iter().map(String::as_str).collect();
    let a: Vec<&str> = action.iter().map(String::as_str).collect();

    forms.push([d.as_slice(), a.as_slice()].concat());
    if a.len() >= 2 {
        forms.push(a.clone());
    }
    forms.push([a.as_slice(), d.as_slice()].concat());
    if a.len() >= 2 {
        forms.push([&a[..1], d.as_slice(), &a[1..]].concat());
        forms.push([d.as_slice(), &a[..1]].concat());
    }

    let mut keys: Vec<String> = Vec::with_capacity(forms.len());
    for form in forms {
        let key = form.join("_");
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}
