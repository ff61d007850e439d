use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "zena.yaml";
pub const CONFIG_PATH_ENV: &str = "ZENA_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub audit_log: PathBuf,
    pub jobs_state_file: Option<PathBuf>,
    pub tool_timeout_ms: u64,
    pub resolver_threshold: f64,
    pub log_level: String,
    /// Capabilities the CLI approval gate approves without asking.
    pub auto_approve: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            audit_log: PathBuf::from("./data/audit.log"),
            jobs_state_file: None,
            tool_timeout_ms: 30_000,
            resolver_threshold: zena_tools::DEFAULT_CONFIDENCE_THRESHOLD,
            log_level: "info".to_string(),
            auto_approve: Vec::new(),
        }
    }
}

impl Config {
    pub fn path() -> PathBuf {
        std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    pub fn exists() -> bool {
        Self::path().exists()
    }

    /// Load from [`Config::path`], falling back to defaults when the file is
    /// absent.
    pub fn load() -> Result<Self> {
        let path = Self::path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.audit_log.as_os_str().is_empty() {
            anyhow::bail!("audit_log cannot be empty");
        }
        if self.tool_timeout_ms == 0 {
            anyhow::bail!("tool_timeout_ms must be greater than zero");
        }
        if !(self.resolver_threshold > 0.0 && self.resolver_threshold <= 1.0) {
            anyhow::bail!(
                "resolver_threshold must be in (0, 1], got {}",
                self.resolver_threshold
            );
        }
        if self.log_level.trim().is_empty() {
            anyhow::bail!("log_level cannot be empty");
        }
        Ok(())
    }
}
