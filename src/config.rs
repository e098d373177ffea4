//! Configuration loaded from `hireflow.toml`.
//!
//! Every field has a default, so a missing file or a partial one is fine.
//! `HIREFLOW_TOKEN` and `HIREFLOW_BASE_URL` take precedence over the file.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::poller::PollPolicy;

pub const CONFIG_FILE: &str = "hireflow.toml";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HireflowConfig {
    /// Root of the hiring-data REST service.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer credential. Empty means signed out.
    #[serde(default)]
    pub token: String,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Delay between organization profile polls.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Stop polling after this many fetches. Unbounded when absent.
    #[serde(default)]
    pub poll_max_attempts: Option<u32>,
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl Default for HireflowConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: String::new(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            poll_max_attempts: None,
        }
    }
}

impl HireflowConfig {
    /// Load `hireflow.toml` from the current directory, then apply the
    /// environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Like [`load`](Self::load) with an explicit file. A missing file
    /// yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            toml::from_str::<HireflowConfig>(&contents)
                .with_context(|| format!("parsing {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Overlay values from `lookup` (normally the process environment).
    /// Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let set = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(token) = set("HIREFLOW_TOKEN") {
            self.token = token;
        }
        if let Some(url) = set("HIREFLOW_BASE_URL") {
            self.base_url = url;
        }
    }

    pub fn poll_policy(&self) -> PollPolicy {
        let policy = PollPolicy::fixed(Duration::from_millis(self.poll_interval_ms));
        match self.poll_max_attempts {
            Some(max) => policy.with_max_attempts(max),
            None => policy,
        }
    }
}
