mod budget;
mod features;
mod kb;
mod lifecycle;
mod policy;

pub use budget::*;
pub use features::*;
pub use kb::*;
pub use lifecycle::*;
pub use policy::*;

use std::fmt;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Loaded once at process start: compiled defaults, overlaid by an optional
/// TOML file, overlaid by environment variables for secrets/endpoints (§4.K).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub budget: BudgetConfig,
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    #[serde(default)]
    pub features: FeatureFlags,
    #[serde(default)]
    pub kb: KbConfig,
}

impl Config {
    /// Load defaults, overlay an optional TOML file, overlay env var
    /// overrides. Returns compiled defaults untouched when `path` is `None`
    /// and no recognized env vars are set.
    pub fn load(path: Option<&std::path::Path>) -> crate::error::Result<Self> {
        let mut cfg = match path {
            Some(p) if p.exists() => {
                let raw = std::fs::read_to_string(p).map_err(crate::error::Error::Io)?;
                toml::from_str(&raw).map_err(|e| crate::error::Error::Config(e.to_string()))?
            }
            _ => Config::default(),
        };
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("ORCH_KB_ONLY") {
            self.kb.kb_only = v == "1" || v.eq_ignore_ascii_case("true");
        }
        if let Ok(v) = std::env::var("ORCH_TEST_MOCK_TOOLS") {
            self.features.test_mock_tools = v == "1" || v.eq_ignore_ascii_case("true");
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues; an empty vec
    /// means the configuration is usable as-is.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.policy.max_iterations == 0 {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "policy.max_iterations".into(),
                message: "must be greater than 0".into(),
            });
        }

        if self.policy.verification_max_attempts == 0 {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "policy.verification_max_attempts".into(),
                message: "must be greater than 0".into(),
            });
        }

        if self.budget.chars_per_token == 0 {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "budget.chars_per_token".into(),
                message: "must be greater than 0".into(),
            });
        }

        if self.lifecycle.daily_reset_hour > 23 {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "lifecycle.daily_reset_hour".into(),
                message: format!("hour {} is out of range 0-23", self.lifecycle.daily_reset_hour),
            });
        }

        if self.kb.kb_only && self.kb.support_links.is_empty() {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Warning,
                field: "kb.support_links".into(),
                message: "kb_only mode is enabled but no support links are configured".into(),
            });
        }

        issues
    }
}
