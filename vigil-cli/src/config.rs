//! Configuration loading for the VIGIL monitor.
//!
//! All fields are required unless explicitly marked optional. Secrets
//! come from the environment, never from the config file.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use vigil_core::{ClassificationPolicy, ConfigError};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VigilConfig {
    pub company: CompanyConfig,
    pub research: ResearchConfig,
    pub storage: StorageConfig,
    pub email: EmailConfig,
    /// Classification policy; defaults to the built-in one when omitted.
    #[serde(default)]
    pub policy: ClassificationPolicy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompanyConfig {
    pub name: String,
    /// Who the research is for; calibrates the significance flagging in
    /// the research prompt.
    pub investor_context: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResearchConfig {
    pub model: String,
    pub max_tokens: i32,
    pub web_search_uses: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    pub reports_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub from: String,
    pub to: String,
}

/// Secrets resolved from the environment at startup.
#[derive(Clone)]
pub struct Secrets {
    pub anthropic_api_key: String,
    pub smtp_password: String,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("anthropic_api_key", &"[REDACTED]")
            .field("smtp_password", &"[REDACTED]")
            .finish()
    }
}

impl Secrets {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            smtp_password: require_env("VIGIL_SMTP_PASSWORD")?,
        })
    }
}

fn require_env(var: &'static str) -> Result<String, ConfigError> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnv { var }),
    }
}

impl VigilConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_args()
            .or_else(config_path_from_env)
            .ok_or(ConfigError::MissingConfigPath)?;
        let config = Self::from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        toml::from_str(&contents).map_err(|e| ConfigError::ParseFailed {
            reason: e.to_string(),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.company.name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "company.name",
                reason: "must not be empty".to_string(),
            });
        }
        if self.company.investor_context.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "company.investor_context",
                reason: "must not be empty".to_string(),
            });
        }
        if self.research.model.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "research.model",
                reason: "must not be empty".to_string(),
            });
        }
        if self.research.max_tokens <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "research.max_tokens",
                reason: "must be > 0".to_string(),
            });
        }
        if self.research.web_search_uses == 0 {
            return Err(ConfigError::InvalidValue {
                field: "research.web_search_uses",
                reason: "must be > 0".to_string(),
            });
        }
        if self.storage.reports_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "storage.reports_dir",
                reason: "must not be empty".to_string(),
            });
        }
        if self.email.smtp_host.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "email.smtp_host",
                reason: "must not be empty".to_string(),
            });
        }
        if self.email.smtp_port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "email.smtp_port",
                reason: "must be > 0".to_string(),
            });
        }
        if self.email.username.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "email.username",
                reason: "must not be empty".to_string(),
            });
        }
        if self.email.from.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "email.from",
                reason: "must not be empty".to_string(),
            });
        }
        if self.email.to.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "email.to",
                reason: "must not be empty".to_string(),
            });
        }
        self.policy.validate().map_err(|e| ConfigError::InvalidValue {
            field: "policy",
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var("VIGIL_CONFIG").ok().map(PathBuf::from)
}

// =============================================================================
// TESTS
// =============================================================================
