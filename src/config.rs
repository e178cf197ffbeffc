use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::format::Locale;

pub const DEFAULT_ENDPOINT: &str = "https://models.github.ai/inference/chat/completions";
pub const DEFAULT_PROVIDER: &str = "github-models";
pub const DEFAULT_ANALYSIS_MODEL: &str = "openai/gpt-4.1";
pub const DEFAULT_CHAT_MODEL: &str = "openai/gpt-4o";
pub const DEFAULT_DATA_DIR: &str = ".skincare";
pub const DEFAULT_USER: &str = "local";

/// Chat-completion endpoint settings.
#[derive(Clone)]
pub struct EndpointConfig {
    pub base_url: String,
    pub provider: String,
    /// None when no token is configured; requests then fail with AuthFailed.
    pub api_key: Option<String>,
}

impl std::fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("base_url", &self.base_url)
            .field("provider", &self.provider)
            .field(
                "api_key",
                &self.api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: EndpointConfig,
    pub analysis_model: String,
    pub chat_model: String,
    pub data_dir: PathBuf,
    pub default_user: String,
    pub locale: Locale,
}

/// Overrides read from `config.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    endpoint: Option<String>,
    provider: Option<String>,
    api_token: Option<String>,
    analysis_model: Option<String>,
    chat_model: Option<String>,
    default_user: Option<String>,
    locale: Option<Locale>,
}

impl Config {
    /// Environment first, then the optional TOML file on top.
    pub fn load() -> Self {
        let mut config = Self::from_env();

        let path = env::var("SKINCARE_CONFIG")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| config.data_dir.join("config.toml"));

        if path.exists() {
            match config.apply_file(&path) {
                Ok(()) => tracing::info!("loaded config overrides from {}", path.display()),
                Err(e) => tracing::warn!("ignoring config file {}: {e}", path.display()),
            }
        }

        if config.endpoint.api_key.is_none() {
            tracing::warn!("SKINCARE_API_TOKEN not set, analysis and chat will be unavailable");
        }

        config
    }

    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup (used by `from_env`).
    pub fn from_vars<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let locale = match get("SKINCARE_LOCALE") {
            Some(raw) => Locale::parse(&raw).unwrap_or_else(|| {
                tracing::warn!("unknown SKINCARE_LOCALE {raw:?}, using en");
                Locale::default()
            }),
            None => Locale::default(),
        };

        Self {
            endpoint: EndpointConfig {
                base_url: get("SKINCARE_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
                provider: DEFAULT_PROVIDER.to_string(),
                api_key: get("SKINCARE_API_TOKEN"),
            },
            analysis_model: get("SKINCARE_ANALYSIS_MODEL")
                .unwrap_or_else(|| DEFAULT_ANALYSIS_MODEL.to_string()),
            chat_model: get("SKINCARE_CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            data_dir: get("SKINCARE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            default_user: get("SKINCARE_USER").unwrap_or_else(|| DEFAULT_USER.to_string()),
            locale,
        }
    }

    fn apply_file(&mut self, path: &Path) -> Result<(), String> {
        let raw = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        self.apply_toml(&raw)
    }

    /// Apply TOML overrides. Unknown keys are rejected so typos surface.
    pub fn apply_toml(&mut self, raw: &str) -> Result<(), String> {
        let file: FileConfig = toml::from_str(raw).map_err(|e| e.to_string())?;

        if let Some(v) = file.endpoint {
            self.endpoint.base_url = v;
        }
        if let Some(v) = file.provider {
            self.endpoint.provider = v;
        }
        if let Some(v) = file.api_token {
            self.endpoint.api_key = Some(v);
        }
        if let Some(v) = file.analysis_model {
            self.analysis_model = v;
        }
        if let Some(v) = file.chat_model {
            self.chat_model = v;
        }
        if let Some(v) = file.default_user {
            self.default_user = v;
        }
        if let Some(v) = file.locale {
            self.locale = v;
        }
        Ok(())
    }
}
