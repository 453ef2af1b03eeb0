//! Static SDK configuration.

use crate::did::reference::did_chain;
use crate::messages::{Action, ServerInfo, VcFilter};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::Path;
use thiserror::Error;

/// Default config file read by [`SdkConfig::from_env`].
pub const DEFAULT_CONFIG_PATH: &str = "ontlogin.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("No DID processor registered for chain {0}")]
    MissingProcessor(String),
}

/// Chains, algorithms, server identity and per-action credential policy.
///
/// Immutable once handed to [`LoginSdk`](crate::sdk::LoginSdk).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkConfig {
    #[serde(default = "default_chains")]
    pub chain: Vec<String>,
    #[serde(default = "default_algs")]
    pub alg: Vec<String>,
    pub server_info: ServerInfo,
    #[serde(default)]
    pub vc_filters: HashMap<Action, Vec<VcFilter>>,
}

fn default_chains() -> Vec<String> {
    vec!["ont".to_string()]
}

fn default_algs() -> Vec<String> {
    vec!["ES256".to_string()]
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl SdkConfig {
    pub fn new(server_info: ServerInfo) -> Self {
        Self {
            chain: default_chains(),
            alg: default_algs(),
            server_info,
            vc_filters: HashMap::new(),
        }
    }

    pub fn with_vc_filters(mut self, action: Action, filters: Vec<VcFilter>) -> Self {
        self.vc_filters.insert(action, filters);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SdkConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Load from `ONTLOGIN_CONFIG` (default [`DEFAULT_CONFIG_PATH`]), then
    /// apply the comma-separated `ONTLOGIN_CHAINS` / `ONTLOGIN_ALGS` overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = env::var("ONTLOGIN_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let json = std::fs::read_to_string(&path)?;
        let mut config: SdkConfig = serde_json::from_str(&json)?;

        if let Ok(chains) = env::var("ONTLOGIN_CHAINS") {
            config.chain = split_list(&chains);
        }
        if let Ok(algs) = env::var("ONTLOGIN_ALGS") {
            config.alg = split_list(&algs);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chain.is_empty() {
            return Err(ConfigError::Invalid("at least one chain is required".to_string()));
        }
        if self.alg.is_empty() {
            return Err(ConfigError::Invalid("at least one algorithm is required".to_string()));
        }
        if self.server_info.name.is_empty() || self.server_info.url.is_empty() {
            return Err(ConfigError::Invalid("server name and url are required".to_string()));
        }
        if !self.server_info.did.is_empty() {
            did_chain(&self.server_info.did).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        Ok(())
    }

    /// Credential filters for `action`, `None` when there are none.
    pub fn filters_for(&self, action: Action) -> Option<&[VcFilter]> {
        self.vc_filters
            .get(&action)
            .map(Vec::as_slice)
            .filter(|filters| !filters.is_empty())
    }

    /// Credential types that must be presented for `action`.
    pub fn required_types(&self, action: Action) -> Vec<String> {
        self.filters_for(action)
            .unwrap_or_default()
            .iter()
            .filter(|f| f.required)
            .map(|f| f.vc_type.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_info() -> ServerInfo {
        ServerInfo {
            name: "testServer".to_string(),
            icon: "http://somepic.jpg".to_string(),
            url: "https://ont.io".to_string(),
            did: "did:ont:sampletest".to_string(),
            verification_method: String::new(),
        }
    }

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "chain": ["ont", "etho"],
            "alg": ["ES256"],
            "serverInfo": {"name": "testServer", "url": "https://ont.io", "did": "did:ont:sampletest"},
            "vcFilters": {
                "authorization": [
                    {"type": "EmailCredential", "required": true},
                    {"type": "NicknameCredential", "required": false}
                ]
            }
        }"#;

        let config = SdkConfig::from_json_str(json).unwrap();
        assert_eq!(config.chain, vec!["ont", "etho"]);
        assert_eq!(config.required_types(Action::Authorization), vec!["EmailCredential"]);
        assert!(config.filters_for(Action::Certification).is_none());
    }

    #[test]
    fn test_defaults() {
        let config = SdkConfig::from_json_str(r#"{"serverInfo": {"name": "s", "url": "https://s"}}"#).unwrap();
        assert_eq!(config.chain, vec!["ont"]);
        assert_eq!(config.alg, vec!["ES256"]);
        assert!(config.vc_filters.is_empty());
    }

    #[test]
    fn test_empty_filter_list_is_absent() {
        let config = SdkConfig::new(server_info()).with_vc_filters(Action::Certification, vec![]);
        assert!(config.filters_for(Action::Certification).is_none());
        assert!(config.required_types(Action::Certification).is_empty());
    }

    #[test]
    fn test_validate() {
        assert!(SdkConfig::new(server_info()).validate().is_ok());

        let mut config = SdkConfig::new(server_info());
        config.chain.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = SdkConfig::new(server_info());
        config.server_info.did = "did:broken".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = SdkConfig::new(server_info());
        config.server_info.url.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("ont, etho ,,"), vec!["ont", "etho"]);
        assert!(split_list("").is_empty());
    }
}
