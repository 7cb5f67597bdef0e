use serde::{Deserialize, Serialize};
use storage::StorageKeys;

/// Host-supplied settings; every field has a default so `{}` is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardConfig {
    /// Prefix every setup path is appended to, e.g. `https://host/api/v1`.
    pub api_base_url: String,
    /// Pre-shared secret proving the caller may run setup.
    pub setup_secret: String,
    pub setup_secret_header: String,
    pub storage: StorageKeys,
    /// `tracing_subscriber::EnvFilter` directive.
    pub log_filter: String,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            api_base_url: "/api/v1".to_string(),
            setup_secret: String::new(),
            setup_secret_header: "X-Setup-Secret".to_string(),
            storage: StorageKeys::default(),
            log_filter: "info".to_string(),
        }
    }
}

impl WizardConfig {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(raw)
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url.trim_end_matches('/'), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = WizardConfig::from_json("").unwrap();
        assert_eq!(cfg, WizardConfig::default());
        assert_eq!(cfg.setup_secret_header, "X-Setup-Secret");
        assert_eq!(cfg.storage.app_config, "APP_CONFIG");
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let cfg = WizardConfig::from_json(
            r#"{"api_base_url":"https://drought.example/api/v1/","setup_secret":"s"}"#,
        )
        .unwrap();
        assert_eq!(
            cfg.endpoint("/manage-setup/abc"),
            "https://drought.example/api/v1/manage-setup/abc"
        );
        assert_eq!(cfg.log_filter, "info");
    }
}
