use anyhow::{Context, Result};
use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Environment variables that carry per-platform credentials, keyed by the
/// field they fill in `PlatformCredentials`.
pub const CREDENTIAL_VARS: [(&str, &str); 4] = [
    ("twitter_bearer_token", "TWITTER_BEARER_TOKEN"),
    ("facebook_access_token", "FACEBOOK_ACCESS_TOKEN"),
    ("linkedin_access_token", "LINKEDIN_ACCESS_TOKEN"),
    ("instagram_access_token", "INSTAGRAM_ACCESS_TOKEN"),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub mode: AdapterMode,
    pub request_timeout_seconds: u64,
    pub credentials: PlatformCredentials,
    pub platforms: HashMap<String, PlatformConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterMode {
    /// Simulated latency, unconditional success, no network.
    #[default]
    Demo,
    /// Real calls against each platform's publishing API.
    Live,
}

impl FromStr for AdapterMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "demo" => Ok(AdapterMode::Demo),
            "live" => Ok(AdapterMode::Live),
            other => Err(anyhow::anyhow!("Unknown adapter mode: {}", other)),
        }
    }
}

impl fmt::Display for AdapterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterMode::Demo => write!(f, "demo"),
            AdapterMode::Live => write!(f, "live"),
        }
    }
}

/// Read-only credentials handed to each publisher when it is built.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformCredentials {
    pub twitter_bearer_token: Option<String>,
    pub facebook_access_token: Option<String>,
    pub linkedin_access_token: Option<String>,
    pub instagram_access_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "config")]
pub enum PlatformConfig {
    Twitter {
        #[serde(default)]
        latency_ms: Option<u64>,
        #[serde(default)]
        api_url: Option<String>,
        #[serde(default)]
        template: Option<String>,
    },
    Facebook {
        #[serde(default)]
        page_id: Option<String>,
        #[serde(default)]
        latency_ms: Option<u64>,
        #[serde(default)]
        api_url: Option<String>,
        #[serde(default)]
        template: Option<String>,
    },
    LinkedIn {
        #[serde(default)]
        author_urn: Option<String>,
        #[serde(default)]
        latency_ms: Option<u64>,
        #[serde(default)]
        api_url: Option<String>,
        #[serde(default)]
        template: Option<String>,
    },
    Instagram {
        #[serde(default)]
        account_id: Option<String>,
        #[serde(default)]
        image_url: Option<String>,
        #[serde(default)]
        latency_ms: Option<u64>,
        #[serde(default)]
        api_url: Option<String>,
        #[serde(default)]
        template: Option<String>,
    },
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut platforms = HashMap::new();
        platforms.insert(
            "twitter".to_string(),
            PlatformConfig::Twitter {
                latency_ms: None,
                api_url: None,
                template: None,
            },
        );
        platforms.insert(
            "facebook".to_string(),
            PlatformConfig::Facebook {
                page_id: None,
                latency_ms: None,
                api_url: None,
                template: None,
            },
        );
        platforms.insert(
            "linkedin".to_string(),
            PlatformConfig::LinkedIn {
                author_urn: None,
                latency_ms: None,
                api_url: None,
                template: None,
            },
        );
        platforms.insert(
            "instagram".to_string(),
            PlatformConfig::Instagram {
                account_id: None,
                image_url: None,
                latency_ms: None,
                api_url: None,
                template: None,
            },
        );

        Self {
            server: ServerConfig::default(),
            mode: AdapterMode::Demo,
            request_timeout_seconds: 30,
            credentials: PlatformCredentials::default(),
            platforms,
        }
    }
}

impl AppConfig {
    /// Layers the optional config file, `CROSSPOST_*` environment variables
    /// and the per-platform credential variables over the defaults.
    pub fn load(config_file: &str) -> Result<Self> {
        if !Path::new(config_file).exists() {
            log::info!(
                "Config file {} doesn't exist, using defaults and environment",
                config_file
            );
        }

        let mut builder = Config::builder()
            .add_source(File::with_name(config_file).required(false))
            .add_source(
                Environment::with_prefix("CROSSPOST")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        for (key, var) in CREDENTIAL_VARS {
            builder = builder
                .set_override_option(format!("credentials.{}", key), std::env::var(var).ok())?;
        }

        let config: AppConfig = builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Failed to parse configuration")?;

        log::info!("Loaded configuration (mode: {})", config.mode);
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port must be non-zero"));
        }

        if self.request_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("request_timeout_seconds must be non-zero"));
        }

        if self.platforms.is_empty() {
            return Err(anyhow::anyhow!("No platforms configured"));
        }

        log::info!("Configuration validation passed");
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, MutexGuard};

    // `load` reads process-wide environment variables.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_lock() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[test]
    fn test_default_registers_four_demo_platforms() {
        let config = AppConfig::default();
        assert_eq!(config.mode, AdapterMode::Demo);
        assert_eq!(config.platforms.len(), 4);
        for id in ["twitter", "facebook", "linkedin", "instagram"] {
            assert!(config.platforms.contains_key(id), "missing {}", id);
        }
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.request_timeout_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.platforms.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_platform_config_from_json() {
        let json = r#"{
            "mode": "live",
            "platforms": {
                "x": { "type": "Twitter", "config": { "latency_ms": 10 } },
                "fb": { "type": "Facebook", "config": { "page_id": "123" } }
            }
        }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.mode, AdapterMode::Live);
        assert_eq!(config.server.port, 3000);
        assert!(matches!(
            config.platforms.get("x"),
            Some(PlatformConfig::Twitter {
                latency_ms: Some(10),
                ..
            })
        ));
        match config.platforms.get("fb") {
            Some(PlatformConfig::Facebook { page_id, .. }) => {
                assert_eq!(page_id.as_deref(), Some("123"))
            }
            other => panic!("unexpected platform config: {:?}", other),
        }
    }

    #[test]
    fn test_load_layers_file_over_defaults() {
        let _guard = env_lock();
        let path = std::env::temp_dir().join(format!("crosspostrs-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"{ "server": { "port": 8088 }, "request_timeout_seconds": 5 }"#,
        )
        .unwrap();

        let config = AppConfig::load(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.server.port, 8088);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.request_timeout_seconds, 5);
        assert_eq!(config.platforms.len(), 4);
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let _guard = env_lock();
        let config = AppConfig::load("does-not-exist.json").unwrap();
        assert_eq!(config.platforms.len(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_layers_environment_and_credentials() {
        let _guard = env_lock();
        std::env::set_var("TWITTER_BEARER_TOKEN", "twitter-test-token");
        std::env::set_var("CROSSPOST_SERVER__PORT", "9137");

        let loaded = AppConfig::load("does-not-exist.json");

        std::env::remove_var("TWITTER_BEARER_TOKEN");
        std::env::remove_var("CROSSPOST_SERVER__PORT");

        let config = loaded.unwrap();
        assert_eq!(config.server.port, 9137);
        assert_eq!(
            config.credentials.twitter_bearer_token.as_deref(),
            Some("twitter-test-token")
        );
    }

    #[test]
    fn test_adapter_mode_parsing() {
        assert_eq!("demo".parse::<AdapterMode>().unwrap(), AdapterMode::Demo);
        assert_eq!("LIVE".parse::<AdapterMode>().unwrap(), AdapterMode::Live);
        assert!("staging".parse::<AdapterMode>().is_err());
    }
}
