use serde::Deserialize;

use crate::domain::DomainError;
use crate::domain::onboarding::DEFAULT_INVITATION_CONCURRENCY;
use crate::infrastructure::fossa::FossaConfig;
use crate::infrastructure::storage::SqliteConfig;

/// Environment variable holding the FOSSA token, as used by the other
/// maintainer-d tools
pub const FOSSA_API_TOKEN_ENV: &str = "FOSSA_API_TOKEN";

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
    pub fossa: FossaSettings,
    pub onboarding: OnboardingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FossaSettings {
    pub base_url: String,
    pub api_token: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OnboardingConfig {
    /// Name of the service row projects are onboarded to
    pub service_name: String,
    /// Maximum invitations in flight during one pass
    pub invitation_concurrency: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://maintainers.db".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for FossaSettings {
    fn default() -> Self {
        Self {
            base_url: FossaConfig::DEFAULT_BASE_URL.to_string(),
            api_token: None,
            timeout_secs: 30,
        }
    }
}

impl Default for OnboardingConfig {
    fn default() -> Self {
        Self {
            service_name: "fossa".to_string(),
            invitation_concurrency: DEFAULT_INVITATION_CONCURRENCY,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn sqlite_config(&self) -> SqliteConfig {
        SqliteConfig::new(&self.database.url).with_max_connections(self.database.max_connections)
    }

    /// FOSSA settings with the token resolved from config or `FOSSA_API_TOKEN`
    pub fn fossa_config(&self) -> Result<FossaConfig, DomainError> {
        let token = self
            .fossa
            .api_token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| std::env::var(FOSSA_API_TOKEN_ENV).ok())
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                DomainError::configuration(format!(
                    "environment variable {} is not set",
                    FOSSA_API_TOKEN_ENV
                ))
            })?;

        Ok(FossaConfig::new(token)
            .with_base_url(&self.fossa.base_url)
            .with_timeout(self.fossa.timeout_secs))
    }
}
