//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, DatabaseConfig, FOSSA_API_TOKEN_ENV, FossaSettings, LogFormat, LoggingConfig,
    OnboardingConfig,
};
