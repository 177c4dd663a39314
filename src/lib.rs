//! maintainerd-onboard
//!
//! Reconciles the onboarding state of maintainer-d projects on an external
//! compliance service (FOSSA):
//! - Provisions the project team once and records it locally
//! - Invites every registered maintainer
//! - Reports which repositories the team has imported

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use domain::{ProjectRepository, Reconciler, Runner, ServiceClient};
use infrastructure::{fossa::FossaClient, storage::SqliteProjectRepository};
use tracing::info;

/// Create a runner wired to the configured database and FOSSA instance
pub async fn create_runner(config: &AppConfig) -> anyhow::Result<Runner> {
    let client: Arc<dyn ServiceClient> = Arc::new(FossaClient::new(&config.fossa_config()?)?);

    info!("Connecting to database...");
    let repository = SqliteProjectRepository::connect(&config.sqlite_config()).await?;
    repository.ensure_schema().await?;
    info!("Database connection established");

    let repository: Arc<dyn ProjectRepository> = Arc::new(repository);

    let reconciler = Reconciler::new(client, repository.clone())
        .with_invitation_concurrency(config.onboarding.invitation_concurrency);

    Ok(Runner::new(
        repository,
        reconciler,
        config.onboarding.service_name.clone(),
    ))
}
