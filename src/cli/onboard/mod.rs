//! Onboard command - reconciles one project and prints its report

use std::io::Write;

use clap::Args;
use tracing::info;

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Arguments for the onboard command
#[derive(Args, Clone, Debug)]
pub struct OnboardArgs {
    /// Project name to onboard
    #[arg(long)]
    pub project: String,

    /// Service name (overrides config, default: fossa)
    #[arg(long)]
    pub service: Option<String>,
}

/// Run a reconciliation pass and write the report to stdout
pub async fn run(args: OnboardArgs, db: Option<String>) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut config = AppConfig::load()?;
    apply_overrides(&mut config, &args, db);
    init_logging(&config);

    info!(
        project = %args.project,
        service = %config.onboarding.service_name,
        "Checking onboarding status"
    );

    let runner = crate::create_runner(&config).await?;
    let report = runner.run(&args.project).await?;

    let mut stdout = std::io::stdout().lock();
    for line in &report {
        writeln!(stdout, "{}", line)?;
    }

    Ok(())
}

fn apply_overrides(config: &mut AppConfig, args: &OnboardArgs, db: Option<String>) {
    if let Some(db) = db {
        config.database.url = database_url(&db);
    }

    if let Some(service) = &args.service {
        config.onboarding.service_name = service.clone();
    }
}

/// Accept either a bare file path or a full `sqlite:` URL
fn database_url(db: &str) -> String {
    if db.starts_with("sqlite:") {
        db.to_string()
    } else {
        format!("sqlite://{}", db)
    }
}

fn init_logging(config: &AppConfig) {
    logging::init_logging(&logging::LoggingConfig {
        level: config.logging.level.clone(),
        format: config.logging.format.clone(),
    });
}
