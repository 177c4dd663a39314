use clap::Parser;
use maintainerd_onboard::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Onboard(args) => cli::onboard::run(args, cli.db).await,
    }
}
