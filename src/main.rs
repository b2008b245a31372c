//! taskdeck: personal task manager with a web UI.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use taskdeck::cli::{Cli, Command};
use taskdeck::config::Config;
use taskdeck::dashboard;
use taskdeck::db::Database;
use taskdeck::gateway::SqliteGateway;
use taskdeck::subscriptions::ChangeFeed;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    taskdeck::logging::init(cli.verbose);

    let config = Config::resolve(cli.database.clone(), cli.port)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Migrate => {
            // Opening the database applies pending migrations.
            let db = Database::open(&config.database_path)?;
            info!(
                "migrations applied to {}",
                config.database_path.display()
            );
            db.close()?;
        }
        Command::Serve => serve(config).await?,
    }

    Ok(())
}

async fn serve(config: Config) -> Result<()> {
    let db = Database::open(&config.database_path)?;
    let feed = Arc::new(ChangeFeed::new());
    let gateway = SqliteGateway::new(db.clone(), Arc::clone(&feed));

    let (shutdown_tx, addr) = dashboard::start_server(gateway, feed, config.port).await?;
    info!("taskdeck ready at http://{}", addr);

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    let _ = shutdown_tx.send(());

    db.close()?;
    Ok(())
}
