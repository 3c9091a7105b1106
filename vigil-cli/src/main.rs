//! VIGIL entry point
//!
//! Loads configuration, initializes tracing, and executes one
//! research-diff-notify run. Scheduling is external; a run either
//! completes or fails entirely.

mod config;
mod run;

use config::{Secrets, VigilConfig};
use tracing_subscriber::EnvFilter;
use vigil_core::VigilResult;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = try_main().await {
        tracing::error!(error = %err, "run failed");
        eprintln!("vigil: {}", err);
        std::process::exit(1);
    }
}

async fn try_main() -> VigilResult<()> {
    let config = VigilConfig::load()?;
    let secrets = Secrets::from_env()?;
    run::run(&config, &secrets).await
}
