#[macro_use]
extern crate tracing;

use crate::{
    cli::{Args, Parser},
    configs::GlobalConfig,
    error::AppError,
    system::HostSystem,
};
use anyhow::{Context, Result as AnyResult};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod app;
mod cli;
mod components;
mod configs;
mod error;
mod system;
#[cfg(test)]
mod testing;

fn main() -> ExitCode {
    // Load environment variables from the `.env` file, only `RUST_LOG` reads them
    dotenvy::dotenv().ok();
    // Initialize the logger after loading the environment variables
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .without_time()
        .init();

    let args = Args::parse();

    match bootstrap(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<AppError>() {
                Some(app_error) => {
                    error!("{}", app_error.report());
                    if let Some(hint) = app_error.reason().hint() {
                        error!("{}", hint);
                    }
                }
                None => error!("{:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

fn bootstrap(args: Args) -> AnyResult<()> {
    let config = GlobalConfig::load_config().context("Failed to parse configuration files")?;
    let system = HostSystem::new(&config);

    // Every step runs strictly in sequence, a single thread is enough
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to bootstrap the Tokio runtime")?;

    runtime.block_on(app::run(&args, &config, &system))?;
    Ok(())
}
