use crate::{
    cli::Args,
    components::{preflight, status, ConnectivityProbe, Updater},
    configs::GlobalConfig,
    error::AppResult,
    system::SystemOps,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn version_banner() -> String {
    format!(
        "{} v{}\nCopyright (c) 2025 Ryu Tanabe (bellx2)\nhttps://github.com/bellx2",
        env!("CARGO_PKG_NAME"),
        VERSION
    )
}

/// Dispatches on the parsed flags. `--version` and `--check` return before
/// the privilege check and never touch the filesystem beyond reading.
pub async fn run<S: SystemOps + ?Sized>(
    args: &Args,
    config: &GlobalConfig,
    system: &S,
) -> AppResult<()> {
    if args.version {
        println!("{}", version_banner());
        return Ok(());
    }
    if args.check {
        status::check(config).await;
        return Ok(());
    }

    println!("Raspbian CA Update Tool v{}", VERSION);
    println!("===========================");

    preflight::run(config, system, args.force).await?;

    if args.insecure {
        warn!("Running in insecure mode - SSL certificate verification disabled");
    }

    Updater::new(config, system, args.insecure).update().await?;
    info!("CA certificates updated successfully!");

    info!("Testing SSL connection...");
    ConnectivityProbe::new(config).report().await;

    Ok(())
}
