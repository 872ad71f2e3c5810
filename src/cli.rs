pub use clap::Parser;

/// Update the root CA bundle of legacy Raspbian systems from curl.se.
#[derive(Parser, Debug, Default)]
#[command(name = env!("CARGO_PKG_NAME"), disable_version_flag = true)]
pub struct Args {
    /// Show version information
    #[arg(short = 'v', long)]
    pub version: bool,

    /// Check current CA certificates status
    #[arg(long)]
    pub check: bool,

    /// Force execution on non-Raspbian systems
    #[arg(long)]
    pub force: bool,

    /// Skip SSL certificate verification when downloading
    #[arg(long)]
    pub insecure: bool,
}
