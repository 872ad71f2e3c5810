pub mod hash_links;
pub mod preflight;
pub mod prober;
pub mod status;
pub mod updater;

pub use hash_links::HashLinkBuilder;
pub use prober::ConnectivityProbe;
pub use updater::Updater;
