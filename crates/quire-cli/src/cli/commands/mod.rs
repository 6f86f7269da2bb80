//! Subcommand implementations.

mod recent;
mod resolve;

pub use recent::run_recent;
pub use resolve::run_resolve;
