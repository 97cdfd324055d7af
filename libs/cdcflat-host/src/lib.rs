pub mod config;
pub mod error;
pub mod plugin_host;
pub mod runner;

pub use error::HostError;
pub use runner::{RunStats, Runner};
