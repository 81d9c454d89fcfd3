// Library interface for coupler-jupyter
// Exposes internal modules for testing and potential library usage

pub mod browser;
pub mod cli;
pub mod clock;
pub mod config;
pub mod docker;
pub mod errors;
pub mod host;
pub mod interrupt;
pub mod launcher;
pub mod logging;
pub mod logscan;
pub mod suggestions;
