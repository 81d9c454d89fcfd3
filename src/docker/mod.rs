pub mod ports;
pub mod run_options;
pub mod runtime;
