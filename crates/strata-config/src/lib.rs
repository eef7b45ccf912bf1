//! Configuration for the strata terrain core.
//!
//! Settings persist to disk as a RON file, can be overridden from the command
//! line via clap, and support reload with change detection. Unknown fields are
//! ignored and missing sections fall back to defaults.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CONFIG_FILE_NAME, Config, DebugConfig, StreamingConfig, WorkerConfig, default_config_dir,
};
pub use error::ConfigError;
