//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the shelf core:
//! - Logging and tracing setup
//! - Configuration loading and validation
//!
//! Other crates depend on this one for the [`CoreConfig`](config::CoreConfig)
//! they are bootstrapped from and for the logging conventions they follow.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder};
pub use error::{Error, Result};
pub use logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
