//! JobPilot Core - Foundation crate for the JobPilot delivery orchestrator.
//!
//! This crate provides the shared types, error handling, configuration
//! management and the progress/cancellation primitives that all other
//! JobPilot crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared domain types (`Platform`, `JobIdentity`, `JobRecord`, `DeliveryStatus`)
//! - [`progress`] - Non-blocking progress channel and cooperative cancellation token

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod progress;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, BrowserConfig, LlmConfig, SearchConfig};
pub use error::{ConfigError, ConfigResult};
pub use progress::{CancelToken, ProgressBus, ProgressReport, Severity};
pub use types::{DeliveryOutcome, DeliveryStatus, JobIdentity, JobRecord, Platform};
