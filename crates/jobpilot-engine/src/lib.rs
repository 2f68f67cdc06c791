//! JobPilot Engine
//!
//! The orchestration core: session monitoring, candidate discovery,
//! detail extraction, filtering and greeting delivery over one browser
//! surface.
//!
//! # Architecture
//!
//! - **One actor on the browser**: discovery and delivery run strictly
//!   sequentially, and the session monitor is paused while a run holds the
//!   surface.
//! - **Cooperative cancellation**: a shared token checked at candidate and
//!   retry boundaries; nothing is aborted mid-interaction.
//! - **Soft degradation**: greeting generation and attachments fall back;
//!   per-candidate failures are reported and skipped, never fatal.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod delivery;
pub mod discovery;
pub mod error;
pub mod extract;
pub mod filter;
pub mod orchestrator;
pub mod retry;
pub mod runner;
pub mod salary;
pub mod selectors;
pub mod session;
pub mod url_builder;

pub use delivery::DeliveryEngine;
pub use discovery::DiscoveryEngine;
pub use error::{EngineError, Result};
pub use extract::parse_detail;
pub use filter::{Blacklist, FilterDecision, FilterEngine, RejectReason};
pub use orchestrator::{Orchestrator, RunSummary};
pub use retry::bounded_retry;
pub use runner::{delivery_overview, DeliveryOverview, DeliveryService, ServiceStatus};
pub use salary::{parse_salary, ParsedSalary};
pub use session::{LoginState, SessionMonitor};
pub use url_builder::build_search_url;
