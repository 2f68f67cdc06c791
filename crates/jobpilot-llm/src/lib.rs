//! JobPilot LLM Layer
//!
//! Greeting generation against OpenAI-compatible APIs. The single seam is
//! [`GreetingGenerator`]; the delivery engine holds it as a trait object so
//! runs work identically with AI greetings disabled.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod greeting;

pub use error::{LlmError, Result};
pub use greeting::{is_rejection, GreetingGenerator, OpenAiGreeter};
