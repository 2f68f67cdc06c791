//! JobPilot Browser - automation surface over one logical browser session.
//!
//! The [`BrowserSurface`] trait is the capability seam the orchestration
//! engine is written against: navigation, element location, visibility and
//! text reads, clicks and fills, one-shot network-response and file-chooser
//! watches, scroll primitives and cookie snapshots. Production code uses the
//! [`ChromiumSurface`] adapter backed by `chromiumoxide`; tests substitute a
//! scripted fake so the state machines run without a live browser.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod engine;
pub mod error;
pub mod surface;

pub use engine::ChromiumSurface;
pub use error::{BrowserError, Result};
pub use surface::{BrowserSurface, ElementHandle, FileChooser};
