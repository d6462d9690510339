//! Common utilities module
//!
//! Shared error type and the epsilon-floored statistics used by every
//! fusion and metric component.

pub mod error;
pub mod stats;

pub use error::{PansharpenError, Result};
