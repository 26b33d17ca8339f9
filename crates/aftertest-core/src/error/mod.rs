//! Error types for the cleanup registry
//!
//! Every failure is surfaced to the immediate caller; nothing is swallowed.
//! `Usage` is raised synchronously by registration, `ActionFailure` by a drain
//! pass when one of the cleanup actions fails or panics.

mod constructors;
mod panic;
mod types;

pub use panic::panic_message;
pub use types::{CleanupError, CleanupResult};
