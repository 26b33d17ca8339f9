//! aftertest harness
//!
//! Wires the cleanup registry to a test lifecycle: [`Harness::after_this`]
//! registers teardown from inside a test, and [`Harness::run`] drains it once
//! the test body finishes.

pub mod harness;
pub mod lifecycle;
pub mod logging;

pub use harness::Harness;
pub use lifecycle::{TestLifecycle, TestOutcome, TestReport};
pub use logging::{LogFormat, LoggingConfig};
