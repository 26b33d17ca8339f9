//! aftertest core library
//!
//! Provides the deferred cleanup registry: test code registers teardown work
//! where a resource is created, and an after-each lifecycle hook drains it in
//! reverse registration order once the test ends.

pub mod action;
pub mod config;
pub mod context;
pub mod error;
pub mod hook;
pub mod registry;

// Re-export commonly used types
pub use action::{CleanupAction, IntoActionResult, Teardown};
pub use config::{CleanupConfig, ResiduePolicy};
pub use context::{CurrentTest, TestContext};
pub use error::{CleanupError, CleanupResult};
pub use hook::{AfterEachCallback, LifecycleHook};
pub use registry::{CleanupRegistry, DrainReport};
