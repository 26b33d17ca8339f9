//! aftertest
//!
//! Register test teardown at the exact point a resource is created. Cleanup
//! actions queued with [`Harness::after_this`] run after the test finishes,
//! last registered first, whether the test passed or failed.
//!
//! # Example
//!
//! ```rust
//! use aftertest::{CleanupAction, Harness};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let harness = Harness::new();
//!
//! let report = harness
//!     .run("opens_a_socket", async {
//!         // open the socket here, then queue its teardown
//!         harness.after_this(CleanupAction::sync(|| println!("socket closed")))?;
//!         // ... assertions ...
//!         Ok::<_, aftertest::CleanupError>(())
//!     })
//!     .await;
//!
//! assert!(report.is_passed());
//! assert!(harness.registry().is_empty());
//! # }
//! ```

pub use aftertest_core::{action, config, context, error, hook, registry};
pub use aftertest_harness::{lifecycle, logging};

pub use aftertest_core::{
    AfterEachCallback, CleanupAction, CleanupConfig, CleanupError, CleanupRegistry,
    CleanupResult, CurrentTest, DrainReport, IntoActionResult, LifecycleHook, ResiduePolicy,
    Teardown, TestContext,
};
pub use aftertest_harness::{Harness, LogFormat, LoggingConfig, TestLifecycle, TestOutcome, TestReport};
