//! Test lifecycle hook interface
//!
//! The surrounding test framework owns the hook. It must invoke every
//! subscribed callback exactly once after each test, whatever the outcome.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::CleanupResult;

/// Callback invoked after every test
pub type AfterEachCallback = Arc<dyn Fn() -> BoxFuture<'static, CleanupResult<()>> + Send + Sync>;

/// Registration point for after-each callbacks
pub trait LifecycleHook: Send + Sync {
    /// Subscribe `callback` to run after every test
    fn after_each(&self, callback: AfterEachCallback);
}
