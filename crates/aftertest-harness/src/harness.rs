//! Harness facade
//!
//! Owns one [`TestLifecycle`] and one cleanup registry subscribed to it, and
//! exposes [`Harness::after_this`] to test bodies.

use std::future::Future;
use std::sync::Arc;

use aftertest_core::{
    CleanupAction, CleanupConfig, CleanupRegistry, CleanupResult, IntoActionResult,
};

use crate::lifecycle::{TestLifecycle, TestReport};

/// Test runner integration layer holding the process' cleanup registry
#[derive(Debug)]
pub struct Harness {
    lifecycle: TestLifecycle,
    registry: Arc<CleanupRegistry>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(CleanupConfig::default())
    }

    pub fn with_config(config: CleanupConfig) -> Self {
        let lifecycle = TestLifecycle::new();
        let registry = Arc::new(CleanupRegistry::with_config(lifecycle.context(), config));
        registry.install(&lifecycle);
        Self {
            lifecycle,
            registry,
        }
    }

    /// Build with configuration read from `AFTERTEST_*` variables
    pub fn from_env() -> CleanupResult<Self> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Build with configuration read through a custom variable lookup
    pub fn from_env_with<F>(lookup: F) -> CleanupResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self::with_config(CleanupConfig::from_env_with(lookup)?))
    }

    /// Queue `action` to run after the current test
    ///
    /// Actions run in reverse order of registration once the test ends.
    ///
    /// ```rust
    /// use aftertest_core::CleanupAction;
    /// use aftertest_harness::Harness;
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let harness = Harness::new();
    /// let report = harness
    ///     .run("connects", async {
    ///         harness.after_this(CleanupAction::sync(|| println!("disconnect")))
    ///     })
    ///     .await;
    /// assert!(report.is_passed());
    /// # }
    /// ```
    pub fn after_this(&self, action: CleanupAction) -> CleanupResult<()> {
        self.registry.register(action)
    }

    /// Run one test body, then drain its cleanup actions
    pub async fn run<Fut, R>(&self, name: impl Into<String>, body: Fut) -> TestReport
    where
        Fut: Future<Output = R>,
        R: IntoActionResult,
    {
        self.lifecycle.run(name, body).await
    }

    pub fn registry(&self) -> &Arc<CleanupRegistry> {
        &self.registry
    }

    pub fn lifecycle(&self) -> &TestLifecycle {
        &self.lifecycle
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
