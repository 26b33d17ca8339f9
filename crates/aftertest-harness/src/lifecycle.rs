//! In-process test lifecycle
//!
//! [`TestLifecycle`] plays the part of the test framework: it tracks which test
//! is running and invokes every after-each callback exactly once per test,
//! whether the body passed, returned an error, or panicked.

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use aftertest_core::error::panic_message;
use aftertest_core::{
    AfterEachCallback, CleanupError, CurrentTest, IntoActionResult, LifecycleHook, TestContext,
};
use futures::future::FutureExt;
use parking_lot::RwLock;
use tracing::{debug, error, info};

/// Final state of a test run
#[derive(Debug, Clone)]
pub enum TestOutcome {
    /// Body and every after-each callback succeeded
    Passed,
    /// Body returned an error or panicked
    Failed(String),
    /// Body passed but an after-each callback failed
    HookFailed(CleanupError),
}

impl TestOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, TestOutcome::Passed)
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestOutcome::Passed => write!(f, "passed"),
            TestOutcome::Failed(reason) => write!(f, "failed: {}", reason),
            TestOutcome::HookFailed(err) => write!(f, "after-each hook failed: {}", err),
        }
    }
}

/// Report for one test run
#[derive(Debug, Clone)]
pub struct TestReport {
    pub name: String,
    pub outcome: TestOutcome,
    /// Every after-each failure, including those hidden by a body failure
    pub hook_errors: Vec<CleanupError>,
}

impl TestReport {
    pub fn is_passed(&self) -> bool {
        self.outcome.is_passed()
    }
}

/// Test runner that honors the after-each contract
#[derive(Default)]
pub struct TestLifecycle {
    context: Arc<CurrentTest>,
    after_each: RwLock<Vec<AfterEachCallback>>,
}

impl TestLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oracle reporting the test this runner is executing
    pub fn context(&self) -> Arc<CurrentTest> {
        Arc::clone(&self.context)
    }

    /// Number of subscribed after-each callbacks
    pub fn after_each_count(&self) -> usize {
        self.after_each.read().len()
    }

    /// Run one test body followed by every after-each callback
    ///
    /// The body's return value goes through [`IntoActionResult`], the same
    /// conversion cleanup actions use, so a body may return `()` or any
    /// `Result<(), E>` with `E: Into<anyhow::Error>`.
    ///
    /// The current test is cleared on every exit path, including a panic
    /// unwinding out of an after-each callback.
    pub async fn run<Fut, R>(&self, name: impl Into<String>, body: Fut) -> TestReport
    where
        Fut: Future<Output = R>,
        R: IntoActionResult,
    {
        let name = name.into();
        self.context.enter(name.clone());
        let running = RunningTest(&*self.context);
        debug!(test = %name, "Test started");

        let body_result = match AssertUnwindSafe(body).catch_unwind().await {
            Ok(result) => result
                .into_action_result()
                .map_err(|e| format!("{:#}", e)),
            Err(payload) => Err(format!("panicked: {}", panic_message(payload.as_ref()))),
        };

        let hook_errors = self.run_after_each(&name).await;
        drop(running);

        let outcome = match (body_result, hook_errors.first()) {
            (Err(reason), _) => TestOutcome::Failed(reason),
            (Ok(()), Some(err)) => TestOutcome::HookFailed(err.clone()),
            (Ok(()), None) => TestOutcome::Passed,
        };
        info!(test = %name, "Test {}", outcome);

        TestReport {
            name,
            outcome,
            hook_errors,
        }
    }

    async fn run_after_each(&self, name: &str) -> Vec<CleanupError> {
        let callbacks: Vec<AfterEachCallback> = self.after_each.read().clone();
        let mut errors = Vec::new();

        for callback in callbacks {
            if let Err(err) = callback().await {
                error!(test = %name, "After-each hook failed: {}", err);
                errors.push(err);
            }
        }

        errors
    }
}

struct RunningTest<'a>(&'a CurrentTest);

impl Drop for RunningTest<'_> {
    fn drop(&mut self) {
        self.0.exit();
    }
}

impl LifecycleHook for TestLifecycle {
    fn after_each(&self, callback: AfterEachCallback) {
        self.after_each.write().push(callback);
    }
}

impl fmt::Debug for TestLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestLifecycle")
            .field("current_test", &self.context.current_test())
            .field("after_each", &self.after_each_count())
            .finish()
    }
}
