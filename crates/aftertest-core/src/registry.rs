//! Deferred cleanup registry
//!
//! Test code registers cleanup actions while a test runs. After the test, the
//! lifecycle hook drains the registry: actions run one at a time, last
//! registered first, each fully awaited before the next starts.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::FutureExt;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::action::CleanupAction;
use crate::config::{CleanupConfig, ResiduePolicy};
use crate::context::TestContext;
use crate::error::{CleanupError, CleanupResult, panic_message};
use crate::hook::LifecycleHook;

/// Outcome of a successful drain pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    /// Number of actions executed
    pub executed: usize,
}

/// Ordered store of pending cleanup actions
pub struct CleanupRegistry {
    pending: Mutex<Vec<CleanupAction>>,
    context: Arc<dyn TestContext>,
    config: CleanupConfig,
    draining: AtomicBool,
    installed: AtomicBool,
}

impl CleanupRegistry {
    /// Create an empty registry with the default configuration
    pub fn new(context: Arc<dyn TestContext>) -> Self {
        Self::with_config(context, CleanupConfig::default())
    }

    pub fn with_config(context: Arc<dyn TestContext>, config: CleanupConfig) -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
            context,
            config,
            draining: AtomicBool::new(false),
            installed: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &CleanupConfig {
        &self.config
    }

    /// Subscribe this registry's drain to the lifecycle hook
    ///
    /// Returns `false` if the registry was already installed; the hook is then
    /// left untouched.
    pub fn install(self: &Arc<Self>, hook: &dyn LifecycleHook) -> bool {
        if self.installed.swap(true, Ordering::AcqRel) {
            warn!("Cleanup registry already installed, ignoring second subscription");
            return false;
        }

        let registry = Arc::clone(self);
        hook.after_each(Arc::new(move || {
            let registry = Arc::clone(&registry);
            async move { registry.drain().await.map(|_| ()) }.boxed()
        }));
        debug!("Cleanup registry subscribed to after-each hook");
        true
    }

    /// Queue `action` to run after the current test
    ///
    /// Fails with a usage error, leaving the registry untouched, when no test
    /// is running.
    pub fn register(&self, action: CleanupAction) -> CleanupResult<()> {
        let Some(test) = self.context.current_test() else {
            debug!(label = action.label(), "Rejected cleanup registration outside a test");
            return Err(CleanupError::not_in_test());
        };

        debug!(test = %test, label = action.label(), "Registered cleanup action");
        self.pending.lock().push(action);
        Ok(())
    }

    /// Run every pending action in reverse registration order
    ///
    /// The pending list is snapshotted first. On success the registry is
    /// emptied. The first failing action stops the pass; under
    /// [`ResiduePolicy::Retain`] the pending actions stay queued and run again
    /// on the next drain.
    pub async fn drain(&self) -> CleanupResult<DrainReport> {
        if self.draining.swap(true, Ordering::AcqRel) {
            return Err(CleanupError::DrainInProgress);
        }
        let _draining = DrainingGuard(&self.draining);

        let snapshot: Vec<CleanupAction> = self.pending.lock().clone();
        if !snapshot.is_empty() {
            info!("Draining {} cleanup action(s)", snapshot.len());
        }

        for (position, action) in snapshot.iter().rev().enumerate() {
            debug!(label = action.label(), position, "Running cleanup action");
            if let Err(err) = self.run_action(action, position).await {
                warn!("Cleanup pass aborted: {}", err);
                self.apply_residue_policy();
                return Err(err);
            }
        }

        self.pending.lock().clear();
        Ok(DrainReport {
            executed: snapshot.len(),
        })
    }

    async fn run_action(&self, action: &CleanupAction, position: usize) -> CleanupResult<()> {
        let result = if self.config.catch_panics {
            match AssertUnwindSafe(action.run()).catch_unwind().await {
                Ok(result) => result,
                Err(payload) => {
                    return Err(CleanupError::action_panic(
                        action.label(),
                        position,
                        &panic_message(payload.as_ref()),
                    ));
                }
            }
        } else {
            action.run().await
        };

        result.map_err(|e| CleanupError::action_failure(action.label(), position, e))
    }

    fn apply_residue_policy(&self) {
        match self.config.residue_policy {
            ResiduePolicy::Retain => {
                let residue = self.pending.lock().len();
                if residue > 0 {
                    warn!("{} cleanup action(s) retained for the next drain", residue);
                }
            }
            ResiduePolicy::Clear => self.pending.lock().clear(),
        }
    }

    /// Number of pending actions
    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Labels of pending actions in registration order
    pub fn pending_labels(&self) -> Vec<String> {
        self.pending
            .lock()
            .iter()
            .map(|action| action.label().to_string())
            .collect()
    }
}

impl fmt::Debug for CleanupRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CleanupRegistry")
            .field("pending", &self.pending_len())
            .field("config", &self.config)
            .field("draining", &self.draining.load(Ordering::Acquire))
            .finish()
    }
}

/// Clears the draining flag when a pass ends, including by unwinding
struct DrainingGuard<'a>(&'a AtomicBool);

impl Drop for DrainingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
