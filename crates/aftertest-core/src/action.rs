//! Cleanup actions
//!
//! A cleanup action is a zero-argument unit of teardown work. It either finishes
//! synchronously or returns a future that completes or fails later. Actions are
//! stored as shared callables, so cloning one and registering both copies runs
//! the same work twice.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};

/// Shared callable behind every cleanup action
pub type ActionFn = dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync;

const DEFAULT_LABEL: &str = "cleanup";

/// Return values a cleanup callback may produce
///
/// Test bodies run by the harness use the same conversion, so a body and a
/// cleanup action accept the same return types.
pub trait IntoActionResult {
    fn into_action_result(self) -> anyhow::Result<()>;
}

impl IntoActionResult for () {
    fn into_action_result(self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl<E> IntoActionResult for Result<(), E>
where
    E: Into<anyhow::Error>,
{
    fn into_action_result(self) -> anyhow::Result<()> {
        self.map_err(Into::into)
    }
}

/// A resource that knows how to tear itself down
#[async_trait]
pub trait Teardown: Send + Sync {
    async fn teardown(&self) -> anyhow::Result<()>;
}

/// Deferred teardown work registered by a test
pub struct CleanupAction {
    callable: Arc<ActionFn>,
    label: String,
}

impl CleanupAction {
    /// Create an asynchronous action
    ///
    /// The closure is called once per execution; the returned future is
    /// awaited to completion before the next action starts.
    pub fn new<F, Fut, R>(callback: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoActionResult + 'static,
    {
        Self {
            callable: Arc::new(move || {
                callback()
                    .map(IntoActionResult::into_action_result)
                    .boxed()
            }),
            label: DEFAULT_LABEL.to_string(),
        }
    }

    /// Create a synchronous action
    ///
    /// The closure runs when the drain polls the action, not when the action
    /// is built.
    pub fn sync<F, R>(callback: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: IntoActionResult + 'static,
    {
        let callback = Arc::new(callback);
        Self {
            callable: Arc::new(move || {
                let callback = Arc::clone(&callback);
                async move { callback().into_action_result() }.boxed()
            }),
            label: DEFAULT_LABEL.to_string(),
        }
    }

    /// Create an action that tears down a shared resource
    pub fn from_teardown<T>(resource: Arc<T>) -> Self
    where
        T: Teardown + 'static,
    {
        let label = short_type_name::<T>().to_string();
        Self::new(move || {
            let resource = Arc::clone(&resource);
            async move { resource.teardown().await }
        })
        .with_label(label)
    }

    /// Set the label used in logs and failure reports
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether both actions share the same underlying callable
    pub fn ptr_eq(&self, other: &CleanupAction) -> bool {
        Arc::ptr_eq(&self.callable, &other.callable)
    }

    /// Build the future for one execution of this action
    ///
    /// The callable is invoked inside the returned future, so a panic raised
    /// while building the inner future surfaces when it is polled.
    pub fn run(&self) -> BoxFuture<'static, anyhow::Result<()>> {
        let callable = Arc::clone(&self.callable);
        async move { callable().await }.boxed()
    }
}

impl Clone for CleanupAction {
    fn clone(&self) -> Self {
        Self {
            callable: Arc::clone(&self.callable),
            label: self.label.clone(),
        }
    }
}

impl fmt::Debug for CleanupAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CleanupAction")
            .field("label", &self.label)
            .finish()
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_sync_action_unit_result() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let action = CleanupAction::sync(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(action.run().await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_sync_action_is_lazy() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let action = CleanupAction::sync(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let pending = action.run();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        pending.await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_sync_action_error() {
        let action = CleanupAction::sync(|| Err::<(), _>(anyhow::anyhow!("disk busy")));
        let err = action.run().await.unwrap_err();
        assert_eq!(err.to_string(), "disk busy");
    }

    #[tokio::test]
    async fn test_sync_action_std_error() {
        let action = CleanupAction::sync(|| {
            Err::<(), _>(std::io::Error::new(std::io::ErrorKind::Other, "io"))
        });
        assert!(action.run().await.is_err());
    }

    #[tokio::test]
    async fn test_async_action() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let action = CleanupAction::new(move || {
            let counter = Arc::clone(&counter);
            async move {
                tokio::task::yield_now().await;
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, anyhow::Error>(())
            }
        });

        action.run().await.unwrap();
        action.run().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    struct Connection {
        closed: AtomicUsize,
    }

    #[async_trait]
    impl Teardown for Connection {
        async fn teardown(&self) -> anyhow::Result<()> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_from_teardown() {
        let conn = Arc::new(Connection {
            closed: AtomicUsize::new(0),
        });
        let action = CleanupAction::from_teardown(Arc::clone(&conn));

        assert_eq!(action.label(), "Connection");
        action.run().await.unwrap();
        assert_eq!(conn.closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clone_shares_callable() {
        let action = CleanupAction::sync(|| ()).with_label("noop");
        let cloned = action.clone();
        let other = CleanupAction::sync(|| ());

        assert!(action.ptr_eq(&cloned));
        assert!(!action.ptr_eq(&other));
        assert_eq!(cloned.label(), "noop");
        assert_eq!(other.label(), DEFAULT_LABEL);
    }

    #[test]
    fn test_debug_shows_label() {
        let action = CleanupAction::sync(|| ()).with_label("drop table");
        assert_eq!(
            format!("{:?}", action),
            "CleanupAction { label: \"drop table\" }"
        );
    }
}
