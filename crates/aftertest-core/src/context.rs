//! Test context oracle
//!
//! The registry asks the oracle whether a test is executing before it accepts
//! a registration. Any reported name counts as "a test is running".

use parking_lot::RwLock;

/// Reports the test that is currently executing, if any
#[cfg_attr(test, mockall::automock)]
pub trait TestContext: Send + Sync {
    /// Name of the running test, or `None` outside of a test
    fn current_test(&self) -> Option<String>;
}

/// Settable current-test slot driven by a test runner
#[derive(Debug, Default)]
pub struct CurrentTest {
    name: RwLock<Option<String>>,
}

impl CurrentTest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `name` as the running test, returning the previous one
    pub fn enter(&self, name: impl Into<String>) -> Option<String> {
        self.name.write().replace(name.into())
    }

    /// Mark that no test is running, returning the test that was
    pub fn exit(&self) -> Option<String> {
        self.name.write().take()
    }
}

impl TestContext for CurrentTest {
    fn current_test(&self) -> Option<String> {
        self.name.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_outside_test() {
        let ctx = CurrentTest::new();
        assert_eq!(ctx.current_test(), None);
    }

    #[test]
    fn test_enter_and_exit() {
        let ctx = CurrentTest::new();

        assert_eq!(ctx.enter("opens_socket"), None);
        assert_eq!(ctx.current_test().as_deref(), Some("opens_socket"));

        assert_eq!(ctx.enter("closes_socket").as_deref(), Some("opens_socket"));
        assert_eq!(ctx.exit().as_deref(), Some("closes_socket"));
        assert_eq!(ctx.current_test(), None);
        assert_eq!(ctx.exit(), None);
    }

    #[test]
    fn test_usable_as_trait_object() {
        let ctx: Box<dyn TestContext> = Box::new(CurrentTest::new());
        assert!(ctx.current_test().is_none());
    }
}
