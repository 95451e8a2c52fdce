//! Lifecycle hook traits.
//!
//! A helper opts into any subset of the four hooks by implementing the matching trait and exposing it through
//! [`Helper`]. `#[derive(Helper)]` writes the `Helper` impl from a `#[helper(..)]` list:
//!
//! ```rust
//! use suitekit::{BeforeTest, Context, Helper, Tester};
//!
//! #[derive(Default, Helper)]
//! #[helper(before_test)]
//! struct Counter {
//!     runs: u32,
//! }
//!
//! impl BeforeTest for Counter {
//!     fn before_test(&mut self, ctx: Context, _t: &mut Tester) -> Context {
//!         self.runs += 1;
//!         ctx
//!     }
//! }
//! ```

use bitflags::bitflags;

use crate::context::Context;
use crate::tester::Tester;

/// Runs once before any test. The returned context replaces the suite's base context.
pub trait BeforeSuite {
    fn before_suite(&mut self, ctx: Context, t: &mut Tester) -> Context;
}

/// Runs once after all tests, whatever their outcome.
pub trait AfterSuite {
    fn after_suite(&mut self, ctx: &Context, t: &mut Tester);
}

/// Runs before every test. The returned context is what the test (and later helpers) see.
pub trait BeforeTest {
    fn before_test(&mut self, ctx: Context, t: &mut Tester) -> Context;
}

/// Runs after every test, also when the test or a `BeforeTest` hook panicked.
pub trait AfterTest {
    fn after_test(&mut self, ctx: &Context, t: &mut Tester);
}

bitflags! {
    /// Set of lifecycle hooks a helper implements.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u8 {
        const BEFORE_SUITE = 1 << 0;
        const AFTER_SUITE = 1 << 1;
        const BEFORE_TEST = 1 << 2;
        const AFTER_TEST = 1 << 3;
    }
}

/// Capability query for a helper type.
///
/// `as_*` return `Some(self)` exactly for the hooks listed in `capabilities()`.
pub trait Helper {
    fn capabilities() -> Capabilities
    where
        Self: Sized;

    fn as_before_suite(&mut self) -> Option<&mut dyn BeforeSuite> {
        None
    }

    fn as_after_suite(&mut self) -> Option<&mut dyn AfterSuite> {
        None
    }

    fn as_before_test(&mut self) -> Option<&mut dyn BeforeTest> {
        None
    }

    fn as_after_test(&mut self) -> Option<&mut dyn AfterTest> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Both {
        suites: u32,
        tests: u32,
    }

    impl BeforeSuite for Both {
        fn before_suite(&mut self, ctx: Context, _t: &mut Tester) -> Context {
            self.suites += 1;
            ctx
        }
    }

    impl AfterTest for Both {
        fn after_test(&mut self, _ctx: &Context, _t: &mut Tester) {
            self.tests += 1;
        }
    }

    impl Helper for Both {
        fn capabilities() -> Capabilities {
            Capabilities::BEFORE_SUITE | Capabilities::AFTER_TEST
        }

        fn as_before_suite(&mut self) -> Option<&mut dyn BeforeSuite> {
            Some(self)
        }

        fn as_after_test(&mut self) -> Option<&mut dyn AfterTest> {
            Some(self)
        }
    }

    #[test]
    fn test_unlisted_hooks_default_to_none() {
        let mut helper = Both::default();
        assert!(helper.as_before_suite().is_some());
        assert!(helper.as_after_test().is_some());
        assert!(helper.as_after_suite().is_none());
        assert!(helper.as_before_test().is_none());
    }

    #[test]
    fn test_hooks_reach_the_helper() {
        let mut helper = Both::default();
        let mut t = Tester::with_reporter("hooks", crate::reporter::MemoryReporter::new());
        if let Some(hook) = helper.as_before_suite() {
            hook.before_suite(Context::background(), &mut t);
        }
        if let Some(hook) = helper.as_after_test() {
            hook.after_test(&Context::background(), &mut t);
        }
        assert_eq!((helper.suites, helper.tests), (1, 1));
    }

    #[derive(Default, suitekit_derive::Helper)]
    #[helper(before_test)]
    struct PartlyListed;

    impl BeforeTest for PartlyListed {
        fn before_test(&mut self, ctx: Context, _t: &mut Tester) -> Context {
            ctx
        }
    }

    impl AfterTest for PartlyListed {
        fn after_test(&mut self, _ctx: &Context, _t: &mut Tester) {}
    }

    #[test]
    fn test_derive_uses_only_the_listed_hooks() {
        assert_eq!(PartlyListed::capabilities(), Capabilities::BEFORE_TEST);
        let mut helper = PartlyListed;
        assert!(helper.as_before_test().is_some());
        assert!(helper.as_after_test().is_none());
    }

    #[test]
    fn test_capabilities_flags() {
        let caps = Both::capabilities();
        assert!(caps.contains(Capabilities::BEFORE_SUITE));
        assert!(!caps.contains(Capabilities::BEFORE_TEST));
        assert!(Capabilities::default().is_empty());
        assert_eq!(Capabilities::all().bits(), 0b1111);
    }
}
