//! Lifecycle dispatch.
//!
//! Each pass walks the registered helpers in field order and calls one hook on every helper that implements it.
//! Before-hooks thread the context through `&mut Context`: every helper sees the context returned by the previous
//! one, and if a hook panics the caller still holds the context as extended so far.

use std::fmt;

use tracing::debug;

use crate::context::Context;
use crate::lifecycle::Capabilities;
use crate::members::SuiteMembers;
use crate::registry::HelperRegistry;
use crate::tester::Tester;

/// One of the four lifecycle hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    BeforeSuite,
    AfterSuite,
    BeforeTest,
    AfterTest,
}

impl Hook {
    pub fn capability(self) -> Capabilities {
        match self {
            Hook::BeforeSuite => Capabilities::BEFORE_SUITE,
            Hook::AfterSuite => Capabilities::AFTER_SUITE,
            Hook::BeforeTest => Capabilities::BEFORE_TEST,
            Hook::AfterTest => Capabilities::AFTER_TEST,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Hook::BeforeSuite => "before_suite",
            Hook::AfterSuite => "after_suite",
            Hook::BeforeTest => "before_test",
            Hook::AfterTest => "after_test",
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Calls lifecycle hooks on the helpers of one registry.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'r> {
    registry: &'r HelperRegistry,
}

impl<'r> Dispatcher<'r> {
    pub fn new(registry: &'r HelperRegistry) -> Self {
        Self { registry }
    }

    /// Number of registered helpers implementing `hook`.
    pub fn count(&self, hook: Hook) -> usize {
        self.registry
            .entries()
            .iter()
            .filter(|entry| entry.capabilities.contains(hook.capability()))
            .count()
    }

    pub fn before_suite<S: SuiteMembers>(&self, suite: &mut S, ctx: &mut Context, t: &mut Tester) {
        for (entry, helper) in self.registry.resolve(suite) {
            if let Some(hook) = helper.as_before_suite() {
                debug!(helper = entry.name, hook = %Hook::BeforeSuite, "dispatch");
                *ctx = hook.before_suite(ctx.clone(), t);
            }
        }
    }

    pub fn after_suite<S: SuiteMembers>(&self, suite: &mut S, ctx: &Context, t: &mut Tester) {
        for (entry, helper) in self.registry.resolve(suite) {
            if let Some(hook) = helper.as_after_suite() {
                debug!(helper = entry.name, hook = %Hook::AfterSuite, "dispatch");
                hook.after_suite(ctx, t);
            }
        }
    }

    pub fn before_test<S: SuiteMembers>(&self, suite: &mut S, ctx: &mut Context, t: &mut Tester) {
        for (entry, helper) in self.registry.resolve(suite) {
            if let Some(hook) = helper.as_before_test() {
                debug!(helper = entry.name, hook = %Hook::BeforeTest, "dispatch");
                *ctx = hook.before_test(ctx.clone(), t);
            }
        }
    }

    pub fn after_test<S: SuiteMembers>(&self, suite: &mut S, ctx: &Context, t: &mut Tester) {
        for (entry, helper) in self.registry.resolve(suite) {
            if let Some(hook) = helper.as_after_test() {
                debug!(helper = entry.name, hook = %Hook::AfterTest, "dispatch");
                hook.after_test(ctx, t);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Key;
    use crate::lifecycle::{AfterTest, BeforeSuite, BeforeTest, Helper};
    use crate::members::__private::{HelperKind as _, Probe};
    use crate::members::{Classification, FieldMember, SuiteMethod, SuiteShape, SuiteTests};
    use crate::reporter::MemoryReporter;

    const TRAIL: Key<String> = Key::new("trail");

    /// Appends its label to the `trail` binding.
    #[derive(Default)]
    struct Stamp {
        label: &'static str,
        seen: Vec<String>,
    }

    impl Stamp {
        fn extend(&self, ctx: Context) -> Context {
            let trail = ctx.value(&TRAIL).cloned().unwrap_or_default();
            ctx.with_value(&TRAIL, format!("{trail}{}", self.label))
        }
    }

    impl BeforeSuite for Stamp {
        fn before_suite(&mut self, ctx: Context, _t: &mut Tester) -> Context {
            self.extend(ctx)
        }
    }

    impl BeforeTest for Stamp {
        fn before_test(&mut self, ctx: Context, _t: &mut Tester) -> Context {
            self.extend(ctx)
        }
    }

    impl AfterTest for Stamp {
        fn after_test(&mut self, ctx: &Context, _t: &mut Tester) {
            self.seen.push(ctx.value(&TRAIL).cloned().unwrap_or_default());
        }
    }

    impl Helper for Stamp {
        fn capabilities() -> Capabilities {
            Capabilities::BEFORE_SUITE | Capabilities::BEFORE_TEST | Capabilities::AFTER_TEST
        }

        fn as_before_suite(&mut self) -> Option<&mut dyn BeforeSuite> {
            Some(self)
        }

        fn as_before_test(&mut self) -> Option<&mut dyn BeforeTest> {
            Some(self)
        }

        fn as_after_test(&mut self) -> Option<&mut dyn AfterTest> {
            Some(self)
        }
    }

    struct Ordered {
        a: Option<Box<Stamp>>,
        b: Option<Box<Stamp>>,
    }

    impl SuiteMembers for Ordered {
        fn shape() -> SuiteShape {
            SuiteShape::Record
        }

        fn fields(&mut self) -> Vec<FieldMember<'_>> {
            vec![
                FieldMember::new("a", Probe::new(&mut self.a).member()),
                FieldMember::new("b", Probe::new(&mut self.b).member()),
            ]
        }
    }

    impl SuiteTests for Ordered {
        fn methods() -> Vec<SuiteMethod<Self>> {
            Vec::new()
        }
    }

    fn ordered() -> (Ordered, HelperRegistry) {
        let stamp = |label| {
            Some(Box::new(Stamp {
                label,
                seen: Vec::new(),
            }))
        };
        let mut suite = Ordered {
            a: stamp("a"),
            b: stamp("b"),
        };
        let classified = Classification::of(&mut suite).expect("struct suite classifies");
        let registry = HelperRegistry::build(&mut suite, &classified.helpers);
        (suite, registry)
    }

    #[test]
    fn test_before_hooks_chain_in_field_order() {
        let (mut suite, registry) = ordered();
        let dispatcher = Dispatcher::new(&registry);
        let mut t = Tester::with_reporter("t", MemoryReporter::new());

        let mut base = Context::background();
        dispatcher.before_suite(&mut suite, &mut base, &mut t);
        assert_eq!(base.value(&TRAIL).map(String::as_str), Some("ab"));

        let mut per_test = base.clone();
        dispatcher.before_test(&mut suite, &mut per_test, &mut t);
        dispatcher.after_test(&mut suite, &per_test, &mut t);

        assert_eq!(base.value(&TRAIL).map(String::as_str), Some("ab"));
        let seen = |s: &Option<Box<Stamp>>| s.as_ref().map(|h| h.seen.clone()).unwrap_or_default();
        assert_eq!(seen(&suite.a), vec!["abab".to_string()]);
        assert_eq!(seen(&suite.b), vec!["abab".to_string()]);
    }

    #[test]
    fn test_missing_capability_is_skipped() {
        let (mut suite, registry) = ordered();
        let dispatcher = Dispatcher::new(&registry);
        let mut t = Tester::with_reporter("t", MemoryReporter::new());

        // Stamp has no AfterSuite hook.
        dispatcher.after_suite(&mut suite, &Context::background(), &mut t);
        assert_eq!(dispatcher.count(Hook::AfterSuite), 0);
        assert_eq!(dispatcher.count(Hook::BeforeTest), 2);
        assert!(!t.failed());
    }

    #[test]
    fn test_hook_names() {
        assert_eq!(Hook::BeforeSuite.to_string(), "before_suite");
        assert_eq!(Hook::AfterTest.capability(), Capabilities::AFTER_TEST);
    }
}
