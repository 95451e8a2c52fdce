//! Suite runner.
//!
//! ## Execution Flow
//!
//! 1. Ask the suite for its [`Config`](crate::Config) (exactly once) and classify its members. A suite that is not
//!    a struct is a setup failure: it is reported and nothing else runs.
//! 2. Allocate helpers, emit the ignored-member warnings unless they are suppressed and run `before_suite` on every
//!    helper, building the suite's base context. A panic anywhere in this step skips the tests.
//! 3. Run every test as a sub-test: `before_test` chain, the test body, then `after_test` regardless of what
//!    happened before it.
//! 4. Run `after_suite` on every allocated helper, whatever happened in steps 2 and 3.
//!
//! Panics are caught at two boundaries. One around suite-scope code (`Suite::suite`, helper allocation, the warning
//! sink and the suite-level hooks), which fails the whole run; one around each test, which fails only that sub-test.

use tracing::{debug, warn};

use crate::assert::log_error;
use crate::config::{Config, Suite};
use crate::context::Context;
use crate::dispatch::{Dispatcher, Hook};
use crate::members::{Classification, SuiteMembers, SuiteTests, TestMethod};
use crate::panic::{Caught, isolate};
use crate::registry::HelperRegistry;
use crate::reporter::TestSummary;
use crate::tester::Tester;

const WARNING_PREFIX: &str = "suitekit";

/// Run `suite` under `t`.
///
/// Failures are recorded on `t` (and its sub-tests); this function itself never panics because of them.
#[tracing::instrument(skip_all, fields(suite = std::any::type_name::<S>(), tester = t.name()))]
pub fn run_suite<S>(t: &mut Tester, suite: &mut S)
where
    S: Suite + SuiteMembers + SuiteTests,
{
    let mut config = match isolate(|| suite.suite()) {
        Ok(config) => config,
        Err(caught) => {
            report(t, caught, "suite");
            return;
        }
    };
    let classified = match Classification::of(suite) {
        Ok(classified) => classified,
        Err(err) => {
            warn!(%err, "suite setup failed");
            t.error(err.render());
            return;
        }
    };
    debug!(
        helpers = classified.helpers.len(),
        tests = classified.tests.len(),
        ignored_fields = classified.ignored_fields.len(),
        ignored_methods = classified.ignored_methods.len(),
        "classified suite"
    );

    let mut built = None;
    let mut base = Context::background();
    let setup = isolate(|| {
        let registry = built.insert(HelperRegistry::build(suite, &classified.helpers));
        if !config.skip_warnings {
            emit_warnings(t, &mut config, &classified);
        }
        Dispatcher::new(registry).before_suite(suite, &mut base, t);
    });
    let ready = match setup {
        Ok(()) => true,
        Err(caught) => {
            report(t, caught, "suite setup");
            false
        }
    };

    // A helper's `Default` may have panicked half way through allocation.
    let registry = built.unwrap_or_else(|| HelperRegistry::allocated(suite, &classified.helpers));
    let dispatcher = Dispatcher::new(&registry);

    if ready {
        for test in &classified.tests {
            run_test(t, suite, &dispatcher, &base, test);
        }
    } else {
        debug!(skipped = classified.tests.len(), "suite setup failed, skipping tests");
    }

    if let Err(caught) = isolate(|| dispatcher.after_suite(suite, &base, t)) {
        report(t, caught, Hook::AfterSuite.as_str());
    }
}

fn emit_warnings<S>(t: &mut Tester, config: &mut Config, classified: &Classification<S>) {
    for line in warnings(classified) {
        match config.logf.as_mut() {
            Some(logf) => logf(&line),
            None => t.log(line),
        }
    }
}

fn run_test<S: SuiteMembers>(
    t: &mut Tester,
    suite: &mut S,
    dispatcher: &Dispatcher<'_>,
    base: &Context,
    test: &TestMethod<S>,
) {
    t.run(test.name, |t| {
        debug!(test = test.name, "running test");
        let mut ctx = base.clone();

        let body = isolate(|| {
            dispatcher.before_test(suite, &mut ctx, t);
            (test.body)(suite, &ctx, t);
        });
        if let Err(caught) = body {
            report(t, caught, "test");
        }

        if let Err(caught) = isolate(|| dispatcher.after_test(suite, &ctx, t)) {
            report(t, caught, Hook::AfterTest.as_str());
        }
    });
}

/// Record a caught unwind on `t`.
fn report(t: &mut Tester, caught: Caught, phase: &'static str) {
    match caught {
        Caught::Stopped => debug!(test = t.name(), phase, "test stopped"),
        Caught::Panicked(err) => {
            warn!(test = t.name(), phase, %err, "caught panic");
            log_error(t, &err);
            t.fail();
        }
    }
}

/// Ignored-member warning lines for `classified`, empty when nothing was ignored.
pub fn warnings<S>(classified: &Classification<S>) -> Vec<String> {
    let mut lines = Vec::new();
    if !classified.ignored_fields.is_empty() {
        lines.push(format!(
            "{WARNING_PREFIX}: ignored suite fields not implementing helpers: [{}]",
            classified.ignored_fields.join(" ")
        ));
    }
    if !classified.ignored_methods.is_empty() {
        lines.push(format!(
            "{WARNING_PREFIX}: ignored suite methods not matching test signature: [{}]",
            classified.ignored_methods.join(" ")
        ));
    }
    lines
}

/// Run `suite` as a `#[test]`: report to the console and panic if anything failed.
///
/// ```rust,ignore
/// #[test]
/// fn storage() {
///     suitekit::run("storage", &mut StorageSuite::default());
/// }
/// ```
pub fn run<S>(name: &str, suite: &mut S) -> TestSummary
where
    S: Suite + SuiteMembers + SuiteTests,
{
    let mut t = Tester::new(name);
    run_suite(&mut t, suite);
    let summary = t.finish();
    if summary.has_failures() {
        panic!(
            "suite `{name}` failed: {} of {} tests failed{}",
            summary.failed,
            summary.total,
            if summary.root_failed { ", suite-level failure" } else { "" }
        );
    }
    summary
}
