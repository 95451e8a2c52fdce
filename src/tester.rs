//! Test-reporting handle.
//!
//! A [`Tester`] is handed to every hook and test method. It records failures and log lines for one (sub-)test and
//! forwards them to the session's [`TestReporter`]. Sub-tests created with [`Tester::run`] share the session, so one
//! reporter sees the whole tree.
//!
//! `fail_now` stops the current test by unwinding with a private sentinel. [`Tester::run`] and the suite runner's
//! isolation boundaries recognise the sentinel and treat it as "already failed", not as a panic.

use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::time::Instant;

use crate::reporter::{ConsoleReporter, TestReporter, TestResult, TestSummary};

/// Unwind payload used by [`Tester::fail_now`].
#[derive(Debug)]
pub(crate) struct StopTest;

struct Session {
    reporter: Box<dyn TestReporter>,
    passed: usize,
    failed: usize,
}

/// Handle for reporting the outcome of one test.
pub struct Tester {
    name: String,
    failed: bool,
    /// Failed through `fail` on this tester, as opposed to through a failing sub-test.
    failed_itself: bool,
    logs: Vec<String>,
    started: Instant,
    session: Rc<RefCell<Session>>,
}

impl Tester {
    /// Create a root tester reporting to the console.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_reporter(name, ConsoleReporter::default())
    }

    /// Create a root tester reporting to `reporter`.
    pub fn with_reporter(name: impl Into<String>, reporter: impl TestReporter + 'static) -> Self {
        Self {
            name: name.into(),
            failed: false,
            failed_itself: false,
            logs: Vec::new(),
            started: Instant::now(),
            session: Rc::new(RefCell::new(Session {
                reporter: Box::new(reporter),
                passed: 0,
                failed: 0,
            })),
        }
    }

    /// Full name, `parent/child` for sub-tests.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    /// Lines logged on this tester so far.
    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    /// Mark the test failed and keep going.
    pub fn fail(&mut self) {
        self.failed = true;
        self.failed_itself = true;
    }

    /// Mark the test failed and stop it immediately.
    pub fn fail_now(&mut self) -> ! {
        self.fail();
        panic::resume_unwind(Box::new(StopTest))
    }

    pub fn log(&mut self, msg: impl fmt::Display) {
        let line = msg.to_string();
        tracing::trace!(test = %self.name, "{line}");
        self.session.borrow_mut().reporter.on_log(&self.name, &line);
        self.logs.push(line);
    }

    /// Log `msg` and mark the test failed.
    pub fn error(&mut self, msg: impl fmt::Display) {
        self.log(msg);
        self.fail();
    }

    /// Log `msg`, mark the test failed and stop it.
    pub fn fatal(&mut self, msg: impl fmt::Display) -> ! {
        self.log(msg);
        self.fail_now()
    }

    /// Run `f` as a sub-test named `name` and report its outcome.
    ///
    /// Returns whether the sub-test passed. A failing sub-test marks this tester failed too. `fail_now` inside `f`
    /// ends only the sub-test; any other panic is re-raised after the sub-test has been reported as failed.
    pub fn run(&mut self, name: &str, f: impl FnOnce(&mut Tester)) -> bool {
        let mut child = Tester {
            name: format!("{}/{}", self.name, name),
            failed: false,
            failed_itself: false,
            logs: Vec::new(),
            started: Instant::now(),
            session: self.session.clone(),
        };
        self.session.borrow_mut().reporter.on_test_start(&child.name);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| f(&mut child)));
        let escaped = match outcome {
            Ok(()) => None,
            Err(payload) if payload.is::<StopTest>() => None,
            Err(payload) => {
                child.fail();
                Some(payload)
            }
        };

        let passed = child.complete();
        if !passed {
            self.failed = true;
        }
        if let Some(payload) = escaped {
            panic::resume_unwind(payload);
        }
        passed
    }

    fn result(&self) -> TestResult {
        let elapsed = self.started.elapsed();
        if self.failed {
            TestResult::Failed(elapsed, self.logs.join("\n"))
        } else {
            TestResult::Passed(elapsed)
        }
    }

    fn complete(&mut self) -> bool {
        let result = self.result();
        let mut session = self.session.borrow_mut();
        if result.is_passed() {
            session.passed += 1;
        } else {
            session.failed += 1;
        }
        session.reporter.on_test_complete(&self.name, &result);
        result.is_passed()
    }

    /// Finish the session: report this tester's own outcome and the run summary.
    pub fn finish(self) -> TestSummary {
        let result = self.result();
        let mut session = self.session.borrow_mut();
        let summary = TestSummary {
            total: session.passed + session.failed,
            passed: session.passed,
            failed: session.failed,
            root_failed: self.failed_itself,
            duration: result.duration(),
        };
        session.reporter.on_test_complete(&self.name, &result);
        session.reporter.on_run_complete(&summary);
        summary
    }
}

impl fmt::Debug for Tester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tester")
            .field("name", &self.name)
            .field("failed", &self.failed)
            .field("logs", &self.logs.len())
            .finish()
    }
}
