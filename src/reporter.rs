//! Test result reporting.
//!
//! ## TestReporter Trait
//!
//! [`Tester`](crate::Tester) sends every sub-test start, log line and completion to a `TestReporter`. This keeps
//! output formatting separate from execution: the console reporter prints pytest-style lines, the memory reporter
//! records events so callers can inspect a run after the fact.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Trait for reporting test execution results.
///
/// Implement this trait to customize test output format (JSON, TAP, etc.)
pub trait TestReporter {
    /// Called when a (sub-)test begins
    fn on_test_start(&mut self, name: &str);

    /// Called for every line a test logs
    fn on_log(&mut self, _name: &str, _line: &str) {}

    /// Called when a (sub-)test completes
    fn on_test_complete(&mut self, name: &str, result: &TestResult);

    /// Called once when the root tester finishes
    fn on_run_complete(&mut self, summary: &TestSummary);
}

/// Result of running a single test
#[derive(Debug, Clone, PartialEq)]
pub enum TestResult {
    Passed(Duration),
    /// Duration and the test's log output
    Failed(Duration, String),
}

impl TestResult {
    pub fn is_passed(&self) -> bool {
        matches!(self, TestResult::Passed(_))
    }

    pub fn duration(&self) -> Duration {
        match self {
            TestResult::Passed(d) | TestResult::Failed(d, _) => *d,
        }
    }
}

/// Summary of test run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Whether the root tester itself failed (a suite-level or setup failure)
    pub root_failed: bool,
    pub duration: Duration,
}

impl TestSummary {
    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.root_failed
    }
}

/// Default console reporter (pytest-style)
#[derive(Default)]
pub struct ConsoleReporter {
    pub verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl TestReporter for ConsoleReporter {
    fn on_test_start(&mut self, name: &str) {
        if self.verbose {
            eprintln!("{} ... ", name);
        }
    }

    fn on_log(&mut self, name: &str, line: &str) {
        if self.verbose {
            eprintln!("    {}: {}", name, line);
        }
    }

    fn on_test_complete(&mut self, name: &str, result: &TestResult) {
        let status = match result {
            TestResult::Passed(d) => {
                if self.verbose {
                    format!("\x1b[32mPASSED\x1b[0m ({:.0}ms)", d.as_millis())
                } else {
                    "\x1b[32mPASSED\x1b[0m".to_string()
                }
            }
            TestResult::Failed(d, _) => {
                if self.verbose {
                    format!("\x1b[31mFAILED\x1b[0m ({:.0}ms)", d.as_millis())
                } else {
                    "\x1b[31mFAILED\x1b[0m".to_string()
                }
            }
        };
        eprintln!("{} {}", name, status);

        // Print failure details
        if let TestResult::Failed(_, output) = result {
            if !output.is_empty() {
                eprintln!("\x1b[31m{}\x1b[0m", name);
                eprintln!("{}", output);
            }
        }
    }

    fn on_run_complete(&mut self, summary: &TestSummary) {
        let mut parts = Vec::new();
        if summary.passed > 0 {
            parts.push(format!("\x1b[32m{} passed\x1b[0m", summary.passed));
        }
        if summary.failed > 0 {
            parts.push(format!("\x1b[31m{} failed\x1b[0m", summary.failed));
        }
        if summary.root_failed {
            parts.push("\x1b[31msuite failed\x1b[0m".to_string());
        }
        if parts.is_empty() {
            parts.push("no tests ran".to_string());
        }

        eprintln!(
            "====== {} in {:.2}s ======",
            parts.join(", "),
            summary.duration.as_secs_f64()
        );
    }
}

/// Event recorded by [`MemoryReporter`]
#[derive(Debug, Clone, PartialEq)]
pub enum ReportEvent {
    Started(String),
    Log { test: String, line: String },
    Completed { test: String, result: TestResult },
    RunComplete(TestSummary),
}

/// Reporter that records events in memory.
///
/// Clones share the same event log, so keep one clone to inspect a run after handing another to a tester.
#[derive(Debug, Clone, Default)]
pub struct MemoryReporter {
    events: Rc<RefCell<Vec<ReportEvent>>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ReportEvent> {
        self.events.borrow().clone()
    }

    /// Completed tests in completion order
    pub fn results(&self) -> Vec<(String, TestResult)> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                ReportEvent::Completed { test, result } => Some((test.clone(), result.clone())),
                _ => None,
            })
            .collect()
    }

    /// Log lines emitted by `test` (exact name match)
    pub fn logs_for(&self, test: &str) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                ReportEvent::Log { test: t, line } if t == test => Some(line.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn result_for(&self, test: &str) -> Option<TestResult> {
        self.results()
            .into_iter()
            .find_map(|(name, result)| (name == test).then_some(result))
    }
}

impl TestReporter for MemoryReporter {
    fn on_test_start(&mut self, name: &str) {
        self.events.borrow_mut().push(ReportEvent::Started(name.to_string()));
    }

    fn on_log(&mut self, name: &str, line: &str) {
        self.events.borrow_mut().push(ReportEvent::Log {
            test: name.to_string(),
            line: line.to_string(),
        });
    }

    fn on_test_complete(&mut self, name: &str, result: &TestResult) {
        self.events.borrow_mut().push(ReportEvent::Completed {
            test: name.to_string(),
            result: result.clone(),
        });
    }

    fn on_run_complete(&mut self, summary: &TestSummary) {
        self.events.borrow_mut().push(ReportEvent::RunComplete(summary.clone()));
    }
}
