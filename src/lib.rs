#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
//! Suite-based test orchestration.
//!
//! A suite is a struct whose fields hold reusable *helpers* and whose methods are *tests*. suitekit discovers both,
//! allocates absent helpers, runs the four lifecycle hooks (`before_suite`, `before_test`, `after_test`,
//! `after_suite`) around the tests and threads a [`Context`] through all of them.
//!
//! ```rust
//! use suitekit::{BeforeTest, Context, DefaultConfig, Helper, Key, Suite, SuiteMembers, Tester, suite_tests};
//!
//! const USER: Key<&str> = Key::new("user");
//!
//! #[derive(Default, Helper)]
//! #[helper(before_test)]
//! struct Login;
//!
//! impl BeforeTest for Login {
//!     fn before_test(&mut self, ctx: Context, _t: &mut Tester) -> Context {
//!         ctx.with_value(&USER, "alice")
//!     }
//! }
//!
//! #[derive(Default, SuiteMembers)]
//! struct AccountSuite {
//!     config: DefaultConfig,
//!     login: Option<Box<Login>>,
//! }
//!
//! impl Suite for AccountSuite {}
//!
//! #[suite_tests]
//! impl AccountSuite {
//!     fn test_logged_in(&mut self, ctx: &Context, t: &mut Tester) {
//!         if ctx.value(&USER) != Some(&"alice") {
//!             t.error("not logged in");
//!         }
//!     }
//! }
//!
//! let summary = suitekit::run("accounts", &mut AccountSuite::default());
//! assert_eq!(summary.passed, 1);
//! ```
//!
//! ## Discovery rules
//!
//! - Helper fields are `Option<Box<H>>` with `H: Helper + Default`. Empty slots are filled with `H::default()`.
//! - Test methods are named `test*`, take `&self` or `&mut self`, a `Context` (by value or reference) and
//!   `&mut Tester`, and return `()`.
//! - Other fields and methods are reported once per run as ignored, unless the suite's [`Config`] says otherwise.
//!
//! ## Panic Policy
//!
//! - **Library code**: errors are returned as `Result` or recorded on the [`Tester`]. `#![deny(clippy::unwrap_used)]`
//!   is enforced crate-wide.
//! - **Hooks and tests**: panics are caught at the per-test and per-suite boundaries and reported as failures.
//! - **Intentional panics**: [`run`] panics when a suite fails, so that a `#[test]` wrapping it fails.
//!   [`Tester::fail_now`] unwinds with a private payload that the boundaries recognise.
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

extern crate self as suitekit;

pub mod assert;
pub mod capture;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod lifecycle;
pub mod members;
pub mod panic;
pub mod registry;
pub mod reporter;
pub mod runner;
pub mod tester;

pub use assert::{assert_no_error, assert_not_panics, require_no_error, require_not_panics};
pub use capture::Capture;
pub use config::{Config, DefaultConfig, LogFn, Suite};
pub use context::{CancelHandle, Context, Key};
pub use error::{CaptureError, ErrorSummary, Stream, SuiteError};
pub use lifecycle::{AfterSuite, AfterTest, BeforeSuite, BeforeTest, Capabilities, Helper};
pub use members::{
    Classification, FieldMember, HelperSlot, Member, MethodKind, SuiteMembers, SuiteMethod, SuiteShape, SuiteTests,
};
pub use panic::PanicError;
pub use registry::{HelperEntry, HelperRegistry};
pub use reporter::{ConsoleReporter, MemoryReporter, ReportEvent, TestReporter, TestResult, TestSummary};
pub use runner::{run, run_suite};
pub use tester::Tester;

pub use suitekit_derive::{Helper, SuiteMembers, suite_tests};

#[doc(hidden)]
pub use members::__private;
