//! Assertion helpers.
//!
//! Each helper comes in two flavours: `require_*` stops the test on failure (like [`Tester::fatal`]), `assert_*`
//! marks it failed and lets it continue (like [`Tester::error`]). On failure the error and its cause chain are logged
//! as pretty-printed JSON.
//!
//! ```rust
//! use suitekit::{assert_no_error, require_no_error, MemoryReporter, Tester};
//!
//! let mut t = Tester::with_reporter("parse", MemoryReporter::new());
//! let port: u16 = require_no_error(&mut t, "8080".parse::<u16>());
//! assert_eq!(port, 8080);
//!
//! assert_eq!(assert_no_error(&mut t, "http".parse::<u16>()), None);
//! assert!(t.failed());
//! ```

use std::error::Error as StdError;

use crate::error::ErrorSummary;
use crate::panic::{Caught, isolate};
use crate::tester::Tester;

/// Log the structured rendering of `err` on `t`.
pub(crate) fn log_error(t: &mut Tester, err: &(dyn StdError + 'static)) {
    t.log(ErrorSummary::from_error(err).render());
}

/// Return the `Ok` value, or log the error and stop the test.
pub fn require_no_error<T, E>(t: &mut Tester, result: Result<T, E>) -> T
where
    E: StdError + 'static,
{
    result.unwrap_or_else(|err| {
        log_error(t, &err);
        t.fail_now()
    })
}

/// Return the `Ok` value, or log the error, mark the test failed and return `None`.
pub fn assert_no_error<T, E>(t: &mut Tester, result: Result<T, E>) -> Option<T>
where
    E: StdError + 'static,
{
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            log_error(t, &err);
            t.fail();
            None
        }
    }
}

/// Run `f`. If it panics, log the panic and stop the test.
pub fn require_not_panics<R>(t: &mut Tester, f: impl FnOnce() -> R) -> R {
    match isolate(f) {
        Ok(value) => value,
        Err(Caught::Stopped) => t.fail_now(),
        Err(Caught::Panicked(err)) => {
            log_error(t, &err);
            t.fail_now()
        }
    }
}

/// Run `f`. If it panics, log the panic, mark the test failed and return `None`.
pub fn assert_not_panics<R>(t: &mut Tester, f: impl FnOnce() -> R) -> Option<R> {
    match isolate(f) {
        Ok(value) => Some(value),
        Err(Caught::Stopped) => {
            t.fail();
            None
        }
        Err(Caught::Panicked(err)) => {
            log_error(t, &err);
            t.fail();
            None
        }
    }
}
