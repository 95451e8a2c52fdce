//! Panic isolation.
//!
//! Hooks and test bodies run inside [`isolate`], which turns an unwinding panic into a [`PanicError`]. Unwinds started
//! by [`Tester::fail_now`](crate::Tester::fail_now) carry a sentinel payload and come back as [`Caught::Stopped`]: the
//! test already recorded its failure, so there is nothing more to report.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;

use crate::tester::StopTest;

/// A recovered panic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("panic: {message}")]
pub struct PanicError {
    message: String,
}

impl PanicError {
    /// Recover the message from a panic payload. `&str` and `String` payloads (what `panic!` produces) keep their
    /// text; anything else gets a placeholder.
    pub fn from_payload(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self { message }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// How an isolated call ended early.
#[derive(Debug)]
pub enum Caught {
    /// `fail_now` was called.
    Stopped,
    Panicked(PanicError),
}

/// Run `f`, catching any unwind.
pub fn isolate<R>(f: impl FnOnce() -> R) -> Result<R, Caught> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        if payload.is::<StopTest>() {
            Caught::Stopped
        } else {
            Caught::Panicked(PanicError::from_payload(payload.as_ref()))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::MemoryReporter;
    use crate::tester::Tester;

    #[test]
    fn test_str_payload() {
        let caught: Result<(), Caught> = isolate(|| panic!("boom"));
        match caught {
            Err(Caught::Panicked(err)) => {
                assert_eq!(err.message(), "boom");
                assert_eq!(err.to_string(), "panic: boom");
            }
            other => panic!("expected a panic, got {other:?}"),
        }
    }

    #[test]
    fn test_formatted_payload() {
        let n = 3;
        let caught: Result<(), Caught> = isolate(|| panic!("failed after {n} tries"));
        assert!(matches!(caught, Err(Caught::Panicked(e)) if e.message() == "failed after 3 tries"));
    }

    #[test]
    fn test_opaque_payload() {
        let caught: Result<(), Caught> = isolate(|| std::panic::panic_any(42_u8));
        assert!(matches!(caught, Err(Caught::Panicked(e)) if e.message() == "non-string panic payload"));
    }

    #[test]
    fn test_fail_now_is_not_a_panic() {
        let mut t = Tester::with_reporter("t", MemoryReporter::new());
        let caught: Result<(), Caught> = isolate(|| t.fail_now());
        assert!(matches!(caught, Err(Caught::Stopped)));
        assert!(t.failed());
    }

    #[test]
    fn test_normal_return() {
        assert!(matches!(isolate(|| 7), Ok(7)));
    }
}
