//! Error taxonomy and rendering.

use std::error::Error as StdError;

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

/// Fatal setup failures. No test runs when one of these is reported.
#[derive(Debug, Error, Diagnostic)]
pub enum SuiteError {
    #[error("suite must be a struct, got {kind} `{suite}`")]
    #[diagnostic(
        code(suitekit::suite::not_a_struct),
        help("derive `SuiteMembers` on a struct so its fields can be inspected for helpers")
    )]
    NotAStruct { suite: String, kind: &'static str },
}

impl SuiteError {
    /// Full diagnostic rendering (code, message and help).
    pub fn render(self) -> String {
        let report = miette::Report::new(self);
        format!("{report:?}")
    }
}

/// Which standard stream a capture error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl std::fmt::Display for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stream::Stdout => f.write_str("stdout"),
            Stream::Stderr => f.write_str("stderr"),
        }
    }
}

/// Errors from [`Capture`](crate::Capture).
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to redirect {stream}")]
    Redirect {
        stream: Stream,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read captured {stream}")]
    Read {
        stream: Stream,
        #[source]
        source: std::io::Error,
    },
}

/// Structured rendering of an error and its cause chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorSummary {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

impl ErrorSummary {
    pub fn from_error(err: &(dyn StdError + 'static)) -> Self {
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        Self {
            message: err.to_string(),
            causes,
        }
    }

    /// Pretty-printed JSON, or just the message if serialization fails.
    pub fn render(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.message.clone())
    }
}
