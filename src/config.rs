//! Suite configuration.
//!
//! A suite describes its execution preferences by returning a [`Config`] from [`Suite::suite`]. The runner asks for
//! it exactly once per run.

use std::fmt;

/// Diagnostic sink replacing the default `Tester::log`.
pub type LogFn = Box<dyn FnMut(&str)>;

/// Execution preferences for a suite run.
#[derive(Default)]
pub struct Config {
    /// Suppress warnings about suite fields and methods that are neither helpers nor tests.
    pub skip_warnings: bool,
    /// Where warnings go. `None` logs them on the suite's `Tester`.
    pub logf: Option<LogFn>,
}

impl Config {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether ignored-member warnings are suppressed
    pub fn with_skip_warnings(mut self, skip: bool) -> Self {
        self.skip_warnings = skip;
        self
    }

    /// Route warnings to `logf` instead of the tester
    pub fn with_logf(mut self, logf: impl FnMut(&str) + 'static) -> Self {
        self.logf = Some(Box::new(logf));
        self
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("skip_warnings", &self.skip_warnings)
            .field("logf", &self.logf.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Implemented by every suite. The single method is the capability query the runner calls once per run.
pub trait Suite {
    fn suite(&mut self) -> Config {
        Config::default()
    }
}

/// Zero-configuration marker.
///
/// Suites may hold a `DefaultConfig` field and delegate `Suite::suite` to it. The member classifier skips fields of
/// this type silently: they are neither helpers nor reported as ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultConfig;

impl Suite for DefaultConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.skip_warnings);
        assert!(config.logf.is_none());
    }

    #[test]
    fn test_with_skip_warnings() {
        let config = Config::new().with_skip_warnings(true);
        assert!(config.skip_warnings);
        // Other fields unchanged
        assert!(config.logf.is_none());
    }

    #[test]
    fn test_with_logf_receives_lines() {
        let lines = Rc::new(RefCell::new(Vec::new()));
        let sink = lines.clone();
        let mut config = Config::new().with_logf(move |line| sink.borrow_mut().push(line.to_string()));

        if let Some(logf) = config.logf.as_mut() {
            logf("first");
            logf("second");
        }
        assert_eq!(*lines.borrow(), vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn test_default_config_marker_returns_defaults() {
        let config = DefaultConfig.suite();
        assert!(!config.skip_warnings);
        assert!(config.logf.is_none());
    }

    #[test]
    fn test_config_debug_hides_closure() {
        let config = Config::new().with_logf(|_| {});
        let debug = format!("{:?}", config);
        assert!(debug.contains("skip_warnings"));
        assert!(debug.contains("<fn>"));
    }
}
