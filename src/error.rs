//! Feature errors

use std::fmt;

/// The kind of feature error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Step handler marked itself as not yet implemented
    Pending,
    /// Table row cell count differs from its header row
    MalformedTable,
    /// Capture accessor called past the last capture group
    CaptureOverflow,
    /// Step pattern is not a valid regular expression
    InvalidPattern,
    /// Step handler raised an error
    HandlerFailed,
    /// IO error
    Io,
}

/// A feature error with file/line context
#[derive(Debug, Clone)]
pub struct FeatureError {
    pub kind: ErrorKind,
    pub message: String,
    pub file: Option<String>,
    pub line: Option<usize>,
}

impl FeatureError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            file: None,
            line: None,
        }
    }

    pub fn with_location(mut self, file: impl Into<String>, line: usize) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Attach a file name, keeping any line number already recorded.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn pending() -> Self {
        Self::new(ErrorKind::Pending, "Pending")
    }

    pub fn malformed_table(expected: usize, found: usize, row: &str) -> Self {
        Self::new(
            ErrorKind::MalformedTable,
            format!(
                "Wrong number of fields in table row [{}] - expected {} fields but found {}",
                row.trim(),
                expected,
                found
            ),
        )
    }

    pub fn capture_overflow(available: usize) -> Self {
        Self::new(
            ErrorKind::CaptureOverflow,
            format!(
                "capture accessor called too many times ({} capture group(s) available)",
                available
            ),
        )
    }

    pub fn invalid_pattern(pattern: &str, err: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::InvalidPattern,
            format!("invalid step pattern {:?}: {}", pattern, err),
        )
    }

    pub fn handler(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::HandlerFailed, msg)
    }

    pub fn is_pending(&self) -> bool {
        self.kind == ErrorKind::Pending
    }
}

/// Mark the calling step handler as pending.
///
/// ```rust
/// # use emx_gherkin::{Engine, pending};
/// let mut engine = Engine::new();
/// engine.given("^a feature nobody wrote yet$", |_| pending()).unwrap();
/// ```
pub fn pending() -> Result<(), FeatureError> {
    Err(FeatureError::pending())
}

impl fmt::Display for FeatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref file) = self.file {
            write!(f, "{}:", file)?;
        }
        if let Some(line) = self.line {
            write!(f, "{}:", line)?;
        }
        if self.file.is_some() || self.line.is_some() {
            write!(f, " ")?;
        }
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for FeatureError {}

impl From<std::io::Error> for FeatureError {
    fn from(e: std::io::Error) -> Self {
        Self::new(ErrorKind::Io, e.to_string())
    }
}

impl From<String> for FeatureError {
    fn from(msg: String) -> Self {
        Self::handler(msg)
    }
}

impl From<&str> for FeatureError {
    fn from(msg: &str) -> Self {
        Self::handler(msg)
    }
}
