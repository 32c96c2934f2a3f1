//! Step registry
//!
//! Holds `(pattern, handler)` pairs in registration order and dispatches a
//! step's text to the first pattern that matches. Handlers receive a
//! [`World`] giving sequential access to capture groups, the step's table
//! rows, and an error buffer for assertion failures.

use std::fmt;

use regex::Regex;

use crate::error::FeatureError;
use crate::model::TableRow;

/// A boxed step handler
pub type StepHandler = Box<dyn Fn(&mut World<'_>) -> Result<(), FeatureError>>;

/// Context handed to a step handler
pub struct World<'a> {
    /// Capture groups 1..N; group 0 is not exposed
    captures: Vec<String>,
    next: usize,
    table: &'a [TableRow],
    errors: String,
    failed: bool,
    overflow: Option<FeatureError>,
}

impl<'a> World<'a> {
    fn new(captures: Vec<String>, table: &'a [TableRow]) -> Self {
        Self {
            captures,
            next: 0,
            table,
            errors: String::new(),
            failed: false,
            overflow: None,
        }
    }

    /// Return the next capture group, starting at group 1.
    ///
    /// Groups that did not participate in the match read as an empty
    /// string. Calling this more times than there are groups is an error,
    /// and the step is reported as failing fatally even if the handler
    /// ignores the returned `Err`.
    pub fn capture(&mut self) -> Result<String, FeatureError> {
        match self.captures.get(self.next) {
            Some(value) => {
                self.next += 1;
                Ok(value.clone())
            }
            None => {
                let err = FeatureError::capture_overflow(self.captures.len());
                self.overflow = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Number of capture groups in the matched pattern
    pub fn capture_count(&self) -> usize {
        self.captures.len()
    }

    /// Table rows attached to the step, empty if none
    pub fn table(&self) -> &[TableRow] {
        self.table
    }

    /// Record an assertion failure; the step is reported as failed
    pub fn fail(&mut self, message: impl fmt::Display) {
        self.failed = true;
        self.errors.push_str(&message.to_string());
        if !self.errors.ends_with('\n') {
            self.errors.push('\n');
        }
    }

    /// Record a failure unless `actual == expected`
    pub fn check_eq<T: PartialEq + fmt::Debug>(&mut self, actual: T, expected: T) {
        if actual != expected {
            self.fail(format_args!("expected {:?}, got {:?}", expected, actual));
        }
    }

    pub fn has_failed(&self) -> bool {
        self.failed
    }
}

impl fmt::Write for World<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.failed = true;
        self.errors.push_str(s);
        Ok(())
    }
}

/// A registered step definition
pub struct StepDef {
    pattern: Regex,
    handler: StepHandler,
}

impl StepDef {
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

/// Result of invoking a matched handler
#[derive(Debug)]
pub struct Invocation {
    /// The pattern that matched
    pub pattern: String,
    /// What the handler returned; a capture overflow overrides `Ok`
    pub result: Result<(), FeatureError>,
    /// Text written to the error buffer
    pub errors: String,
    /// Whether anything was written to the error buffer
    pub failed: bool,
}

/// Ordered collection of step definitions
#[derive(Default)]
pub struct StepRegistry {
    defs: Vec<StepDef>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `pattern` and append it. Anchoring is up to the caller.
    pub fn register<F>(&mut self, pattern: &str, handler: F) -> Result<(), FeatureError>
    where
        F: Fn(&mut World<'_>) -> Result<(), FeatureError> + 'static,
    {
        let regex = Regex::new(pattern).map_err(|e| FeatureError::invalid_pattern(pattern, e))?;
        self.defs.push(StepDef {
            pattern: regex,
            handler: Box::new(handler),
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn defs(&self) -> &[StepDef] {
        &self.defs
    }

    /// Find the first definition matching `text`
    pub fn find(&self, text: &str) -> Option<&StepDef> {
        self.defs.iter().find(|d| d.pattern.is_match(text))
    }

    /// Invoke the first definition whose pattern matches `text`.
    ///
    /// Returns `None` if nothing matches; no handler runs in that case.
    pub fn dispatch(&self, text: &str, table: &[TableRow]) -> Option<Invocation> {
        let def = self.find(text)?;
        let captures: Vec<String> = match def.pattern.captures(text) {
            Some(caps) => caps
                .iter()
                .skip(1)
                .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
                .collect(),
            None => Vec::new(),
        };

        let mut world = World::new(captures, table);
        let mut result = (def.handler)(&mut world);
        if let Some(overflow) = world.overflow.take() {
            if result.as_ref().map_or_else(FeatureError::is_pending, |_| true) {
                result = Err(overflow);
            }
        }

        Some(Invocation {
            pattern: def.pattern().to_string(),
            result,
            errors: world.errors,
            failed: world.failed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{pending, ErrorKind};
    use std::cell::{Cell, RefCell};
    use std::fmt::Write;
    use std::rc::Rc;

    #[test]
    fn test_first_match_wins() {
        let mut reg = StepRegistry::new();
        let first = Rc::new(Cell::new(false));
        let second = Rc::new(Cell::new(false));
        let f = first.clone();
        reg.register(".", move |_| {
            f.set(true);
            Ok(())
        })
        .unwrap();
        let s = second.clone();
        reg.register(".", move |_| {
            s.set(true);
            Ok(())
        })
        .unwrap();

        let inv = reg.dispatch("only the first step is called", &[]).unwrap();
        assert_eq!(inv.pattern, ".");
        assert!(first.get());
        assert!(!second.get());
    }

    #[test]
    fn test_no_match_is_none() {
        let mut reg = StepRegistry::new();
        reg.register("^A", |_| Ok(())).unwrap();
        assert!(reg.dispatch("the first setup", &[]).is_none());
    }

    #[test]
    fn test_invalid_pattern() {
        let mut reg = StepRegistry::new();
        let err = reg.register("(unclosed", |_| Ok(())).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidPattern);
        assert!(reg.is_empty());
    }

    #[test]
    fn test_captures_sequential() {
        let mut reg = StepRegistry::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        reg.register(r"^(\w+) has (\d+) (apples)?$", move |w| {
            assert_eq!(w.capture_count(), 3);
            for _ in 0..3 {
                s.borrow_mut().push(w.capture()?);
            }
            Ok(())
        })
        .unwrap();

        let inv = reg.dispatch("bob has 3 ", &[]).unwrap();
        assert!(inv.result.is_ok());
        assert_eq!(*seen.borrow(), vec!["bob", "3", ""]);
    }

    #[test]
    fn test_capture_overflow_is_error() {
        let mut reg = StepRegistry::new();
        reg.register("(thing)", |w| {
            w.capture()?;
            w.capture()?;
            Ok(())
        })
        .unwrap();
        let inv = reg.dispatch("thing", &[]).unwrap();
        let err = inv.result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::CaptureOverflow);
        assert!(err.message.contains("called too many times"));
    }

    #[test]
    fn test_capture_overflow_not_swallowed() {
        let mut reg = StepRegistry::new();
        reg.register(".", |w| {
            let _ = w.capture();
            Ok(())
        })
        .unwrap();
        let inv = reg.dispatch(".", &[]).unwrap();
        assert_eq!(inv.result.unwrap_err().kind, ErrorKind::CaptureOverflow);
    }

    #[test]
    fn test_capture_overflow_not_hidden_by_pending() {
        let mut reg = StepRegistry::new();
        reg.register("^no groups$", |w| {
            let _ = w.capture();
            pending()
        })
        .unwrap();
        let inv = reg.dispatch("no groups", &[]).unwrap();
        assert_eq!(inv.result.unwrap_err().kind, ErrorKind::CaptureOverflow);
    }

    #[test]
    fn test_pending_passed_through() {
        let mut reg = StepRegistry::new();
        reg.register(".", |_| pending()).unwrap();
        let inv = reg.dispatch("x", &[]).unwrap();
        assert!(inv.result.unwrap_err().is_pending());
    }

    #[test]
    fn test_error_buffer_marks_failed() {
        let mut reg = StepRegistry::new();
        reg.register("^write$", |w| {
            write!(w, "expected {} got {}", 1, 2).unwrap();
            Ok(())
        })
        .unwrap();
        reg.register("^check$", |w| {
            w.check_eq(1, 1);
            Ok(())
        })
        .unwrap();

        let inv = reg.dispatch("write", &[]).unwrap();
        assert!(inv.failed);
        assert_eq!(inv.errors, "expected 1 got 2");
        assert!(inv.result.is_ok());

        let inv = reg.dispatch("check", &[]).unwrap();
        assert!(!inv.failed);
        assert!(inv.errors.is_empty());
    }

    #[test]
    fn test_table_rows_exposed() {
        let mut reg = StepRegistry::new();
        let got = Rc::new(RefCell::new(Vec::new()));
        let g = got.clone();
        reg.register(".", move |w| {
            g.borrow_mut().extend(w.table().iter().cloned());
            Ok(())
        })
        .unwrap();

        let row: TableRow = [("name".to_string(), "Bob".to_string())].into_iter().collect();
        reg.dispatch("people", std::slice::from_ref(&row)).unwrap();
        assert_eq!(*got.borrow(), vec![row]);
    }
}
