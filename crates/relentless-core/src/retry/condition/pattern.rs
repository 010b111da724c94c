//! Condition that matches textual results against a regular expression.

use super::{Outcome, RetryCondition};
use crate::error::ConfigError;
use regex::Regex;
use std::borrow::Cow;
use std::sync::Arc;

/// Values that may carry text for a [`PatternCondition`] to inspect.
///
/// Returning `None` means "no text here", which the pattern condition treats
/// as having no opinion.
pub trait AsText {
    /// The text carried by this value, if any.
    fn as_text(&self) -> Option<&str>;
}

impl AsText for str {
    fn as_text(&self) -> Option<&str> {
        Some(self)
    }
}

impl AsText for String {
    fn as_text(&self) -> Option<&str> {
        Some(self)
    }
}

impl AsText for Cow<'_, str> {
    fn as_text(&self) -> Option<&str> {
        Some(self)
    }
}

impl<S: AsText + ?Sized> AsText for &S {
    fn as_text(&self) -> Option<&str> {
        (**self).as_text()
    }
}

impl<S: AsText + ?Sized> AsText for Box<S> {
    fn as_text(&self) -> Option<&str> {
        (**self).as_text()
    }
}

impl<S: AsText + ?Sized> AsText for Arc<S> {
    fn as_text(&self) -> Option<&str> {
        (**self).as_text()
    }
}

impl<S: AsText> AsText for Option<S> {
    fn as_text(&self) -> Option<&str> {
        self.as_ref().and_then(AsText::as_text)
    }
}

// Side-effect executions complete with `()`, which carries no text.
impl AsText for () {
    fn as_text(&self) -> Option<&str> {
        None
    }
}

/// Retries textual results depending on whether they match a pattern.
///
/// With `should_match_to_retry = false` (the default) the pattern describes
/// what a good result looks like, and results that do *not* match are
/// retried. With `should_match_to_retry = true` the pattern describes a bad
/// result, and matching results are retried. Results without text and errors
/// are never retried by this condition.
///
/// # Examples
///
/// ```rust
/// use relentless_core::retry::{Outcome, PatternCondition, RetryCondition};
///
/// let failure_marker = PatternCondition::new("error|exception")?.should_match_to_retry(true);
///
/// assert!(failure_marker.should_retry(Outcome::<_, ()>::Success(&"fatal error")));
/// assert!(!failure_marker.should_retry(Outcome::<_, ()>::Success(&"Success")));
/// # Ok::<(), relentless_core::ConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct PatternCondition {
    pattern: Regex,
    should_match_to_retry: bool,
}

impl PatternCondition {
    /// Compile `pattern` into a condition that retries non-matching results.
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        Ok(Self::from_regex(Regex::new(pattern)?))
    }

    /// Build a condition from an already compiled expression.
    pub fn from_regex(pattern: Regex) -> Self {
        Self {
            pattern,
            should_match_to_retry: false,
        }
    }

    /// Choose the polarity: retry on a match (`true`) or on a miss (`false`).
    pub fn should_match_to_retry(mut self, should_match_to_retry: bool) -> Self {
        self.should_match_to_retry = should_match_to_retry;
        self
    }

    /// The compiled pattern.
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }
}

impl<T, E> RetryCondition<T, E> for PatternCondition
where
    T: AsText,
{
    fn should_retry(&self, outcome: Outcome<'_, T, E>) -> bool {
        match outcome {
            Outcome::Success(value) => match value.as_text() {
                Some(text) => self.pattern.is_match(text) == self.should_match_to_retry,
                None => false,
            },
            Outcome::Failure(_) => false,
        }
    }
}
