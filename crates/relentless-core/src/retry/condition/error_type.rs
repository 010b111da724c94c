//! Conditions that judge errors.

use super::{Outcome, RetryCondition};
use std::any::type_name;
use std::error::Error;
use std::fmt;
use std::marker::PhantomData;

type ErrorCheck = fn(&(dyn Error + 'static)) -> bool;

fn is_type<X: Error + 'static>(error: &(dyn Error + 'static)) -> bool {
    error.is::<X>()
}

#[derive(Clone, Copy)]
struct ErrorType {
    name: &'static str,
    check: ErrorCheck,
}

/// Retries errors of one or more configured types.
///
/// An error matches when it is one of the configured types, or when any error
/// in its [`source`](Error::source) chain is. This lets a wrapping error
/// enum be retried on the type of the cause it carries. Values are never
/// retried by this condition.
///
/// # Examples
///
/// ```rust
/// use relentless_core::retry::{ErrorTypeCondition, Outcome, RetryCondition};
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("connection reset")]
/// struct ConnectionReset;
///
/// let condition = ErrorTypeCondition::of::<ConnectionReset>().or_type::<std::io::Error>();
///
/// assert!(condition.should_retry(Outcome::<(), _>::Failure(&ConnectionReset)));
/// ```
#[derive(Clone)]
pub struct ErrorTypeCondition {
    types: Vec<ErrorType>,
}

impl ErrorTypeCondition {
    /// Retry errors of type `X`.
    pub fn of<X: Error + 'static>() -> Self {
        Self { types: Vec::new() }.or_type::<X>()
    }

    /// Also retry errors of type `X`.
    pub fn or_type<X: Error + 'static>(mut self) -> Self {
        self.types.push(ErrorType {
            name: type_name::<X>(),
            check: is_type::<X>,
        });
        self
    }

    /// Names of the configured error types.
    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.types.iter().map(|t| t.name)
    }

    /// Whether `error` or one of its causes is a configured type.
    pub fn matches(&self, error: &(dyn Error + 'static)) -> bool {
        let mut current = Some(error);
        while let Some(err) = current {
            if self.types.iter().any(|t| (t.check)(err)) {
                return true;
            }
            current = err.source();
        }
        false
    }
}

impl fmt::Debug for ErrorTypeCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorTypeCondition")
            .field("types", &self.type_names().collect::<Vec<_>>())
            .finish()
    }
}

impl<T, E> RetryCondition<T, E> for ErrorTypeCondition
where
    E: Error + 'static,
{
    fn should_retry(&self, outcome: Outcome<'_, T, E>) -> bool {
        match outcome {
            Outcome::Failure(error) => self.matches(error),
            Outcome::Success(_) => false,
        }
    }
}

/// Retries errors for which a predicate holds.
///
/// Suited to error enums, where "which errors are transient" is a question
/// about variants rather than types. Values are never retried.
///
/// ```rust
/// use relentless_core::retry::{ErrorPredicate, Outcome, RetryCondition};
///
/// let condition = ErrorPredicate::new(|err: &std::io::Error| {
///     err.kind() == std::io::ErrorKind::TimedOut
/// });
///
/// let timed_out = std::io::Error::from(std::io::ErrorKind::TimedOut);
/// assert!(condition.should_retry(Outcome::<(), _>::Failure(&timed_out)));
/// ```
pub struct ErrorPredicate<E, F> {
    predicate: F,
    _error: PhantomData<fn(&E) -> bool>,
}

impl<E, F> ErrorPredicate<E, F>
where
    F: Fn(&E) -> bool,
{
    /// Retry errors for which `predicate` returns `true`.
    pub fn new(predicate: F) -> Self {
        Self {
            predicate,
            _error: PhantomData,
        }
    }
}

impl<E, F: Clone> Clone for ErrorPredicate<E, F> {
    fn clone(&self) -> Self {
        Self {
            predicate: self.predicate.clone(),
            _error: PhantomData,
        }
    }
}

impl<E, F> fmt::Debug for ErrorPredicate<E, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorPredicate")
            .field("error", &type_name::<E>())
            .finish_non_exhaustive()
    }
}

impl<T, E, F> RetryCondition<T, E> for ErrorPredicate<E, F>
where
    F: Fn(&E) -> bool + Send + Sync,
{
    fn should_retry(&self, outcome: Outcome<'_, T, E>) -> bool {
        match outcome {
            Outcome::Failure(error) => (self.predicate)(error),
            Outcome::Success(_) => false,
        }
    }
}
