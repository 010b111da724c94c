//! Condition that judges produced values.

use super::{Outcome, RetryCondition};
use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

/// Retries values for which a predicate holds.
///
/// The predicate is typed over the result type `R`, so the condition can only
/// be attached to executions producing `R`. Errors are never retried by this
/// condition; combine it with an error condition through
/// [`RetryConditionExt::or`](super::RetryConditionExt::or) when both matter.
///
/// # Examples
///
/// ```rust
/// use relentless_core::retry::{Outcome, ResultPredicate, RetryCondition};
///
/// // Keep polling while the job is still pending.
/// let condition = ResultPredicate::new(|status: &String| status == "pending");
///
/// assert!(condition.should_retry(Outcome::<_, ()>::Success(&"pending".to_string())));
/// assert!(!condition.should_retry(Outcome::<_, ()>::Success(&"done".to_string())));
/// ```
pub struct ResultPredicate<R, F> {
    predicate: F,
    _result: PhantomData<fn(&R) -> bool>,
}

impl<R, F> ResultPredicate<R, F>
where
    F: Fn(&R) -> bool,
{
    /// Retry values for which `predicate` returns `true`.
    pub fn new(predicate: F) -> Self {
        Self {
            predicate,
            _result: PhantomData,
        }
    }
}

impl<R, F: Clone> Clone for ResultPredicate<R, F> {
    fn clone(&self) -> Self {
        Self {
            predicate: self.predicate.clone(),
            _result: PhantomData,
        }
    }
}

impl<R, F> fmt::Debug for ResultPredicate<R, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultPredicate")
            .field("result", &type_name::<R>())
            .finish_non_exhaustive()
    }
}

impl<R, E, F> RetryCondition<R, E> for ResultPredicate<R, F>
where
    F: Fn(&R) -> bool + Send + Sync,
{
    fn should_retry(&self, outcome: Outcome<'_, R, E>) -> bool {
        match outcome {
            Outcome::Success(value) => (self.predicate)(value),
            Outcome::Failure(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicate_decides_values() {
        let condition = ResultPredicate::new(|n: &u32| *n < 3);

        assert!(condition.should_retry(Outcome::<_, ()>::Success(&1)));
        assert!(condition.should_retry(Outcome::<_, ()>::Success(&2)));
        assert!(!condition.should_retry(Outcome::<_, ()>::Success(&3)));
    }

    #[test]
    fn test_predicate_ignores_errors() {
        let condition = ResultPredicate::new(|_: &u32| true);
        let error = std::io::Error::other("boom");

        assert!(!condition.should_retry(Outcome::<u32, _>::Failure(&error)));
    }

    #[test]
    fn test_debug_names_result_type() {
        let condition = ResultPredicate::new(|_: &Vec<u8>| false);
        assert!(format!("{condition:?}").contains("Vec<u8>"));
    }
}
