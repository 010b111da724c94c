//! Retry executor, strategies and conditions.
//!
//! A retry is assembled from two independent policies:
//!
//! - a **strategy** ([`RetryStrategy`]) answers "may we try again?" and "how
//!   long do we wait first?", looking only at the [`RetryContext`];
//! - a **condition** ([`RetryCondition`]) answers "is this outcome
//!   acceptable?", looking at either the produced value or the error.
//!
//! [`RetryBuilder`] binds one of each into a [`RetryExecutor`], which drives
//! the operation.
//!
//! # Key Types
//!
//! - [`FixedCount`], [`ExponentialBackoff`], [`TimeoutBound`] - Built-in strategies
//! - [`ErrorTypeCondition`], [`ErrorPredicate`], [`ResultPredicate`],
//!   [`PatternCondition`] - Built-in conditions
//! - [`RetryObserver`] - Per-attempt diagnostics sink
//!
//! # Examples
//!
//! ```rust
//! use relentless_core::retry::RetryBuilder;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let executor = RetryBuilder::new()
//!     .exponential(3, Duration::from_millis(1))
//!     .retry_if_result(|ready: &bool| !*ready)
//!     .build()?;
//!
//! let mut polls = 0;
//! let ready = executor
//!     .execute(|| {
//!         polls += 1;
//!         let ready = polls >= 3;
//!         async move { Ok::<_, std::io::Error>(ready) }
//!     })
//!     .await?;
//!
//! assert!(ready);
//! assert_eq!(polls, 3);
//! # Ok(())
//! # }
//! ```

mod builder;
mod condition;
mod context;
mod executor;
mod exponential;
mod observer;
mod strategy;

pub use builder::{RetryBuilder, Unconditioned};
pub use condition::{
    AsText, ErrorPredicate, ErrorTypeCondition, Or, Outcome, PatternCondition, ResultPredicate,
    RetryCondition, RetryConditionExt,
};
pub use context::{AttemptFailure, RetryContext};
pub use executor::RetryExecutor;
pub use exponential::{ExponentialBackoff, ExponentialBackoffBuilder};
pub use observer::{AttemptEvent, AttemptOutcome, NoopObserver, RetryObserver};
pub use strategy::{FixedCount, RetryStrategy, TimeoutBound};
