#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Generic retry execution for fallible operations.
//!
//! This crate runs an operation repeatedly until it produces an acceptable
//! outcome or a policy says to stop:
//!
//! - **Pluggable strategies** via the `RetryStrategy` trait
//!   - Fixed retry count with a constant delay
//!   - Exponential backoff with optional cap and jitter
//!   - Wall-clock time budget
//! - **Typed conditions** via the `RetryCondition` trait, judging either the
//!   error (by type, source chain, or predicate) or the produced value (by
//!   predicate or regular expression)
//! - **Async, side-effect and blocking call shapes** over one async core,
//!   with cancellation between attempts
//! - **Declarative configuration** via `RetryConfig`, from files or the
//!   environment
//!
//! Every attempt is reported through `tracing` and an optional
//! [`RetryObserver`](retry::RetryObserver).
//!
//! # Examples
//!
//! Using the prelude for convenient imports:
//!
//! ```rust
//! use relentless_core::prelude::*;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let executor = RetryBuilder::new()
//!     .fixed(3, Duration::from_millis(10))
//!     .retry_on_error::<std::io::Error>()
//!     .build()?;
//!
//! let result = executor.execute(|| async {
//!     Ok::<_, std::io::Error>(42)
//! }).await?;
//! assert_eq!(result, 42);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod retry;

pub use config::RetryConfig;
pub use error::{ConfigError, RetryError, RetryResult};

/// Convenient re-exports of commonly used items.
///
/// Import everything needed to build and run an executor with:
///
/// ```rust
/// use relentless_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::RetryConfig;
    pub use crate::error::{ConfigError, RetryError, RetryResult};
    pub use crate::retry::{
        ErrorPredicate, ErrorTypeCondition, ExponentialBackoff, FixedCount, PatternCondition,
        ResultPredicate, RetryBuilder, RetryCondition, RetryConditionExt, RetryExecutor,
        RetryStrategy, TimeoutBound,
    };
    pub use tokio_util::sync::CancellationToken;
}
