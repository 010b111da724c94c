//! Declarative strategy configuration.
//!
//! [`RetryConfig`] describes a stop/backoff strategy as plain data, so it can
//! live in a configuration file or the environment:
//!
//! ```toml
//! [retry]
//! kind = "exponential"
//! max_attempts = 5
//! base_delay_ms = 200
//! max_delay_ms = 5000
//! jitter = 0.1
//! ```

use crate::error::ConfigError;
use crate::retry::{ExponentialBackoff, FixedCount, RetryStrategy, TimeoutBound};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_DELAY_MS: u64 = 100;
const DEFAULT_MULTIPLIER: f64 = 2.0;
const DEFAULT_BUDGET_MS: u64 = 30_000;

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_delay_ms() -> u64 {
    DEFAULT_DELAY_MS
}

fn default_multiplier() -> f64 {
    DEFAULT_MULTIPLIER
}

/// A stop/backoff strategy described as data.
///
/// All durations are in milliseconds. Call [`into_strategy`](Self::into_strategy)
/// (or pass the config to [`RetryBuilder::config`](crate::retry::RetryBuilder::config))
/// to obtain a usable strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetryConfig {
    /// [`FixedCount`]: a bounded number of retries with a constant delay.
    Fixed {
        /// Retries after the initial attempt.
        #[serde(default = "default_max_attempts")]
        max_attempts: u32,
        /// Wait between attempts.
        #[serde(default = "default_delay_ms")]
        delay_ms: u64,
    },

    /// [`ExponentialBackoff`]: a bounded number of retries with growing delays.
    Exponential {
        /// Retries after the initial attempt.
        #[serde(default = "default_max_attempts")]
        max_attempts: u32,
        /// Wait before the first retry.
        #[serde(default = "default_delay_ms")]
        base_delay_ms: u64,
        /// Growth factor per attempt. Must be at least 1.0.
        #[serde(default = "default_multiplier")]
        multiplier: f64,
        /// Upper bound on any single wait.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_delay_ms: Option<u64>,
        /// Random spread applied to each wait, between 0.0 and 1.0.
        #[serde(default)]
        jitter: f64,
    },

    /// [`TimeoutBound`]: retries until a wall-clock budget is spent.
    Timeout {
        /// Total time allowed for retries.
        budget_ms: u64,
        /// Wait between attempts.
        #[serde(default = "default_delay_ms")]
        delay_ms: u64,
    },
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::Exponential {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_DELAY_MS,
            multiplier: DEFAULT_MULTIPLIER,
            max_delay_ms: None,
            jitter: 0.0,
        }
    }
}

impl RetryConfig {
    /// Load a configuration from environment variables.
    ///
    /// This will look for:
    /// - `RELENTLESS_STRATEGY`: `fixed`, `exponential` (default) or `timeout`
    /// - `RELENTLESS_MAX_ATTEMPTS`: retries after the initial attempt
    /// - `RELENTLESS_DELAY_MS`: constant delay, or the base delay for exponential
    /// - `RELENTLESS_MAX_DELAY_MS`: exponential cap
    /// - `RELENTLESS_MULTIPLIER`: exponential growth factor
    /// - `RELENTLESS_JITTER`: exponential jitter factor
    /// - `RELENTLESS_BUDGET_MS`: time budget for `timeout`
    ///
    /// Variables that do not apply to the selected strategy are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidParameter`] if a variable is set but
    /// cannot be parsed, names an unknown strategy, or the resulting
    /// configuration fails [`validate`](Self::validate).
    pub fn from_env() -> Result<Self, ConfigError> {
        let kind = env::var("RELENTLESS_STRATEGY").ok();

        let max_attempts = env_parse("RELENTLESS_MAX_ATTEMPTS")?.unwrap_or(DEFAULT_MAX_ATTEMPTS);
        let delay_ms = env_parse("RELENTLESS_DELAY_MS")?.unwrap_or(DEFAULT_DELAY_MS);

        let config = match kind.as_deref().map(str::trim) {
            None | Some("exponential") => Self::Exponential {
                max_attempts,
                base_delay_ms: delay_ms,
                multiplier: env_parse("RELENTLESS_MULTIPLIER")?.unwrap_or(DEFAULT_MULTIPLIER),
                max_delay_ms: env_parse("RELENTLESS_MAX_DELAY_MS")?,
                jitter: env_parse("RELENTLESS_JITTER")?.unwrap_or(0.0),
            },
            Some("fixed") => Self::Fixed {
                max_attempts,
                delay_ms,
            },
            Some("timeout") => Self::Timeout {
                budget_ms: env_parse("RELENTLESS_BUDGET_MS")?.unwrap_or(DEFAULT_BUDGET_MS),
                delay_ms,
            },
            Some(other) => {
                return Err(ConfigError::invalid(
                    "RELENTLESS_STRATEGY",
                    format!("expected fixed, exponential or timeout, got: '{other}'"),
                ));
            }
        };

        config.validate()?;
        tracing::debug!(?config, "Loaded retry configuration from environment");
        Ok(config)
    }

    /// Check that every parameter is in range.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidParameter`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Self::Exponential {
            multiplier, jitter, ..
        } = *self
        {
            if !multiplier.is_finite() || multiplier < 1.0 {
                return Err(ConfigError::invalid(
                    "multiplier",
                    format!("must be a finite number of at least 1.0, got: {multiplier}"),
                ));
            }
            if !(0.0..=1.0).contains(&jitter) {
                return Err(ConfigError::invalid(
                    "jitter",
                    format!("must be between 0.0 and 1.0, got: {jitter}"),
                ));
            }
        }
        Ok(())
    }

    /// Validate and turn the configuration into a shareable strategy.
    ///
    /// # Errors
    ///
    /// See [`validate`](Self::validate).
    pub fn into_strategy(self) -> Result<Arc<dyn RetryStrategy>, ConfigError> {
        self.validate()?;

        Ok(match self {
            Self::Fixed {
                max_attempts,
                delay_ms,
            } => Arc::new(FixedCount::new(
                max_attempts,
                Duration::from_millis(delay_ms),
            )),
            Self::Exponential {
                max_attempts,
                base_delay_ms,
                multiplier,
                max_delay_ms,
                jitter,
            } => {
                let mut builder = ExponentialBackoff::builder()
                    .max_attempts(max_attempts)
                    .base_delay(Duration::from_millis(base_delay_ms))
                    .multiplier(multiplier)
                    .jitter(jitter);
                if let Some(max_delay_ms) = max_delay_ms {
                    builder = builder.max_delay(Duration::from_millis(max_delay_ms));
                }
                Arc::new(builder.build())
            }
            Self::Timeout {
                budget_ms,
                delay_ms,
            } => Arc::new(TimeoutBound::new(
                Duration::from_millis(budget_ms),
                Duration::from_millis(delay_ms),
            )),
        })
    }
}

fn env_parse<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::invalid(name, format!("must be a valid number, got: '{raw}'"))),
        Err(_) => Ok(None),
    }
}
