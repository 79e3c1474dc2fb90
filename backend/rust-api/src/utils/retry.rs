use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::metrics::RETRY_ATTEMPTS_TOTAL;

/// How a failed attempt is treated by [`retry_with_policy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    /// The operation overran its own deadline. Retried.
    Timeout,
    /// Any other failure of a network or store call. Retried.
    Transient,
    /// Duplicate keys, undecodable documents. Returned after the first attempt.
    Fatal,
}

impl RetryClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetryClass::Timeout => "timeout",
            RetryClass::Transient => "transient",
            RetryClass::Fatal => "fatal",
        }
    }
}

pub trait Retryable {
    fn retry_class(&self) -> RetryClass;
}

/// Fixed attempt ceiling with a fixed pause between failed attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn fixed(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

/// Runs `f` until it succeeds, fails fatally, or `policy.max_attempts` is used up.
///
/// Sleeps `policy.delay` only between attempts: a success returns at once and the
/// final failure is returned without a trailing pause. The last error is handed
/// back unchanged so callers can tell a timeout from a generic failure.
pub async fn retry_with_policy<F, Fut, T, E>(
    policy: &RetryPolicy,
    operation: &str,
    mut f: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        let err = match f().await {
            Ok(value) => {
                if attempt > 1 {
                    RETRY_ATTEMPTS_TOTAL
                        .with_label_values(&[operation, "recovered"])
                        .inc();
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        let class = err.retry_class();
        if class == RetryClass::Fatal {
            return Err(err);
        }

        RETRY_ATTEMPTS_TOTAL
            .with_label_values(&[operation, class.as_str()])
            .inc();

        if attempt >= max_attempts {
            tracing::error!(
                operation,
                attempts = attempt,
                kind = class.as_str(),
                "{} failed after all retries: {}",
                operation,
                err
            );
            return Err(err);
        }

        tracing::warn!(
            operation,
            attempt,
            max_attempts,
            kind = class.as_str(),
            "{} attempt {} failed: {}",
            operation,
            attempt,
            err
        );
        tokio::time::sleep(policy.delay).await;
    }
}
