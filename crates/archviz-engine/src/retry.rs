use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::error::GenerationError;

pub type Sleeper = Arc<dyn Fn(Duration) + Send + Sync>;

pub fn thread_sleeper() -> Sleeper {
    Arc::new(thread::sleep)
}

/// Reported before each backoff sleep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryNotice {
    /// 1-based number of the attempt that failed.
    pub attempt: u32,
    pub max_attempts: u32,
    pub delay: Duration,
    pub error: GenerationError,
}

/// Bounded exponential backoff around transient remote failures.
///
/// Attempt `n` (0-based) that fails transiently waits `initial_delay * 2^n` before the
/// next one. Non-transient failures and the last failed attempt propagate immediately.
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    sleeper: Sleeper,
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("initial_delay", &self.initial_delay)
            .finish_non_exhaustive()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(2000))
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            sleeper: thread_sleeper(),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Sleeper) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_delay.saturating_mul(factor)
    }

    pub fn run<T>(
        &self,
        mut op: impl FnMut(u32) -> Result<T, GenerationError>,
        mut on_retry: impl FnMut(&RetryNotice),
    ) -> Result<T, GenerationError> {
        let mut attempt = 0;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt + 1 < self.max_attempts => {
                    let notice = RetryNotice {
                        attempt: attempt + 1,
                        max_attempts: self.max_attempts,
                        delay: self.delay_for(attempt),
                        error: err,
                    };
                    tracing::warn!(
                        attempt = notice.attempt,
                        max_attempts = notice.max_attempts,
                        delay_ms = notice.delay.as_millis() as u64,
                        error = %notice.error,
                        "remote model overloaded, backing off"
                    );
                    on_retry(&notice);
                    (self.sleeper)(notice.delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn recording_sleeper() -> (Sleeper, Arc<std::sync::Mutex<Vec<Duration>>>) {
    let slept = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = Arc::clone(&slept);
    let sleeper: Sleeper = Arc::new(move |delay| {
        if let Ok(mut slept) = sink.lock() {
            slept.push(delay);
        }
    });
    (sleeper, slept)
}
