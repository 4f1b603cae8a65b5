//! Waiting on asynchronous backend state.
//!
//! [`wait_until`] re-runs a probe with exponential backoff until it yields a
//! value, the deadline passes, or the wait is cancelled.

use crate::error::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Longest single sleep between cancellation checks
const CANCEL_CHECK_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    pub timeout: Duration,
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            initial_interval: Duration::from_millis(250),
            max_interval: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}

impl PollConfig {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    fn next_interval(&self, current: Duration) -> Duration {
        let scaled = current.mul_f64(self.multiplier.max(1.0));
        scaled.min(self.max_interval)
    }
}

/// Shared flag that stops a wait from another thread or a test hook.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T> {
    Ready(T),
    TimedOut { attempts: u32, elapsed: Duration },
    Cancelled { attempts: u32 },
}

impl<T> PollOutcome<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Calls `probe` until it returns `Some`. Probe errors end the wait
/// immediately. The probe always runs at least once.
pub fn wait_until<T, F>(config: &PollConfig, cancel: &CancelToken, mut probe: F) -> Result<PollOutcome<T>>
where
    F: FnMut() -> Result<Option<T>>,
{
    let started = Instant::now();
    let deadline = started + config.timeout;
    let mut interval = config.initial_interval;
    let mut attempts = 0u32;

    loop {
        if cancel.is_cancelled() {
            return Ok(PollOutcome::Cancelled { attempts });
        }

        attempts += 1;
        if let Some(value) = probe()? {
            tracing::debug!(attempts, elapsed_ms = started.elapsed().as_millis() as u64, "Poll ready");
            return Ok(PollOutcome::Ready(value));
        }

        let now = Instant::now();
        if now >= deadline {
            tracing::debug!(attempts, "Poll timed out");
            return Ok(PollOutcome::TimedOut {
                attempts,
                elapsed: started.elapsed(),
            });
        }

        let wake = (now + interval).min(deadline);
        while Instant::now() < wake {
            if cancel.is_cancelled() {
                return Ok(PollOutcome::Cancelled { attempts });
            }
            let remaining = wake.saturating_duration_since(Instant::now());
            thread::sleep(remaining.min(CANCEL_CHECK_INTERVAL));
        }
        interval = config.next_interval(interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HarnessError;

    fn fast() -> PollConfig {
        PollConfig {
            timeout: Duration::from_millis(500),
            initial_interval: Duration::from_millis(5),
            max_interval: Duration::from_millis(20),
            multiplier: 2.0,
        }
    }

    #[test]
    fn test_ready_after_a_few_attempts() {
        let mut calls = 0;
        let outcome = wait_until(&fast(), &CancelToken::new(), || {
            calls += 1;
            Ok(if calls == 3 { Some("done") } else { None })
        })
        .unwrap();
        assert_eq!(outcome, PollOutcome::Ready("done"));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_times_out() {
        let config = PollConfig {
            timeout: Duration::from_millis(30),
            ..fast()
        };
        let outcome: PollOutcome<()> = wait_until(&config, &CancelToken::new(), || Ok(None)).unwrap();
        match outcome {
            PollOutcome::TimedOut { attempts, elapsed } => {
                assert!(attempts >= 2);
                assert!(elapsed >= Duration::from_millis(30));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_cancelled_before_start() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let outcome: PollOutcome<()> = wait_until(&fast(), &cancel, || Ok(None)).unwrap();
        assert_eq!(outcome, PollOutcome::Cancelled { attempts: 0 });
    }

    #[test]
    fn test_cancelled_from_another_thread() {
        let cancel = CancelToken::new();
        let remote = cancel.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            remote.cancel();
        });
        let config = PollConfig::with_timeout(Duration::from_secs(10));
        let outcome: PollOutcome<()> = wait_until(&config, &cancel, || Ok(None)).unwrap();
        handle.join().unwrap();
        assert!(matches!(outcome, PollOutcome::Cancelled { .. }));
    }

    #[test]
    fn test_probe_error_stops_wait() {
        let result: Result<PollOutcome<()>> = wait_until(&fast(), &CancelToken::new(), || {
            Err(HarnessError::transport("http://x", "refused"))
        });
        assert!(result.unwrap_err().is_transport());
    }

    #[test]
    fn test_backoff_is_capped() {
        let config = fast();
        let mut interval = config.initial_interval;
        for _ in 0..10 {
            interval = config.next_interval(interval);
        }
        assert_eq!(interval, config.max_interval);
    }
}
