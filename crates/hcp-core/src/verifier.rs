//! Sync verification
//!
//! After a ManifestWork is patched on the service cluster, the change reaches
//! the management cluster asynchronously. The verifier polls the management
//! cluster on a fixed cadence until the required annotations show up, the
//! deadline passes, or the run is cancelled.
//!
//! ```text
//! Polling ──satisfied──▶ Satisfied
//!    │
//!    ├──deadline──▶ TimedOut
//!    └──cancel────▶ Cancelled
//! ```
//!
//! The deadline is checked before each fetch (is this tick still eligible?)
//! and after each negative or failed fetch, so the last tick at or before the
//! deadline is always evaluated. Cancellation wins over a simultaneous
//! timeout.

use crate::cancel::CancelSignal;
use crate::config::MigrationConfig;
use crate::error::{StoreError, SyncError};
use std::future::Future;
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Shortest poll cadence; smaller intervals are raised to this
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Successful verification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    /// Fetches performed, including the satisfied one
    pub attempts: u32,
    /// Time from start until the satisfied fetch returned
    pub elapsed: Duration,
}

/// Bounded, cancellable poller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncVerifier {
    poll_interval: Duration,
    timeout: Duration,
}

impl SyncVerifier {
    /// Create verifier
    ///
    /// A zero `poll_interval` is raised to [`MIN_POLL_INTERVAL`].
    #[inline]
    #[must_use]
    pub fn new(poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
            timeout,
        }
    }

    /// Create verifier from configuration
    #[inline]
    #[must_use]
    pub fn from_config(config: &MigrationConfig) -> Self {
        Self::new(config.poll_interval(), config.sync_timeout())
    }

    /// Poll cadence
    #[inline]
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Deadline measured from the start of a wait
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Poll `fetch` until `is_satisfied` holds
    ///
    /// The first fetch happens one poll interval after the call. A failed
    /// fetch counts as "not yet" for that tick.
    ///
    /// # Errors
    /// - `SyncError::Cancelled` if `cancel` fires before a terminal condition
    /// - `SyncError::TimedOut` if no fetch up to the deadline was satisfied
    /// - `SyncError::OutOfRange` if the deadline is not representable
    pub async fn wait_until<T, F, Fut, P>(
        &self,
        mut fetch: F,
        is_satisfied: P,
        cancel: &CancelSignal,
    ) -> Result<SyncReport, SyncError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
        P: Fn(&T) -> bool,
    {
        let start = Instant::now();
        let Some(deadline) = self.deadline_from(start) else {
            warn!(
                poll_interval = ?self.poll_interval,
                timeout = ?self.timeout,
                "Sync schedule out of range"
            );
            return Err(SyncError::OutOfRange {
                poll_interval: self.poll_interval,
                timeout: self.timeout,
            });
        };
        let mut ticker = time::interval_at(start + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut attempts: u32 = 0;
        let mut last_error: Option<String> = None;

        loop {
            let scheduled = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(SyncError::Cancelled),
                scheduled = ticker.tick() => scheduled,
            };

            if scheduled > deadline {
                return Err(self.timed_out(attempts, last_error));
            }

            attempts += 1;
            let fetched = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(SyncError::Cancelled),
                fetched = fetch() => fetched,
            };

            match fetched {
                Ok(value) if is_satisfied(&value) => {
                    let elapsed = start.elapsed();
                    info!(attempt = attempts, elapsed_secs = elapsed.as_secs(), "Sync verified");
                    return Ok(SyncReport { attempts, elapsed });
                }
                Ok(_) => {
                    debug!(attempt = attempts, "Annotations not yet synced");
                }
                Err(e) => {
                    warn!(attempt = attempts, error = %e, "Failed to fetch record during sync");
                    last_error = Some(e.to_string());
                }
            }

            if cancel.is_cancelled() {
                return Err(SyncError::Cancelled);
            }
            if Instant::now() >= deadline {
                return Err(self.timed_out(attempts, last_error));
            }
        }
    }

    /// Deadline of a wait starting at `start`
    ///
    /// The ticker looks up to two intervals past the deadline, so that span
    /// must be representable too.
    fn deadline_from(&self, start: Instant) -> Option<Instant> {
        let horizon = self.timeout.checked_add(self.poll_interval.checked_mul(2)?)?;
        start.checked_add(horizon)?;
        start.checked_add(self.timeout)
    }

    fn timed_out(&self, attempts: u32, last_error: Option<String>) -> SyncError {
        SyncError::TimedOut {
            timeout: self.timeout,
            attempts,
            last_error,
        }
    }
}

impl Default for SyncVerifier {
    fn default() -> Self {
        Self::from_config(&MigrationConfig::default())
    }
}
