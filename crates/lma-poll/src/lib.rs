//! Bounded blocking polling for LMA integration assertions.
//!
//! `lma-poll` provides the [`wait`] primitive the harness uses to assert
//! that a metric, log entry, or alarm eventually reaches an expected state:
//! evaluate a predicate repeatedly until it becomes true or a deadline
//! elapses, sleeping on the calling thread between attempts.
//!
//! Passing `None` as the timeout turns [`wait`] into a single immediate
//! check: the predicate is evaluated exactly once and no sleeping occurs.
//! Callers across the harness rely on this to share one code path between
//! "is it true right now" probes and genuine waits.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use lma_poll::wait;
//!
//! let mut attempts = 0;
//! let remaining = wait(
//!     || {
//!         attempts += 1;
//!         attempts >= 3
//!     },
//!     Duration::from_millis(1),
//!     Some(Duration::from_secs(5)),
//!     "counter never reached 3",
//! )
//! .unwrap();
//! assert!(remaining <= Duration::from_secs(5));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

pub mod error;

pub use error::{PollError, Result};

/// Polls `predicate` until it returns true or `timeout` elapses.
///
/// With `timeout = Some(t)`: the predicate is evaluated at least once and
/// then repeatedly, sleeping `min(interval, time_left)` between attempts.
/// On the first true result the remaining time (`t - elapsed`, clamped to
/// zero) is returned. If the deadline passes first, the call fails with
/// [`PollError::Timeout`] carrying `timeout_msg`.
///
/// With `timeout = None`: the predicate is evaluated exactly once, no
/// sleeping occurs, and a false result is reported as
/// [`PollError::ConditionNotMet`]. This is deliberate dual-purpose
/// behavior, not a degenerate case.
///
/// This is a blocking, single-threaded spin loop; it never spawns.
///
/// # Errors
///
/// [`PollError::Timeout`] when the deadline elapses, or
/// [`PollError::ConditionNotMet`] for a failed immediate check.
pub fn wait<F>(
    mut predicate: F,
    interval: Duration,
    timeout: Option<Duration>,
    timeout_msg: impl Into<String>,
) -> Result<Duration>
where
    F: FnMut() -> bool,
{
    let Some(timeout) = timeout else {
        // Single immediate check.
        if predicate() {
            return Ok(Duration::ZERO);
        }
        return Err(PollError::ConditionNotMet {
            message: timeout_msg.into(),
        });
    };

    let started = Instant::now();
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        if predicate() {
            let remaining = timeout.saturating_sub(started.elapsed());
            debug!(attempt, ?remaining, "condition satisfied");
            return Ok(remaining);
        }

        let elapsed = started.elapsed();
        if elapsed >= timeout {
            debug!(attempt, ?timeout, "condition still false at deadline");
            return Err(PollError::Timeout {
                message: timeout_msg.into(),
                timeout,
            });
        }

        let time_left = timeout - elapsed;
        thread::sleep(interval.min(time_left));
    }
}
