//! Error types for the lma-poll crate.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while polling for a condition.
#[derive(Debug, Error)]
pub enum PollError {
    /// The deadline elapsed before the predicate became true.
    #[error("timed out after {timeout:?}: {message}")]
    Timeout {
        /// The caller-supplied description of what was being waited for.
        message: String,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// A single immediate check (no timeout) found the predicate false.
    #[error("condition not met: {message}")]
    ConditionNotMet {
        /// The caller-supplied description of the condition.
        message: String,
    },
}

/// Result type for polling operations.
pub type Result<T> = std::result::Result<T, PollError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_timeout() {
        let err = PollError::Timeout {
            message: "nagios never reported OK".to_string(),
            timeout: Duration::from_secs(30),
        };
        assert_eq!(
            err.to_string(),
            "timed out after 30s: nagios never reported OK"
        );
    }

    #[test]
    fn error_display_condition_not_met() {
        let err = PollError::ConditionNotMet {
            message: "service is down".to_string(),
        };
        assert_eq!(err.to_string(), "condition not met: service is down");
    }
}
