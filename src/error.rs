//! # Watchdog errors.
//!
//! All fallible operations in the crate return [`WdtError`]. Variants
//! follow the failure surfaces of the supervisor:
//!
//! - validation: [`WdtError::InvalidArgument`]
//! - registry: [`WdtError::CapacityExceeded`], [`WdtError::NotFound`]
//! - lifecycle: [`WdtError::AlreadyExpired`]
//! - control channel: [`WdtError::NotSupported`], [`WdtError::TransportFault`]
//!
//! ## Rules
//!
//! - Expiry is terminal: once a dog has left the alive state, feeding and
//!   reprogramming fail with [`WdtError::AlreadyExpired`].
//! - Unknown control requests are reported, never guessed at.

use thiserror::Error;

use crate::core::DogId;

/// Error type for watchdog operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum WdtError {
    /// A timeout value was outside the accepted range.
    ///
    /// Carries the rejected value as given by the caller, which may be
    /// negative when it arrived over the control channel.
    #[error("timeout {seconds}s outside accepted range [1, 65535]")]
    InvalidArgument {
        /// The rejected timeout value, in seconds.
        seconds: i64,
    },

    /// The registry is full and no further dog can be created.
    #[error("dog registry full ({capacity} slots)")]
    CapacityExceeded {
        /// Configured registry capacity.
        capacity: usize,
    },

    /// The dog has expired or was stopped; the operation needs a live dog.
    #[error("dog {id} is no longer alive")]
    AlreadyExpired {
        /// Identifier of the dead dog.
        id: DogId,
    },

    /// No dog with this identifier is registered.
    #[error("no dog with id {id}")]
    NotFound {
        /// The unknown identifier.
        id: DogId,
    },

    /// The control channel received a request code this supervisor does
    /// not implement.
    #[error("unsupported control request {cmd:#06x}")]
    NotSupported {
        /// Raw request code as received.
        cmd: u32,
    },

    /// The control channel itself failed (short read, missing argument).
    #[error("control transport fault: {0}")]
    TransportFault(#[from] std::io::Error),
}

impl WdtError {
    /// Stable machine-readable label for logs and metrics.
    ///
    /// ```rust
    /// use softwdt::WdtError;
    ///
    /// let err = WdtError::InvalidArgument { seconds: -1 };
    /// assert_eq!(err.as_label(), "invalid_argument");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            WdtError::InvalidArgument { .. } => "invalid_argument",
            WdtError::CapacityExceeded { .. } => "capacity_exceeded",
            WdtError::AlreadyExpired { .. } => "already_expired",
            WdtError::NotFound { .. } => "not_found",
            WdtError::NotSupported { .. } => "not_supported",
            WdtError::TransportFault(_) => "transport_fault",
        }
    }

    /// Human-oriented message (alias for the `Display` form).
    pub fn as_message(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        let cases: Vec<(WdtError, &str)> = vec![
            (WdtError::InvalidArgument { seconds: 65537 }, "invalid_argument"),
            (WdtError::CapacityExceeded { capacity: 4 }, "capacity_exceeded"),
            (WdtError::AlreadyExpired { id: 7 }, "already_expired"),
            (WdtError::NotFound { id: 9 }, "not_found"),
            (WdtError::NotSupported { cmd: 0x8004 }, "not_supported"),
            (
                WdtError::TransportFault(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "missing argument",
                )),
                "transport_fault",
            ),
        ];
        for (err, label) in cases {
            assert_eq!(err.as_label(), label, "label mismatch for {err}");
        }
    }

    #[test]
    fn test_display_carries_the_rejected_value() {
        let err = WdtError::InvalidArgument { seconds: -1 };
        assert!(
            err.to_string().contains("-1"),
            "display should quote the rejected value: {err}"
        );
    }

    #[test]
    fn test_transport_fault_wraps_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read");
        let err = WdtError::from(io);
        assert!(matches!(err, WdtError::TransportFault(_)));
    }
}
