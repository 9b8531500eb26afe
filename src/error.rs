//! Custom error types for the application.
//!
//! This module defines the primary error type, `ScopeError`, for the entire
//! crate. Using the `thiserror` crate, it provides a centralized and
//! consistent way to handle the failure classes of the acquisition pipeline:
//!
//! - **`Calibration`**: a reference characterization that cannot produce a
//!   usable code-to-voltage curve (non-monotonic points, out-of-range codes).
//! - **`Configuration`**: semantic errors in loaded settings that pass
//!   parsing but are logically invalid, caught during the validation step.
//! - **`SourceNotConfigured`**: an acquisition round requested before the
//!   sample source received its first `configure` call.
//! - **`AcquisitionTimeout` / `Hardware`**: a sampling round that did not
//!   complete. These are fatal for the round only; the controller discards
//!   the buffer and restarts the pipeline rather than crashing.
//! - **`Io`**: transport failures on the client link.
//!
//! By using `#[from]`, `ScopeError` can be seamlessly created from underlying
//! error types, simplifying error handling with the `?` operator.

use std::time::Duration;
use thiserror::Error;

/// Convenience alias for results using the crate error type.
pub type ScopeResult<T> = std::result::Result<T, ScopeError>;

/// Errors produced by the acquisition, calibration, and transport layers.
#[derive(Error, Debug)]
pub enum ScopeError {
    /// Reference characterization cannot produce a usable curve.
    #[error("Calibration error: {0}")]
    Calibration(String),

    /// Loaded settings parsed but failed semantic validation.
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// An acquisition round was requested before the first `configure`.
    #[error("Sample source used before configure()")]
    SourceNotConfigured,

    /// A sampling round did not complete within its deadline.
    #[error("Acquisition round timed out after {0:?}")]
    AcquisitionTimeout(Duration),

    /// The sample source reported a converter or transfer fault.
    #[error("Acquisition hardware fault: {0}")]
    Hardware(String),

    /// Transport failure on the client link.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A serial link was requested from a build without the feature.
    #[error("Serial support not enabled. Rebuild with --features serial")]
    SerialFeatureDisabled,
}

impl ScopeError {
    /// True for faults that poison only the current acquisition round.
    ///
    /// The controller responds to these by discarding the round's buffer and
    /// restarting the sampling pipeline; anything else ends the session.
    pub fn is_round_fault(&self) -> bool {
        matches!(
            self,
            ScopeError::AcquisitionTimeout(_)
                | ScopeError::Hardware(_)
                | ScopeError::SourceNotConfigured
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_formats_with_duration() {
        let err = ScopeError::AcquisitionTimeout(Duration::from_millis(250));
        assert!(err.to_string().contains("250ms"));
    }

    #[test]
    fn io_errors_convert_via_from() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "link dropped");
        let err: ScopeError = io.into();
        match err {
            ScopeError::Io(inner) => {
                assert_eq!(inner.kind(), std::io::ErrorKind::BrokenPipe);
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn round_faults_are_classified() {
        assert!(ScopeError::AcquisitionTimeout(Duration::from_secs(1)).is_round_fault());
        assert!(ScopeError::Hardware("dma underrun".into()).is_round_fault());
        assert!(!ScopeError::Calibration("bad points".into()).is_round_fault());
        assert!(!ScopeError::Configuration("bad rate".into()).is_round_fault());
    }
}
