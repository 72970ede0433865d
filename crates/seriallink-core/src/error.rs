//! Error taxonomy
//!
//! Two closed sets of failures:
//! - [`CommunicationsError`]: what the raw transfer call observed
//! - [`ElectronicsError`]: what a recovery policy concluded about the device
//!
//! Reclassification from the first to the second is one-way and lossy.

use thiserror::Error;

/// Transport-level failures detected at the raw byte-transfer call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommunicationsError {
    /// The driver reported a non-OK status
    #[error("Read/write timeout")]
    ReadWriteTimeout,

    /// The driver reported success but moved the wrong number of bytes
    #[error("Wrong byte count: expected {expected}, received {received}")]
    WrongByteCount {
        /// Bytes requested
        expected: usize,
        /// Bytes the driver reported as transferred
        received: usize,
    },

    /// The payload arrived intact in size but not in content.
    ///
    /// Never raised by the read/write path; see
    /// [`verify_response`](crate::transport::verify_response).
    #[error("Corrupted response: expected {expected:02x?}, received {received:02x?}")]
    CorruptedResponse {
        /// Bytes the validator expected
        expected: Vec<u8>,
        /// Bytes actually read
        received: Vec<u8>,
    },
}

/// Device-level failures, produced only by recovery policies
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElectronicsError {
    /// Timeouts persisted; the device is assumed unplugged or powered off
    #[error("Electronics disconnected")]
    ElectronicsDisconnected,

    /// Byte-count or content mismatches persisted
    #[error("Unrecoverable communication noise")]
    UnrecoverableCommunicationNoise,
}

impl From<CommunicationsError> for ElectronicsError {
    fn from(error: CommunicationsError) -> Self {
        match error {
            CommunicationsError::ReadWriteTimeout => ElectronicsError::ElectronicsDisconnected,
            CommunicationsError::WrongByteCount { .. }
            | CommunicationsError::CorruptedResponse { .. } => {
                ElectronicsError::UnrecoverableCommunicationNoise
            }
        }
    }
}

/// Errors that can be shown to an operator
pub trait PresentableError {
    /// Short headline for a dialog or status bar
    fn error_title(&self) -> String;

    /// Longer explanation with a suggested action
    fn error_info(&self) -> String;
}

impl PresentableError for ElectronicsError {
    fn error_title(&self) -> String {
        match self {
            ElectronicsError::ElectronicsDisconnected => "Device disconnected".to_string(),
            ElectronicsError::UnrecoverableCommunicationNoise => {
                "Communication error".to_string()
            }
        }
    }

    fn error_info(&self) -> String {
        match self {
            ElectronicsError::ElectronicsDisconnected => {
                "The device stopped responding. Check that it is powered and the cable is connected."
                    .to_string()
            }
            ElectronicsError::UnrecoverableCommunicationNoise => {
                "Responses from the device were garbled after a retry. Check the cable for interference."
                    .to_string()
            }
        }
    }
}

impl PresentableError for CommunicationsError {
    fn error_title(&self) -> String {
        match self {
            CommunicationsError::ReadWriteTimeout => "Serial timeout".to_string(),
            CommunicationsError::WrongByteCount { .. } => "Incomplete transfer".to_string(),
            CommunicationsError::CorruptedResponse { .. } => "Corrupted response".to_string(),
        }
    }

    fn error_info(&self) -> String {
        self.to_string()
    }
}
