//! Recovery policies
//!
//! Retry strategies that consume transport-level outcomes and produce
//! device-level ones. The policies hold no state, retry sequentially on the
//! calling thread and never retry more than once.
//!
//! The difference between [`soft_recovery`] and [`restricted_soft_recovery`]
//! is whether a timeout earns a second attempt.

use serde::{Deserialize, Serialize};

use crate::error::{CommunicationsError, ElectronicsError};

/// Run `command`, and run it exactly once more if the first attempt failed.
///
/// The second outcome is returned as-is, success or failure.
pub fn retry_once_on_failure<T, E, F>(mut command: F) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
{
    match command() {
        Ok(value) => Ok(value),
        Err(_) => {
            tracing::debug!("first attempt failed, retrying once");
            command()
        }
    }
}

/// Retry once on any failure, then classify what is left.
///
/// A timeout on the first attempt still gets its retry before being reported
/// as [`ElectronicsError::ElectronicsDisconnected`].
pub fn soft_recovery<T, F>(command: F) -> Result<T, ElectronicsError>
where
    F: FnMut() -> Result<T, CommunicationsError>,
{
    retry_once_on_failure(command).map_err(|error| {
        let classified = ElectronicsError::from(error);
        tracing::warn!(%classified, "soft recovery gave up");
        classified
    })
}

/// Retry once only for byte-count or content mismatches.
///
/// A timeout is reported as [`ElectronicsError::ElectronicsDisconnected`]
/// after a single attempt. Any failure of the second attempt, whatever its
/// kind, becomes [`ElectronicsError::UnrecoverableCommunicationNoise`].
pub fn restricted_soft_recovery<T, F>(mut command: F) -> Result<T, ElectronicsError>
where
    F: FnMut() -> Result<T, CommunicationsError>,
{
    match command() {
        Ok(value) => Ok(value),
        Err(CommunicationsError::ReadWriteTimeout) => {
            tracing::warn!("timeout, not retrying");
            Err(ElectronicsError::ElectronicsDisconnected)
        }
        Err(
            error @ (CommunicationsError::WrongByteCount { .. }
            | CommunicationsError::CorruptedResponse { .. }),
        ) => {
            tracing::debug!(%error, "transfer mismatch, retrying once");
            match command() {
                Ok(value) => Ok(value),
                Err(error) => {
                    tracing::warn!(%error, "retry failed");
                    Err(ElectronicsError::UnrecoverableCommunicationNoise)
                }
            }
        }
    }
}

/// Selects which recovery function a [`SerialLink`](crate::link::SerialLink) applies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryPolicy {
    /// [`soft_recovery`]: retry once on any failure
    Soft,
    /// [`restricted_soft_recovery`]: never retry a timeout
    #[default]
    Restricted,
}

impl RecoveryPolicy {
    /// Run `command` under this policy
    pub fn run<T, F>(self, command: F) -> Result<T, ElectronicsError>
    where
        F: FnMut() -> Result<T, CommunicationsError>,
    {
        match self {
            RecoveryPolicy::Soft => soft_recovery(command),
            RecoveryPolicy::Restricted => restricted_soft_recovery(command),
        }
    }
}
