//! Device link
//!
//! Pairs a [`SerialPort`] with the recovery policy the session should use, so
//! callers only see device-level outcomes.

use serde::{Deserialize, Serialize};

use crate::error::ElectronicsError;
use crate::outcome::ResultExt;
use crate::recovery::RecoveryPolicy;
use crate::transport::{
    read_bytes_from_serial_port, verify_response, write_bytes_to_serial_port, CallerContext,
    Driver, ExecutionContext, SerialPort,
};

/// Link configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Recovery policy applied to every exchange
    pub recovery: RecoveryPolicy,
}

/// A serial port plus its recovery policy
#[derive(Debug)]
pub struct SerialLink<D: Driver, C: ExecutionContext = CallerContext> {
    port: SerialPort<D, C>,
    config: LinkConfig,
}

impl<D: Driver, C: ExecutionContext> SerialLink<D, C> {
    /// Create a link
    pub fn new(port: SerialPort<D, C>, config: LinkConfig) -> Self {
        Self { port, config }
    }

    /// The underlying port
    pub fn port(&self) -> &SerialPort<D, C> {
        &self.port
    }

    /// Current configuration
    pub fn config(&self) -> LinkConfig {
        self.config
    }

    /// Change the recovery policy for subsequent exchanges
    pub fn set_recovery(&mut self, recovery: RecoveryPolicy) {
        self.config.recovery = recovery;
    }

    /// Read exactly `count` bytes
    pub fn read(&self, count: usize) -> Result<Vec<u8>, ElectronicsError> {
        self.config
            .recovery
            .run(|| read_bytes_from_serial_port(count, &self.port))
    }

    /// Write all of `bytes`
    pub fn write(&self, bytes: &[u8]) -> Result<(), ElectronicsError> {
        self.config
            .recovery
            .run(|| write_bytes_to_serial_port(bytes, &self.port))
    }

    /// Read `expected.len()` bytes and require them to equal `expected`
    pub fn read_expecting(&self, expected: &[u8]) -> Result<Vec<u8>, ElectronicsError> {
        self.config.recovery.run(|| {
            read_bytes_from_serial_port(expected.len(), &self.port)
                .then(verify_response(expected))
        })
    }

    /// Send `command` and read a `response_len`-byte reply.
    ///
    /// The write and the read are retried together as one exchange.
    pub fn query(&self, command: &[u8], response_len: usize) -> Result<Vec<u8>, ElectronicsError> {
        tracing::trace!(command_len = command.len(), response_len, "query");
        self.config.recovery.run(|| {
            write_bytes_to_serial_port(command, &self.port)
                .then(|()| read_bytes_from_serial_port(response_len, &self.port))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeBehavior, FakeDriver};

    #[test]
    fn test_config_default_is_restricted() {
        assert_eq!(LinkConfig::default().recovery, RecoveryPolicy::Restricted);
    }

    #[test]
    fn test_set_recovery() {
        let mut link = SerialLink::new(SerialPort::inline(FakeDriver::new(), 0), LinkConfig::default());
        link.set_recovery(RecoveryPolicy::Soft);
        assert_eq!(link.config().recovery, RecoveryPolicy::Soft);
    }

    #[test]
    fn test_query_stops_at_failed_write() {
        let driver = FakeDriver::new();
        driver.script_writes(FakeBehavior::BadStatus);
        let link = SerialLink::new(SerialPort::inline(driver, 0), LinkConfig::default());

        assert_eq!(link.query(b"Q", 4), Err(ElectronicsError::ElectronicsDisconnected));
        assert_eq!(link.port().driver().write_calls(), 1);
        assert_eq!(link.port().driver().read_calls(), 0);
    }
}
