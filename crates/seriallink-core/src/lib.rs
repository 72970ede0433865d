//! # seriallink Core Library
//!
//! Typed failures and recovery policies for fixed-size, byte-exact exchanges
//! with a peripheral device over a serial link.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Result composition helpers (`then`, infix bind, `ignore_value`)
//! - A two-tier error taxonomy: transport-level and device-level
//! - Retry policies that turn transport failures into device-level outcomes
//! - Byte-count-checked serial reads and writes
//! - Execution contexts that pin raw driver calls to a single thread
//!
//! ## Example
//!
//! ```rust,ignore
//! use seriallink_core::prelude::*;
//!
//! let port = SerialPort::new(driver, handle, DedicatedThread::spawn("serial")?);
//! let reply = restricted_soft_recovery(|| read_bytes_from_serial_port(4, &port))?;
//! ```

pub mod error;
pub mod fake;
pub mod link;
pub mod outcome;
pub mod recovery;
pub mod transport;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{CommunicationsError, ElectronicsError, PresentableError};
    pub use crate::link::{LinkConfig, SerialLink};
    pub use crate::outcome::{bind, Chain, ResultExt};
    pub use crate::recovery::{
        restricted_soft_recovery, retry_once_on_failure, soft_recovery, RecoveryPolicy,
    };
    pub use crate::transport::{
        read_bytes_from_serial_port, verify_response, write_bytes_to_serial_port, CallerContext,
        Completion, DedicatedThread, Driver, ExecutionContext, SerialPort, SerializedContext,
        Status,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
