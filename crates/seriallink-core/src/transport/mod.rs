//! Serial transport
//!
//! The narrow contract with the device driver and the byte-count-checked
//! transfer built on top of it.
//!
//! A driver hands out raw transfer functions shaped like the classic D2XX
//! calls: `(handle, buffer, requested length) -> (status, bytes transferred)`.
//! Every call runs on the port's [`ExecutionContext`].

pub mod context;
pub mod serial;
mod transfer;

use std::fmt;
use std::sync::Arc;

pub use context::{CallerContext, DedicatedThread, ExecutionContext, SerializedContext};
pub use serial::SerialportDriver;
pub use transfer::{
    read_bytes_from_serial_port, transfer, verify_response, write_bytes_to_serial_port,
};

/// Driver status code; [`Status::OK`] is the only success value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(pub u32);

impl Status {
    /// Transfer completed
    pub const OK: Status = Status(0);
    /// Handle does not refer to an open device
    pub const INVALID_HANDLE: Status = Status(1);
    /// Device not present
    pub const DEVICE_NOT_FOUND: Status = Status(2);
    /// Device present but not opened
    pub const DEVICE_NOT_OPENED: Status = Status(3);
    /// Low-level I/O failure, including timeouts
    pub const IO_ERROR: Status = Status(4);
    /// Anything else
    pub const OTHER_ERROR: Status = Status(18);

    /// Whether the driver reported success
    pub fn is_ok(self) -> bool {
        self == Status::OK
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Status::OK => write!(f, "OK"),
            Status::INVALID_HANDLE => write!(f, "INVALID_HANDLE"),
            Status::DEVICE_NOT_FOUND => write!(f, "DEVICE_NOT_FOUND"),
            Status::DEVICE_NOT_OPENED => write!(f, "DEVICE_NOT_OPENED"),
            Status::IO_ERROR => write!(f, "IO_ERROR"),
            Status::OTHER_ERROR => write!(f, "OTHER_ERROR"),
            Status(code) => write!(f, "status {}", code),
        }
    }
}

/// What a raw transfer call reports back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// Driver status
    pub status: Status,
    /// Bytes the driver claims to have read or written
    pub transferred: usize,
}

impl Completion {
    /// Successful call that moved `transferred` bytes
    pub fn ok(transferred: usize) -> Self {
        Self {
            status: Status::OK,
            transferred,
        }
    }

    /// Failed call
    pub fn failed(status: Status) -> Self {
        Self {
            status,
            transferred: 0,
        }
    }
}

/// Raw transfer function: `(handle, buffer, requested length) -> completion`.
///
/// Reads fill `buffer`; writes send from it.
pub type RawTransferFn<H> = Arc<dyn Fn(&H, &mut [u8], usize) -> Completion + Send + Sync>;

/// Capability a device driver provides
pub trait Driver: Send + Sync {
    /// Open connection handle, used only for identity
    type Handle: Send + Sync + 'static;

    /// Function performing a raw read
    fn read_function(&self) -> RawTransferFn<Self::Handle>;

    /// Function performing a raw write
    fn write_function(&self) -> RawTransferFn<Self::Handle>;
}

/// An open device connection bound to its execution context
pub struct SerialPort<D: Driver, C: ExecutionContext = CallerContext> {
    driver: D,
    handle: Arc<D::Handle>,
    context: C,
}

impl<D: Driver, C: ExecutionContext> SerialPort<D, C> {
    /// Bind a driver and an open handle to the context its calls must run on
    pub fn new(driver: D, handle: D::Handle, context: C) -> Self {
        Self {
            driver,
            handle: Arc::new(handle),
            context,
        }
    }

    /// The driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// The device handle
    pub fn handle(&self) -> &D::Handle {
        &self.handle
    }

    /// The execution context raw calls are dispatched to
    pub fn context(&self) -> &C {
        &self.context
    }

    pub(crate) fn shared_handle(&self) -> Arc<D::Handle> {
        Arc::clone(&self.handle)
    }
}

impl<D: Driver> SerialPort<D, CallerContext> {
    /// Port whose raw calls run on the calling thread
    pub fn inline(driver: D, handle: D::Handle) -> Self {
        Self::new(driver, handle, CallerContext)
    }
}

impl<D, C> fmt::Debug for SerialPort<D, C>
where
    D: Driver + fmt::Debug,
    C: ExecutionContext + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialPort")
            .field("driver", &self.driver)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
