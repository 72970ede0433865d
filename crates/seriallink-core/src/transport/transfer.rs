//! Byte-count-checked transfers

use super::{Driver, ExecutionContext, RawTransferFn, SerialPort};
use crate::error::CommunicationsError;
use crate::outcome::ResultExt;

/// Run one raw transfer of `length` bytes through the port's execution context.
///
/// A non-OK status becomes [`CommunicationsError::ReadWriteTimeout`]; a short
/// or long transfer becomes [`CommunicationsError::WrongByteCount`]. On success
/// the buffer is returned as the driver left it.
pub fn transfer<D, C>(
    port: &SerialPort<D, C>,
    mut buffer: Vec<u8>,
    length: usize,
    function: RawTransferFn<D::Handle>,
) -> Result<Vec<u8>, CommunicationsError>
where
    D: Driver,
    C: ExecutionContext,
{
    let handle = port.shared_handle();
    let (completion, buffer) = port.context().run(move || {
        let completion = function(&*handle, buffer.as_mut_slice(), length);
        (completion, buffer)
    });

    tracing::trace!(
        status = %completion.status,
        requested = length,
        transferred = completion.transferred,
        "raw transfer complete"
    );

    if !completion.status.is_ok() {
        return Err(CommunicationsError::ReadWriteTimeout);
    }

    if completion.transferred != length {
        return Err(CommunicationsError::WrongByteCount {
            expected: length,
            received: completion.transferred,
        });
    }

    Ok(buffer)
}

/// Write all of `bytes`, keeping only whether it worked
pub fn write_bytes_to_serial_port<D, C>(
    bytes: &[u8],
    port: &SerialPort<D, C>,
) -> Result<(), CommunicationsError>
where
    D: Driver,
    C: ExecutionContext,
{
    transfer(
        port,
        bytes.to_vec(),
        bytes.len(),
        port.driver().write_function(),
    )
    .ignore_value()
}

/// Read exactly `count` bytes
pub fn read_bytes_from_serial_port<D, C>(
    count: usize,
    port: &SerialPort<D, C>,
) -> Result<Vec<u8>, CommunicationsError>
where
    D: Driver,
    C: ExecutionContext,
{
    transfer(port, vec![0u8; count], count, port.driver().read_function())
}

/// Validator for chaining after a read: the payload must equal `expected`.
///
/// ```rust,ignore
/// let ack = read_bytes_from_serial_port(2, &port).then(verify_response(b"OK"));
/// ```
pub fn verify_response(
    expected: &[u8],
) -> impl FnOnce(Vec<u8>) -> Result<Vec<u8>, CommunicationsError> {
    let expected = expected.to_vec();
    move |received| {
        if received == expected {
            Ok(received)
        } else {
            Err(CommunicationsError::CorruptedResponse { expected, received })
        }
    }
}
