//! Hardware driver backed by the `serialport` crate
//!
//! The port must already be opened and configured by the caller; this module
//! only moves bytes. Each raw call blocks until `requested` bytes have moved or
//! the port's own timeout fires.

use std::io::{ErrorKind, Read, Write};
use std::sync::{Arc, Mutex};

use super::{Completion, Driver, ExecutionContext, RawTransferFn, SerialPort, Status};

/// Handle type for [`SerialportDriver`]
pub type PortHandle = Mutex<Box<dyn serialport::SerialPort>>;

/// Driver issuing blocking reads and writes on a `serialport` handle
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialportDriver;

impl SerialportDriver {
    /// Wrap an opened port so its calls run on `context`
    pub fn bind<C: ExecutionContext>(
        port: Box<dyn serialport::SerialPort>,
        context: C,
    ) -> SerialPort<SerialportDriver, C> {
        SerialPort::new(SerialportDriver, Mutex::new(port), context)
    }
}

impl Driver for SerialportDriver {
    type Handle = PortHandle;

    fn read_function(&self) -> RawTransferFn<PortHandle> {
        Arc::new(raw_read)
    }

    fn write_function(&self) -> RawTransferFn<PortHandle> {
        Arc::new(raw_write)
    }
}

fn raw_read(handle: &PortHandle, buffer: &mut [u8], requested: usize) -> Completion {
    let Ok(mut port) = handle.lock() else {
        return Completion::failed(Status::INVALID_HANDLE);
    };
    let Some(target) = buffer.get_mut(..requested) else {
        return Completion::failed(Status::OTHER_ERROR);
    };
    read_into(&mut **port, target)
}

fn raw_write(handle: &PortHandle, buffer: &mut [u8], requested: usize) -> Completion {
    let Ok(mut port) = handle.lock() else {
        return Completion::failed(Status::INVALID_HANDLE);
    };
    let Some(source) = buffer.get(..requested) else {
        return Completion::failed(Status::OTHER_ERROR);
    };
    write_from(&mut **port, source)
}

/// Fill `target` from `reader`, stopping early only on a timeout after some data
fn read_into<R: Read + ?Sized>(reader: &mut R, target: &mut [u8]) -> Completion {
    let requested = target.len();
    let mut filled = 0;
    while filled < requested {
        match reader.read(&mut target[filled..]) {
            // Some backends signal a timeout as an empty read.
            Ok(0) if filled == 0 => return Completion::failed(Status::IO_ERROR),
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            // Partial data is reported as a short transfer, not a timeout.
            Err(e) if e.kind() == ErrorKind::TimedOut && filled > 0 => break,
            Err(e) => {
                tracing::debug!(error = %e, filled, requested, "serial read failed");
                return Completion::failed(Status::IO_ERROR);
            }
        }
    }

    Completion::ok(filled)
}

/// Send all of `source` to `writer`, stopping early only on a timeout after some data
fn write_from<W: Write + ?Sized>(writer: &mut W, source: &[u8]) -> Completion {
    let requested = source.len();
    let mut sent = 0;
    while sent < requested {
        match writer.write(&source[sent..]) {
            Ok(0) if sent == 0 => return Completion::failed(Status::IO_ERROR),
            Ok(0) => break,
            Ok(n) => sent += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == ErrorKind::TimedOut && sent > 0 => break,
            Err(e) => {
                tracing::debug!(error = %e, sent, requested, "serial write failed");
                return Completion::failed(Status::IO_ERROR);
            }
        }
    }

    Completion::ok(sent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io;

    /// Reader/writer replaying scripted results, one per call
    struct Scripted(VecDeque<io::Result<Vec<u8>>>);

    impl Scripted {
        fn new(steps: Vec<io::Result<Vec<u8>>>) -> Self {
            Self(steps.into())
        }

        fn next(&mut self) -> io::Result<Vec<u8>> {
            self.0
                .pop_front()
                .unwrap_or_else(|| Err(io::Error::from(ErrorKind::TimedOut)))
        }
    }

    impl Read for Scripted {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let chunk = self.next()?;
            buf[..chunk.len()].copy_from_slice(&chunk);
            Ok(chunk.len())
        }
    }

    impl Write for Scripted {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(self.next()?.len().min(buf.len()))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn timed_out() -> io::Result<Vec<u8>> {
        Err(io::Error::from(ErrorKind::TimedOut))
    }

    #[test]
    fn test_read_timeout_without_data_is_io_error() {
        let mut reader = Scripted::new(vec![timed_out()]);
        let mut target = [0u8; 4];
        assert_eq!(
            read_into(&mut reader, &mut target),
            Completion::failed(Status::IO_ERROR)
        );
    }

    #[test]
    fn test_empty_read_without_data_is_io_error() {
        let mut reader = Scripted::new(vec![Ok(vec![])]);
        let mut target = [0u8; 4];
        assert_eq!(
            read_into(&mut reader, &mut target),
            Completion::failed(Status::IO_ERROR)
        );
    }

    #[test]
    fn test_read_short_after_partial_data() {
        let mut reader = Scripted::new(vec![Ok(vec![1, 2]), timed_out()]);
        let mut target = [0u8; 4];
        assert_eq!(read_into(&mut reader, &mut target), Completion::ok(2));
        assert_eq!(target, [1, 2, 0, 0]);

        let mut reader = Scripted::new(vec![Ok(vec![1]), Ok(vec![])]);
        assert_eq!(read_into(&mut reader, &mut [0u8; 3]), Completion::ok(1));
    }

    #[test]
    fn test_read_retries_interrupted_and_joins_chunks() {
        let mut reader = Scripted::new(vec![
            Ok(vec![1]),
            Err(io::Error::from(ErrorKind::Interrupted)),
            Ok(vec![2, 3]),
        ]);
        let mut target = [0u8; 3];
        assert_eq!(read_into(&mut reader, &mut target), Completion::ok(3));
        assert_eq!(target, [1, 2, 3]);
    }

    #[test]
    fn test_read_other_error_is_io_error() {
        let mut reader = Scripted::new(vec![
            Ok(vec![1]),
            Err(io::Error::from(ErrorKind::BrokenPipe)),
        ]);
        assert_eq!(
            read_into(&mut reader, &mut [0u8; 2]),
            Completion::failed(Status::IO_ERROR)
        );
    }

    #[test]
    fn test_zero_length_read_does_not_touch_port() {
        let mut reader = Scripted::new(vec![]);
        assert_eq!(read_into(&mut reader, &mut []), Completion::ok(0));
        assert_eq!(reader.0.len(), 0);
    }

    #[test]
    fn test_write_status_mapping() {
        let mut writer = Scripted::new(vec![Ok(vec![0; 2]), Ok(vec![0; 2])]);
        assert_eq!(write_from(&mut writer, &[1, 2, 3, 4]), Completion::ok(4));

        let mut writer = Scripted::new(vec![Ok(vec![0; 3]), timed_out()]);
        assert_eq!(write_from(&mut writer, &[1, 2, 3, 4]), Completion::ok(3));

        let mut writer = Scripted::new(vec![timed_out()]);
        assert_eq!(
            write_from(&mut writer, &[1, 2]),
            Completion::failed(Status::IO_ERROR)
        );

        let mut writer = Scripted::new(vec![Ok(vec![])]);
        assert_eq!(
            write_from(&mut writer, &[1, 2]),
            Completion::failed(Status::IO_ERROR)
        );
    }

    #[cfg(unix)]
    mod pty {
        use crate::error::CommunicationsError;
        use crate::transport::{read_bytes_from_serial_port, CallerContext, SerialportDriver};
        use serialport::{SerialPort as _, TTYPort};
        use std::io::Write;
        use std::time::Duration;

        fn pty_pair() -> (TTYPort, crate::transport::SerialPort<SerialportDriver, CallerContext>) {
            let (master, mut slave) = TTYPort::pair().expect("Should open a pty pair");
            slave
                .set_timeout(Duration::from_millis(100))
                .expect("Should set timeout");
            (master, SerialportDriver::bind(Box::new(slave), CallerContext))
        }

        #[test]
        fn test_no_data_is_timeout() {
            let (_master, port) = pty_pair();
            assert_eq!(
                read_bytes_from_serial_port(4, &port),
                Err(CommunicationsError::ReadWriteTimeout)
            );
        }

        #[test]
        fn test_partial_data_is_wrong_byte_count() {
            let (mut master, port) = pty_pair();
            master.write_all(&[1, 2]).unwrap();
            assert_eq!(
                read_bytes_from_serial_port(4, &port),
                Err(CommunicationsError::WrongByteCount {
                    expected: 4,
                    received: 2
                })
            );
        }

        #[test]
        fn test_full_read() {
            let (mut master, port) = pty_pair();
            master.write_all(&[5, 6, 7, 8]).unwrap();
            assert_eq!(read_bytes_from_serial_port(4, &port), Ok(vec![5, 6, 7, 8]));
        }
    }
}
