//! Scripted fake driver
//!
//! Simulates a device for tests and demos without hardware. Reads and writes
//! each follow their own script of [`FakeBehavior`]s: every raw call consumes
//! the next entry, and the last entry stays in effect once reached.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::transport::{Completion, Driver, RawTransferFn, Status};

/// Handle type for [`FakeDriver`]
pub type FakeHandle = u32;

/// How the fake device answers one raw call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeBehavior {
    /// Report success for the full requested length, leaving the buffer alone
    GoodReadWrite,
    /// Report a driver failure
    BadStatus,
    /// Report success but claim this many bytes moved
    WrongByteCount(usize),
    /// Copy these bytes into the buffer and report their length
    ResponseWithCustomBytes(Vec<u8>),
    /// Fail unless the outgoing buffer matches these bytes exactly.
    ///
    /// A request of a different length reports success with the length of
    /// the expected bytes.
    VerifyOutputBytes(Vec<u8>),
}

impl FakeBehavior {
    /// Raw transfer function implementing this behaviour
    pub fn into_function(self) -> RawTransferFn<FakeHandle> {
        match self {
            FakeBehavior::GoodReadWrite => {
                Arc::new(|_: &FakeHandle, _: &mut [u8], requested: usize| Completion::ok(requested))
            }
            FakeBehavior::BadStatus => Arc::new(|_: &FakeHandle, _: &mut [u8], _: usize| {
                Completion::failed(Status::OTHER_ERROR)
            }),
            FakeBehavior::WrongByteCount(count) => {
                Arc::new(move |_: &FakeHandle, _: &mut [u8], _: usize| Completion::ok(count))
            }
            FakeBehavior::ResponseWithCustomBytes(bytes) => {
                Arc::new(move |_: &FakeHandle, buffer: &mut [u8], _: usize| {
                    let len = bytes.len().min(buffer.len());
                    buffer[..len].copy_from_slice(&bytes[..len]);
                    Completion::ok(bytes.len())
                })
            }
            FakeBehavior::VerifyOutputBytes(expected) => {
                Arc::new(move |_: &FakeHandle, buffer: &mut [u8], requested: usize| {
                    if requested != expected.len() {
                        return Completion::ok(expected.len());
                    }
                    if buffer.get(..requested) != Some(expected.as_slice()) {
                        return Completion::failed(Status::OTHER_ERROR);
                    }
                    Completion::ok(requested)
                })
            }
        }
    }
}

#[derive(Debug)]
struct Script {
    queue: Mutex<VecDeque<FakeBehavior>>,
    calls: Arc<AtomicUsize>,
}

impl Script {
    fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::from([FakeBehavior::GoodReadWrite])),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn queue(&self) -> std::sync::MutexGuard<'_, VecDeque<FakeBehavior>> {
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn reset(&self, behavior: FakeBehavior) {
        let mut queue = self.queue();
        queue.clear();
        queue.push_back(behavior);
    }

    fn push(&self, behavior: FakeBehavior) {
        self.queue().push_back(behavior);
    }

    fn next_function(&self) -> RawTransferFn<FakeHandle> {
        let behavior = {
            let mut queue = self.queue();
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        }
        .unwrap_or(FakeBehavior::GoodReadWrite);

        let inner = behavior.into_function();
        let calls = Arc::clone(&self.calls);
        Arc::new(move |handle: &FakeHandle, buffer: &mut [u8], requested: usize| {
            calls.fetch_add(1, Ordering::SeqCst);
            inner(handle, buffer, requested)
        })
    }
}

/// Driver whose answers are scripted per direction
#[derive(Debug)]
pub struct FakeDriver {
    reads: Script,
    writes: Script,
}

impl FakeDriver {
    /// Fake that answers every read and write with [`FakeBehavior::GoodReadWrite`]
    pub fn new() -> Self {
        Self {
            reads: Script::new(),
            writes: Script::new(),
        }
    }

    /// Replace the read script with a single behaviour
    pub fn script_reads(&self, behavior: FakeBehavior) {
        self.reads.reset(behavior);
    }

    /// Append a behaviour to the read script
    pub fn then_read(&self, behavior: FakeBehavior) {
        self.reads.push(behavior);
    }

    /// Replace the write script with a single behaviour
    pub fn script_writes(&self, behavior: FakeBehavior) {
        self.writes.reset(behavior);
    }

    /// Append a behaviour to the write script
    pub fn then_write(&self, behavior: FakeBehavior) {
        self.writes.push(behavior);
    }

    /// Raw read calls made so far
    pub fn read_calls(&self) -> usize {
        self.reads.calls.load(Ordering::SeqCst)
    }

    /// Raw write calls made so far
    pub fn write_calls(&self) -> usize {
        self.writes.calls.load(Ordering::SeqCst)
    }
}

impl Default for FakeDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver for FakeDriver {
    type Handle = FakeHandle;

    fn read_function(&self) -> RawTransferFn<FakeHandle> {
        self.reads.next_function()
    }

    fn write_function(&self) -> RawTransferFn<FakeHandle> {
        self.writes.next_function()
    }
}
