//! Tests for the recovery policies

use pretty_assertions::assert_eq;
use seriallink_core::error::{CommunicationsError, ElectronicsError};
use seriallink_core::recovery::{
    restricted_soft_recovery, retry_once_on_failure, soft_recovery,
};
use std::cell::RefCell;
use std::collections::VecDeque;

/// Command replaying scripted outcomes; the last outcome repeats forever
struct Scripted {
    outcomes: RefCell<VecDeque<Result<u32, CommunicationsError>>>,
    calls: RefCell<usize>,
}

impl Scripted {
    fn new(outcomes: Vec<Result<u32, CommunicationsError>>) -> Self {
        Self {
            outcomes: RefCell::new(outcomes.into()),
            calls: RefCell::new(0),
        }
    }

    fn call(&self) -> Result<u32, CommunicationsError> {
        *self.calls.borrow_mut() += 1;
        let mut outcomes = self.outcomes.borrow_mut();
        if outcomes.len() > 1 {
            outcomes.pop_front().unwrap()
        } else {
            outcomes.front().cloned().unwrap()
        }
    }

    fn calls(&self) -> usize {
        *self.calls.borrow()
    }
}

fn timeout() -> Result<u32, CommunicationsError> {
    Err(CommunicationsError::ReadWriteTimeout)
}

fn wrong_count() -> Result<u32, CommunicationsError> {
    Err(CommunicationsError::WrongByteCount { expected: 4, received: 3 })
}

fn corrupted() -> Result<u32, CommunicationsError> {
    Err(CommunicationsError::CorruptedResponse {
        expected: vec![1, 2],
        received: vec![2, 1],
    })
}

#[test]
fn test_retry_once_invokes_at_most_twice() {
    let command = Scripted::new(vec![timeout()]);
    assert_eq!(retry_once_on_failure(|| command.call()), timeout());
    assert_eq!(command.calls(), 2);

    let command = Scripted::new(vec![Ok(1)]);
    assert_eq!(retry_once_on_failure(|| command.call()), Ok(1));
    assert_eq!(command.calls(), 1);
}

#[test]
fn test_soft_recovery_always_timing_out() {
    let command = Scripted::new(vec![timeout()]);
    assert_eq!(
        soft_recovery(|| command.call()),
        Err(ElectronicsError::ElectronicsDisconnected)
    );
    assert_eq!(command.calls(), 2);
}

#[test]
fn test_soft_recovery_timeout_then_success() {
    let command = Scripted::new(vec![timeout(), Ok(42)]);
    assert_eq!(soft_recovery(|| command.call()), Ok(42));
    assert_eq!(command.calls(), 2);
}

#[test]
fn test_soft_recovery_classifies_final_failure() {
    let command = Scripted::new(vec![timeout(), wrong_count()]);
    assert_eq!(
        soft_recovery(|| command.call()),
        Err(ElectronicsError::UnrecoverableCommunicationNoise)
    );

    let command = Scripted::new(vec![wrong_count(), timeout()]);
    assert_eq!(
        soft_recovery(|| command.call()),
        Err(ElectronicsError::ElectronicsDisconnected)
    );

    let command = Scripted::new(vec![corrupted()]);
    assert_eq!(
        soft_recovery(|| command.call()),
        Err(ElectronicsError::UnrecoverableCommunicationNoise)
    );
}

#[test]
fn test_restricted_recovery_does_not_retry_timeout() {
    let command = Scripted::new(vec![timeout(), Ok(1)]);
    assert_eq!(
        restricted_soft_recovery(|| command.call()),
        Err(ElectronicsError::ElectronicsDisconnected)
    );
    assert_eq!(command.calls(), 1);
}

#[test]
fn test_restricted_recovery_wrong_count_twice() {
    let command = Scripted::new(vec![wrong_count()]);
    assert_eq!(
        restricted_soft_recovery(|| command.call()),
        Err(ElectronicsError::UnrecoverableCommunicationNoise)
    );
    assert_eq!(command.calls(), 2);
}

#[test]
fn test_restricted_recovery_wrong_count_then_success() {
    let command = Scripted::new(vec![wrong_count(), Ok(7)]);
    assert_eq!(restricted_soft_recovery(|| command.call()), Ok(7));
    assert_eq!(command.calls(), 2);
}

#[test]
fn test_restricted_recovery_timeout_on_retry_is_noise() {
    let command = Scripted::new(vec![corrupted(), timeout()]);
    assert_eq!(
        restricted_soft_recovery(|| command.call()),
        Err(ElectronicsError::UnrecoverableCommunicationNoise)
    );
    assert_eq!(command.calls(), 2);
}

#[test]
fn test_policies_pass_success_through_untouched() {
    let command = Scripted::new(vec![Ok(9)]);
    assert_eq!(soft_recovery(|| command.call()), Ok(9));
    assert_eq!(restricted_soft_recovery(|| command.call()), Ok(9));
    assert_eq!(command.calls(), 2);
}
