//! Result composition
//!
//! Every operation in this crate reports failure as a value through
//! [`std::result::Result`]. This module adds the chaining vocabulary used
//! across the transfer and recovery layers:
//!
//! - [`ResultExt::then`]: monadic bind with a name that reads left to right
//! - [`bind`] and [`Chain`]: the same bind as a free function and as an infix `>>`
//! - [`ResultExt::ignore_value`]: keep only success or failure, drop the payload

use std::ops::Shr;

/// Extension methods for chaining fallible serial operations
pub trait ResultExt<T, E> {
    /// Run `next` on the success value, or pass the failure through untouched.
    ///
    /// `next` is never invoked once a failure has occurred, so a chain of any
    /// length stops at its first failing step.
    fn then<V, F>(self, next: F) -> Result<V, E>
    where
        F: FnOnce(T) -> Result<V, E>;

    /// Replace the success value with `()`, keeping the failure as-is.
    fn ignore_value(self) -> Result<(), E>;
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn then<V, F>(self, next: F) -> Result<V, E>
    where
        F: FnOnce(T) -> Result<V, E>,
    {
        bind(self, next)
    }

    fn ignore_value(self) -> Result<(), E> {
        match self {
            Ok(_) => Ok(()),
            Err(error) => Err(error),
        }
    }
}

/// Free-function form of [`ResultExt::then`]
pub fn bind<T, V, E, F>(result: Result<T, E>, next: F) -> Result<V, E>
where
    F: FnOnce(T) -> Result<V, E>,
{
    match result {
        Ok(value) => next(value),
        Err(error) => Err(error),
    }
}

/// Wrapper enabling infix bind with `>>`
///
/// ```rust
/// use seriallink_core::outcome::Chain;
///
/// let doubled = Chain(Ok::<u8, ()>(2)) >> |v: u8| Ok(v * 2);
/// assert_eq!(doubled.into_inner(), Ok(4));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain<T, E>(pub Result<T, E>);

impl<T, E> Chain<T, E> {
    /// Unwrap the chained result
    pub fn into_inner(self) -> Result<T, E> {
        self.0
    }
}

impl<T, E> From<Result<T, E>> for Chain<T, E> {
    fn from(result: Result<T, E>) -> Self {
        Chain(result)
    }
}

impl<T, V, E, F> Shr<F> for Chain<T, E>
where
    F: FnOnce(T) -> Result<V, E>,
{
    type Output = Chain<V, E>;

    fn shr(self, next: F) -> Self::Output {
        Chain(bind(self.0, next))
    }
}
