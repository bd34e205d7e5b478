//! Fatal runtime conditions
//!
//! Generated code has no error channel into the runtime, so every condition
//! below ends the process. Internal helpers return `RuntimeResult` and
//! propagate with `?`; public contract operations hand the error to [`fatal`].

use crate::builtins::ElemKind;
use std::fmt;
use tracing::error;

/// Every way a runtime operation can fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// Requested record is smaller than the object header
    AllocationTooSmall { requested: usize, header: usize },
    /// System allocator could not satisfy the request
    OutOfMemory { bytes: usize },
    /// Growing a list would exceed the representable element count
    CapacityOverflow { len: usize, max: usize },
    IndexOutOfRange { index: isize, len: usize },
    KeyNotFound,
    /// No equality rule exists for this kind of element
    ComparisonNotImplemented { kind: ElemKind },
    KindMismatch { expected: ElemKind, found: ElemKind },
    PopFromEmpty,
    LengthMismatch { keys: usize, values: usize },
    /// Reference to a record that has already been destroyed
    DanglingReference { index: u32, generation: u32 },
    WrongPayload { expected: &'static str, found: &'static str },
    ScopeUnderflow,
    ScopeMismatch { expected: usize, found: usize },
    RefcountUnderflow { index: u32 },
    /// Reference taken on an object already queued for destruction
    PendingResurrection { index: u32 },
    DestructorAlreadySet { index: u32 },
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocationTooSmall { requested, header } => {
                write!(f, "Allocation of {} bytes is smaller than the {} byte header", requested, header)
            }
            Self::OutOfMemory { bytes } => {
                write!(f, "Out of memory allocating {} bytes", bytes)
            }
            Self::CapacityOverflow { len, max } => {
                write!(f, "List capacity overflow: length {} cannot grow past {}", len, max)
            }
            Self::IndexOutOfRange { index, len } => {
                write!(f, "Index {} out of range for length {}", index, len)
            }
            Self::KeyNotFound => write!(f, "Key not found"),
            Self::ComparisonNotImplemented { kind } => {
                write!(f, "Comparing {} elements is not implemented", kind)
            }
            Self::KindMismatch { expected, found } => {
                write!(f, "Element kind mismatch: expected {}, found {}", expected, found)
            }
            Self::PopFromEmpty => write!(f, "Pop from empty list"),
            Self::LengthMismatch { keys, values } => {
                write!(f, "Dict built from {} keys and {} values", keys, values)
            }
            Self::DanglingReference { index, generation } => {
                write!(f, "Dangling reference to record {} (generation {})", index, generation)
            }
            Self::WrongPayload { expected, found } => {
                write!(f, "Expected {} object, found {}", expected, found)
            }
            Self::ScopeUnderflow => write!(f, "Cannot pop the root scope"),
            Self::ScopeMismatch { expected, found } => {
                write!(f, "Scope guard for scope {} released while scope {} is active", expected, found)
            }
            Self::RefcountUnderflow { index } => {
                write!(f, "Refcount underflow on record {}", index)
            }
            Self::PendingResurrection { index } => {
                write!(f, "Record {} is pending destruction and cannot be referenced", index)
            }
            Self::DestructorAlreadySet { index } => {
                write!(f, "Record {} already has a destructor", index)
            }
        }
    }
}

impl std::error::Error for RuntimeError {}

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Stop the runtime. Logged first so the cause survives an aborting panic.
#[cold]
#[inline(never)]
#[track_caller]
pub fn fatal(err: RuntimeError) -> ! {
    error!(target: "runtime", error = %err, "fatal runtime error");
    panic!("{}", err)
}

/// Turn a contract violation into a fatal stop
pub(crate) trait OrFatal<T> {
    fn or_fatal(self) -> T;
}

impl<T> OrFatal<T> for RuntimeResult<T> {
    #[inline]
    #[track_caller]
    fn or_fatal(self) -> T {
        match self {
            Ok(v) => v,
            Err(e) => fatal(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_values() {
        let err = RuntimeError::IndexOutOfRange { index: -4, len: 3 };
        assert_eq!(err.to_string(), "Index -4 out of range for length 3");

        let err = RuntimeError::ComparisonNotImplemented { kind: ElemKind::Obj };
        assert_eq!(err.to_string(), "Comparing object elements is not implemented");
    }

    #[test]
    #[should_panic(expected = "Key not found")]
    fn fatal_panics_with_message() {
        fatal(RuntimeError::KeyNotFound);
    }

    #[test]
    fn or_fatal_passes_values_through() {
        let ok: RuntimeResult<u8> = Ok(7);
        assert_eq!(ok.or_fatal(), 7);
    }
}
