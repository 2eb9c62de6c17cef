use thiserror::Error;

/// Returned by the fallible `try_` variants when an operation would not fit
/// in the remaining capacity.
///
/// The silent-truncating operations never produce this; they clamp instead.
/// On failure the buffer is left unchanged.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("capacity exceeded: need {needed} bytes, {available} available")]
pub struct CapacityError {
    /// Bytes the operation needed to write.
    pub needed: usize,
    /// Writable bytes that were actually available (capacity minus current
    /// length minus the terminator slot).
    pub available: usize,
}
