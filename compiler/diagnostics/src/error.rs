//! Error propagation primitives.

pub use crate::reporter::ErasedReportedError;

/// The result of a fallible, diagnostic-reporting operation.
///
/// By convention an `Err` means the diagnostic has already been reported;
/// the token merely witnesses that fact.
pub type Result<T = ()> = std::result::Result<T, ErasedReportedError>;
