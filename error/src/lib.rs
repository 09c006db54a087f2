//! Shared error plumbing for the validator pipeline crates.
//!
//! Domain crates (`vld-pack`, `vld-tower`, `vld-config`) define their own
//! `#[derive(Error)]` enums via [`prelude`], the same shape CKB's `miner`
//! and `chain` crates derive their local `Error` enums through
//! `ckb_error::prelude::*`. This crate does not attempt to unify every
//! domain error into one type; the hot insertion/scheduling path in `pack`
//! uses plain return codes rather than `Error` at all (see
//! `vld_pack::InsertionOutcome`).

/// Re-exports so downstream crates can `use vld_error::prelude::*;` and get
/// the `thiserror` derive macro plus `Error` trait in scope without a direct
/// `thiserror` dependency declaration of their own.
pub mod prelude {
    pub use thiserror::Error;
}

/// Errors raised by fatal invariant violations.
///
/// The spec treats these as process-terminating diagnostics (mirroring the
/// original implementation's `FD_LOG_ERR`, which aborts the process). A
/// library has no business calling `abort()` on behalf of its caller, so
/// these are returned as `Result::Err` and it is up to the binary entry
/// point to decide whether to `.expect()` them into a process exit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FatalError {
    /// An invariant the caller promised to uphold was violated.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl FatalError {
    pub fn invariant(reason: impl Into<String>) -> Self {
        Self::InvariantViolation(reason.into())
    }
}
