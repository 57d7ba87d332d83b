//! The validation error taxonomy for [`crate::apply`].
//!
//! Kept as its own `thiserror` enum (rather than folded into a crate-wide
//! catch-all) so the RPC layer can match exhaustively and map each variant
//! to the right HTTP status without guessing.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("id '{0}' already exists")]
    DuplicateId(String),

    #[error("printer '{0}' not found")]
    UnknownPrinter(String),

    #[error("filament '{0}' not found")]
    UnknownFilament(String),

    #[error("job '{0}' not found")]
    UnknownJob(String),

    #[error("invalid filament type '{0}'")]
    InvalidType(String),

    #[error("weight must be positive, got {0}")]
    InvalidWeight(f64),

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("illegal transition {from:?} -> {to:?}")]
    IllegalTransition {
        from: crate::domain::JobStatus,
        to: crate::domain::JobStatus,
    },

    #[error("printer '{0}' is busy")]
    PrinterBusy(String),

    #[error("insufficient filament: requested {requested}g, available {available}g")]
    InsufficientFilament { available: f64, requested: f64 },
}
