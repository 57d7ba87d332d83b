//! Effects produced by the kernel.
//!
//! The kernel is pure - it never writes to disk or a socket itself. Each
//! successful [`crate::apply`] call returns, alongside the next [`crate::State`],
//! a small list of effects describing what changed. The node runtime does
//! not need these to make progress (it already has the next `State`), but
//! they give the durable-store and test layers a structured record of
//! "what happened" without diffing two maps.

use serde::{Deserialize, Serialize};

use crate::domain::JobStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    PrinterAdded { id: String },
    FilamentAdded { id: String },
    JobQueued { id: String },
    JobStatusChanged {
        job_id: String,
        from: JobStatus,
        to: JobStatus,
    },
    FilamentConsumed { filament_id: String, grams: f64 },
}
