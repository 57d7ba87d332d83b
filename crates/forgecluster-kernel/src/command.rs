//! The tagged union of mutations accepted by the kernel.
//!
//! Replacing the source's string `op` field: the state machine dispatches
//! exhaustively over this enum, so the compiler rejects an unhandled
//! command kind rather than silently ignoring an unrecognized opcode.

use serde::{Deserialize, Serialize};

use crate::domain::JobStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "data", rename_all = "snake_case")]
pub enum Command {
    AddPrinter {
        id: String,
        company: String,
        model: String,
    },
    AddFilament {
        id: String,
        #[serde(rename = "type")]
        filament_type: String,
        color: String,
        total_weight_g: f64,
    },
    AddJob {
        id: String,
        printer_id: String,
        filament_id: String,
        filepath: String,
        print_weight_g: f64,
    },
    UpdateJobStatus {
        job_id: String,
        new_status: JobStatus,
    },
}
