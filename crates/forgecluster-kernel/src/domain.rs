//! Domain entities: printers, filaments, and print jobs.

use serde::{Deserialize, Serialize};

/// The filament materials the fleet is allowed to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilamentType {
    #[serde(rename = "PLA")]
    Pla,
    #[serde(rename = "PETG")]
    Petg,
    #[serde(rename = "ABS")]
    Abs,
    #[serde(rename = "TPU")]
    Tpu,
}

impl FilamentType {
    /// Parses the wire representation (`"PLA"`, `"PETG"`, ...), returning
    /// `None` for anything outside the allowed set rather than panicking -
    /// callers turn that into `CommandError::InvalidType`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "PLA" => Some(Self::Pla),
            "PETG" => Some(Self::Petg),
            "ABS" => Some(Self::Abs),
            "TPU" => Some(Self::Tpu),
            _ => None,
        }
    }
}

/// A 3D printer known to the fleet. Never deleted once added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Printer {
    pub id: String,
    pub company: String,
    pub model: String,
}

/// A spool of filament with a remaining-weight budget that jobs draw down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filament {
    pub id: String,
    #[serde(rename = "type")]
    pub filament_type: FilamentType,
    pub color: String,
    pub total_weight_g: f64,
    pub remaining_weight_g: f64,
}

/// Lifecycle status of a print job. See [`crate::transitions::is_legal_transition`]
/// for the allowed DAG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Queued,
    Running,
    Done,
    Cancelled,
}

impl JobStatus {
    /// Jobs in these statuses still hold a claim against their filament's
    /// and printer's capacity.
    #[must_use]
    pub const fn holds_capacity(self) -> bool {
        matches!(self, Self::Queued | Self::Running)
    }
}

/// A single print job, queued against a printer and a filament spool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub printer_id: String,
    pub filament_id: String,
    pub filepath: String,
    pub print_weight_g: f64,
    pub status: JobStatus,
}
