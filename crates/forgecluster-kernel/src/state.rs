//! Kernel state.
//!
//! Uses `BTreeMap` rather than `HashMap` so that serializing a snapshot is
//! byte-identical across replicas that applied the same command sequence -
//! not just semantically equal (see the determinism note in the top-level
//! spec). State transitions take ownership and return `self` (builder
//! pattern), which keeps the kernel's `apply` function free of interior
//! mutation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Filament, Job, JobStatus, Printer};

/// The full in-memory domain state: every printer, filament, and job the
/// cluster has ever accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct State {
    pub printers: BTreeMap<String, Printer>,
    pub filaments: BTreeMap<String, Filament>,
    pub jobs: BTreeMap<String, Job>,
}

impl State {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_printer(mut self, printer: Printer) -> Self {
        self.printers.insert(printer.id.clone(), printer);
        self
    }

    #[must_use]
    pub fn with_filament(mut self, filament: Filament) -> Self {
        self.filaments.insert(filament.id.clone(), filament);
        self
    }

    #[must_use]
    pub fn with_job(mut self, job: Job) -> Self {
        self.jobs.insert(job.id.clone(), job);
        self
    }

    /// Sum of `print_weight_g` across jobs on `filament_id` that still hold
    /// a capacity claim (`Queued` or `Running`).
    #[must_use]
    pub fn reserved_weight_g(&self, filament_id: &str) -> f64 {
        self.jobs
            .values()
            .filter(|job| job.filament_id == filament_id && job.status.holds_capacity())
            .map(|job| job.print_weight_g)
            .sum()
    }

    /// `remaining_weight_g - reserved_weight_g`: what a new job on this
    /// filament is allowed to request.
    #[must_use]
    pub fn available_weight_g(&self, filament_id: &str) -> Option<f64> {
        let filament = self.filaments.get(filament_id)?;
        Some(filament.remaining_weight_g - self.reserved_weight_g(filament_id))
    }

    /// Whether any job on `printer_id` currently holds a capacity claim.
    #[must_use]
    pub fn printer_busy(&self, printer_id: &str) -> bool {
        self.jobs
            .values()
            .any(|job| job.printer_id == printer_id && job.status.holds_capacity())
    }

    /// Whether any job on `printer_id` is currently `Running`.
    #[must_use]
    pub fn printer_has_running_job(&self, printer_id: &str) -> bool {
        self.jobs
            .values()
            .any(|job| job.printer_id == printer_id && job.status == JobStatus::Running)
    }
}
