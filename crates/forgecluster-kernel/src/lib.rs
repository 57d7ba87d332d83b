//! `forgecluster-kernel`: the deterministic domain state machine.
//!
//! Printers, filaments, and print jobs, with the validation and status
//! transition rules from the top-level spec. This crate is the pure
//! functional core of the replicated service: [`apply`] takes a [`State`]
//! and a [`Command`] and returns the next `State` plus a list of
//! [`Effect`]s, or a typed [`CommandError`]. No IO, no clocks, no
//! randomness - callers (the consensus and storage layers) own all of
//! that.

mod command;
mod domain;
mod effects;
mod error;
mod kernel;
mod state;
mod transitions;

pub use command::Command;
pub use domain::{Filament, FilamentType, Job, JobStatus, Printer};
pub use effects::Effect;
pub use error::CommandError;
pub use kernel::apply;
pub use state::State;
pub use transitions::is_legal_transition;

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_weight() -> impl Strategy<Value = f64> {
        1.0..10_000.0f64
    }

    proptest! {
        /// Invariant 3: `0 <= remaining_weight_g <= total_weight_g` after
        /// any sequence of jobs running to completion on one filament.
        #[test]
        fn filament_weight_stays_within_bounds(
            total in arb_weight(),
            weights in proptest::collection::vec(1.0..500.0f64, 0..8),
        ) {
            let mut state = State::new()
                .with_printer(Printer { id: "p".into(), company: "c".into(), model: "m".into() });
            state = apply(state, Command::AddFilament {
                id: "f".into(),
                filament_type: "PLA".into(),
                color: "black".into(),
                total_weight_g: total,
            }).unwrap().0;

            for (i, w) in weights.iter().enumerate() {
                let job_id = format!("j{i}");
                let printer_id = format!("printer-for-{job_id}");
                state = state.with_printer(Printer {
                    id: printer_id.clone(),
                    company: "c".into(),
                    model: "m".into(),
                });
                let Ok((next, _)) = apply(state.clone(), Command::AddJob {
                    id: job_id.clone(),
                    printer_id,
                    filament_id: "f".into(),
                    filepath: "x.gcode".into(),
                    print_weight_g: *w,
                }) else {
                    continue;
                };
                state = next;
                state = apply(state, Command::UpdateJobStatus {
                    job_id: job_id.clone(),
                    new_status: JobStatus::Running,
                }).unwrap().0;
                state = apply(state, Command::UpdateJobStatus {
                    job_id,
                    new_status: JobStatus::Done,
                }).unwrap().0;

                let f = &state.filaments["f"];
                prop_assert!(f.remaining_weight_g >= 0.0);
                prop_assert!(f.remaining_weight_g <= f.total_weight_g);
            }
        }

        /// Invariant 6: reserved weight across Queued/Running jobs never
        /// exceeds remaining_weight_g, immediately after each accepted
        /// `add_job`.
        #[test]
        fn reserved_weight_never_exceeds_remaining(
            total in arb_weight(),
            requests in proptest::collection::vec(1.0..2_000.0f64, 0..10),
        ) {
            let mut state = State::new();
            state = apply(state, Command::AddFilament {
                id: "f".into(),
                filament_type: "PLA".into(),
                color: "black".into(),
                total_weight_g: total,
            }).unwrap().0;

            for (i, w) in requests.iter().enumerate() {
                let printer_id = format!("p{i}");
                state = state.with_printer(Printer {
                    id: printer_id.clone(),
                    company: "c".into(),
                    model: "m".into(),
                });
                if let Ok((next, _)) = apply(state.clone(), Command::AddJob {
                    id: format!("j{i}"),
                    printer_id,
                    filament_id: "f".into(),
                    filepath: "x.gcode".into(),
                    print_weight_g: *w,
                }) {
                    state = next;
                }
                prop_assert!(state.reserved_weight_g("f") <= state.filaments["f"].remaining_weight_g);
            }
        }
    }
}
