#![forbid(unsafe_code)]
#![deny(unreachable_pub)]
#![deny(missing_docs)]

//! The driver: owns output sinks and the run loop wiring the engine over
//! the dispatcher, independent of any particular frontend.

mod output;
mod run;

pub use output::{write_final_replicas, EnergyTraceWriter};
pub use run::{run, RunOutcome};
