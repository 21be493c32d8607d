#![forbid(unsafe_code)]
#![deny(unreachable_pub)]
#![deny(missing_docs)]

//! The nested-sampling iteration engine: live-set bookkeeping,
//! energy-ordered removal, clone-and-mutate replacement via the
//! dispatcher, and adaptive step-size control.

mod engine;
mod live_set;
mod step_size;

pub use engine::{NestedSampling, StepOutcome};
pub use live_set::LiveSet;
pub use step_size::{step_factor, update_stepsize};
