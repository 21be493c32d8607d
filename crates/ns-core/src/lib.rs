#![forbid(unsafe_code)]
#![deny(unreachable_pub)]
#![deny(missing_docs)]

//! Shared types and capability traits for the nested-sampling workspace.
//!
//! This crate owns the data model (`Replica`, `WalkJob`, `WalkResult`,
//! `AdaptiveState`), the external-contract traits callers implement
//! (`Potential`, `StepKernel`, `AcceptTest`, `Observer`), engine
//! configuration, and the shared error enum. It has no behavior of its own.

mod config;
mod error;
mod replica;
mod rng;
mod traits;
mod walk;

pub use config::{DispatcherEndpointSource, EngineConfig};
pub use error::NsError;
pub use replica::Replica;
pub use rng::{NsRng, derive_seed, rng_from_seed};
pub use traits::{AcceptTest, Observer, Potential, StepKernel, WalkDispatcher};
pub use walk::{AdaptiveState, WalkJob, WalkResult};
