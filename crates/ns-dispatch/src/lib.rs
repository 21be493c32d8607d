#![forbid(unsafe_code)]
#![deny(unreachable_pub)]
#![deny(missing_docs)]

//! The parallel walk dispatcher.
//!
//! `WalkDispatcher` abstracts "run K walks in parallel"; `LocalDispatcher`
//! farms jobs out to a bounded in-process thread pool, `RemoteDispatcher`
//! is a client of a dispatcher service reachable over HTTP. Both return
//! results reordered to match the input job order.

mod local;
mod remote;
mod wire;

pub use local::LocalDispatcher;
pub use remote::RemoteDispatcher;
pub use wire::{BatchRequest, BatchResponse};

pub use ns_core::WalkDispatcher;
