//! Typed wrappers over the call surface for the backend's built-in modules.
//!
//! These stay strictly on the public `call`/`cast`/`cancel` contract: they
//! build requests, hand them to the [`Client`](crate::Client), and shape the
//! reply payloads into Rust types. None of them touch framing or the
//! pending-call table.

mod algorithm;
mod events;
mod simulation;
mod topology;

pub use algorithm::{AlgorithmApi, CompileOutcome};
pub use events::{EventsApi, LongPoll};
pub use simulation::{AddOutcome, SimulationApi};
pub use topology::{Topology, TopologyApi};
