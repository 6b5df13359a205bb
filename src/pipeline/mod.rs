//! Long-running tasks: the watch loop and the message responder.

pub mod cycle;
pub mod respond;

pub use cycle::{CycleOutcome, Watcher};
pub use respond::run_responder;
