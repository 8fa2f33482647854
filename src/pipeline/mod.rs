//! Pipeline orchestration: per-image state machine, ordered frame numbering, and the run loop.

pub(crate) mod orchestrator;
pub(crate) mod output;
pub(crate) mod sequencer;
pub(crate) mod state;
