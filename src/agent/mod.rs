//! Agent core: the two-phase dispatch pipeline
//!
//! user input -> detect phase (buffered) -> Invocation -> handler
//! -> present phase (streamed live)

pub mod dispatcher;

pub use dispatcher::Agent;
