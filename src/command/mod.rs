//! Command catalog and pattern matching
//!
//! Turns free-form model output into a structured invocation:
//! text -> delimited span -> CompiledMatcher -> Invocation -> handler

pub mod matcher;
pub mod registry;
pub mod spec;

pub use matcher::{compile_matcher, find_delimited_span, CompiledMatcher, Invocation};
pub use registry::CommandRegistry;
pub use spec::{CommandHandler, CommandSpec, ResponseExample, VariableSpec};
