//! Triage pipeline: preprocess → fan-out classify → parse → merge → decide.
//!
//! One [`orchestrator::TriageOrchestrator::process`] invocation is fully
//! self-contained: a short-lived task group runs the four classifiers, the
//! results are joined before any merge logic, and nothing is shared across
//! invocations.

pub mod classify;
pub mod decision;
pub mod merge;
pub mod orchestrator;
pub mod parse;
pub mod preprocess;

pub use orchestrator::TriageOrchestrator;
