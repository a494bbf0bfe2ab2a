//! Compile-and-run pipeline for untrusted single-file C++ submissions.
//!
//! Data flow: source + fixtures -> `workspace` -> `compiler` -> `supervisor`
//! (per fixture) -> `evaluator` -> `runner` aggregation, with `executor::Judge`
//! owning the pieces and bounding concurrency.

pub mod compiler;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod fixtures;
pub mod instrument;
pub mod questions;
pub mod runner;
pub mod supervisor;
pub mod workspace;

#[cfg(test)]
mod testing;

pub use error::{EngineError, Result};
pub use executor::Judge;
pub use fixtures::FixtureStore;
pub use questions::{QuestionError, QuestionStore};
pub use runner::run_suite;
