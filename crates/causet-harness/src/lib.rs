//! Tooling around causet-core.
//!
//! This crate provides:
//! - Fixtures: JSON files naming a graph, the stages to run and optional
//!   reference outputs
//! - Runner: executes the closure / reduction / longest-path / separation
//!   pipeline and verifies the outputs against the fixture
//! - Structured logging: JSONL stage logs plus a SHA-256 artifact index

#![forbid(unsafe_code)]

pub mod error;
pub mod fixtures;
pub mod runner;
pub mod structured_log;

pub use error::HarnessError;
pub use fixtures::{ExpectedOutputs, MatrixFixture, PipelineConfig};
pub use runner::{Mismatch, PipelineReport, PipelineRunner, StageReport};
