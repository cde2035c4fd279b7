//! Recruitment campaign workflow engine.
//!
//! The core lives under [`workflows::campaign`]: a status state machine, a step/condition
//! scheduler, an evaluation aggregator, and the orchestrator that ties them together behind
//! narrow persistence, delivery, and scoring collaborators.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
