//! Concurrent timetable generation engine.
//!
//! One randomized-plus-exhaustive solver per subject runs in parallel
//! against three shared availability trackers (teachers, rooms, groups);
//! the orchestrator bounds the fan-out, collects results in submission
//! order and reports an aggregate success rate instead of failing hard.

pub mod config;
mod generator;
mod search;
mod subject;
mod tracker;

pub use generator::TimetableGenerator;
pub use search::{SlotStrategy, TwoPhaseSearch};
pub use subject::SubjectScheduler;
pub use tracker::{ResourceTracker, Trackers};
