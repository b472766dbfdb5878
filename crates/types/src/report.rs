//! Result and metrics types produced by a generation run.

use crate::{Activity, SubjectId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Per-run state machine labels; terminal on `ReportReady`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd)]
pub enum Phase {
    Initialized,
    TrackersBuilt,
    SubjectsDispatched,
    SubjectsCollected,
    ReportReady,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Initialized => "INITIALIZED",
            Phase::TrackersBuilt => "TRACKERS_BUILT",
            Phase::SubjectsDispatched => "SUBJECTS_DISPATCHED",
            Phase::SubjectsCollected => "SUBJECTS_COLLECTED",
            Phase::ReportReady => "REPORT_READY",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GenerationMetrics {
    /// Elapsed milliseconds from run start to each completed phase.
    pub phase_ms: BTreeMap<String, u64>,
    pub errors: Vec<String>,
    pub total_ms: u64,
}

impl GenerationMetrics {
    pub fn record_phase(&mut self, phase: Phase, elapsed_ms: u64) {
        self.phase_ms.insert(phase.to_string(), elapsed_ms);
    }

    pub fn record_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubjectOutcome {
    pub subject: SubjectId,
    pub success: bool,
    pub scheduled_hours: u32,
    pub elapsed_ms: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationReport {
    pub run_id: Uuid,
    pub activities: Vec<Activity>,
    pub total_activities: usize,
    /// Percentage of required hours scheduled, rounded to one decimal.
    pub success_rate: f64,
    pub total_ms: u64,
    pub metrics: GenerationMetrics,
    pub subject_outcomes: Vec<SubjectOutcome>,
    /// Nonempty on a fatal fault or an incomplete schedule.
    pub error: Option<String>,
}

impl GenerationReport {
    pub fn success(&self) -> bool {
        self.success_rate >= 100.0 && self.error.is_none()
    }

    /// Fatal-fault report: zero activities, nonempty error message.
    pub fn fatal(run_id: Uuid, metrics: GenerationMetrics, error: String) -> Self {
        GenerationReport {
            run_id,
            activities: Vec::new(),
            total_activities: 0,
            success_rate: 0.0,
            total_ms: metrics.total_ms,
            metrics,
            subject_outcomes: Vec::new(),
            error: Some(error),
        }
    }
}
