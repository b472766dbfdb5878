//! Generation orchestrator: orders subjects, builds the run's trackers,
//! fans subject schedulers out over a bounded worker pool and folds the
//! results into a report.

use crate::config;
use crate::subject::SubjectScheduler;
use crate::tracker::Trackers;
use async_trait::async_trait;
use gen_core::{accounting, Generator};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use types::{
    Catalog, GenerationMetrics, GenerationParams, GenerationReport, Phase, Subject, SubjectOutcome,
};
use uuid::Uuid;

pub struct TimetableGenerator {
    shutdown_grace: Duration,
}

impl Default for TimetableGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TimetableGenerator {
    pub fn new() -> Self {
        Self {
            shutdown_grace: config::SHUTDOWN_GRACE,
        }
    }

    pub fn with_shutdown_grace(shutdown_grace: Duration) -> Self {
        Self { shutdown_grace }
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}

/// First recorded error, truncated for the report headline.
fn headline(error: &str) -> String {
    const LIMIT: usize = 200;
    if error.len() <= LIMIT {
        return error.to_owned();
    }
    let cut = (0..=LIMIT)
        .rev()
        .find(|&i| error.is_char_boundary(i))
        .unwrap_or(0);
    format!("{}...", &error[..cut])
}

#[async_trait]
impl Generator for TimetableGenerator {
    async fn generate(
        &self,
        catalog: Arc<Catalog>,
        params: GenerationParams,
    ) -> anyhow::Result<GenerationReport> {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        let mut metrics = GenerationMetrics::default();
        metrics.record_phase(Phase::Initialized, 0);
        info!(%run_id, "generation run started");

        if let Err(e) = gen_core::validate(&catalog) {
            error!(%run_id, error = %e, "catalog rejected before dispatch");
            metrics.record_error(e.to_string());
            metrics.total_ms = elapsed_ms(started);
            return Ok(GenerationReport::fatal(run_id, metrics, headline(&e.to_string())));
        }

        let seed = params.seed.unwrap_or_else(rand::random);
        let workers = params
            .workers
            .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
            .unwrap_or(1)
            .max(1);

        // Hardest subjects first: descending required weekly hours.
        let mut subjects: Vec<Subject> = catalog.subjects().cloned().collect();
        subjects.sort_by(|a, b| b.weekly_hours().cmp(&a.weekly_hours()));

        let trackers = Arc::new(Trackers::build(&catalog));
        metrics.record_phase(Phase::TrackersBuilt, elapsed_ms(started));

        let semaphore = Arc::new(Semaphore::new(workers));
        let mut handles = Vec::with_capacity(subjects.len());
        for (i, subject) in subjects.iter().cloned().enumerate() {
            let permit = semaphore.clone().acquire_owned().await?;
            let catalog = Arc::clone(&catalog);
            let trackers = Arc::clone(&trackers);
            let task_seed = seed ^ (i as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                SubjectScheduler::new(&subject, &catalog, &trackers, task_seed).run()
            }));
        }
        metrics.record_phase(Phase::SubjectsDispatched, elapsed_ms(started));

        // Collect in submission order regardless of completion order, so
        // reporting stays deterministic. Tasks outliving the pool-wide
        // grace period are aborted and their subjects marked failed.
        let deadline = Instant::now() + self.shutdown_grace;
        let mut activities = Vec::new();
        let mut outcomes = Vec::with_capacity(subjects.len());
        for (subject, mut handle) in subjects.iter().zip(handles) {
            let collect_started = Instant::now();
            let required = accounting::required_hours(&catalog, subject);
            let remaining = deadline.saturating_duration_since(Instant::now());
            match tokio::time::timeout(remaining, &mut handle).await {
                Ok(Ok(list)) => {
                    let scheduled = accounting::scheduled_hours(&list);
                    let success = scheduled >= required;
                    if !success {
                        let reason = if list.is_empty() {
                            "No activities scheduled.".to_owned()
                        } else {
                            format!("Only {scheduled}/{required} hours scheduled.")
                        };
                        warn!(subject = %subject.id, %reason, "subject fell short");
                        metrics.record_error(format!("Subject {} failed: {reason}", subject.id));
                    }
                    activities.extend(list);
                    outcomes.push(SubjectOutcome {
                        subject: subject.id.clone(),
                        success,
                        scheduled_hours: scheduled,
                        elapsed_ms: elapsed_ms(collect_started),
                    });
                }
                Ok(Err(join_err)) => {
                    error!(subject = %subject.id, error = %join_err, "subject task faulted");
                    metrics.record_error(format!(
                        "Execution error for subject {}: {join_err}",
                        subject.id
                    ));
                    outcomes.push(SubjectOutcome {
                        subject: subject.id.clone(),
                        success: false,
                        scheduled_hours: 0,
                        elapsed_ms: elapsed_ms(collect_started),
                    });
                }
                Err(_) => {
                    handle.abort();
                    error!(subject = %subject.id, "subject task exceeded the shutdown grace");
                    metrics.record_error(format!(
                        "Subject {} interrupted: shutdown grace exceeded",
                        subject.id
                    ));
                    outcomes.push(SubjectOutcome {
                        subject: subject.id.clone(),
                        success: false,
                        scheduled_hours: 0,
                        elapsed_ms: elapsed_ms(collect_started),
                    });
                }
            }
        }
        metrics.record_phase(Phase::SubjectsCollected, elapsed_ms(started));

        let total_scheduled: f64 = outcomes.iter().map(|o| f64::from(o.scheduled_hours)).sum();
        let total_required: f64 = subjects
            .iter()
            .map(|s| f64::from(accounting::required_hours(&catalog, s)))
            .sum();
        let rate = accounting::success_rate(total_scheduled, total_required);

        let error = if let Some(first) = metrics.errors.first() {
            Some(headline(first))
        } else if rate < 100.0 {
            Some(format!("Incomplete schedule (Success Rate: {rate:.1}%)"))
        } else {
            None
        };

        metrics.total_ms = elapsed_ms(started);
        metrics.record_phase(Phase::ReportReady, metrics.total_ms);
        info!(
            %run_id,
            success_rate = rate,
            activities = activities.len(),
            total_ms = metrics.total_ms,
            "generation run finished"
        );

        Ok(GenerationReport {
            run_id,
            total_activities: activities.len(),
            activities,
            success_rate: rate,
            total_ms: metrics.total_ms,
            metrics,
            subject_outcomes: outcomes,
            error,
        })
    }
}
