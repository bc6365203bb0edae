use super::context::JobContext;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Schedule for when a job should run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobSchedule {
    /// Run every `every`, on the grid `anchor + k * every` when an anchor is given.
    Interval {
        every: Duration,
        anchor: Option<DateTime<Utc>>,
    },
    /// Run only in response to hooks
    Hook(HookEvent),
    /// Combination of scheduled and hook-triggered
    Combined {
        every: Option<Duration>,
        anchor: Option<DateTime<Utc>>,
        hooks: Vec<HookEvent>,
    },
}

impl JobSchedule {
    /// Interval part of the schedule, if any.
    pub fn interval(&self) -> Option<(Duration, Option<DateTime<Utc>>)> {
        match self {
            JobSchedule::Interval { every, anchor } => Some((*every, *anchor)),
            JobSchedule::Combined {
                every: Some(every),
                anchor,
                ..
            } => Some((*every, *anchor)),
            _ => None,
        }
    }

    pub fn listens_to(&self, event: HookEvent) -> bool {
        match self {
            JobSchedule::Hook(hook) => *hook == event,
            JobSchedule::Combined { hooks, .. } => hooks.contains(&event),
            JobSchedule::Interval { .. } => false,
        }
    }

    /// Next scheduled fire strictly after `now`, or `None` for hook-only jobs
    /// and for grids whose next point is not representable.
    pub fn next_fire_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.interval()
            .and_then(|(every, anchor)| next_fire_after(every, anchor, now))
    }
}

/// First point of the grid `anchor + k * every` (k >= 0) strictly after `now`.
///
/// Without an anchor the grid starts at `now`, so the result is `now + every`.
/// Returns `None` when the result overflows the representable time range.
pub fn next_fire_after(
    every: Duration,
    anchor: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let every_ms = i64::try_from(every.as_millis()).ok()?.max(1);
    let step = chrono::Duration::try_milliseconds(every_ms)?;

    let Some(anchor) = anchor else {
        return now.checked_add_signed(step);
    };
    if anchor > now {
        return Some(anchor);
    }

    let elapsed_ms = (now - anchor).num_milliseconds();
    let periods = elapsed_ms / every_ms + 1;
    let offset = chrono::Duration::try_milliseconds(periods.checked_mul(every_ms)?)?;
    anchor.checked_add_signed(offset)
}

/// Events that can trigger hook-based jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    OnStartup,
}

impl std::fmt::Display for HookEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HookEvent::OnStartup => write!(f, "OnStartup"),
        }
    }
}

/// Errors that can occur during job execution.
#[derive(Debug)]
pub enum JobError {
    NotFound,
    AlreadyRunning,
    ExecutionFailed(String),
    Cancelled,
}

impl std::fmt::Display for JobError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobError::NotFound => write!(f, "Job not found"),
            JobError::AlreadyRunning => write!(f, "Job is already running"),
            JobError::ExecutionFailed(msg) => write!(f, "Execution failed: {}", msg),
            JobError::Cancelled => write!(f, "Job was cancelled"),
        }
    }
}

impl std::error::Error for JobError {}

/// Outcome of a job run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobRunStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobRunStatus::Running => "running",
            JobRunStatus::Completed => "completed",
            JobRunStatus::Failed => "failed",
            JobRunStatus::Cancelled => "cancelled",
        }
    }
}

/// In-memory record of the most recent run of a job.
#[derive(Debug, Clone)]
pub struct JobRun {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status: JobRunStatus,
    pub error_message: Option<String>,
    pub triggered_by: String,
}

/// Trait for background jobs.
///
/// Jobs are executed synchronously in a blocking context.
pub trait BackgroundJob: Send + Sync {
    /// Unique identifier for this job.
    fn id(&self) -> &'static str;

    /// Human-readable name for this job.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// When this job should be scheduled to run.
    fn schedule(&self) -> JobSchedule;

    /// Execute the job.
    ///
    /// Called through `spawn_blocking`. Implementations should check
    /// `ctx.is_cancelled()` between steps and return `JobError::Cancelled`.
    fn execute(&self, ctx: &JobContext) -> Result<(), JobError>;
}
