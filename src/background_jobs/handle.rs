use super::job::{BackgroundJob, JobError, JobRun, JobSchedule};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, RwLock};

/// Information about a registered job for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct JobInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub schedule: JobScheduleInfo,
    pub is_running: bool,
    pub last_run: Option<JobRunInfo>,
    pub next_run_at: Option<String>,
}

/// Serializable schedule information.
#[derive(Debug, Clone, Serialize)]
pub struct JobScheduleInfo {
    #[serde(rename = "type")]
    pub schedule_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hooks: Option<Vec<String>>,
}

impl From<JobSchedule> for JobScheduleInfo {
    fn from(schedule: JobSchedule) -> Self {
        match schedule {
            JobSchedule::Interval { every, anchor } => JobScheduleInfo {
                schedule_type: "interval".to_string(),
                value_secs: Some(every.as_secs()),
                anchor: anchor.map(|a| a.to_rfc3339()),
                hooks: None,
            },
            JobSchedule::Hook(event) => JobScheduleInfo {
                schedule_type: "hook".to_string(),
                value_secs: None,
                anchor: None,
                hooks: Some(vec![event.to_string()]),
            },
            JobSchedule::Combined {
                every,
                anchor,
                hooks,
            } => JobScheduleInfo {
                schedule_type: "combined".to_string(),
                value_secs: every.map(|d| d.as_secs()),
                anchor: anchor.map(|a| a.to_rfc3339()),
                hooks: Some(hooks.iter().map(|h| h.to_string()).collect()),
            },
        }
    }
}

/// Serializable job run information.
#[derive(Debug, Clone, Serialize)]
pub struct JobRunInfo {
    pub started_at: String,
    pub finished_at: Option<String>,
    pub status: String,
    pub error_message: Option<String>,
    pub triggered_by: String,
}

impl From<JobRun> for JobRunInfo {
    fn from(run: JobRun) -> Self {
        JobRunInfo {
            started_at: run.started_at.to_rfc3339(),
            finished_at: run.finished_at.map(|dt| dt.to_rfc3339()),
            status: run.status.as_str().to_string(),
            error_message: run.error_message,
            triggered_by: run.triggered_by,
        }
    }
}

/// Command sent to the scheduler.
pub enum SchedulerCommand {
    TriggerJob {
        job_id: String,
        response: oneshot::Sender<Result<(), JobError>>,
    },
}

/// Shared state between scheduler and handle.
#[derive(Default)]
pub struct SharedJobState {
    /// Registered jobs, fixed after startup
    pub jobs: HashMap<String, Arc<dyn BackgroundJob>>,
    /// Currently running job IDs
    pub running_jobs: HashSet<String>,
    /// Most recent run per job
    pub last_runs: HashMap<String, JobRun>,
    /// Next scheduled fire per interval job
    pub next_runs: HashMap<String, DateTime<Utc>>,
}

impl SharedJobState {
    fn job_info(&self, job_id: &str) -> Option<JobInfo> {
        let job = self.jobs.get(job_id)?;
        Some(JobInfo {
            id: job_id.to_string(),
            name: job.name().to_string(),
            description: job.description().to_string(),
            schedule: job.schedule().into(),
            is_running: self.running_jobs.contains(job_id),
            last_run: self.last_runs.get(job_id).cloned().map(JobRunInfo::from),
            next_run_at: self.next_runs.get(job_id).map(|t| t.to_rfc3339()),
        })
    }
}

/// Handle to interact with the job scheduler from HTTP handlers.
#[derive(Clone)]
pub struct SchedulerHandle {
    command_tx: mpsc::Sender<SchedulerCommand>,
    shared_state: Arc<RwLock<SharedJobState>>,
}

impl SchedulerHandle {
    pub fn new(
        command_tx: mpsc::Sender<SchedulerCommand>,
        shared_state: Arc<RwLock<SharedJobState>>,
    ) -> Self {
        Self {
            command_tx,
            shared_state,
        }
    }

    /// Get information about all registered jobs, sorted by id.
    pub async fn list_jobs(&self) -> Vec<JobInfo> {
        let state = self.shared_state.read().await;
        let mut jobs: Vec<JobInfo> = state
            .jobs
            .keys()
            .filter_map(|id| state.job_info(id))
            .collect();
        jobs.sort_by(|a, b| a.id.cmp(&b.id));
        jobs
    }

    pub async fn get_job(&self, job_id: &str) -> Option<JobInfo> {
        self.shared_state.read().await.job_info(job_id)
    }

    /// Trigger a job manually.
    pub async fn trigger_job(&self, job_id: &str) -> Result<(), JobError> {
        let (response_tx, response_rx) = oneshot::channel();

        self.command_tx
            .send(SchedulerCommand::TriggerJob {
                job_id: job_id.to_string(),
                response: response_tx,
            })
            .await
            .map_err(|_| JobError::ExecutionFailed("Scheduler not available".to_string()))?;

        response_rx
            .await
            .map_err(|_| JobError::ExecutionFailed("Scheduler did not respond".to_string()))?
    }

    pub async fn is_job_running(&self, job_id: &str) -> bool {
        self.shared_state.read().await.running_jobs.contains(job_id)
    }

    pub async fn job_exists(&self, job_id: &str) -> bool {
        self.shared_state.read().await.jobs.contains_key(job_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background_jobs::job::{HookEvent, JobRunStatus};
    use chrono::TimeZone;
    use std::time::Duration;

    #[test]
    fn interval_schedule_info() {
        let anchor = Utc.with_ymd_and_hms(2021, 9, 3, 0, 0, 0).unwrap();
        let info: JobScheduleInfo = JobSchedule::Interval {
            every: Duration::from_secs(43200),
            anchor: Some(anchor),
        }
        .into();

        assert_eq!(info.schedule_type, "interval");
        assert_eq!(info.value_secs, Some(43200));
        assert_eq!(info.anchor.as_deref(), Some("2021-09-03T00:00:00+00:00"));
        assert!(info.hooks.is_none());
    }

    #[test]
    fn combined_schedule_info_lists_hooks() {
        let info: JobScheduleInfo = JobSchedule::Combined {
            every: Some(Duration::from_secs(60)),
            anchor: None,
            hooks: vec![HookEvent::OnStartup],
        }
        .into();

        assert_eq!(info.schedule_type, "combined");
        assert_eq!(info.hooks, Some(vec!["OnStartup".to_string()]));

        let json = serde_json::to_value(&info).unwrap();
        assert!(json.get("anchor").is_none());
        assert_eq!(json["type"], "combined");
    }

    #[test]
    fn job_run_info_formats_timestamps() {
        let started = Utc.with_ymd_and_hms(2021, 9, 3, 12, 0, 0).unwrap();
        let info = JobRunInfo::from(JobRun {
            started_at: started,
            finished_at: None,
            status: JobRunStatus::Failed,
            error_message: Some("boom".into()),
            triggered_by: "schedule".into(),
        });

        assert_eq!(info.started_at, "2021-09-03T12:00:00+00:00");
        assert_eq!(info.status, "failed");
        assert!(info.finished_at.is_none());
    }

    #[tokio::test]
    async fn trigger_without_scheduler_loop_fails() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let handle = SchedulerHandle::new(tx, Arc::new(RwLock::new(SharedJobState::default())));

        let err = handle.trigger_job("anything").await.unwrap_err();
        assert!(matches!(err, JobError::ExecutionFailed(_)));
    }
}
