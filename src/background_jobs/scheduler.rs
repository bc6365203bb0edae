use super::context::JobContext;
use super::handle::{SchedulerCommand, SchedulerHandle, SharedJobState};
use super::job::{BackgroundJob, HookEvent, JobError, JobRun, JobRunStatus};
use crate::server::metrics;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Longest the loop sleeps without re-checking schedules.
const MAX_IDLE: Duration = Duration::from_secs(60);

/// How long shutdown waits for each running job.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Manages background job scheduling and execution.
pub struct JobScheduler {
    /// Shared state accessible by SchedulerHandle
    shared_state: Arc<RwLock<SharedJobState>>,

    /// Task handles of running jobs, owned by the scheduler loop
    running_handles: HashMap<String, JoinHandle<()>>,

    job_cancel_tokens: HashMap<String, CancellationToken>,

    /// Receiver for commands from SchedulerHandle
    command_receiver: mpsc::Receiver<SchedulerCommand>,

    shutdown_token: CancellationToken,

    /// Shared context provided to jobs during execution.
    job_context: JobContext,
}

impl JobScheduler {
    fn new(
        command_receiver: mpsc::Receiver<SchedulerCommand>,
        shutdown_token: CancellationToken,
        job_context: JobContext,
        shared_state: Arc<RwLock<SharedJobState>>,
    ) -> Self {
        Self {
            shared_state,
            running_handles: HashMap::new(),
            job_cancel_tokens: HashMap::new(),
            command_receiver,
            shutdown_token,
            job_context,
        }
    }

    /// Register a job and compute its first fire time.
    pub async fn register_job(&mut self, job: Arc<dyn BackgroundJob>) {
        let job_id = job.id().to_string();
        info!("Registering job: {} - {}", job_id, job.description());

        let mut state = self.shared_state.write().await;
        let schedule = job.schedule();
        match schedule.next_fire_after(Utc::now()) {
            Some(next_run) => {
                info!("Job {} first scheduled for {}", job_id, next_run.to_rfc3339());
                state.next_runs.insert(job_id.clone(), next_run);
            }
            None if schedule.interval().is_some() => {
                warn!("Job {} has no representable fire time, it only runs on demand", job_id);
            }
            None => {}
        }
        state.jobs.insert(job_id, job);
    }

    pub async fn job_count(&self) -> usize {
        self.shared_state.read().await.jobs.len()
    }

    /// Main scheduler loop. Returns once the shutdown token is cancelled.
    pub async fn run(&mut self) {
        let job_count = self.job_count().await;
        info!("Starting job scheduler with {} registered jobs", job_count);

        self.trigger_jobs_for_hook(HookEvent::OnStartup).await;

        loop {
            self.cleanup_completed_jobs().await;

            let sleep_duration = self.time_until_next_scheduled_job().await;
            debug!(
                "Scheduler sleeping for {:?} until next scheduled job",
                sleep_duration
            );

            tokio::select! {
                _ = tokio::time::sleep(sleep_duration) => {
                    self.run_due_jobs().await;
                }
                Some(cmd) = self.command_receiver.recv() => {
                    self.handle_command(cmd).await;
                }
                _ = self.shutdown_token.cancelled() => {
                    info!("Scheduler received shutdown signal");
                    self.shutdown().await;
                    break;
                }
            }
        }

        info!("Job scheduler stopped");
    }

    async fn handle_command(&mut self, cmd: SchedulerCommand) {
        match cmd {
            SchedulerCommand::TriggerJob { job_id, response } => {
                let result = self.trigger_job(&job_id).await;
                let _ = response.send(result);
            }
        }
    }

    /// Manually trigger a job by ID.
    async fn trigger_job(&mut self, job_id: &str) -> Result<(), JobError> {
        let state = self.shared_state.read().await;
        if !state.jobs.contains_key(job_id) {
            return Err(JobError::NotFound);
        }
        if state.running_jobs.contains(job_id) {
            return Err(JobError::AlreadyRunning);
        }
        drop(state);

        self.spawn_job(job_id, "manual").await;
        Ok(())
    }

    /// Time until the earliest scheduled fire, capped at [`MAX_IDLE`].
    ///
    /// Running jobs are included so that a fire falling inside a run is
    /// observed and skipped rather than silently postponed.
    async fn time_until_next_scheduled_job(&self) -> Duration {
        let state = self.shared_state.read().await;
        let now = Utc::now();

        state
            .next_runs
            .values()
            .map(|next_run| (*next_run - now).to_std().unwrap_or(Duration::ZERO))
            .min()
            .map_or(MAX_IDLE, |d| d.min(MAX_IDLE))
    }

    /// Start every job whose fire time has passed. A job that is still running
    /// misses this fire; either way its next fire moves to the next grid point.
    async fn run_due_jobs(&mut self) {
        let now = Utc::now();
        let mut jobs_to_run = Vec::new();

        {
            let mut state = self.shared_state.write().await;
            let due: Vec<String> = state
                .next_runs
                .iter()
                .filter(|(_, next_run)| **next_run <= now)
                .map(|(job_id, _)| job_id.clone())
                .collect();

            for job_id in due {
                let Some(job) = state.jobs.get(&job_id).cloned() else {
                    state.next_runs.remove(&job_id);
                    continue;
                };

                if state.running_jobs.contains(&job_id) {
                    warn!("Skipping scheduled run of {}: previous run still in progress", job_id);
                    metrics::record_background_job_skipped(&job_id);
                } else {
                    jobs_to_run.push(job_id.clone());
                }

                match job.schedule().next_fire_after(now) {
                    Some(next_run) => {
                        debug!("Job {} next scheduled for {}", job_id, next_run.to_rfc3339());
                        state.next_runs.insert(job_id, next_run);
                    }
                    None => {
                        state.next_runs.remove(&job_id);
                    }
                }
            }
        }

        for job_id in jobs_to_run {
            self.spawn_job(&job_id, "schedule").await;
        }
    }

    /// Trigger all jobs that listen for a specific hook event.
    async fn trigger_jobs_for_hook(&mut self, event: HookEvent) {
        let jobs_to_trigger: Vec<String> = {
            let state = self.shared_state.read().await;
            state
                .jobs
                .iter()
                .filter(|(job_id, job)| {
                    if state.running_jobs.contains(*job_id) {
                        debug!("Skipping hook trigger for already running job: {}", job_id);
                        return false;
                    }
                    job.schedule().listens_to(event)
                })
                .map(|(job_id, _)| job_id.clone())
                .collect()
        };

        for job_id in jobs_to_trigger {
            let trigger = format!("hook:{}", event);
            self.spawn_job(&job_id, &trigger).await;
        }
    }

    /// Spawn a job execution task.
    async fn spawn_job(&mut self, job_id: &str, triggered_by: &str) {
        let job = {
            let mut state = self.shared_state.write().await;
            let Some(job) = state.jobs.get(job_id).cloned() else {
                error!("Attempted to spawn unknown job: {}", job_id);
                return;
            };
            state.running_jobs.insert(job_id.to_string());
            state.last_runs.insert(
                job_id.to_string(),
                JobRun {
                    started_at: Utc::now(),
                    finished_at: None,
                    status: JobRunStatus::Running,
                    error_message: None,
                    triggered_by: triggered_by.to_string(),
                },
            );
            job
        };

        info!("Starting job: {} (triggered_by: {})", job_id, triggered_by);
        metrics::set_background_job_running(job_id, true);

        let cancel_token = self.job_context.cancellation_token.child_token();
        self.job_cancel_tokens
            .insert(job_id.to_string(), cancel_token.clone());

        let ctx = JobContext::new(cancel_token, Arc::clone(&self.job_context.snapshot_store));
        let job_id_owned = job_id.to_string();
        let shared_state = Arc::clone(&self.shared_state);

        let handle = tokio::spawn(async move {
            let start_time = Instant::now();
            let result = tokio::task::spawn_blocking(move || job.execute(&ctx)).await;
            let elapsed = start_time.elapsed();

            let (status, error_msg, status_label) = match result {
                Ok(Ok(())) => {
                    info!(
                        "Job {} completed successfully in {:?}",
                        job_id_owned, elapsed
                    );
                    (JobRunStatus::Completed, None, "success")
                }
                Ok(Err(JobError::Cancelled)) => {
                    info!("Job {} was cancelled after {:?}", job_id_owned, elapsed);
                    (
                        JobRunStatus::Cancelled,
                        Some("Cancelled".to_string()),
                        "cancelled",
                    )
                }
                Ok(Err(e)) => {
                    error!("Job {} failed after {:?}: {}", job_id_owned, elapsed, e);
                    (JobRunStatus::Failed, Some(e.to_string()), "failed")
                }
                Err(e) => {
                    error!("Job {} panicked after {:?}: {}", job_id_owned, elapsed, e);
                    (
                        JobRunStatus::Failed,
                        Some(format!("Task panic: {}", e)),
                        "panic",
                    )
                }
            };

            metrics::record_background_job_execution(&job_id_owned, status_label, elapsed);
            metrics::set_background_job_running(&job_id_owned, false);

            let mut state = shared_state.write().await;
            if let Some(run) = state.last_runs.get_mut(&job_id_owned) {
                run.finished_at = Some(Utc::now());
                run.status = status;
                run.error_message = error_msg;
            }
            state.running_jobs.remove(&job_id_owned);
        });

        self.running_handles.insert(job_id.to_string(), handle);
    }

    async fn cleanup_completed_jobs(&mut self) {
        let completed: Vec<String> = self
            .running_handles
            .iter()
            .filter(|(_, handle)| handle.is_finished())
            .map(|(job_id, _)| job_id.clone())
            .collect();

        for job_id in completed {
            if let Some(handle) = self.running_handles.remove(&job_id) {
                let _ = handle.await;
            }
            self.job_cancel_tokens.remove(&job_id);
        }
    }

    /// Cancel running jobs and wait for them to wind down.
    async fn shutdown(&mut self) {
        info!("Shutting down scheduler...");

        for (job_id, token) in &self.job_cancel_tokens {
            debug!("Cancelling job: {}", job_id);
            token.cancel();
        }

        for (job_id, handle) in self.running_handles.drain() {
            if tokio::time::timeout(SHUTDOWN_GRACE, handle).await.is_err() {
                warn!("Job {} did not stop within {:?}", job_id, SHUTDOWN_GRACE);
            }
        }

        self.job_cancel_tokens.clear();
        info!("Scheduler shutdown complete");
    }
}

/// Create a scheduler and its handle.
pub fn create_scheduler(
    shutdown_token: CancellationToken,
    job_context: JobContext,
) -> (JobScheduler, SchedulerHandle) {
    let (command_tx, command_rx) = mpsc::channel(100);
    let shared_state = Arc::new(RwLock::new(SharedJobState::default()));

    let scheduler = JobScheduler::new(
        command_rx,
        shutdown_token,
        job_context,
        Arc::clone(&shared_state),
    );
    let handle = SchedulerHandle::new(command_tx, shared_state);

    (scheduler, handle)
}
