//! Background job scheduling and execution.
//!
//! Jobs run on fixed intervals or on hook events; at most one run of a given
//! job is in flight at any time.

mod context;
mod handle;
mod job;
pub mod jobs;
mod scheduler;

pub use context::JobContext;
pub use handle::{JobInfo, JobRunInfo, JobScheduleInfo, SchedulerHandle};
pub use job::{
    next_fire_after, BackgroundJob, HookEvent, JobError, JobRun, JobRunStatus, JobSchedule,
};
pub use scheduler::{create_scheduler, JobScheduler};
