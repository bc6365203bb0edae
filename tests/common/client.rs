//! HTTP client for end-to-end tests
//!
//! When API routes change, update only this file.

use super::constants::*;
use reqwest::Response;
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    #[allow(dead_code)]
    pub client: reqwest::Client,
    pub base_url: String,
}

#[allow(dead_code)]
impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("Request failed")
    }

    async fn post(&self, path: &str) -> Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("Request failed")
    }

    // ========================================================================
    // Map
    // ========================================================================

    pub async fn get_index(&self) -> Response {
        self.get("/").await
    }

    pub async fn get_map(&self) -> Response {
        self.get("/map").await
    }

    pub async fn get_status(&self) -> Response {
        self.get("/status").await
    }

    // ========================================================================
    // Scheduler
    // ========================================================================

    pub async fn list_jobs(&self) -> Response {
        self.get("/scheduler/jobs").await
    }

    pub async fn get_job(&self, job_id: &str) -> Response {
        self.get(&format!("/scheduler/jobs/{}", job_id)).await
    }

    pub async fn trigger_job(&self, job_id: &str) -> Response {
        self.post(&format!("/scheduler/jobs/{}/run", job_id)).await
    }

    /// Polls the job until it is idle with a finished last run, returning its JSON.
    ///
    /// # Panics
    ///
    /// Panics if the job does not finish within [`JOB_WAIT_TIMEOUT_MS`].
    pub async fn wait_for_job(&self, job_id: &str) -> serde_json::Value {
        let start = std::time::Instant::now();
        loop {
            let job: serde_json::Value = self
                .get_job(job_id)
                .await
                .json()
                .await
                .expect("Invalid job JSON");
            let finished = job["is_running"] == false && !job["last_run"]["finished_at"].is_null();
            if finished {
                return job;
            }
            if start.elapsed() > Duration::from_millis(JOB_WAIT_TIMEOUT_MS) {
                panic!("Job {} did not finish in time: {}", job_id, job);
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}
