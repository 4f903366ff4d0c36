use crate::api::types::{Job, JobId, JobResult, WorkerId};
use crate::proxy::protocol::{
    HeartbeatRequest, RegisterResponse, ResultPayload, ENDPOINT_JOB_NEXT, ENDPOINT_JOB_RESULT,
    ENDPOINT_WORKER_GOODBYE, ENDPOINT_WORKER_HEARTBEAT, ENDPOINT_WORKER_REGISTER,
};
use crate::settings::WORKER_HTTP_TIMEOUT;
use anyhow::{anyhow, Result};
use std::time::Duration;

/// Worker-side client for the proxy's internal endpoints.
///
/// The underlying HTTP client's timeout sits above the proxy's long-poll
/// window so an idle poll comes back as a clean 204 rather than a client
/// timeout.
pub struct ProxyClient {
    base_url: String,
    http: reqwest::Client,
}

impl ProxyClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            base_url: base_url.into(),
            http: reqwest::Client::builder()
                .timeout(WORKER_HTTP_TIMEOUT)
                .build()?,
        })
    }

    /// Joins the fleet and returns the assigned worker id.
    pub async fn register(&self) -> Result<WorkerId> {
        let url = format!("{}{}", self.base_url, ENDPOINT_WORKER_REGISTER);
        let response = self
            .post_with_retry(&url, &serde_json::json!({}), 3)
            .await?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "registration failed with status {}",
                response.status()
            ));
        }
        let payload: RegisterResponse = response.json().await?;
        if payload.worker_id.0.is_empty() {
            return Err(anyhow!("proxy did not return a worker_id"));
        }
        Ok(payload.worker_id)
    }

    pub async fn heartbeat(&self, worker_id: &WorkerId) -> Result<()> {
        let url = format!("{}{}", self.base_url, ENDPOINT_WORKER_HEARTBEAT);
        let response = self
            .http
            .post(url)
            .json(&HeartbeatRequest {
                worker_id: worker_id.clone(),
            })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(anyhow!("heartbeat request failed: {}", response.status()));
        }
        Ok(())
    }

    /// Long-polls for the next job. `None` means the poll came back empty.
    pub async fn next_job(&self, worker_id: &WorkerId) -> Result<Option<Job>> {
        let url = format!(
            "{}{}?worker_id={}",
            self.base_url, ENDPOINT_JOB_NEXT, worker_id.0
        );
        let response = self.http.get(url).send().await?;
        match response.status() {
            reqwest::StatusCode::NO_CONTENT => Ok(None),
            reqwest::StatusCode::OK => Ok(Some(response.json().await?)),
            status => Err(anyhow!("proxy returned {} for job fetch", status)),
        }
    }

    pub async fn post_result(&self, job_id: JobId, result: JobResult) -> Result<()> {
        let url = format!("{}{}", self.base_url, ENDPOINT_JOB_RESULT);
        let payload = ResultPayload { job_id, result };
        let response = self.post_with_retry(&url, &payload, 3).await?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "proxy returned {} for result submission",
                response.status()
            ));
        }
        Ok(())
    }

    /// Announces a graceful departure.
    pub async fn goodbye(&self, worker_id: &WorkerId) -> Result<()> {
        let url = format!(
            "{}{}?worker_id={}",
            self.base_url, ENDPOINT_WORKER_GOODBYE, worker_id.0
        );
        let response = self.http.post(url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("goodbye request failed: {}", response.status()));
        }
        Ok(())
    }

    async fn post_with_retry<T: serde::Serialize>(
        &self,
        url: &str,
        payload: &T,
        attempts: usize,
    ) -> Result<reqwest::Response> {
        let mut delay_ms = 150u64;

        for attempt in 0..attempts {
            match self.http.post(url).json(payload).send().await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    if attempt + 1 == attempts {
                        return Err(anyhow!(e));
                    }
                    let jitter = rand::random::<u64>() % 50;
                    tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                    delay_ms = (delay_ms * 2).min(1200);
                }
            }
        }

        Err(anyhow!("retry attempts exhausted"))
    }
}
