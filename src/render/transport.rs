use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::error::TransportError;

use super::{JobResult, RenderJob};

/// Opaque handle to a submitted render job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle(pub String);

impl std::fmt::Display for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The job queue seam to the rendering worker: submit once, poll until
/// ready, fetch the result. Assumed reliable at-least-once; retry and
/// backoff policy are the caller's concern.
#[async_trait]
pub trait RenderTransport: Send + Sync {
    async fn submit(&self, job: RenderJob) -> Result<JobHandle, TransportError>;
    async fn is_ready(&self, handle: &JobHandle) -> Result<bool, TransportError>;
    async fn fetch_result(&self, handle: &JobHandle) -> Result<JobResult, TransportError>;
}

/// Directory-based job queue for handing jobs to an external worker
/// process. Submission writes `<id>.job.json` into the spool directory;
/// the worker is expected to write `<id>.result.json` next to it when
/// done.
pub struct SpoolTransport {
    dir: PathBuf,
}

impl SpoolTransport {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        SpoolTransport { dir: dir.into() }
    }

    fn job_path(&self, handle: &JobHandle) -> PathBuf {
        self.dir.join(format!("{handle}.job.json"))
    }

    fn result_path(&self, handle: &JobHandle) -> PathBuf {
        self.dir.join(format!("{handle}.result.json"))
    }
}

#[async_trait]
impl RenderTransport for SpoolTransport {
    async fn submit(&self, job: RenderJob) -> Result<JobHandle, TransportError> {
        let handle = JobHandle(Uuid::new_v4().to_string());
        tokio::fs::create_dir_all(&self.dir).await?;
        let payload = serde_json::to_vec_pretty(&job)?;
        tokio::fs::write(self.job_path(&handle), payload).await?;
        debug!("spooled job {} to {}", handle, self.dir.display());
        Ok(handle)
    }

    async fn is_ready(&self, handle: &JobHandle) -> Result<bool, TransportError> {
        Ok(tokio::fs::try_exists(self.result_path(handle)).await?)
    }

    async fn fetch_result(&self, handle: &JobHandle) -> Result<JobResult, TransportError> {
        let raw = tokio::fs::read(self.result_path(handle)).await?;
        Ok(serde_json::from_slice(&raw)?)
    }
}
