//! Bounded worker pool for CPU-bound pipeline work.
//!
//! Callers hand a [`JobRequest`] to the pool and either block on it
//! ([`WorkerPool::run`]), get a handle back ([`WorkerPool::submit`]) or fan
//! out a batch ([`WorkerPool::run_batch`]). A job runs to completion once it
//! starts; dropping its [`PendingJob`] only discards the result.
//!
//! Jobs share nothing but the read-only [`Pipeline`].

use crate::audit::AuditRecord;
use crate::config::effective_threads;
use crate::imaging::ImagingError;
use crate::pipeline::{Artifact, Command, Pipeline};
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::Instant;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("failed to start worker pool: {0}")]
    Build(#[from] rayon::ThreadPoolBuildError),
    #[error("worker exited before reporting a result")]
    Disconnected,
}

/// An encoded source and what to do with it.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub bytes: Vec<u8>,
    pub command: Command,
}

impl JobRequest {
    pub fn new(bytes: Vec<u8>, command: Command) -> Self {
        Self { bytes, command }
    }
}

/// The result of one job plus the audit row describing it.
#[derive(Debug)]
pub struct JobOutcome {
    pub result: Result<Artifact, ImagingError>,
    pub audit: AuditRecord,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

pub struct WorkerPool {
    pool: rayon::ThreadPool,
    pipeline: Arc<Pipeline>,
}

impl WorkerPool {
    /// Pool sized from `[processing] max_processes`, capped at the core count.
    pub fn new(pipeline: Pipeline) -> Result<Self, WorkerError> {
        let threads = effective_threads(&pipeline.config().processing);
        Self::with_threads(pipeline, threads)
    }

    pub fn with_threads(pipeline: Pipeline, threads: usize) -> Result<Self, WorkerError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("rasterforge-worker-{i}"))
            .build()?;
        debug!(threads = pool.current_num_threads(), "worker pool ready");
        Ok(Self {
            pool,
            pipeline: Arc::new(pipeline),
        })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Execute on the pool and block until done.
    pub fn run(&self, request: JobRequest) -> JobOutcome {
        let pipeline = &self.pipeline;
        self.pool.install(|| execute_job(pipeline, &request))
    }

    /// Queue a job and return immediately.
    pub fn submit(&self, request: JobRequest) -> PendingJob {
        let (tx, rx) = mpsc::channel();
        let pipeline = Arc::clone(&self.pipeline);
        self.pool.spawn(move || {
            let outcome = execute_job(&pipeline, &request);
            // The receiver may be gone; the work is still done.
            let _ = tx.send(outcome);
        });
        PendingJob { rx }
    }

    /// Run independent jobs in parallel. Outcomes come back in input order.
    pub fn run_batch(&self, requests: Vec<JobRequest>) -> Vec<JobOutcome> {
        let pipeline = &self.pipeline;
        self.pool.install(|| {
            requests
                .par_iter()
                .map(|request| execute_job(pipeline, request))
                .collect()
        })
    }
}

/// Handle to a submitted job.
pub struct PendingJob {
    rx: mpsc::Receiver<JobOutcome>,
}

impl PendingJob {
    pub fn wait(self) -> Result<JobOutcome, WorkerError> {
        self.rx.recv().map_err(|_| WorkerError::Disconnected)
    }
}

fn execute_job(pipeline: &Pipeline, request: &JobRequest) -> JobOutcome {
    let started = Instant::now();
    let result = pipeline.execute(&request.bytes, &request.command);
    let elapsed = started.elapsed();
    let input_size = request.bytes.len() as u64;
    let audit = match &result {
        Ok(artifact) => AuditRecord::success(&artifact.report, input_size, elapsed),
        Err(err) => AuditRecord::failure(request.command.name(), err, input_size, elapsed),
    };
    JobOutcome { result, audit }
}
