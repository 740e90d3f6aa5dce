use std::sync::Arc;
use std::thread::JoinHandle;

use thiserror::Error;

use crate::contract::CoreRequest;
use crate::engine::AppEngine;
use crate::transport::{handle_request, TransportResponse};

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("engine worker has stopped")]
    Stopped,
    #[error("failed to start engine worker: {0}")]
    Spawn(#[from] std::io::Error),
}

struct Job {
    request: CoreRequest,
    reply: flume::Sender<TransportResponse>,
}

/// Serves engine requests on a dedicated thread so callers never block on
/// directory walks, launch helpers or the restart settle interval.
pub struct EngineWorker {
    jobs: Option<flume::Sender<Job>>,
    handle: Option<JoinHandle<()>>,
}

impl EngineWorker {
    pub fn spawn(engine: Arc<AppEngine>) -> Result<Self, WorkerError> {
        let (jobs, queue) = flume::unbounded::<Job>();
        let handle = std::thread::Builder::new()
            .name("appctl-engine".into())
            .spawn(move || {
                for job in queue.iter() {
                    let response = handle_request(&engine, job.request);
                    // The submitter may have dropped its receiver.
                    let _ = job.reply.send(response);
                }
                log::debug!("engine worker queue closed");
            })?;

        Ok(Self {
            jobs: Some(jobs),
            handle: Some(handle),
        })
    }

    /// Queues `request`; the response arrives on the returned receiver.
    pub fn submit(
        &self,
        request: CoreRequest,
    ) -> Result<flume::Receiver<TransportResponse>, WorkerError> {
        let jobs = self.jobs.as_ref().ok_or(WorkerError::Stopped)?;
        let (reply, response) = flume::bounded(1);
        jobs.send(Job { request, reply })
            .map_err(|_| WorkerError::Stopped)?;
        Ok(response)
    }

    /// Submits and waits for the response.
    pub fn call(&self, request: CoreRequest) -> Result<TransportResponse, WorkerError> {
        self.submit(request)?
            .recv()
            .map_err(|_| WorkerError::Stopped)
    }
}

impl Drop for EngineWorker {
    fn drop(&mut self) {
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("engine worker thread panicked");
            }
        }
    }
}
