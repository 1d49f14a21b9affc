//! Bounded background work queue
//!
//! A bounded channel drained under a fixed concurrency cap, with a short
//! delay between job starts. Reserved for parallel cover-image proxy
//! fetches; the search and update paths themselves stay strictly
//! sequential and do not touch this.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, info};
use uuid::Uuid;

/// Configuration for a work queue
#[derive(Debug, Clone)]
pub struct WorkQueueConfig {
    /// Maximum concurrent jobs
    pub max_concurrent: usize,
    /// Queue capacity (pending jobs)
    pub queue_capacity: usize,
    /// Delay between starting jobs
    pub job_delay: Duration,
}

impl Default for WorkQueueConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 2,
            queue_capacity: 100,
            job_delay: Duration::from_millis(50),
        }
    }
}

/// A queued job with its payload
pub struct Job<T> {
    pub id: Uuid,
    pub payload: T,
}

impl<T> Job<T> {
    pub fn new(payload: T) -> Self {
        Self {
            id: Uuid::new_v4(),
            payload,
        }
    }
}

/// A bounded work queue that processes jobs with limited concurrency
pub struct WorkQueue<T> {
    sender: mpsc::Sender<Job<T>>,
    semaphore: Arc<Semaphore>,
    config: WorkQueueConfig,
    name: String,
}

impl<T: Send + 'static> WorkQueue<T> {
    /// Create a new work queue with a processor function
    pub fn new<F, Fut>(name: &str, config: WorkQueueConfig, processor: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        let (sender, mut receiver) = mpsc::channel::<Job<T>>(config.queue_capacity);
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent));
        let job_delay = config.job_delay;
        let queue_name = name.to_string();

        let sem_clone = semaphore.clone();
        let processor = Arc::new(processor);

        tokio::spawn(async move {
            info!(queue = %queue_name, "Work queue started");

            while let Some(job) = receiver.recv().await {
                let sem = sem_clone.clone();
                let proc = processor.clone();
                let name = queue_name.clone();

                tokio::spawn(async move {
                    let _permit = sem.acquire().await.expect("Semaphore closed");
                    debug!(queue = %name, job_id = %job.id, "Processing job");

                    proc(job.payload).await;

                    debug!(queue = %name, job_id = %job.id, "Job completed");
                });

                if job_delay > Duration::ZERO {
                    tokio::time::sleep(job_delay).await;
                }
            }

            info!(queue = %queue_name, "Work queue stopped");
        });

        Self {
            sender,
            semaphore,
            config,
            name: name.to_string(),
        }
    }

    /// Submit a job to the queue
    pub async fn submit(&self, payload: T) -> Result<Uuid, mpsc::error::SendError<Job<T>>> {
        let job = Job::new(payload);
        let id = job.id;
        self.sender.send(job).await?;
        debug!(queue = %self.name, job_id = %id, "Job submitted");
        Ok(id)
    }

    /// Get current queue statistics
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            max_concurrent: self.config.max_concurrent,
            available_permits: self.semaphore.available_permits(),
            queue_capacity: self.config.queue_capacity,
        }
    }
}

/// Queue statistics
#[derive(Debug, Clone)]
pub struct QueueStats {
    pub max_concurrent: usize,
    pub available_permits: usize,
    pub queue_capacity: usize,
}
