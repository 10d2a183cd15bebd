//! Job, JobQueue & worker — MODULE F.
//!
//! A `Job` is a closure of signature `(name, origin, connection) -> bool`
//! in spec.md §4.F; here it is an owned, boxed async closure taking the
//! shared connection handle a [`crate::pool::Lease`] hands out, per the
//! spec.md §9 redesign note ("Jobs are asynchronous closures; workers are
//! spawned tasks"). A worker drains one origin's queue with one leased
//! `Connection`, logging a job's error rather than propagating it.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex as StdMutex};

use mea::mutex::Mutex;

use crate::connection::Connection;
use crate::error::Result;
use crate::pool::ConnectionPool;
use crate::url::HostInfo;

pub type JobFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

/// A unit of work dispatched to a worker with the job's own name, its
/// origin, and the `Connection` leased to run it on.
pub type Job = Box<dyn FnOnce(String, HostInfo, Arc<Mutex<Connection>>) -> JobFuture + Send>;

/// Wraps an ordinary async closure as a [`Job`], so callers don't have to
/// box and pin the future by hand.
pub fn job<F, Fut>(f: F) -> Job
where
    F: FnOnce(String, HostInfo, Arc<Mutex<Connection>>) -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Box::new(move |name, origin, conn| Box::pin(f(name, origin, conn)))
}

pub(crate) struct JobEntry {
    pub name: String,
    pub origin: HostInfo,
    pub job: Job,
}

/// A FIFO of Jobs for one origin. Popping is synchronous (no I/O), so the
/// queue is guarded by a plain blocking `Mutex` rather than an async one —
/// no critical section here ever spans an `.await`.
#[derive(Default)]
pub(crate) struct JobQueue {
    entries: StdMutex<VecDeque<JobEntry>>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: JobEntry) {
        self.entries.lock().expect("job queue mutex poisoned").push_back(entry);
    }

    pub fn pop(&self) -> Option<JobEntry> {
        self.entries.lock().expect("job queue mutex poisoned").pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().expect("job queue mutex poisoned").is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("job queue mutex poisoned").len()
    }
}

/// Spawned by the distributor as one cooperative worker. Returns
/// immediately if `queue` is already empty; otherwise leases a
/// `Connection` from `pool`, drains `queue` job-by-job, and closes the
/// connection once the queue runs dry. A job's error is logged and never
/// propagates past this function.
pub(crate) async fn run_worker(pool: Arc<Mutex<ConnectionPool>>, queue: Arc<JobQueue>) {
    if queue.is_empty() {
        return;
    }

    let lease = pool.lock().await.acquire().await;
    let conn = lease.connection();

    while let Some(JobEntry { name, origin, job }) = queue.pop() {
        log::trace!("worker: {name} -> {origin}");
        if let Err(e) = job(name.clone(), origin.clone(), conn.clone()).await {
            log::warn!("job {name} for {origin} failed: {e}");
        }
    }

    drop(lease);
    if let Err(e) = conn.lock().await.close().await {
        log::warn!("error closing connection to {}: {e}", conn.lock().await.host());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_origin() -> HostInfo {
        HostInfo {
            scheme: crate::url::Scheme::Http,
            hostname: "example.com".to_string(),
            port: None,
            username: None,
            password: None,
        }
    }

    #[test]
    fn queue_is_fifo() {
        let queue = JobQueue::new();
        queue.push(JobEntry {
            name: "a".into(),
            origin: sample_origin(),
            job: job(|_, _, _| async { Ok(()) }),
        });
        queue.push(JobEntry {
            name: "b".into(),
            origin: sample_origin(),
            job: job(|_, _, _| async { Ok(()) }),
        });

        assert_eq!(queue.pop().unwrap().name, "a");
        assert_eq!(queue.pop().unwrap().name, "b");
        assert!(queue.pop().is_none());
    }

    #[test]
    fn worker_returns_immediately_on_empty_queue() {
        smol::block_on(async {
            let config = crate::config::ClientConfig::default();
            let resolver = Arc::new(crate::dns::DnsResolver::new(&config));
            let pool = Arc::new(Mutex::new(ConnectionPool::new(sample_origin(), resolver)));
            let queue = Arc::new(JobQueue::new());
            run_worker(pool.clone(), queue).await;
            assert!(pool.lock().await.is_empty());
        });
    }
}
