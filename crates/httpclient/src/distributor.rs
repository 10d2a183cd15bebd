//! `Distributor` — MODULE G: owns the reactor-facing bookkeeping, spawns
//! worker coroutines per origin on demand, drains queues until all are
//! empty.
//!
//! Grounded on spec.md §4.G's `run` loop and the spec.md §9 redesign note
//! that replaces a process-global reactor singleton with a first-class
//! runtime value the distributor owns; `smol`'s default executor plays
//! the reactor's role, the same one `httproxy`/`rproxy` drive with
//! `smol::spawn`/`smol::block_on`.

use std::collections::HashMap;
use std::sync::Arc;

use mea::mutex::Mutex;

use crate::config::ClientConfig;
use crate::dns::DnsResolver;
use crate::job::{self, Job, JobEntry, JobQueue};
use crate::pool::ConnectionPool;
use crate::url::HostInfo;

/// Caller-facing entry point: enqueue jobs against origins, then `run`
/// to drive them all to completion over a bounded number of connections
/// per origin.
pub struct Distributor {
    config: ClientConfig,
    resolver: Arc<DnsResolver>,
    pools: HashMap<HostInfo, Arc<Mutex<ConnectionPool>>>,
    queues: HashMap<HostInfo, Arc<JobQueue>>,
}

impl Distributor {
    pub fn new(config: ClientConfig) -> Self {
        let resolver = Arc::new(DnsResolver::new(&config));
        Self {
            config,
            resolver,
            pools: HashMap::new(),
            queues: HashMap::new(),
        }
    }

    /// Appends a Job to `origin`'s queue, creating the queue on first use.
    /// Safe to call again while `run` is draining: a queue is only
    /// dropped once it has gone empty and its current drain pass ends.
    pub fn enqueue(&mut self, name: impl Into<String>, origin: HostInfo, job: Job) {
        let entry = JobEntry {
            name: name.into(),
            origin: origin.clone(),
            job,
        };
        self.queues
            .entry(origin)
            .or_insert_with(|| Arc::new(JobQueue::new()))
            .push(entry);
    }

    /// Drains every queued Job. For each non-empty origin queue, spawns
    /// up to `max_workers_per_origin` workers on the shared reactor,
    /// drives them to completion, then drops any queue that emptied out.
    /// Repeats until no origin has queued work — so a worker's job
    /// enqueueing more work for its own origin is picked up by the next
    /// pass rather than lost. Returns once every queue is empty.
    pub fn run(&mut self) {
        smol::block_on(async {
            let sweeper = self.resolver.spawn_cache_sweeper(self.config.dns_cache_ttl);

            loop {
                let origins: Vec<HostInfo> = self
                    .queues
                    .iter()
                    .filter(|(_, q)| !q.is_empty())
                    .map(|(origin, _)| origin.clone())
                    .collect();
                if origins.is_empty() {
                    break;
                }

                let mut tasks = Vec::new();
                for origin in origins {
                    let queue = self.queues.get(&origin).expect("origin just listed").clone();
                    let resolver = self.resolver.clone();
                    let pool = self
                        .pools
                        .entry(origin.clone())
                        .or_insert_with(move || Arc::new(Mutex::new(ConnectionPool::new(origin, resolver))))
                        .clone();

                    let worker_count = self.config.max_workers_per_origin.min(queue.len().max(1));
                    for _ in 0..worker_count {
                        tasks.push(smol::spawn(job::run_worker(pool.clone(), queue.clone())));
                    }
                }

                for task in tasks {
                    task.await;
                }

                self.queues.retain(|_, q| !q.is_empty());
            }

            sweeper.cancel().await;
        });
    }

    /// Number of origins with a live (possibly empty) connection pool.
    /// Exposed for tests and callers that want to observe pool fan-out.
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }
}

impl Default for Distributor {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Connection;
    use mea::mutex::Mutex as AsyncMutex;
    use smol::io::{AsyncReadExt, AsyncWriteExt};
    use smol::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn localhost_origin(port: u16) -> HostInfo {
        HostInfo {
            scheme: crate::url::Scheme::Http,
            hostname: "127.0.0.1".to_string(),
            port: Some(port),
            username: None,
            password: None,
        }
    }

    async fn spawn_echo_server() -> (u16, smol::Task<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let task = smol::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                smol::spawn(async move {
                    let mut buf = [0u8; 1024];
                    loop {
                        let n = stream.read(&mut buf).await.unwrap_or(0);
                        if n == 0 {
                            break;
                        }
                        let resp = b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nhi";
                        if stream.write_all(resp).await.is_err() {
                            break;
                        }
                    }
                })
                .detach();
            }
        });
        (port, task)
    }

    #[test]
    fn run_drains_all_jobs_and_returns() {
        let (port, _server) = smol::block_on(spawn_echo_server());
        let origin = localhost_origin(port);
        let completed = Arc::new(AtomicUsize::new(0));

        let mut distributor = Distributor::new(ClientConfig::default().max_workers_per_origin(4));
        for i in 0..10 {
            let completed = completed.clone();
            distributor.enqueue(
                format!("job-{i}"),
                origin.clone(),
                job::job(move |_name, _origin, conn: Arc<AsyncMutex<Connection>>| async move {
                    conn.lock().await.get("/").await?;
                    completed.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
            );
        }

        distributor.run();
        assert_eq!(completed.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn run_fans_out_across_two_origins() {
        let (port_a, _server_a) = smol::block_on(spawn_echo_server());
        let (port_b, _server_b) = smol::block_on(spawn_echo_server());
        let origin_a = localhost_origin(port_a);
        let origin_b = localhost_origin(port_b);

        let mut distributor = Distributor::new(ClientConfig::default());
        for origin in [&origin_a, &origin_b] {
            for i in 0..3 {
                distributor.enqueue(
                    format!("job-{i}"),
                    origin.clone(),
                    job::job(|_name, _origin, conn: Arc<AsyncMutex<Connection>>| async move {
                        conn.lock().await.get("/").await?;
                        Ok(())
                    }),
                );
            }
        }

        distributor.run();
        assert_eq!(distributor.pool_count(), 2);
    }
}
