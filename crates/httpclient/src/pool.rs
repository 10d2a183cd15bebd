//! `ConnectionPool` — MODULE E: a per-origin multiset of [`Connection`]s
//! with in-use marking and closed-connection reaping.
//!
//! Grounded on `ConnectionPool.hpp`'s linear-scan-over-a-small-vector
//! design (spec.md §9: "Connection reuse through a linked list with
//! in-use flags scanned linearly" → a `Vec` of slots, acquisition is a
//! linear scan over at most `max_workers_per_origin` entries). Each slot
//! wraps its `Connection` in its own `Mutex` so a worker can hold the
//! lock across the awaits `action`/`close` need, while the pool's own
//! slot list is scanned under the pool's lock.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use mea::mutex::Mutex;

use crate::connection::Connection;
use crate::dns::DnsResolver;
use crate::url::HostInfo;

struct Slot {
    connection: Arc<Mutex<Connection>>,
    in_use: Arc<AtomicBool>,
}

/// All `Connection`s ever opened for one origin. Connections are never
/// removed while in use; closed, idle ones are reaped on the next
/// `acquire`/`cleanup`.
pub struct ConnectionPool {
    host: HostInfo,
    resolver: Arc<DnsResolver>,
    slots: Vec<Slot>,
}

impl ConnectionPool {
    pub fn new(host: HostInfo, resolver: Arc<DnsResolver>) -> Self {
        Self {
            host,
            resolver,
            slots: Vec::new(),
        }
    }

    pub fn host(&self) -> &HostInfo {
        &self.host
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Reaps closed connections, then returns a lease on an idle open one
    /// if it finds one, else opens a new `Connection` and adds it to the
    /// pool. The lease marks the connection in-use until dropped.
    pub async fn acquire(&mut self) -> Lease {
        self.reap_closed().await;

        for slot in &self.slots {
            if !slot.in_use.load(Ordering::Acquire) {
                slot.in_use.store(true, Ordering::Release);
                return Lease {
                    connection: slot.connection.clone(),
                    in_use: slot.in_use.clone(),
                };
            }
        }

        let connection = Arc::new(Mutex::new(Connection::new(self.host.clone(), self.resolver.clone())));
        let in_use = Arc::new(AtomicBool::new(true));
        self.slots.push(Slot {
            connection: connection.clone(),
            in_use: in_use.clone(),
        });
        Lease { connection, in_use }
    }

    /// Removes every closed, idle connection from the pool.
    pub async fn cleanup(&mut self) {
        self.reap_closed().await;
    }

    async fn reap_closed(&mut self) {
        let mut kept = Vec::with_capacity(self.slots.len());
        for slot in self.slots.drain(..) {
            let keep = slot.in_use.load(Ordering::Acquire) || slot.connection.lock().await.is_open();
            if keep {
                kept.push(slot);
            }
        }
        self.slots = kept;
    }
}

impl Drop for ConnectionPool {
    /// Destroying a pool with an open Connection is a programmer error:
    /// the pool cannot close one itself because graceful TLS shutdown
    /// must be awaited on the reactor. This only logs — it cannot assert
    /// synchronously without blocking on each connection's async lock.
    fn drop(&mut self) {
        if !self.slots.is_empty() {
            log::debug!(
                "connection pool for {} dropped with {} tracked connection(s); close() should have been awaited first",
                self.host,
                self.slots.len()
            );
        }
    }
}

/// A scoped borrow of a [`Connection`] from its [`ConnectionPool`].
/// Dropping the lease clears the in-use marker; it does not close the
/// connection (that is the worker's job once its queue is empty).
pub struct Lease {
    connection: Arc<Mutex<Connection>>,
    in_use: Arc<AtomicBool>,
}

impl Lease {
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        self.connection.clone()
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.in_use.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use smol::io::{AsyncReadExt, AsyncWriteExt};
    use smol::net::TcpListener;

    fn localhost_origin(port: u16) -> HostInfo {
        HostInfo {
            scheme: crate::url::Scheme::Http,
            hostname: "127.0.0.1".to_string(),
            port: Some(port),
            username: None,
            password: None,
        }
    }

    /// Accepts one connection at a time, replying to every request on it
    /// with a fixed tiny keep-alive response, until the listener is dropped.
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
    fn acquire_reuses_idle_open_connection() {
        smol::block_on(async {
            let (port, _server) = spawn_echo_server().await;
            let config = ClientConfig::default();
            let resolver = Arc::new(DnsResolver::new(&config));
            let mut pool = ConnectionPool::new(localhost_origin(port), resolver);

            let lease = pool.acquire().await;
            lease.connection().lock().await.get("/").await.unwrap();
            drop(lease);
            assert_eq!(pool.len(), 1);

            let lease2 = pool.acquire().await;
            assert!(Arc::ptr_eq(&lease2.connection(), &pool.slots[0].connection));
        });
    }

    #[test]
    fn acquire_opens_a_second_connection_while_first_is_in_use() {
        smol::block_on(async {
            let (port, _server) = spawn_echo_server().await;
            let config = ClientConfig::default();
            let resolver = Arc::new(DnsResolver::new(&config));
            let mut pool = ConnectionPool::new(localhost_origin(port), resolver);

            let _lease1 = pool.acquire().await;
            let _lease2 = pool.acquire().await;
            assert_eq!(pool.len(), 2);
        });
    }

    #[test]
    fn cleanup_removes_closed_idle_connections() {
        smol::block_on(async {
            let (port, _server) = spawn_echo_server().await;
            let config = ClientConfig::default();
            let resolver = Arc::new(DnsResolver::new(&config));
            let mut pool = ConnectionPool::new(localhost_origin(port), resolver);

            let lease = pool.acquire().await;
            lease.connection().lock().await.get("/").await.unwrap();
            lease.connection().lock().await.close().await.unwrap();
            drop(lease);

            pool.cleanup().await;
            assert!(pool.is_empty());
        });
    }
}
