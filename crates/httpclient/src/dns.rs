//! DNS resolution: `/etc/hosts` override, system resolver fallback, and a
//! TTL-based result cache swept by a cooperative task.
//!
//! Grounded on the teacher's `dns/local.rs` (`/etc/hosts` parsing),
//! `dns/cache.rs` (domain → IP with a liveness timestamp) and
//! `dns/mod.rs`'s `DnsResolver` (cache, then local, then remote). The
//! teacher sweeps expired cache entries from an OS thread
//! (`start_cache_monitor`); that violates the single-reactor rule this
//! crate otherwise follows, so the sweep here is a `smol` task instead —
//! same idea, cooperative form. "Remote" resolution here is the system's
//! own resolver via `ToSocketAddrs`, run off-reactor with `smol::unblock`,
//! matching how the teacher dispatches blocking calls (`smol::unblock`
//! wrapping `ureq` elsewhere in the pack).

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use mea::mutex::Mutex;

use crate::config::{ClientConfig, DnsPolicy};
use crate::error::{Error, Result};
use crate::url::HostInfo;

#[cfg(windows)]
const DEFAULT_HOSTS_PATH: &str = r"C:\Windows\System32\drivers\etc\hosts";
#[cfg(not(windows))]
const DEFAULT_HOSTS_PATH: &str = "/etc/hosts";

struct CacheEntry {
    addrs: Vec<SocketAddr>,
    resolved_at: Instant,
}

struct DnsCache {
    ttl: Duration,
    entries: HashMap<String, CacheEntry>,
}

impl DnsCache {
    fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    fn get(&self, key: &str) -> Option<Vec<SocketAddr>> {
        self.entries
            .get(key)
            .filter(|e| e.resolved_at.elapsed() < self.ttl)
            .map(|e| e.addrs.clone())
    }

    fn insert(&mut self, key: String, addrs: Vec<SocketAddr>) {
        self.entries.insert(
            key,
            CacheEntry {
                addrs,
                resolved_at: Instant::now(),
            },
        );
    }

    fn sweep_expired(&mut self) {
        let ttl = self.ttl;
        self.entries.retain(|_, e| e.resolved_at.elapsed() < ttl);
    }
}

pub struct DnsResolver {
    cache: Arc<Mutex<DnsCache>>,
    etc_hosts: Arc<HashMap<String, IpAddr>>,
    policy: DnsPolicy,
}

impl DnsResolver {
    pub fn new(config: &ClientConfig) -> Self {
        let etc_hosts = match config.dns_policy {
            DnsPolicy::EtcHostsThenSystem => {
                load_etc_hosts(Path::new(DEFAULT_HOSTS_PATH)).unwrap_or_default()
            }
            DnsPolicy::SystemOnly => HashMap::new(),
        };
        Self {
            cache: Arc::new(Mutex::new(DnsCache::new(config.dns_cache_ttl))),
            etc_hosts: Arc::new(etc_hosts),
            policy: config.dns_policy,
        }
    }

    /// Spawns the cache-sweeping task on the caller's reactor. The
    /// returned `Task` is detached if dropped; the distributor keeps it
    /// alive for the lifetime of `run`.
    pub fn spawn_cache_sweeper(&self, interval: Duration) -> smol::Task<()> {
        let cache = self.cache.clone();
        smol::spawn(async move {
            loop {
                smol::Timer::after(interval).await;
                cache.lock().await.sweep_expired();
            }
        })
    }

    /// Resolves `host` to a list of endpoints tried in order: cache, then
    /// `/etc/hosts` (if enabled), then the system resolver.
    pub async fn resolve(&self, host: &HostInfo) -> Result<Vec<SocketAddr>> {
        let authority = host.authority();

        if let Some(addrs) = self.cache.lock().await.get(&authority) {
            return Ok(addrs);
        }

        if matches!(self.policy, DnsPolicy::EtcHostsThenSystem)
            && let Some(ip) = self.etc_hosts.get(&host.hostname)
        {
            let addrs = vec![SocketAddr::new(*ip, host.port())];
            self.cache.lock().await.insert(authority, addrs.clone());
            return Ok(addrs);
        }

        let lookup_key = authority.clone();
        let addrs = smol::unblock(move || lookup_key.to_socket_addrs().map(|it| it.collect::<Vec<_>>()))
            .await
            .map_err(|e| Error::Resolve(format!("{authority}: {e}")))?;

        if addrs.is_empty() {
            return Err(Error::Resolve(format!("{authority}: resolver returned no addresses")));
        }

        self.cache.lock().await.insert(authority, addrs.clone());
        Ok(addrs)
    }
}

fn load_etc_hosts(path: &Path) -> Result<HashMap<String, IpAddr>> {
    use std::io::BufRead;

    let mut hosts = HashMap::new();
    let file = std::fs::File::open(path)?;
    for line in std::io::BufReader::new(file).lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        let Some(ip_field) = fields.next() else { continue };
        let Ok(ip) = ip_field.parse::<IpAddr>() else { continue };
        for domain in fields {
            hosts.insert(domain.to_string(), ip);
        }
    }
    Ok(hosts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_hosts_file() {
        let dir = std::env::temp_dir().join(format!("httpclient-dns-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("hosts");
        std::fs::write(&path, "127.0.0.1 localhost\n# comment\n10.0.0.5 internal.example\n").unwrap();

        let hosts = load_etc_hosts(&path).unwrap();
        assert_eq!(hosts.get("localhost"), Some(&"127.0.0.1".parse().unwrap()));
        assert_eq!(hosts.get("internal.example"), Some(&"10.0.0.5".parse().unwrap()));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn cache_expires_after_ttl() {
        let mut cache = DnsCache::new(Duration::from_millis(0));
        let addr: SocketAddr = "127.0.0.1:80".parse().unwrap();
        cache.insert("example.com:80".into(), vec![addr]);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("example.com:80"), None);
    }
}
