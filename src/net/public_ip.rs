//! Public IP discovery.
//!
//! Races several well-known echo services and takes whichever answers
//! first with a parseable address. The result is cached for a short window
//! so bursts of lookups hit the network once.

use anyhow::{Context, Result, anyhow};
use futures::future::select_ok;
use reqwest::Client;
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

const DEFAULT_ENDPOINTS: &[&str] = &[
    "https://api.ipify.org",
    "https://checkip.amazonaws.com",
    "https://icanhazip.com",
    "https://ifconfig.me/ip",
];

const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

struct CacheEntry {
    ip: IpAddr,
    fetched_at: Instant,
}

/// Resolves the caller's public IP address.
pub struct PublicIpResolver {
    client: Client,
    endpoints: Vec<String>,
    cache_ttl: Duration,
    cache: Mutex<Option<CacheEntry>>,
}

impl Default for PublicIpResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl PublicIpResolver {
    pub fn new() -> Self {
        Self::with_endpoints(DEFAULT_ENDPOINTS.iter().map(|s| s.to_string()).collect())
    }

    /// Use a custom endpoint list (tests point this at a mock server).
    pub fn with_endpoints(endpoints: Vec<String>) -> Self {
        Self {
            client: Client::new(),
            endpoints,
            cache_ttl: DEFAULT_CACHE_TTL,
            cache: Mutex::new(None),
        }
    }

    /// Override how long a resolved address stays cached.
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Return the public IP, from cache when fresh.
    ///
    /// All endpoints are probed concurrently; the first parseable answer
    /// wins and the rest are dropped. The whole race is bounded by a single
    /// timeout, and nothing is retried.
    pub async fn resolve(&self) -> Result<IpAddr> {
        if let Some(ip) = self.cached() {
            debug!(%ip, "public IP served from cache");
            return Ok(ip);
        }

        let probes: Vec<_> = self
            .endpoints
            .iter()
            .map(|endpoint| Box::pin(probe(&self.client, endpoint)))
            .collect();
        if probes.is_empty() {
            return Err(anyhow!("no public IP endpoints configured"));
        }

        let (ip, _) = tokio::time::timeout(PROBE_TIMEOUT, select_ok(probes))
            .await
            .context("public IP lookup timed out")??;

        debug!(%ip, "public IP resolved");
        if let Ok(mut cache) = self.cache.lock() {
            *cache = Some(CacheEntry {
                ip,
                fetched_at: Instant::now(),
            });
        }
        Ok(ip)
    }

    fn cached(&self) -> Option<IpAddr> {
        let cache = self.cache.lock().ok()?;
        let entry = cache.as_ref()?;
        (entry.fetched_at.elapsed() < self.cache_ttl).then_some(entry.ip)
    }
}

async fn probe(client: &Client, endpoint: &str) -> Result<IpAddr> {
    let body = client
        .get(endpoint)
        .timeout(PROBE_TIMEOUT)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .with_context(|| format!("probe failed: {endpoint}"))?
        .text()
        .await
        .with_context(|| format!("probe body unreadable: {endpoint}"))?;

    body.trim()
        .parse()
        .with_context(|| format!("probe returned a non-address body: {endpoint}"))
}
