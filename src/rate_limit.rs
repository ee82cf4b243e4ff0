use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, interval};

pub const DEFAULT_IDLE_EVICTION_SECS: u64 = 180;
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid rate limiter config: {0}")]
    InvalidConfig(&'static str),
}

// Limiter settings - all values must be positive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterConfig {
    pub requests_per_window: u32,
    pub window_secs: u64,
    pub idle_eviction_secs: u64,
    pub sweep_interval_secs: u64,
}

impl LimiterConfig {
    pub fn new(requests_per_window: u32, window_secs: u64) -> Self {
        Self {
            requests_per_window,
            window_secs,
            idle_eviction_secs: DEFAULT_IDLE_EVICTION_SECS,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.requests_per_window == 0 {
            return Err(ConfigError::InvalidConfig("requests per window must be positive"));
        }
        if self.window_secs == 0 {
            return Err(ConfigError::InvalidConfig("window must be positive"));
        }
        if self.idle_eviction_secs == 0 {
            return Err(ConfigError::InvalidConfig("idle eviction must be positive"));
        }
        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::InvalidConfig("sweep interval must be positive"));
        }
        Ok(())
    }
}

/// Token bucket with lazy refill. `tokens` stays within `0..=capacity`.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    capacity: f64,
    refill_per_sec: f64,
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn full(capacity: u32, refill_per_sec: f64, now: Instant) -> Self {
        Self {
            capacity: capacity as f64,
            refill_per_sec,
            tokens: capacity as f64,
            last_refill: now,
        }
    }

    fn refill(&mut self, now: Instant) {
        // a clock reading older than last_refill adds nothing
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        if now > self.last_refill {
            self.last_refill = now;
        }
    }

    fn try_take(&mut self, now: Instant) -> bool {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    #[cfg(test)]
    pub fn tokens(&self) -> f64 {
        self.tokens
    }
}

// Per-client entry - bucket plus last time the client showed up
#[derive(Debug, Clone)]
pub struct ClientState {
    pub bucket: TokenBucket,
    pub last_seen: Instant,
}

/// Per-client token-bucket rate limiter.
///
/// State lives in a sharded map; every `allow` holds the shard guard for the
/// whole refill + take, so two calls for the same client never spend the
/// same token. `sweep` goes through the same shard locks.
pub struct RateLimiter {
    clients: DashMap<String, ClientState>,
    config: LimiterConfig,
    refill_per_sec: f64,
}

impl RateLimiter {
    pub fn new(config: LimiterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let refill_per_sec = config.requests_per_window as f64 / config.window_secs as f64;
        Ok(Self {
            clients: DashMap::new(),
            config,
            refill_per_sec,
        })
    }

    pub fn refill_per_sec(&self) -> f64 {
        self.refill_per_sec
    }

    /// Decide whether `client` may make a request at `now`.
    pub fn allow(&self, client: &str, now: Instant) -> bool {
        let mut entry = self
            .clients
            .entry(client.to_string())
            .or_insert_with(|| ClientState {
                bucket: TokenBucket::full(self.config.requests_per_window, self.refill_per_sec, now),
                last_seen: now,
            });

        let allowed = entry.bucket.try_take(now);
        if now > entry.last_seen {
            entry.last_seen = now;
        }
        allowed
    }

    // allow() at the current instant
    pub fn check(&self, client: &str) -> bool {
        self.allow(client, Instant::now())
    }

    /// Drop every client idle for longer than the eviction timeout.
    /// Returns how many entries were removed.
    pub fn sweep(&self, now: Instant) -> usize {
        let idle = Duration::from_secs(self.config.idle_eviction_secs);
        let mut removed = 0;
        self.clients.retain(|_, state| {
            let keep = now.saturating_duration_since(state.last_seen) <= idle;
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    #[cfg(test)]
    pub fn contains(&self, client: &str) -> bool {
        self.clients.contains_key(client)
    }

    #[cfg(test)]
    pub fn tokens(&self, client: &str) -> Option<f64> {
        self.clients.get(client).map(|state| state.bucket.tokens())
    }

    /// Start the background sweep loop. It runs until the returned handle is
    /// shut down.
    pub fn spawn_sweeper(self: &Arc<Self>) -> SweeperHandle {
        let (stop_tx, stop_rx) = oneshot::channel();
        let limiter = Arc::clone(self);
        let task = tokio::spawn(sweeper(limiter, stop_rx));
        SweeperHandle { stop_tx, task }
    }
}

pub struct SweeperHandle {
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    // stop the loop and wait for it to exit
    pub async fn shutdown(self) {
        let _ = self.stop_tx.send(());
        if let Err(e) = self.task.await {
            tracing::warn!("rate limit sweeper ended abnormally: {}", e);
        }
    }

    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

async fn sweeper(limiter: Arc<RateLimiter>, mut stop_rx: oneshot::Receiver<()>) {
    let every = Duration::from_secs(limiter.config.sweep_interval_secs);
    let mut ticker = interval(every);
    // first tick fires immediately; nothing can be idle yet
    ticker.tick().await;

    tracing::info!(
        "Rate limit sweeper started (interval: {:?}, idle eviction: {}s)",
        every,
        limiter.config.idle_eviction_secs
    );

    loop {
        tokio::select! {
            _ = &mut stop_rx => break,
            _ = ticker.tick() => {
                if limiter.is_empty() {
                    continue;
                }
                let removed = limiter.sweep(Instant::now());
                crate::metrics::TRACKED_CLIENTS.set(limiter.len() as f64);
                if removed > 0 {
                    crate::metrics::EVICTED_CLIENTS.inc_by(removed as f64);
                    tracing::debug!("Evicted {} idle clients, {} still tracked", removed, limiter.len());
                }
            }
        }
    }

    tracing::info!("Rate limit sweeper stopped");
}
