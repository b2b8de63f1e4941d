use crate::config::RateLimitConfig;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

/// Outcome of a rate-limit check for one inbound request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    /// Whether the request may proceed
    pub allowed: bool,
    /// Seconds left in the client's window when the request was denied
    pub retry_after_seconds: Option<u64>,
}

struct RateLimitEntry {
    count: u32,
    window_reset_at: Instant,
}

/// Per-client fixed-window request admission control
///
/// One entry per distinct client per window; the map is the only cross-request
/// shared mutable state in the service, guarded by a single mutex since
/// cardinality and contention are both low. Construct one instance at process
/// start, call [`RateLimiter::start_sweep`] to bound memory, and pass the
/// handle into request handlers.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    state: Arc<Mutex<HashMap<String, RateLimitEntry>>>,
}

impl RateLimiter {
    /// Creates a limiter allowing `max_requests` per client per `window`
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Creates a limiter from the service configuration
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, Duration::from_secs(config.window_secs))
    }

    /// Atomically checks and counts one request for `client_id`
    ///
    /// The first request in a window (or the first after the window elapsed)
    /// resets the counter; requests beyond `max_requests` are denied with the
    /// remaining window time rounded up to whole seconds.
    pub async fn check(&self, client_id: &str) -> RateDecision {
        let now = Instant::now();
        let mut state = self.state.lock().await;

        match state.get_mut(client_id) {
            Some(entry) if now < entry.window_reset_at => {
                if entry.count >= self.max_requests {
                    let remaining = entry.window_reset_at.saturating_duration_since(now);
                    return RateDecision {
                        allowed: false,
                        retry_after_seconds: Some(ceil_secs(remaining)),
                    };
                }
                entry.count += 1;
            }
            _ => {
                state.insert(
                    client_id.to_string(),
                    RateLimitEntry {
                        count: 1,
                        window_reset_at: now + self.window,
                    },
                );
            }
        }

        RateDecision {
            allowed: true,
            retry_after_seconds: None,
        }
    }

    /// Maximum requests allowed per window
    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Spawns the periodic sweep that deletes expired entries
    ///
    /// Runs once per window. The returned handle aborts the task when
    /// dropped, tying the sweep's lifetime to the owner.
    pub fn start_sweep(&self) -> SweepHandle {
        let state = Arc::clone(&self.state);
        let window = self.window;

        let handle = tokio::spawn(async move {
            let mut tick = tokio::time::interval(window);
            // The first tick fires immediately; skip it.
            tick.tick().await;
            loop {
                tick.tick().await;
                let now = Instant::now();
                let mut map = state.lock().await;
                let before = map.len();
                map.retain(|_, entry| now < entry.window_reset_at);
                if before > map.len() {
                    debug!("rate limiter sweep removed {} stale entries", before - map.len());
                }
            }
        });

        SweepHandle { handle }
    }
}

/// Owner handle for the background sweep task
pub struct SweepHandle {
    handle: JoinHandle<()>,
}

impl SweepHandle {
    /// Stops the sweep task
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn ceil_secs(d: Duration) -> u64 {
    let secs = d.as_secs();
    if d.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs.max(1)
    }
}
