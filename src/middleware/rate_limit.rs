use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;

/// Per-key admission log.
struct KeyWindow {
    hits: Vec<Instant>,
    last_seen: Instant,
}

/// Sliding-log rate limiter keyed by client address.
///
/// Gives exact "at most `limit` admissions in any trailing `window`"
/// semantics, with no fixed-bucket boundary burst. An owned instance,
/// not a process-wide singleton: construct one per deployment and share
/// it behind `Arc`.
pub struct RateLimiter {
    limit: usize,
    window: Duration,
    idle_ttl: Duration,
    entries: Mutex<HashMap<String, KeyWindow>>,
}

impl RateLimiter {
    pub fn new(limit: usize, window: Duration, idle_ttl: Duration) -> Self {
        Self {
            limit,
            window,
            idle_ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Decide admission for `key` at instant `now`.
    ///
    /// Prune, check, and append run under one lock acquisition, so two
    /// concurrent calls for the same key can never both take the last
    /// remaining slot. Callers are expected to pass nondecreasing
    /// instants per key; an out-of-order `now` degrades accuracy for
    /// one window but cannot panic or corrupt the log (all time
    /// arithmetic saturates).
    pub fn admit(&self, key: &str, now: Instant) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        let entry = entries.entry(key.to_string()).or_insert_with(|| KeyWindow {
            hits: Vec::new(),
            last_seen: now,
        });
        entry.last_seen = now;

        // Drop admissions that have slid out of the trailing window
        let window = self.window;
        entry.hits.retain(|ts| now.saturating_duration_since(*ts) < window);

        if entry.hits.len() >= self.limit {
            return false;
        }

        entry.hits.push(now);
        true
    }

    /// Evict keys idle longer than `idle_ttl`, bounding memory for
    /// long-running processes. Intended to be called from a periodic
    /// background task.
    pub fn sweep(&self, now: Instant) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let idle_ttl = self.idle_ttl;
        entries.retain(|_, w| now.saturating_duration_since(w.last_seen) < idle_ttl);
    }

    /// Number of client keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn idle_ttl(&self) -> Duration {
        self.idle_ttl
    }
}

/// Rate limit middleware. Runs before authentication: a throttled
/// client costs nothing beyond timestamp bookkeeping.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = client_key(&headers, &request);

    if !limiter.admit(&key, Instant::now()) {
        tracing::warn!(client = %key, "Rate limit exceeded");
        return Err(ApiError::too_many_requests("Rate limit exceeded"));
    }

    Ok(next.run(request).await)
}

/// Client key for rate-limit bucketing: first `X-Forwarded-For` hop if
/// present, otherwise the socket peer address.
fn client_key(headers: &HeaderMap, request: &Request) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn window_slides_past_old_admissions() {
        let limiter = RateLimiter::new(3, Duration::from_secs(1), Duration::from_secs(60));
        let t0 = Instant::now();

        assert!(limiter.admit("1.2.3.4", t0));
        assert!(limiter.admit("1.2.3.4", t0));
        assert!(limiter.admit("1.2.3.4", t0));

        // Fourth call inside the window is rejected and not recorded
        assert!(!limiter.admit("1.2.3.4", t0 + Duration::from_millis(500)));

        // The t0 admissions have slid out by t0 + 1.1s
        assert!(limiter.admit("1.2.3.4", t0 + Duration::from_millis(1100)));
    }

    #[test]
    fn rejection_does_not_consume_a_slot() {
        let limiter = RateLimiter::new(1, Duration::from_secs(1), Duration::from_secs(60));
        let t0 = Instant::now();

        assert!(limiter.admit("k", t0));
        // Hammering while limited must not extend the penalty
        for ms in [100u64, 200, 300, 900] {
            assert!(!limiter.admit("k", t0 + Duration::from_millis(ms)));
        }
        assert!(limiter.admit("k", t0 + Duration::from_millis(1001)));
    }

    #[test]
    fn keys_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(1), Duration::from_secs(60));
        let t0 = Instant::now();

        assert!(limiter.admit("a", t0));
        assert!(!limiter.admit("a", t0));
        assert!(limiter.admit("b", t0));
    }

    #[test]
    fn concurrent_admissions_never_exceed_limit() {
        const THREADS: usize = 16;
        const LIMIT: usize = 5;

        let limiter = Arc::new(RateLimiter::new(
            LIMIT,
            Duration::from_secs(10),
            Duration::from_secs(60),
        ));
        let barrier = Arc::new(Barrier::new(THREADS));
        let admitted = Arc::new(AtomicUsize::new(0));
        let now = Instant::now();

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                let barrier = Arc::clone(&barrier);
                let admitted = Arc::clone(&admitted);
                std::thread::spawn(move || {
                    barrier.wait();
                    if limiter.admit("shared", now) {
                        admitted.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("thread panicked");
        }

        assert_eq!(admitted.load(Ordering::SeqCst), LIMIT);
    }

    #[test]
    fn out_of_order_now_is_safe() {
        let limiter = RateLimiter::new(1, Duration::from_secs(1), Duration::from_secs(60));
        let t0 = Instant::now();

        assert!(limiter.admit("k", t0 + Duration::from_secs(5)));
        // An earlier `now` must not panic: the saturating prune keeps
        // the later admission counted, so the key is still at its limit.
        assert!(!limiter.admit("k", t0));
        // Normal service resumes once the window slides past it
        assert!(limiter.admit("k", t0 + Duration::from_millis(6001)));
    }

    #[test]
    fn sweep_evicts_idle_keys_only() {
        let limiter = RateLimiter::new(3, Duration::from_secs(1), Duration::from_secs(10));
        let t0 = Instant::now();

        limiter.admit("idle", t0);
        limiter.admit("active", t0 + Duration::from_secs(9));
        assert_eq!(limiter.tracked_keys(), 2);

        limiter.sweep(t0 + Duration::from_secs(11));
        assert_eq!(limiter.tracked_keys(), 1);

        // Evicted key starts fresh on its next request
        assert!(limiter.admit("idle", t0 + Duration::from_secs(12)));
    }
}
