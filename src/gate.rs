//! Per-client request gate.
//!
//! Fixed-window counter keyed by client identity. The window opens on a
//! client's first request and resets once it has elapsed. A rejected
//! request does not count against the window.

use axum::http::HeaderMap;
use dashmap::DashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct RateWindow {
    count: u32,
    window_start: Instant,
}

/// Outcome of one gate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allowed { remaining: u32 },
    /// `retry_after` is what is left of the current window
    Limited { retry_after: Duration },
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allowed { .. })
    }
}

#[derive(Debug)]
pub struct RequestGate {
    limit: u32,
    window: Duration,
    windows: DashMap<String, RateWindow>,
}

impl RequestGate {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            windows: DashMap::new(),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn check(&self, identity: &str) -> GateDecision {
        self.check_at(identity, Instant::now())
    }

    pub fn allow(&self, identity: &str) -> bool {
        self.check(identity).is_allowed()
    }

    fn check_at(&self, identity: &str, now: Instant) -> GateDecision {
        // The entry guard holds the shard lock, so check-and-increment is
        // atomic per identity.
        let mut entry = self
            .windows
            .entry(identity.to_string())
            .or_insert(RateWindow {
                count: 0,
                window_start: now,
            });

        let elapsed = now.saturating_duration_since(entry.window_start);
        if elapsed >= self.window {
            entry.count = 0;
            entry.window_start = now;
        }

        if entry.count >= self.limit {
            let retry_after = self
                .window
                .saturating_sub(now.saturating_duration_since(entry.window_start));
            debug!("Rate limit hit for {}; retry in {:?}", identity, retry_after);
            return GateDecision::Limited { retry_after };
        }

        entry.count += 1;
        GateDecision::Allowed {
            remaining: self.limit - entry.count,
        }
    }

    /// Drop windows that have fully elapsed; returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Instant::now())
    }

    fn sweep_expired_at(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.window_start) < self.window);
        before.saturating_sub(self.windows.len())
    }

    /// Number of tracked client identities.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

/// Whole seconds for a `Retry-After` value: rounded up, at least 1.
pub fn retry_after_secs(retry_after: Duration) -> u64 {
    let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
    secs.max(1)
}

/// Client identity for rate limiting.
///
/// First `X-Forwarded-For` entry, then `X-Real-IP`, then the peer address.
pub fn client_identity(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    if let Some(first) = header("x-forwarded-for")
        .and_then(|forwarded| forwarded.split(',').next())
        .map(str::trim)
        .filter(|first| !first.is_empty())
    {
        return first.to_string();
    }

    if let Some(real_ip) = header("x-real-ip") {
        return real_ip.to_string();
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    // ==================== Window Tests ====================

    #[test]
    fn test_allows_up_to_limit() {
        let gate = RequestGate::new(3, Duration::from_secs(60));
        let now = Instant::now();

        assert_eq!(gate.check_at("a", now), GateDecision::Allowed { remaining: 2 });
        assert_eq!(gate.check_at("a", now), GateDecision::Allowed { remaining: 1 });
        assert_eq!(gate.check_at("a", now), GateDecision::Allowed { remaining: 0 });
        assert!(!gate.check_at("a", now).is_allowed());
    }

    #[test]
    fn test_limited_retry_after_within_window() {
        let window = Duration::from_secs(60);
        let gate = RequestGate::new(1, window);
        let start = Instant::now();

        gate.check_at("a", start);
        let decision = gate.check_at("a", start + Duration::from_secs(15));

        match decision {
            GateDecision::Limited { retry_after } => {
                assert_eq!(retry_after, Duration::from_secs(45));
                assert!(retry_after <= window);
            }
            other => panic!("expected limit, got {:?}", other),
        }
    }

    #[test]
    fn test_rejections_do_not_extend_window() {
        let gate = RequestGate::new(1, Duration::from_secs(10));
        let start = Instant::now();

        gate.check_at("a", start);
        for s in 1..10 {
            assert!(!gate.check_at("a", start + Duration::from_secs(s)).is_allowed());
        }
        assert!(gate.check_at("a", start + Duration::from_secs(10)).is_allowed());
    }

    #[test]
    fn test_window_resets_after_elapsing() {
        let gate = RequestGate::new(2, Duration::from_secs(60));
        let start = Instant::now();

        gate.check_at("a", start);
        gate.check_at("a", start);
        assert!(!gate.check_at("a", start).is_allowed());

        assert_eq!(
            gate.check_at("a", start + Duration::from_secs(60)),
            GateDecision::Allowed { remaining: 1 }
        );
    }

    #[test]
    fn test_identities_are_independent() {
        let gate = RequestGate::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(gate.check_at("a", now).is_allowed());
        assert!(gate.check_at("b", now).is_allowed());
        assert!(!gate.check_at("a", now).is_allowed());
        assert_eq!(gate.len(), 2);
    }

    #[test]
    fn test_zero_limit_rejects_everything() {
        let gate = RequestGate::new(0, Duration::from_secs(5));
        assert!(!gate.allow("a"));
    }

    #[test]
    fn test_sweep_drops_elapsed_windows() {
        let gate = RequestGate::new(5, Duration::from_secs(60));
        let start = Instant::now();

        gate.check_at("old", start);
        gate.check_at("new", start + Duration::from_secs(30));

        assert_eq!(gate.sweep_expired_at(start + Duration::from_secs(61)), 1);
        assert_eq!(gate.len(), 1);
    }

    #[test]
    fn test_concurrent_checks_never_exceed_limit() {
        let gate = std::sync::Arc::new(RequestGate::new(50, Duration::from_secs(60)));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gate = gate.clone();
                std::thread::spawn(move || (0..20).filter(|_| gate.allow("shared")).count())
            })
            .collect();

        let allowed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(allowed, 50);
    }

    // ==================== Retry-After Tests ====================

    #[test]
    fn test_retry_after_secs_rounds_up() {
        assert_eq!(retry_after_secs(Duration::from_millis(1500)), 2);
        assert_eq!(retry_after_secs(Duration::from_secs(45)), 45);
        assert_eq!(retry_after_secs(Duration::ZERO), 1);
        assert_eq!(retry_after_secs(Duration::from_millis(10)), 1);
    }

    // ==================== Identity Tests ====================

    #[test]
    fn test_identity_prefers_first_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(" 203.0.113.7, 10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));

        assert_eq!(client_identity(&headers, None), "203.0.113.7");
    }

    #[test]
    fn test_identity_uses_real_ip_when_forwarded_empty() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(""));
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));

        assert_eq!(client_identity(&headers, None), "198.51.100.2");
    }

    #[test]
    fn test_identity_falls_back_to_peer() {
        let peer: SocketAddr = "192.0.2.10:5555".parse().unwrap();
        assert_eq!(client_identity(&HeaderMap::new(), Some(peer)), "192.0.2.10");
        assert_eq!(client_identity(&HeaderMap::new(), None), "unknown");
    }
}
