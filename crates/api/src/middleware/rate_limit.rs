//! Rate limiting middleware for write routes.
//!
//! Authenticated callers are keyed by subject. Anonymous callers are keyed by
//! peer address, or by the first `X-Forwarded-For` address when the proxy is
//! trusted. Safe methods pass through unmetered.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use domain::models::Principal;
use governor::{
    clock::{Clock, DefaultClock},
    state::keyed::DefaultKeyedStateStore,
    Quota, RateLimiter,
};
use serde_json::json;
use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::app::AppState;

type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";
const ANONYMOUS_KEY: &str = "anonymous";

/// How often idle caller state is dropped.
pub const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Per-caller limiter shared across all requests.
pub struct RateLimiterState {
    limiter: KeyedLimiter,
    clock: DefaultClock,
    rate_limit_per_minute: u32,
    trust_forwarded_for: bool,
}

impl RateLimiterState {
    /// Returns `None` when `rate_limit_per_minute` is zero.
    pub fn new(rate_limit_per_minute: u32, trust_forwarded_for: bool) -> Option<Self> {
        let per_minute = NonZeroU32::new(rate_limit_per_minute)?;
        Some(Self {
            limiter: RateLimiter::keyed(Quota::per_minute(per_minute)),
            clock: DefaultClock::default(),
            rate_limit_per_minute,
            trust_forwarded_for,
        })
    }

    /// `Err` carries the retry-after delay in whole seconds (at least 1).
    pub fn check(&self, key: &str) -> Result<(), u64> {
        self.limiter.check_key(&key.to_string()).map_err(|not_until| {
            not_until
                .wait_time_from(self.clock.now())
                .as_secs()
                .max(1)
        })
    }

    pub fn rate_limit_per_minute(&self) -> u32 {
        self.rate_limit_per_minute
    }

    /// Number of callers with live limiter state.
    pub fn tracked_callers(&self) -> usize {
        self.limiter.len()
    }

    /// Drops state for callers whose quota has fully replenished.
    pub fn prune(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    /// Prunes idle callers every `every` until the runtime shuts down.
    pub fn spawn_pruner(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.prune();
                tracing::debug!(
                    tracked_callers = self.tracked_callers(),
                    "Pruned rate limiter state"
                );
            }
        })
    }

    /// Key a request is metered under.
    pub fn caller_key(
        &self,
        principal: Option<&Principal>,
        headers: &HeaderMap,
        peer: Option<IpAddr>,
    ) -> String {
        if let Some(principal) = principal {
            return format!("sub:{}", principal.subject);
        }

        let forwarded = self
            .trust_forwarded_for
            .then(|| forwarded_for(headers))
            .flatten();

        match forwarded {
            Some(addr) => format!("ip:{}", addr),
            None => peer
                .map(|ip| format!("ip:{}", ip))
                .unwrap_or_else(|| ANONYMOUS_KEY.to_string()),
        }
    }
}

impl std::fmt::Debug for RateLimiterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterState")
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("trust_forwarded_for", &self.trust_forwarded_for)
            .field("tracked_callers", &self.limiter.len())
            .finish()
    }
}

/// First address of `X-Forwarded-For`.
fn forwarded_for(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(FORWARDED_FOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|addr| !addr.is_empty())
}

/// Must run after principal resolution so authenticated callers get their
/// own bucket.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(limiter) = state.rate_limiter.as_ref() else {
        return next.run(req).await;
    };

    if req.method().is_safe() {
        return next.run(req).await;
    }

    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let key = limiter.caller_key(req.extensions().get::<Principal>(), req.headers(), peer);
    if let Err(retry_after) = limiter.check(&key) {
        tracing::warn!(caller = %key, retry_after, "Rate limit exceeded");
        return rate_limited_response(limiter.rate_limit_per_minute(), retry_after);
    }

    next.run(req).await
}

fn rate_limited_response(limit: u32, retry_after: u64) -> Response {
    let body = json!({
        "error": "rate_limited",
        "message": format!("Rate limit of {} requests/minute exceeded", limit),
        "retry_after": retry_after
    });

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
    response
}
