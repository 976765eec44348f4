use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};
use domain::store::CampusStore;
use shared::jwt::{JwtConfig, JwtError};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, resolve_principal,
    security_headers_middleware, trace_id, RateLimiterState,
};
use crate::routes::{attendance, auth, events, feedback, health, registrations};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CampusStore>,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn CampusStore>) -> Result<Self, JwtError> {
        let jwt = JwtConfig::new(&config.jwt.secret, config.jwt.leeway_secs)?;
        let rate_limiter = RateLimiterState::new(
            config.security.rate_limit_per_minute,
            config.security.trust_forwarded_for,
        )
        .map(Arc::new);

        Ok(Self {
            store,
            config: Arc::new(config),
            jwt: Arc::new(jwt),
            rate_limiter,
        })
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origin = if config.security.cors_origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn build_router(state: AppState) -> Router {
    // Admin-only handlers guard themselves with the AdminPrincipal extractor;
    // writes on these routes are rate limited per caller.
    let api_routes = Router::new()
        .route("/events", get(events::list_events).post(events::create_event))
        .route(
            "/events/:event_id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route("/events/:event_id/register", post(registrations::register))
        .route(
            "/events/:event_id/registrations/:student_id",
            delete(registrations::withdraw),
        )
        .route(
            "/events/:event_id/attendance",
            get(attendance::list_attendance).post(attendance::mark_attendance),
        )
        .route("/attendance/token", post(attendance::check_in_by_token))
        .route("/registrations", get(registrations::list_for_student))
        .route("/feedback/:event_id", post(feedback::submit_feedback))
        .route("/auth/whoami", get(auth::whoami))
        // Principal resolution must run before rate limiting (outermost runs first)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            resolve_principal,
        ));

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    let cors = cors_layer(&state.config);
    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);
    let max_body_size = state.config.server.max_body_size;

    Router::new()
        .merge(api_routes)
        .merge(public_routes)
        // Global middleware (bottom layers run first)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(timeout))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
