use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CircuitState {
    Closed,   // Normal operation
    Open,     // Failing fast
    HalfOpen, // Probing whether the collaborator is back
}

pub struct CircuitBreaker {
    pub name: String,
    state: RwLock<CircuitState>,
    failure_count: AtomicUsize,
    failure_threshold: usize,
    reset_timeout: Duration,
    last_failure: RwLock<Option<Instant>>,
}

impl CircuitBreaker {
    pub fn new(name: &str, threshold: usize, timeout: Duration) -> Self {
        Self {
            name: name.to_string(),
            state: RwLock::new(CircuitState::Closed),
            failure_count: AtomicUsize::new(0),
            failure_threshold: threshold.max(1),
            reset_timeout: timeout,
            last_failure: RwLock::new(None),
        }
    }

    pub async fn current(&self) -> CircuitState {
        *self.state.read().await
    }

    /// Whether a request may go through now.
    pub async fn check(&self) -> bool {
        match self.current().await {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let last_failure = *self.last_failure.read().await;
                let cooled_down = last_failure
                    .map(|instant| instant.elapsed() >= self.reset_timeout)
                    .unwrap_or(true);
                if cooled_down {
                    *self.state.write().await = CircuitState::HalfOpen;
                    tracing::info!("Circuit Breaker [{}] moving to Half-Open", self.name);
                }
                cooled_down
            }
        }
    }

    pub async fn record_success(&self) {
        let mut state = self.state.write().await;
        if *state == CircuitState::HalfOpen {
            tracing::info!("Circuit Breaker [{}] recovered to Closed", self.name);
        }
        *state = CircuitState::Closed;
        self.failure_count.store(0, Ordering::SeqCst);
    }

    pub async fn record_failure(&self) {
        let count = self.failure_count.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = self.state.write().await;

        if count >= self.failure_threshold || *state == CircuitState::HalfOpen {
            *state = CircuitState::Open;
            *self.last_failure.write().await = Some(Instant::now());
            tracing::error!("Circuit Breaker [{}] TRIPPED to Open. Failures: {}", self.name, count);
        }
    }
}

fn breaker_for<'a>(state: &'a AppState, path: &str) -> Option<&'a CircuitBreaker> {
    if path.starts_with("/create-payment-intent") || path.starts_with("/confirm-payment") || path.starts_with("/payment/") {
        Some(&state.resiliency.payment_cb)
    } else if path.starts_with("/send-notification") {
        Some(&state.resiliency.push_cb)
    } else {
        None
    }
}

fn counts_as_failure(status: axum::http::StatusCode) -> bool {
    status.is_server_error()
}

pub async fn circuit_breaker_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let Some(cb) = breaker_for(&state, req.uri().path()) else {
        return next.run(req).await;
    };

    if !cb.check().await {
        return AppError::ServiceUnavailable(format!("Circuit Breaker [{}] is OPEN", cb.name)).into_response();
    }

    let response = next.run(req).await;
    // Only outages count; declines and bad input are the caller's problem.
    if counts_as_failure(response.status()) {
        cb.record_failure().await;
    } else {
        cb.record_success().await;
    }
    response
}

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let Some(redis) = &state.redis else {
        return next.run(req).await;
    };

    let ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let key = format!("ratelimit:{}", ip);
    let rules = &state.business_rules;

    match redis
        .check_rate_limit(&key, rules.rate_limit_requests, rules.rate_limit_window_seconds)
        .await
    {
        Ok(true) => next.run(req).await,
        Ok(false) => AppError::RateLimitError("Too many requests, please try again later".to_string()).into_response(),
        Err(e) => {
            tracing::warn!("Rate limiter unavailable, allowing request: {}", e);
            next.run(req).await // Fail open
        }
    }
}
