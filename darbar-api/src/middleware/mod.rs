pub mod auth;
pub mod resiliency;

pub use auth::{session_middleware, AdminUser, Claims, CurrentUser, MaybeUser, TokenKind};
pub use resiliency::{circuit_breaker_middleware, rate_limit_middleware, CircuitBreaker};
