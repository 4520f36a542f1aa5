use chrono::{DateTime, Utc};

use crate::models::{Order, OrderStatus};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum OrderError {
    #[error("Invalid order: {0}")]
    Invalid(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: &'static str, to: &'static str },
}

/// Move an order to `next`, enforcing the lifecycle rules.
pub fn transition(order: &mut Order, next: OrderStatus, now: DateTime<Utc>) -> Result<(), OrderError> {
    let current = order.order_status;
    if !current.can_transition_to(next) {
        return Err(OrderError::InvalidTransition {
            from: current.as_str(),
            to: next.as_str(),
        });
    }
    order.update_status(next, now);
    Ok(())
}

/// Customers may only cancel, and only before preparation starts.
pub fn customer_cancel(order: &mut Order, requested: OrderStatus, now: DateTime<Utc>) -> Result<(), OrderError> {
    let current = order.order_status;
    if requested != OrderStatus::Cancelled || !matches!(current, OrderStatus::Pending | OrderStatus::Confirmed) {
        return Err(OrderError::InvalidTransition {
            from: current.as_str(),
            to: requested.as_str(),
        });
    }
    order.update_status(OrderStatus::Cancelled, now);
    Ok(())
}
