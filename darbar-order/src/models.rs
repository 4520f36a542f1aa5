use chrono::{DateTime, Utc};
use darbar_shared::is_valid_amount;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::manager::OrderError;

/// Order status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    Ready,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Forward moves along the kitchen/delivery path, plus cancellation
    /// before the food is ready.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Confirmed, Preparing)
                | (Preparing, Ready)
                | (Ready, OutForDelivery)
                | (Ready, Delivered)
                | (OutForDelivery, Delivered)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
                | (Preparing, Cancelled)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Ready => "READY",
            OrderStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

/// One dish within an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub dish_id: String,
    #[serde(default)]
    pub name: String,
    pub price: f64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_quantity() -> u32 {
    1
}

/// An order document in the `orders` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub user_id: String,
    pub items: Vec<OrderLine>,
    pub total_price: f64,
    #[serde(default)]
    pub order_status: OrderStatus,
    pub order_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promo_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn update_status(&mut self, status: OrderStatus, now: DateTime<Utc>) {
        self.order_status = status;
        self.updated_at = Some(now);
    }

    pub fn item_count(&self) -> u32 {
        self.items.iter().fold(0u32, |count, item| count.saturating_add(item.quantity))
    }
}

/// Checkout request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    #[serde(default)]
    pub items: Vec<OrderLine>,
    pub total_price: f64,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub promo_code: Option<String>,
    #[serde(default)]
    pub payment_intent_id: Option<String>,
}

impl NewOrder {
    /// Validate and stamp a pending order for `user_id`.
    pub fn into_order(self, user_id: &str, now: DateTime<Utc>) -> Result<Order, OrderError> {
        if self.items.is_empty() {
            return Err(OrderError::Invalid("Order must contain at least one item".to_string()));
        }
        if !is_valid_amount(self.total_price) {
            return Err(OrderError::Invalid(format!("Invalid total price: {}", self.total_price)));
        }
        if let Some(line) = self
            .items
            .iter()
            .find(|line| line.quantity == 0 || !is_valid_amount(line.price) || line.dish_id.is_empty())
        {
            return Err(OrderError::Invalid(format!("Invalid order item: {:?}", line.dish_id)));
        }

        Ok(Order {
            user_id: user_id.to_string(),
            items: self.items,
            total_price: self.total_price,
            order_status: OrderStatus::Pending,
            order_date: now,
            address: self.address,
            promo_code: self.promo_code,
            payment_intent_id: self.payment_intent_id,
            updated_at: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn checkout() -> NewOrder {
        serde_json::from_value(json!({
            "items": [
                {"dishId": "d1", "name": "Butter Chicken", "price": 15.5, "quantity": 2},
                {"dishId": "d2", "name": "Garlic Naan", "price": 3.0}
            ],
            "totalPrice": 34.0,
            "address": "12 Curry Lane"
        }))
        .unwrap()
    }

    #[test]
    fn test_new_order_is_pending() {
        let order = checkout().into_order("u1", Utc::now()).unwrap();
        assert_eq!(order.order_status, OrderStatus::Pending);
        assert_eq!(order.user_id, "u1");
        assert_eq!(order.item_count(), 3);
    }

    #[test]
    fn test_item_count_saturates() {
        let mut request = checkout();
        request.items[0].quantity = u32::MAX;
        let order = request.into_order("u1", Utc::now()).unwrap();
        assert_eq!(order.item_count(), u32::MAX);
    }

    #[test]
    fn test_empty_order_rejected() {
        let mut request = checkout();
        request.items.clear();
        assert!(matches!(request.into_order("u1", Utc::now()), Err(OrderError::Invalid(_))));
    }

    #[test]
    fn test_negative_total_rejected() {
        let mut request = checkout();
        request.total_price = -1.0;
        assert!(request.into_order("u1", Utc::now()).is_err());
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_value(OrderStatus::OutForDelivery).unwrap(), json!("OUT_FOR_DELIVERY"));
        assert_eq!(OrderStatus::OutForDelivery.as_str(), "OUT_FOR_DELIVERY");
    }

    #[test]
    fn test_lifecycle_rules() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Preparing.can_transition_to(Cancelled));
        assert!(!Ready.can_transition_to(Cancelled));
        assert!(!Delivered.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Delivered));
        assert!(Cancelled.is_terminal());
    }
}
