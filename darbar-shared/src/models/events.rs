/// Audit events recorded alongside the state changes that produce them.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEvent {
    OrderPlaced(OrderPlacedEvent),
    OrderStatusChanged(OrderStatusChangedEvent),
    RewardRedeemed(RewardRedeemedEvent),
    GoldPriceChanged(GoldPriceChangedEvent),
    NotificationSent(NotificationSentEvent),
}

/// Seconds since the Unix epoch, the timestamp unit of every event.
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

impl AuditEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AuditEvent::OrderPlaced(_) => "ORDER_PLACED",
            AuditEvent::OrderStatusChanged(_) => "ORDER_STATUS_CHANGED",
            AuditEvent::RewardRedeemed(_) => "REWARD_REDEEMED",
            AuditEvent::GoldPriceChanged(_) => "GOLD_PRICE_CHANGED",
            AuditEvent::NotificationSent(_) => "NOTIFICATION_SENT",
        }
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct OrderPlacedEvent {
    pub order_id: String,
    pub user_id: String,
    pub total_price: f64,
    pub rewards_earned: u64,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct OrderStatusChangedEvent {
    pub order_id: String,
    pub from: String,
    pub to: String,
    pub changed_by: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct RewardRedeemedEvent {
    pub user_id: String,
    pub points_spent: u64,
    pub dollar_value: f64,
    pub new_balance: u64,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct GoldPriceChangedEvent {
    pub percent: f64,
    pub dishes_repriced: usize,
    pub scope: Option<String>,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct NotificationSentEvent {
    pub notification_id: String,
    pub title: String,
    pub delivered: usize,
    pub timestamp: i64,
}
