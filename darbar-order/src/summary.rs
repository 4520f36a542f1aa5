use std::collections::BTreeMap;

use crate::models::Order;

/// Order counts per UTC calendar day, keyed `YYYY-MM-DD`.
pub fn daily_summary<'a>(orders: impl IntoIterator<Item = &'a Order>) -> BTreeMap<String, u64> {
    let mut summary = BTreeMap::new();
    for order in orders {
        let day = order.order_date.format("%Y-%m-%d").to_string();
        *summary.entry(day).or_insert(0) += 1;
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderStatus;
    use chrono::{TimeZone, Utc};

    fn order_at(day: u32, hour: u32) -> Order {
        Order {
            user_id: "u1".to_string(),
            items: vec![],
            total_price: 10.0,
            order_status: OrderStatus::Pending,
            order_date: Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap(),
            address: None,
            promo_code: None,
            payment_intent_id: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_daily_summary() {
        let orders = vec![order_at(1, 9), order_at(1, 23), order_at(2, 0)];
        let summary = daily_summary(&orders);
        assert_eq!(summary.get("2024-03-01"), Some(&2));
        assert_eq!(summary.get("2024-03-02"), Some(&1));
        assert_eq!(summary.len(), 2);
    }

    #[test]
    fn test_empty_summary() {
        assert!(daily_summary(&Vec::<Order>::new()).is_empty());
    }
}
