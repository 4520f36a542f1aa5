use darbar_core::store::{collection_path, DocumentStore, Stored};
use darbar_core::CoreResult;
use darbar_order::{CartItem, Order};
use serde_json::json;
use std::sync::Arc;

use crate::collection::Collection;

pub const ORDERS: &str = "orders";
pub const USERS: &str = "users";
pub const CART: &str = "cart";

/// Orders live once, in the top-level `orders` collection, tagged with `userId`.
#[derive(Clone)]
pub struct OrderRepository {
    orders: Collection<Order>,
}

impl OrderRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            orders: Collection::new(store, ORDERS),
        }
    }

    pub async fn create(&self, order: &Order) -> CoreResult<String> {
        self.orders.insert(order).await
    }

    pub async fn get(&self, order_id: &str) -> CoreResult<Option<Order>> {
        self.orders.get(order_id).await
    }

    pub async fn save(&self, order_id: &str, order: &Order) -> CoreResult<()> {
        self.orders.put(order_id, order).await
    }

    pub async fn list(&self) -> CoreResult<Vec<Stored<Order>>> {
        self.orders.list().await
    }

    pub async fn for_user(&self, user_id: &str) -> CoreResult<Vec<Stored<Order>>> {
        self.orders.list_where("userId", json!(user_id)).await
    }

    pub async fn count(&self) -> CoreResult<usize> {
        Ok(self.orders.list().await?.len())
    }
}

/// Each user's cart under `users/{uid}/cart`.
#[derive(Clone)]
pub struct CartRepository {
    store: Arc<dyn DocumentStore>,
}

impl CartRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn cart(&self, user_id: &str) -> Collection<CartItem> {
        Collection::new(self.store.clone(), collection_path(&[USERS, user_id, CART]))
    }

    /// Add a line, folding it into an existing line for the same dish.
    /// Returns the line id and whether it was merged.
    pub async fn add_item(&self, user_id: &str, item: &CartItem) -> CoreResult<(String, bool)> {
        let cart = self.cart(user_id);
        let existing = cart.list_where("dishId", json!(item.dish_id)).await?;
        match existing.into_iter().next() {
            Some(mut line) => {
                line.value.merge(item);
                cart.put(&line.id, &line.value).await?;
                Ok((line.id, true))
            }
            None => Ok((cart.insert(item).await?, false)),
        }
    }

    pub async fn clear(&self, user_id: &str) -> CoreResult<usize> {
        Ok(self.cart(user_id).clear().await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDocumentStore;
    use chrono::Utc;
    use darbar_order::{NewOrder, OrderStatus};

    fn naan(quantity: u32) -> CartItem {
        CartItem {
            dish_id: "d7".to_string(),
            name: "Garlic Naan".to_string(),
            price: 3.0,
            quantity,
            image: None,
        }
    }

    #[tokio::test]
    async fn test_cart_merges_same_dish() {
        let repo = CartRepository::new(Arc::new(MemoryDocumentStore::new()));
        let (first, merged) = repo.add_item("u1", &naan(1)).await.unwrap();
        assert!(!merged);
        let (second, merged) = repo.add_item("u1", &naan(2)).await.unwrap();
        assert!(merged);
        assert_eq!(first, second);

        let lines = repo.cart("u1").list().await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].value.quantity, 3);

        assert!(repo.cart("u2").list().await.unwrap().is_empty());
        assert_eq!(repo.clear("u1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_orders_by_user() {
        let repo = OrderRepository::new(Arc::new(MemoryDocumentStore::new()));
        let request: NewOrder = serde_json::from_value(serde_json::json!({
            "items": [{"dishId": "d1", "name": "Dal", "price": 9.0}],
            "totalPrice": 9.0
        }))
        .unwrap();

        let order = request.clone().into_order("u1", Utc::now()).unwrap();
        let id = repo.create(&order).await.unwrap();
        repo.create(&request.into_order("u2", Utc::now()).unwrap()).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 2);
        let mine = repo.for_user("u1").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, id);
        assert_eq!(mine[0].value.order_status, OrderStatus::Pending);
    }
}
