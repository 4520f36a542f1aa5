use darbar_shared::is_valid_amount;
use serde::{Deserialize, Serialize};

use crate::manager::OrderError;

/// A line in `users/{uid}/cart`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub dish_id: String,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl CartItem {
    /// Fold another add of the same dish into this line.
    pub fn merge(&mut self, added: &CartItem) {
        self.quantity = self.quantity.saturating_add(added.quantity);
        self.price = added.price;
        self.name = added.name.clone();
        if added.image.is_some() {
            self.image = added.image.clone();
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCartItem {
    #[serde(default)]
    pub dish_id: String,
    #[serde(default)]
    pub name: String,
    pub price: f64,
    #[serde(default = "one")]
    pub quantity: u32,
    #[serde(default)]
    pub image: Option<String>,
}

fn one() -> u32 {
    1
}

impl NewCartItem {
    pub fn validate(self) -> Result<CartItem, OrderError> {
        if self.dish_id.trim().is_empty() {
            return Err(OrderError::Invalid("dishId is required".to_string()));
        }
        if self.quantity == 0 {
            return Err(OrderError::Invalid("Quantity must be at least 1".to_string()));
        }
        if !is_valid_amount(self.price) {
            return Err(OrderError::Invalid(format!("Invalid price: {}", self.price)));
        }
        Ok(CartItem {
            dish_id: self.dish_id,
            name: self.name,
            price: self.price,
            quantity: self.quantity,
            image: self.image,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemUpdate {
    pub quantity: Option<u32>,
    pub price: Option<f64>,
    pub name: Option<String>,
}

impl CartItemUpdate {
    pub fn apply(self, item: &mut CartItem) -> Result<(), OrderError> {
        if let Some(quantity) = self.quantity {
            if quantity == 0 {
                return Err(OrderError::Invalid("Quantity must be at least 1".to_string()));
            }
            item.quantity = quantity;
        }
        if let Some(price) = self.price {
            if !is_valid_amount(price) {
                return Err(OrderError::Invalid(format!("Invalid price: {}", price)));
            }
            item.price = price;
        }
        if let Some(name) = self.name {
            item.name = name;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn naan(quantity: u32) -> CartItem {
        CartItem {
            dish_id: "d7".to_string(),
            name: "Garlic Naan".to_string(),
            price: 3.0,
            quantity,
            image: None,
        }
    }

    #[test]
    fn test_merge_adds_quantity() {
        let mut item = naan(2);
        item.merge(&naan(3));
        assert_eq!(item.quantity, 5);
    }

    #[test]
    fn test_new_item_defaults_to_one() {
        let request: NewCartItem =
            serde_json::from_value(json!({"dishId": "d7", "name": "Garlic Naan", "price": 3.0})).unwrap();
        assert_eq!(request.validate().unwrap().quantity, 1);
    }

    #[test]
    fn test_new_item_rejects_zero_quantity() {
        let request: NewCartItem =
            serde_json::from_value(json!({"dishId": "d7", "price": 3.0, "quantity": 0})).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_update() {
        let mut item = naan(1);
        let update = CartItemUpdate {
            quantity: Some(4),
            ..CartItemUpdate::default()
        };
        update.apply(&mut item).unwrap();
        assert_eq!(item.quantity, 4);

        let bad = CartItemUpdate {
            quantity: Some(0),
            ..CartItemUpdate::default()
        };
        assert!(bad.apply(&mut item).is_err());
        assert_eq!(item.quantity, 4);
    }
}
