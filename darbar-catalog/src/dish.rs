use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::pricing::{discounted_price, GoldPricing, PricingError};
use crate::CatalogError;

fn default_available() -> bool {
    true
}

/// A dish document under `category/{name}/dishes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dish {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    /// Member price, derived from `price` and the gold percentage.
    #[serde(default)]
    pub gold_price: f64,
    /// Special-offer discount in percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<f64>,
    #[serde(default)]
    pub offer_available: bool,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub image: String,
    /// Free-form menu attributes (spice level, tags, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Dish {
    pub fn reprice(&mut self, pricing: &GoldPricing) -> Result<(), PricingError> {
        self.gold_price = pricing.member_price(self.price)?;
        Ok(())
    }

    /// Price shown to a customer.
    pub fn visible_price(&self, gold_member: bool) -> f64 {
        if gold_member {
            self.gold_price
        } else {
            self.price
        }
    }

    pub fn apply_discount(&mut self, discount_percent: f64) -> Result<(), PricingError> {
        discounted_price(self.price, discount_percent)?;
        self.discount = Some(discount_percent);
        self.offer_available = true;
        Ok(())
    }

    pub fn toggle_availability(&mut self) -> bool {
        self.available = !self.available;
        self.available
    }

    /// Customer view; unavailable dishes are hidden.
    pub fn for_customer(&self, id: &str, category: Option<&str>, gold_member: bool) -> Option<DishView> {
        if !self.available {
            return None;
        }
        Some(self.view(id, category, self.visible_price(gold_member)))
    }

    /// Special-offer view with the discounted price, when the dish is on offer.
    pub fn as_special_offer(&self, id: &str, category: &str) -> Option<DishView> {
        if !(self.available && self.offer_available) {
            return None;
        }
        let discount = self.discount?;
        let price = discounted_price(self.price, discount).ok()?;
        Some(self.view(id, Some(category), price))
    }

    fn view(&self, id: &str, category: Option<&str>, price: f64) -> DishView {
        DishView {
            dish_id: id.to_string(),
            category: category.map(str::to_string),
            name: self.name.clone(),
            description: self.description.clone(),
            price,
            discount: self.discount,
            offer_available: self.offer_available,
            available: self.available,
            image: self.image.clone(),
            extra: self.extra.clone(),
        }
    }
}

/// What customers see. The member price is never exposed directly.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DishView {
    pub dish_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<f64>,
    pub offer_available: bool,
    pub available: bool,
    pub image: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Admin view: the raw document with its id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DishRecord {
    pub dish_id: String,
    #[serde(flatten)]
    pub dish: Dish,
}

/// The `dishData` JSON of a create request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DishDraft {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DishDraft {
    /// Validate and build the stored dish. Returns the target category too.
    pub fn into_dish(self, pricing: &GoldPricing, image: Option<String>) -> Result<(String, Dish), CatalogError> {
        let category = self.category.trim().to_string();
        crate::category::validate_name(&category)?;
        if self.name.trim().is_empty() {
            return Err(CatalogError::MissingField("name"));
        }

        let mut dish = Dish {
            name: self.name.trim().to_string(),
            description: self.description,
            price: self.price,
            gold_price: 0.0,
            discount: None,
            offer_available: false,
            available: true,
            image: image.unwrap_or_default(),
            extra: strip_managed(self.extra),
        };
        dish.reprice(pricing)?;
        Ok((category, dish))
    }
}

/// Partial update of a dish.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DishUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub image: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DishUpdate {
    /// Apply the update; the member price follows a changed base price.
    pub fn apply(self, dish: &mut Dish, pricing: &GoldPricing) -> Result<(), CatalogError> {
        if let Some(name) = self.name {
            if name.trim().is_empty() {
                return Err(CatalogError::MissingField("name"));
            }
            dish.name = name.trim().to_string();
        }
        if let Some(description) = self.description {
            dish.description = Some(description);
        }
        if let Some(image) = self.image {
            dish.image = image;
        }
        if let Some(price) = self.price {
            dish.gold_price = pricing.member_price(price)?;
            dish.price = price;
        }
        dish.extra.extend(strip_managed(self.extra));
        Ok(())
    }
}

// Fields with their own endpoints or derived values never come in as free-form attributes.
fn strip_managed(mut extra: Map<String, Value>) -> Map<String, Value> {
    for key in [
        "category",
        "goldPrice",
        "discount",
        "offerAvailable",
        "available",
        "dishId",
    ] {
        extra.remove(key);
    }
    extra
}
