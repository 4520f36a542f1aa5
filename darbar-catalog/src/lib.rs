pub mod category;
pub mod dish;
pub mod location;
pub mod pricing;

pub use category::Category;
pub use dish::{Dish, DishDraft, DishRecord, DishUpdate, DishView};
pub use location::{Location, LocationDraft};
pub use pricing::{compute_member_price, discounted_price, GoldPriceSetting, GoldPricing, PricingError};

/// Catalog input errors.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CatalogError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Invalid category name: {0:?}")]
    InvalidCategory(String),

    #[error(transparent)]
    Pricing(#[from] PricingError),
}
