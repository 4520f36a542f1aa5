use darbar_catalog::{Category, Dish, GoldPriceSetting, GoldPricing, Location, PricingError};
use darbar_core::store::{collection_path, DocumentStore, Stored};
use darbar_core::{CoreError, CoreResult};
use std::sync::Arc;

use crate::collection::Collection;

pub const CATEGORIES: &str = "category";
pub const DISHES: &str = "dishes";
pub const GOLD_PRICE: &str = "goldprice";
pub const GOLD_PRICE_DOC: &str = "current";
pub const LOCATIONS: &str = "location";

pub fn pricing_error(err: PricingError) -> CoreError {
    CoreError::ValidationError(err.to_string())
}

/// Categories, their dishes, member pricing and locations.
#[derive(Clone)]
pub struct CatalogRepository {
    store: Arc<dyn DocumentStore>,
}

impl CatalogRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn categories(&self) -> Collection<Category> {
        Collection::new(self.store.clone(), CATEGORIES)
    }

    pub fn dishes(&self, category: &str) -> Collection<Dish> {
        Collection::new(self.store.clone(), collection_path(&[CATEGORIES, category, DISHES]))
    }

    pub fn locations(&self) -> Collection<Location> {
        Collection::new(self.store.clone(), LOCATIONS)
    }

    fn gold_settings(&self) -> Collection<GoldPriceSetting> {
        Collection::new(self.store.clone(), GOLD_PRICE)
    }

    pub async fn gold_price(&self) -> CoreResult<Option<GoldPriceSetting>> {
        self.gold_settings().get(GOLD_PRICE_DOC).await
    }

    pub async fn set_gold_price(&self, setting: &GoldPriceSetting) -> CoreResult<()> {
        self.gold_settings().put(GOLD_PRICE_DOC, setting).await
    }

    /// Member pricing for new and updated dishes; full price when unset.
    pub async fn current_pricing(&self) -> CoreResult<GoldPricing> {
        let setting = self.gold_price().await?;
        GoldPricing::from_setting(setting.as_ref()).map_err(pricing_error)
    }

    /// Create the category document if it does not exist yet.
    pub async fn ensure_category(&self, name: &str) -> CoreResult<()> {
        let categories = self.categories();
        if !categories.exists(name).await? {
            categories.put(name, &Category { name: name.to_string() }).await?;
            tracing::info!("Category created: {}", name);
        }
        Ok(())
    }

    pub async fn category_names(&self) -> CoreResult<Vec<String>> {
        Ok(self
            .categories()
            .list()
            .await?
            .into_iter()
            .map(|stored| stored.value.name)
            .collect())
    }

    /// Every dish with its category, in category then id order.
    pub async fn all_dishes(&self) -> CoreResult<Vec<(String, Stored<Dish>)>> {
        let mut all = Vec::new();
        for category in self.categories().list().await? {
            for dish in self.dishes(&category.id).list().await? {
                all.push((category.id.clone(), dish));
            }
        }
        Ok(all)
    }

    /// Recompute the member price of every dish in one category.
    pub async fn reprice_category(&self, category: &str, pricing: &GoldPricing) -> CoreResult<usize> {
        let dishes = self.dishes(category);
        let mut repriced = 0;
        for mut stored in dishes.list().await? {
            stored.value.reprice(pricing).map_err(pricing_error)?;
            dishes.put(&stored.id, &stored.value).await?;
            repriced += 1;
        }
        Ok(repriced)
    }

    pub async fn reprice_all(&self, pricing: &GoldPricing) -> CoreResult<usize> {
        let mut repriced = 0;
        for category in self.categories().list().await? {
            repriced += self.reprice_category(&category.id, pricing).await?;
        }
        tracing::info!("Repriced {} dishes at {}%", repriced, pricing.percent());
        Ok(repriced)
    }

    /// Delete a category with all of its dishes. Returns the image URLs
    /// that belonged to the removed dishes.
    pub async fn delete_category(&self, name: &str) -> CoreResult<Vec<String>> {
        let removed = self.dishes(name).clear().await?;
        let deleted = self.categories().delete(name).await?;
        if !deleted && removed.is_empty() {
            return Err(CoreError::NotFound("Category".to_string()));
        }
        Ok(removed
            .into_iter()
            .map(|stored| stored.value.image)
            .filter(|image| !image.is_empty())
            .collect())
    }
}
