use darbar_core::store::{DocumentStore, Stored};
use darbar_core::{CoreError, CoreResult};
use darbar_offer::{MiniGame, PromoCode};
use std::sync::Arc;

use crate::collection::Collection;

pub const PROMO_CODES: &str = "promoCodes";
pub const MINI_GAMES: &str = "miniGames";

/// Promo codes keyed by the code itself.
#[derive(Clone)]
pub struct PromoRepository {
    promos: Collection<PromoCode>,
}

impl PromoRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            promos: Collection::new(store, PROMO_CODES),
        }
    }

    pub async fn find(&self, code: &str) -> CoreResult<Option<PromoCode>> {
        self.promos.get(code).await
    }

    /// Codes are created once; an existing code is a conflict.
    pub async fn create(&self, code: &str, promo: &PromoCode) -> CoreResult<()> {
        if self.promos.exists(code).await? {
            return Err(CoreError::Conflict("Promo code already exists".to_string()));
        }
        self.promos.put(code, promo).await
    }

    pub async fn list(&self) -> CoreResult<Vec<Stored<PromoCode>>> {
        self.promos.list().await
    }
}

#[derive(Clone)]
pub struct GameRepository {
    games: Collection<MiniGame>,
}

impl GameRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            games: Collection::new(store, MINI_GAMES),
        }
    }

    pub fn games(&self) -> &Collection<MiniGame> {
        &self.games
    }

    pub async fn count(&self) -> CoreResult<usize> {
        Ok(self.games.list().await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDocumentStore;
    use chrono::Utc;

    #[tokio::test]
    async fn test_duplicate_promo_conflicts() {
        let repo = PromoRepository::new(Arc::new(MemoryDocumentStore::new()));
        let promo = PromoCode {
            discount: 0.2,
            expiration_date: Utc::now(),
        };
        repo.create("WELCOME20", &promo).await.unwrap();
        assert!(matches!(repo.create("WELCOME20", &promo).await, Err(CoreError::Conflict(_))));
        assert_eq!(repo.find("WELCOME20").await.unwrap(), Some(promo));
        assert!(repo.find("NOPE").await.unwrap().is_none());
    }
}
