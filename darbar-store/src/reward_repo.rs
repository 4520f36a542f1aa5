use darbar_core::store::{DocumentStore, Stored};
use darbar_core::CoreResult;
use darbar_order::RewardLedger;
use std::sync::Arc;

use crate::collection::Collection;

pub const REWARDS: &str = "rewards";
pub const REWARD_DOC: &str = "rewardDoc";

#[derive(Clone)]
pub struct RewardRepository {
    ledgers: Collection<RewardLedger>,
}

impl RewardRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            ledgers: Collection::new(store, REWARDS),
        }
    }

    pub async fn ledger(&self) -> CoreResult<Option<RewardLedger>> {
        self.ledgers.get(REWARD_DOC).await
    }

    /// Store the ledger, returning whether it was newly created.
    pub async fn save(&self, ledger: &RewardLedger) -> CoreResult<bool> {
        let created = !self.ledgers.exists(REWARD_DOC).await?;
        self.ledgers.put(REWARD_DOC, ledger).await?;
        Ok(created)
    }

    pub async fn list(&self) -> CoreResult<Vec<Stored<RewardLedger>>> {
        self.ledgers.list().await
    }
}
