use chrono::{DateTime, Utc};
use darbar_core::store::{DocumentStore, Stored};
use darbar_core::user::UserProfile;
use darbar_core::CoreResult;
use serde_json::json;
use std::sync::Arc;

use crate::collection::Collection;

pub const USERS: &str = "users";

/// Profiles under `users/{uid}`, keyed by the identity provider's uid.
#[derive(Clone)]
pub struct UserRepository {
    users: Collection<UserProfile>,
}

impl UserRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            users: Collection::new(store, USERS),
        }
    }

    pub async fn get(&self, uid: &str) -> CoreResult<Option<UserProfile>> {
        self.users.get(uid).await
    }

    pub async fn save(&self, uid: &str, profile: &UserProfile) -> CoreResult<()> {
        self.users.put(uid, profile).await
    }

    pub async fn list(&self) -> CoreResult<Vec<Stored<UserProfile>>> {
        self.users.list().await
    }

    pub async fn delete(&self, uid: &str) -> CoreResult<bool> {
        self.users.delete(uid).await
    }

    pub async fn set_rewards(&self, uid: &str, rewards: u64) -> CoreResult<()> {
        self.users.patch(uid, json!({ "rewards": rewards })).await
    }

    pub async fn set_gold_member(&self, uid: &str, gold_member: bool, now: DateTime<Utc>) -> CoreResult<()> {
        self.users
            .patch(uid, json!({ "goldMember": gold_member, "updatedAt": now }))
            .await
    }

    pub async fn record_login(&self, uid: &str, now: DateTime<Utc>) -> CoreResult<()> {
        self.users.patch(uid, json!({ "lastLogin": now })).await
    }

    pub async fn set_image(&self, uid: &str, image: &str, now: DateTime<Utc>) -> CoreResult<()> {
        self.users
            .patch(uid, json!({ "image": image, "updatedAt": now }))
            .await
    }
}
