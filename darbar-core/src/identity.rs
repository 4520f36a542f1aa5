use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::{CoreError, CoreResult};

#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityRecord {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub email_verified: bool,
}

/// Capability set of the hosted identity service. Credentials are verified
/// there; this service never stores passwords.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Fails with `Conflict` when the email is already registered.
    async fn create_user(&self, identity: &NewIdentity) -> CoreResult<IdentityRecord>;

    /// Fails with `InvalidCredentials` for unknown emails or wrong passwords.
    async fn sign_in(&self, email: &str, password: &str) -> CoreResult<IdentityRecord>;

    async fn change_password(&self, email: &str, current_password: &str, new_password: &str) -> CoreResult<()>;

    /// Remove an account; used to roll back a registration whose profile
    /// could not be written.
    async fn delete_user(&self, uid: &str) -> CoreResult<()>;
}

struct MockAccount {
    record: IdentityRecord,
    password: String,
}

/// In-process identity provider for tests and local development.
#[derive(Default)]
pub struct MockIdentityProvider {
    accounts: RwLock<HashMap<String, MockAccount>>,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> CoreError {
    CoreError::InternalError("identity accounts lock poisoned".to_string())
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn create_user(&self, identity: &NewIdentity) -> CoreResult<IdentityRecord> {
        let email = identity.email.to_lowercase();
        let mut accounts = self.accounts.write().map_err(|_| poisoned())?;

        if accounts.contains_key(&email) {
            return Err(CoreError::Conflict("User with this email already exists".to_string()));
        }

        let record = IdentityRecord {
            uid: Uuid::new_v4().simple().to_string(),
            email: email.clone(),
            display_name: Some(identity.display_name.clone()),
            email_verified: false,
        };
        accounts.insert(
            email,
            MockAccount {
                record: record.clone(),
                password: identity.password.clone(),
            },
        );

        tracing::info!("Mock identity created: {}", record.uid);
        Ok(record)
    }

    async fn sign_in(&self, email: &str, password: &str) -> CoreResult<IdentityRecord> {
        let accounts = self.accounts.read().map_err(|_| poisoned())?;
        match accounts.get(&email.to_lowercase()) {
            Some(account) if account.password == password => Ok(account.record.clone()),
            _ => Err(CoreError::InvalidCredentials),
        }
    }

    async fn change_password(&self, email: &str, current_password: &str, new_password: &str) -> CoreResult<()> {
        let mut accounts = self.accounts.write().map_err(|_| poisoned())?;
        match accounts.get_mut(&email.to_lowercase()) {
            Some(account) if account.password == current_password => {
                account.password = new_password.to_string();
                Ok(())
            }
            _ => Err(CoreError::InvalidCredentials),
        }
    }

    async fn delete_user(&self, uid: &str) -> CoreResult<()> {
        let mut accounts = self.accounts.write().map_err(|_| poisoned())?;
        accounts.retain(|_, account| account.record.uid != uid);
        Ok(())
    }
}
