use darbar_core::identity::{IdentityProvider, MockIdentityProvider};
use darbar_core::payment::PaymentGateway;
use darbar_core::push::{MockPushGateway, PushGateway};
use darbar_core::storage::ObjectStore;
use darbar_core::store::DocumentStore;
use darbar_order::{MockPaymentGateway, PaymentOrchestrator};
use darbar_store::app_config::{BusinessRules, Config};
use darbar_store::catalog_repo::CatalogRepository;
use darbar_store::notification_repo::NotificationRepository;
use darbar_store::offer_repo::{GameRepository, PromoRepository};
use darbar_store::order_repo::{CartRepository, OrderRepository};
use darbar_store::reward_repo::RewardRepository;
use darbar_store::user_repo::UserRepository;
use darbar_store::{EventLog, MemoryDocumentStore, MemoryObjectStore, RedisClient};
use std::sync::Arc;
use std::time::Duration;

use crate::middleware::resiliency::CircuitBreaker;

#[derive(Clone)]
pub struct AuthConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl_seconds: u64,
    pub refresh_ttl_seconds: u64,
}

impl AuthConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            access_secret: config.auth.jwt_secret.clone(),
            refresh_secret: config.auth.refresh_secret.clone(),
            access_ttl_seconds: config.auth.access_token_seconds,
            refresh_ttl_seconds: config.auth.refresh_token_seconds,
        }
    }
}

pub struct ResiliencyState {
    pub payment_cb: CircuitBreaker,
    pub push_cb: CircuitBreaker,
}

impl ResiliencyState {
    pub fn new(rules: &BusinessRules) -> Self {
        let timeout = Duration::from_secs(rules.circuit_breaker_timeout_seconds);
        let threshold = rules.circuit_breaker_threshold as usize;
        Self {
            payment_cb: CircuitBreaker::new("payments", threshold, timeout),
            push_cb: CircuitBreaker::new("push", threshold, timeout),
        }
    }
}

/// The external collaborators the API is wired to.
pub struct Services {
    pub documents: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub storage: Arc<dyn ObjectStore>,
    pub payments: Arc<dyn PaymentGateway>,
    pub push: Arc<dyn PushGateway>,
    pub redis: Option<Arc<RedisClient>>,
}

impl Services {
    /// Everything in process: memory documents and storage, mock gateways, no Redis.
    pub fn in_memory(config: &Config) -> Self {
        Self {
            documents: Arc::new(MemoryDocumentStore::new()),
            identity: Arc::new(MockIdentityProvider::new()),
            storage: Arc::new(MemoryObjectStore::new(&config.storage.public_url, &config.storage.bucket)),
            payments: Arc::new(MockPaymentGateway::new()),
            push: Arc::new(MockPushGateway::new()),
            redis: None,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub users: UserRepository,
    pub catalog: CatalogRepository,
    pub orders: OrderRepository,
    pub carts: CartRepository,
    pub promos: PromoRepository,
    pub games: GameRepository,
    pub rewards: RewardRepository,
    pub notifications: NotificationRepository,
    pub events: EventLog,
    pub identity: Arc<dyn IdentityProvider>,
    pub storage: Arc<dyn ObjectStore>,
    pub push: Arc<dyn PushGateway>,
    pub payments: Arc<PaymentOrchestrator>,
    pub redis: Option<Arc<RedisClient>>,
    pub resiliency: Arc<ResiliencyState>,
    pub auth: AuthConfig,
    pub business_rules: BusinessRules,
    pub cors_origins: Vec<String>,
}

impl AppState {
    pub fn new(config: &Config, services: Services) -> Self {
        let documents = services.documents;
        Self {
            users: UserRepository::new(documents.clone()),
            catalog: CatalogRepository::new(documents.clone()),
            orders: OrderRepository::new(documents.clone()),
            carts: CartRepository::new(documents.clone()),
            promos: PromoRepository::new(documents.clone()),
            games: GameRepository::new(documents.clone()),
            rewards: RewardRepository::new(documents.clone()),
            notifications: NotificationRepository::new(documents.clone()),
            events: EventLog::new(documents),
            identity: services.identity,
            storage: services.storage,
            push: services.push,
            payments: Arc::new(PaymentOrchestrator::new(services.payments)),
            redis: services.redis,
            resiliency: Arc::new(ResiliencyState::new(&config.business_rules)),
            auth: AuthConfig::from_config(config),
            business_rules: config.business_rules.clone(),
            cors_origins: config.cors.origins.clone(),
        }
    }
}
