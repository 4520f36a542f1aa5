use anyhow::Context;
use darbar_api::{app, AppState, Services};
use darbar_core::identity::{IdentityProvider, MockIdentityProvider};
use darbar_core::payment::PaymentGateway;
use darbar_core::push::{MockPushGateway, PushGateway};
use darbar_core::storage::ObjectStore;
use darbar_core::store::DocumentStore;
use darbar_order::MockPaymentGateway;
use darbar_store::app_config::Config;
use darbar_store::firebase_auth::FirebaseAuth;
use darbar_store::object_store::CloudObjectStore;
use darbar_store::pushy::PushyGateway;
use darbar_store::stripe::StripeGateway;
use darbar_store::{DbClient, MemoryDocumentStore, MemoryObjectStore, PgDocumentStore, RedisClient};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn documents(config: &Config) -> anyhow::Result<Arc<dyn DocumentStore>> {
    if config.database.in_memory {
        tracing::warn!("Using in-memory document store; data is lost on restart");
        return Ok(Arc::new(MemoryDocumentStore::new()));
    }

    let db = DbClient::new(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to connect to Postgres")?;
    db.migrate().await.context("Failed to run migrations")?;
    Ok(Arc::new(PgDocumentStore::new(db.pool)))
}

async fn services(config: &Config) -> anyhow::Result<Services> {
    let redis = match &config.redis {
        Some(redis) => Some(Arc::new(
            RedisClient::new(&redis.url).await.context("Invalid Redis URL")?,
        )),
        None => {
            tracing::warn!("Redis not configured; rate limiting and token revocation disabled");
            None
        }
    };

    let documents = documents(config).await?;

    if config.gateways.use_mocks {
        tracing::warn!("Using mock identity, payment, push and storage services");
        let identity: Arc<dyn IdentityProvider> = Arc::new(MockIdentityProvider::new());
        let payments: Arc<dyn PaymentGateway> = Arc::new(MockPaymentGateway::new());
        let push: Arc<dyn PushGateway> = Arc::new(MockPushGateway::new());
        let storage: Arc<dyn ObjectStore> = Arc::new(MemoryObjectStore::new(
            &config.storage.public_url,
            &config.storage.bucket,
        ));
        return Ok(Services {
            documents,
            identity,
            storage,
            payments,
            push,
            redis,
        });
    }

    Ok(Services {
        documents,
        identity: Arc::new(FirebaseAuth::new(
            config.identity.api_key.clone(),
            config.identity.access_token.clone(),
            config.identity.api_url.clone(),
        )),
        storage: Arc::new(CloudObjectStore::new(
            config.storage.bucket.clone(),
            config.storage.access_token.clone(),
            config.storage.api_url.clone(),
            config.storage.public_url.clone(),
        )),
        payments: Arc::new(StripeGateway::new(
            config.stripe.secret_key.clone(),
            config.stripe.api_url.clone(),
        )),
        push: Arc::new(PushyGateway::new(config.pushy.api_key.clone(), config.pushy.api_url.clone())),
        redis,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "darbar_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Darbar API on port {}", config.server.port);

    let services = services(&config).await?;
    let app = app(AppState::new(&config, services));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
