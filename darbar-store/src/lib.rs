pub mod app_config;
pub mod collection;
pub mod database;
pub mod document_repo;
pub mod events;
pub mod memory;
pub mod redis_repo;

pub mod catalog_repo;
pub mod notification_repo;
pub mod offer_repo;
pub mod order_repo;
pub mod reward_repo;
pub mod user_repo;

pub mod firebase_auth;
pub mod object_store;
pub mod pushy;
pub mod stripe;

pub use collection::Collection;
pub use database::DbClient;
pub use document_repo::PgDocumentStore;
pub use events::EventLog;
pub use memory::{MemoryDocumentStore, MemoryObjectStore};
pub use redis_repo::RedisClient;
