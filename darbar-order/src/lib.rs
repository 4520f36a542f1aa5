pub mod cart;
pub mod manager;
pub mod models;
pub mod orchestrator;
pub mod rewards;
pub mod summary;

pub use cart::{CartItem, CartItemUpdate, NewCartItem};
pub use manager::{customer_cancel, transition, OrderError};
pub use models::{NewOrder, Order, OrderLine, OrderStatus};
pub use orchestrator::{MockPaymentGateway, PaymentError, PaymentOrchestrator};
pub use rewards::{accrue_rewards, apply_redemption, redeem_reward, Redemption, RewardError, RewardLedger};
pub use summary::daily_summary;
