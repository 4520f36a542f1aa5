pub mod games;
pub mod promo;

pub use games::{GameError, GameLimit, MiniGame};
pub use promo::{validate_promo, NewPromo, PromoCode, PromoError, PromoSummary, PromoValidation};
