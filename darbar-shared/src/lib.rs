pub mod money;
pub mod pii;
pub mod models;

pub use money::{is_valid_amount, is_whole_cents, round_to_cents, to_minor_units};
pub use pii::Masked;
