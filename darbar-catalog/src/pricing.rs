use darbar_shared::{is_whole_cents, round_to_cents};
use serde::{Deserialize, Serialize};

/// Member percentage used when no gold price has been configured yet:
/// members pay the full base price.
pub const DEFAULT_GOLD_PERCENT: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PricingError {
    #[error("Invalid price: {0}")]
    InvalidPrice(f64),

    #[error("Invalid gold price percentage: {0}")]
    InvalidPercent(f64),

    #[error("Invalid discount: {0}")]
    InvalidDiscount(f64),
}

/// Prices are whole cents; rounding a fraction of a cent up could push the
/// member price above the base.
fn ensure_price(price: f64) -> Result<(), PricingError> {
    if price.is_finite() && price >= 0.0 && is_whole_cents(price) {
        Ok(())
    } else {
        Err(PricingError::InvalidPrice(price))
    }
}

pub fn ensure_percent(percent: f64) -> Result<(), PricingError> {
    if percent.is_finite() && (0.0..=100.0).contains(&percent) {
        Ok(())
    } else {
        Err(PricingError::InvalidPercent(percent))
    }
}

/// Price a gold member pays: `base × percent / 100`, rounded to cents.
pub fn compute_member_price(base_price: f64, percent: f64) -> Result<f64, PricingError> {
    ensure_price(base_price)?;
    ensure_percent(percent)?;
    Ok(round_to_cents(base_price * percent / 100.0))
}

/// Special-offer price: `price − price × discount / 100`, rounded to cents.
pub fn discounted_price(price: f64, discount_percent: f64) -> Result<f64, PricingError> {
    ensure_price(price)?;
    if !discount_percent.is_finite() || discount_percent <= 0.0 || discount_percent > 100.0 {
        return Err(PricingError::InvalidDiscount(discount_percent));
    }
    Ok(round_to_cents(price - price * discount_percent / 100.0))
}

/// The singleton `goldprice/current` document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoldPriceSetting {
    pub gold_price: f64,
}

/// Member pricing for one gold percentage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoldPricing {
    percent: f64,
}

impl Default for GoldPricing {
    fn default() -> Self {
        Self {
            percent: DEFAULT_GOLD_PERCENT,
        }
    }
}

impl GoldPricing {
    pub fn new(percent: f64) -> Result<Self, PricingError> {
        ensure_percent(percent)?;
        Ok(Self { percent })
    }

    /// Pricing from the stored setting, or full price when none is stored.
    pub fn from_setting(setting: Option<&GoldPriceSetting>) -> Result<Self, PricingError> {
        match setting {
            Some(s) => Self::new(s.gold_price),
            None => Ok(Self::default()),
        }
    }

    pub fn percent(&self) -> f64 {
        self.percent
    }

    pub fn member_price(&self, base_price: f64) -> Result<f64, PricingError> {
        compute_member_price(base_price, self.percent)
    }

    pub fn setting(&self) -> GoldPriceSetting {
        GoldPriceSetting {
            gold_price: self.percent,
        }
    }
}
