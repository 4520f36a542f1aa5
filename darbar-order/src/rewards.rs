use darbar_shared::round_to_cents;
use serde::{Deserialize, Serialize};

/// Points spent by one redemption.
pub const POINTS_PER_REDEMPTION: u64 = 10;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RewardError {
    #[error("Reward and dollar values must be positive numbers")]
    InvalidLedger,

    #[error("Invalid order total: {0}")]
    InvalidTotal(f64),

    #[error("At least {required} reward points are needed, balance is {balance}")]
    InsufficientPoints { balance: u64, required: u64 },
}

/// The singleton `rewards/rewardDoc` document.
///
/// `reward` points are worth `dollar` dollars, and every `dollar` spent
/// on an order earns one point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardLedger {
    pub reward: f64,
    pub dollar: f64,
}

impl RewardLedger {
    pub fn new(reward: f64, dollar: f64) -> Result<Self, RewardError> {
        let ledger = Self { reward, dollar };
        ledger.validate()?;
        Ok(ledger)
    }

    pub fn validate(&self) -> Result<(), RewardError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if positive(self.reward) && positive(self.dollar) {
            Ok(())
        } else {
            Err(RewardError::InvalidLedger)
        }
    }

    /// Dollar value of one redemption.
    pub fn redemption_value(&self) -> f64 {
        let points = POINTS_PER_REDEMPTION as f64;
        if self.reward == 1.0 {
            points * self.dollar
        } else {
            points * (self.dollar / self.reward)
        }
    }
}

/// Points earned by an order: one per whole `dollars_per_point` spent.
pub fn accrue_rewards(order_total: f64, dollars_per_point: f64) -> Result<u64, RewardError> {
    if !dollars_per_point.is_finite() || dollars_per_point <= 0.0 {
        return Err(RewardError::InvalidLedger);
    }
    if !order_total.is_finite() || order_total < 0.0 {
        return Err(RewardError::InvalidTotal(order_total));
    }
    Ok((order_total / dollars_per_point).floor() as u64)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Redemption {
    pub new_balance: u64,
    pub dollar_value: f64,
}

/// Spend one redemption's worth of points. The balance never goes negative.
pub fn redeem_reward(user_points: u64, ledger: &RewardLedger) -> Result<Redemption, RewardError> {
    ledger.validate()?;
    let new_balance = user_points
        .checked_sub(POINTS_PER_REDEMPTION)
        .ok_or(RewardError::InsufficientPoints {
            balance: user_points,
            required: POINTS_PER_REDEMPTION,
        })?;
    Ok(Redemption {
        new_balance,
        dollar_value: ledger.redemption_value(),
    })
}

/// Order total after a redemption, rounded to cents and never below zero.
pub fn apply_redemption(order_total: f64, redemption: &Redemption) -> f64 {
    round_to_cents((order_total - redemption.dollar_value).max(0.0))
}
