use chrono::{DateTime, Utc};
use darbar_shared::round_to_cents;
use serde::{Deserialize, Serialize};

/// A stored promo code, keyed by the code itself in `promoCodes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoCode {
    /// Fraction of the order taken off, in `[0, 1]`.
    pub discount: f64,
    pub expiration_date: DateTime<Utc>,
}

impl PromoCode {
    /// Expired once `now` is past the expiry, compared at whole seconds.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() > self.expiration_date.timestamp()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PromoValidation {
    Valid { discount: f64 },
    Invalid,
    Expired,
}

impl PromoValidation {
    pub fn message(&self) -> Option<&'static str> {
        match self {
            PromoValidation::Valid { .. } => None,
            PromoValidation::Invalid => Some("Invalid promo code"),
            PromoValidation::Expired => Some("Promo code expired"),
        }
    }
}

/// Check a looked-up promo record against the current time.
pub fn validate_promo(promo: Option<&PromoCode>, now: DateTime<Utc>) -> PromoValidation {
    match promo {
        None => PromoValidation::Invalid,
        Some(p) if p.is_expired(now) => PromoValidation::Expired,
        Some(p) => PromoValidation::Valid { discount: p.discount },
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PromoError {
    #[error("Code, discount, and expiration date are required")]
    MissingFields,

    #[error("Invalid promo code: {0:?}")]
    InvalidCode(String),

    #[error("Discount must be a percentage between 0 and 100, got {0}")]
    InvalidDiscount(f64),

    #[error("Invalid expiration date: {0}")]
    InvalidExpiration(String),
}

/// Admin request to create a promo; discount is given in percent.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPromo {
    pub code: Option<String>,
    pub discount: Option<f64>,
    pub expiration_date: Option<String>,
}

impl NewPromo {
    /// Returns the code and the record to store.
    pub fn validate(self) -> Result<(String, PromoCode), PromoError> {
        let (Some(code), Some(discount), Some(expiration)) = (self.code, self.discount, self.expiration_date) else {
            return Err(PromoError::MissingFields);
        };

        let code = code.trim().to_string();
        if code.is_empty() || code.contains('/') {
            return Err(PromoError::InvalidCode(code));
        }
        if !discount.is_finite() || discount <= 0.0 || discount > 100.0 {
            return Err(PromoError::InvalidDiscount(discount));
        }
        let expiration_date = DateTime::parse_from_rfc3339(expiration.trim())
            .map_err(|e| PromoError::InvalidExpiration(e.to_string()))?
            .with_timezone(&Utc);

        Ok((
            code,
            PromoCode {
                discount: discount / 100.0,
                expiration_date,
            },
        ))
    }
}

/// Admin listing entry with the discount back in percent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoSummary {
    pub code: String,
    pub discount: f64,
    pub expiration_date: DateTime<Utc>,
}

impl PromoSummary {
    pub fn new(code: &str, promo: &PromoCode) -> Self {
        Self {
            code: code.to_string(),
            discount: round_to_cents(promo.discount * 100.0),
            expiration_date: promo.expiration_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn summer21() -> PromoCode {
        PromoCode {
            discount: 0.15,
            expiration_date: Utc.with_ymd_and_hms(2021, 8, 31, 23, 59, 59).unwrap(),
        }
    }

    #[test]
    fn test_unknown_code_is_invalid() {
        assert_eq!(validate_promo(None, Utc::now()), PromoValidation::Invalid);
    }

    #[test]
    fn test_expiry_boundary() {
        let promo = summer21();
        let expiry = promo.expiration_date;

        assert_eq!(
            validate_promo(Some(&promo), expiry - Duration::seconds(1)),
            PromoValidation::Valid { discount: 0.15 }
        );
        assert_eq!(validate_promo(Some(&promo), expiry), PromoValidation::Valid { discount: 0.15 });
        assert_eq!(
            validate_promo(Some(&promo), expiry + Duration::milliseconds(500)),
            PromoValidation::Valid { discount: 0.15 }
        );
        assert_eq!(validate_promo(Some(&promo), expiry + Duration::seconds(1)), PromoValidation::Expired);
    }

    #[test]
    fn test_new_promo_stores_fraction() {
        let request = NewPromo {
            code: Some("SUMMER21".to_string()),
            discount: Some(15.0),
            expiration_date: Some("2021-08-31T23:59:59Z".to_string()),
        };
        let (code, promo) = request.validate().unwrap();
        assert_eq!(code, "SUMMER21");
        assert_eq!(promo, summer21());
        assert_eq!(PromoSummary::new(&code, &promo).discount, 15.0);
    }

    #[test]
    fn test_new_promo_rejections() {
        let missing = NewPromo {
            code: Some("X".to_string()),
            discount: None,
            expiration_date: Some("2030-01-01T00:00:00Z".to_string()),
        };
        assert_eq!(missing.validate(), Err(PromoError::MissingFields));

        let too_big = NewPromo {
            code: Some("X".to_string()),
            discount: Some(150.0),
            expiration_date: Some("2030-01-01T00:00:00Z".to_string()),
        };
        assert_eq!(too_big.validate(), Err(PromoError::InvalidDiscount(150.0)));

        let bad_date = NewPromo {
            code: Some("X".to_string()),
            discount: Some(10.0),
            expiration_date: Some("next tuesday".to_string()),
        };
        assert!(matches!(bad_date.validate(), Err(PromoError::InvalidExpiration(_))));
    }

    #[test]
    fn test_stored_wire_format() {
        let json = serde_json::to_value(summer21()).unwrap();
        assert_eq!(json["discount"], 0.15);
        assert_eq!(json["expirationDate"], "2021-08-31T23:59:59Z");
    }
}
