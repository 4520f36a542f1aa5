/// Round a monetary amount to two decimal places.
pub fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Convert a decimal amount to the smallest currency unit.
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

pub fn is_valid_amount(amount: f64) -> bool {
    amount.is_finite() && amount >= 0.0
}

/// Whether `amount` is a whole number of cents, within float noise.
pub fn is_whole_cents(amount: f64) -> bool {
    let cents = amount * 100.0;
    cents.is_finite() && (cents - cents.round()).abs() < 1e-6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_cents() {
        assert_eq!(round_to_cents(10.005_1), 10.01);
        assert_eq!(round_to_cents(99.994), 99.99);
        assert_eq!(round_to_cents(0.0), 0.0);
    }

    #[test]
    fn test_minor_units() {
        assert_eq!(to_minor_units(12.34), 1234);
        assert_eq!(to_minor_units(0.1 + 0.2), 30);
    }

    #[test]
    fn test_amount_validation() {
        assert!(is_valid_amount(0.0));
        assert!(!is_valid_amount(-1.0));
        assert!(!is_valid_amount(f64::NAN));
        assert!(!is_valid_amount(f64::INFINITY));
    }

    #[test]
    fn test_whole_cents() {
        assert!(is_whole_cents(19.99));
        assert!(is_whole_cents(0.1 + 0.2));
        assert!(is_whole_cents(1234.56));
        assert!(!is_whole_cents(10.125));
        assert!(!is_whole_cents(0.005));
        assert!(!is_whole_cents(f64::NAN));
    }
}
