//! Currency rounding helpers.
//!
//! All pricing arithmetic runs at full `f64` precision; amounts are rounded
//! to whole cents exactly once, at the presentation boundary. These helpers
//! are the only place rounding happens.

/// Tolerance for comparing two dollar amounts: within one cent.
pub const CENT_TOLERANCE: f64 = 0.01;

/// Round a dollar amount to whole cents (2 decimal places).
///
/// Used only when producing display/persistence copies of a pricing result,
/// never on intermediate values.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Whether two dollar amounts agree to within one cent.
pub fn cents_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= CENT_TOLERANCE + f64::EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_nearest_cent() {
        assert_eq!(round_cents(1.006), 1.01);
        assert_eq!(round_cents(1.004), 1.0);
        assert_eq!(round_cents(10.0 / 3.0), 3.33);
        assert_eq!(round_cents(12.5), 12.5);
    }

    #[test]
    fn negative_amounts_round_toward_nearest_cent() {
        assert_eq!(round_cents(-1.006), -1.01);
        assert_eq!(round_cents(-0.004), 0.0);
    }

    #[test]
    fn cents_eq_within_tolerance() {
        assert!(cents_eq(10.0, 10.01));
        assert!(cents_eq(10.0, 9.99));
        assert!(!cents_eq(10.0, 10.02));
    }
}
