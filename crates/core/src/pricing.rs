//! Multi-party pricing and margin allocation.
//!
//! Prices a print job across the three-company chain (customer-facing
//! broker, sub-broker, manufacturer). The standard path derives every
//! amount from the size's rate rule; the custom path re-allocates the whole
//! chain around a negotiated customer price and/or paper rate so the totals
//! stay consistent, and flags prices that fall below hard pass-through
//! cost for approval.
//!
//! Both calculators are pure functions of their inputs and the catalog:
//! no I/O, no shared state, identical inputs always produce identical
//! results. Arithmetic runs at full precision; callers round once for
//! display via [`PricingResult::rounded`].

use serde::Serialize;

use crate::error::CoreError;
use crate::money::round_cents;
use crate::rates::RateCatalog;
use crate::validation::{validate_price, validate_quantity, validate_rate};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// CPM rates are dollars per this many units.
pub const UNITS_PER_THOUSAND: f64 = 1000.0;

/// Share of the residual margin allocated to the broker; the sub-broker
/// print margin receives the remainder (an even split).
pub const BROKER_MARGIN_SHARE: f64 = 0.5;

/// Shortfalls smaller than this are float noise, not a loss.
const LOSS_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Pricing result
// ---------------------------------------------------------------------------

/// Complete cost/margin breakdown for one job.
///
/// `impact_*` fields belong to the customer-facing broker, `bradford_*`
/// fields to the sub-broker; `print_*` amounts are the manufacturer's leg.
/// Every `*_total` equals its `*_cpm` times `quantity / 1000`.
///
/// `bradford_paper_margin` is paper-as-charged minus paper-at-cost, so the
/// sub-broker's ledger carries the paper leg at cost plus that margin, and
/// the allocation is conserved at all times:
///
/// `customer_total == bradford_total + impact_margin`
/// `bradford_total == print_total + paper_cost_total
///   + bradford_print_margin + bradford_paper_margin`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingResult {
    pub size_id: String,
    pub size_name: String,
    pub quantity: i64,

    // Per-thousand rates.
    pub customer_cpm: f64,
    pub print_cpm: f64,
    pub paper_cost_cpm: f64,
    pub paper_charged_cpm: f64,
    pub impact_margin_cpm: f64,
    pub bradford_print_margin_cpm: f64,
    pub bradford_paper_margin_cpm: f64,
    pub bradford_total_margin_cpm: f64,
    pub bradford_total_cpm: f64,

    // Extended totals (CPM x quantity / 1000).
    pub customer_total: f64,
    pub print_total: f64,
    pub paper_cost_total: f64,
    pub paper_charged_total: f64,
    pub impact_margin: f64,
    pub bradford_print_margin: f64,
    pub bradford_paper_margin: f64,
    pub bradford_total_margin: f64,
    pub bradford_total: f64,

    // Paper consumption.
    pub paper_weight_per_1000: f64,
    pub paper_weight_total: f64,

    // Custom-pricing flags.
    pub is_custom_pricing: bool,
    /// What the standard formula would have charged, kept for comparison
    /// display next to a negotiated price.
    pub standard_customer_price: f64,
    pub is_loss: bool,
    /// Shortfall against hard pass-through cost; `0.0` when not a loss.
    pub loss_amount: f64,
}

impl PricingResult {
    /// Presentation copy with every dollar field rounded to whole cents.
    ///
    /// This is the single rounding point. The conservation invariant holds
    /// exactly on the unrounded result and within one cent here.
    pub fn rounded(&self) -> Self {
        Self {
            size_id: self.size_id.clone(),
            size_name: self.size_name.clone(),
            quantity: self.quantity,
            customer_cpm: round_cents(self.customer_cpm),
            print_cpm: round_cents(self.print_cpm),
            paper_cost_cpm: round_cents(self.paper_cost_cpm),
            paper_charged_cpm: round_cents(self.paper_charged_cpm),
            impact_margin_cpm: round_cents(self.impact_margin_cpm),
            bradford_print_margin_cpm: round_cents(self.bradford_print_margin_cpm),
            bradford_paper_margin_cpm: round_cents(self.bradford_paper_margin_cpm),
            bradford_total_margin_cpm: round_cents(self.bradford_total_margin_cpm),
            bradford_total_cpm: round_cents(self.bradford_total_cpm),
            customer_total: round_cents(self.customer_total),
            print_total: round_cents(self.print_total),
            paper_cost_total: round_cents(self.paper_cost_total),
            paper_charged_total: round_cents(self.paper_charged_total),
            impact_margin: round_cents(self.impact_margin),
            bradford_print_margin: round_cents(self.bradford_print_margin),
            bradford_paper_margin: round_cents(self.bradford_paper_margin),
            bradford_total_margin: round_cents(self.bradford_total_margin),
            bradford_total: round_cents(self.bradford_total),
            paper_weight_per_1000: self.paper_weight_per_1000,
            paper_weight_total: self.paper_weight_total,
            is_custom_pricing: self.is_custom_pricing,
            standard_customer_price: round_cents(self.standard_customer_price),
            is_loss: self.is_loss,
            loss_amount: round_cents(self.loss_amount),
        }
    }
}

// ---------------------------------------------------------------------------
// Standard pricing
// ---------------------------------------------------------------------------

/// Price a job at the standard catalog rate for its size.
///
/// The residual between the customer price and the pass-through costs
/// (print plus paper at cost) is split evenly between the broker and the
/// sub-broker's print margin. Paper is charged at cost on this path, so
/// the sub-broker's paper margin is zero.
pub fn calculate_standard_pricing(
    catalog: &RateCatalog,
    size_id: &str,
    quantity: i64,
) -> Result<PricingResult, CoreError> {
    validate_quantity(quantity)?;
    let rule = catalog.rule(size_id)?;

    let thousands = quantity as f64 / UNITS_PER_THOUSAND;

    let customer_total = rule.base_cpm * thousands;
    let print_total = rule.print_cpm * thousands;

    let paper_cost_cpm = rule.paper_cost_cpm();
    let paper_charged_cpm = paper_cost_cpm;
    let paper_cost_total = paper_cost_cpm * thousands;
    let paper_charged_total = paper_charged_cpm * thousands;

    let residual = customer_total - print_total - paper_charged_total;
    let impact_margin = residual * BROKER_MARGIN_SHARE;
    let bradford_print_margin = residual - impact_margin;
    let bradford_paper_margin = paper_charged_total - paper_cost_total;

    // Sub-broker ledger: paper at cost, markup carried in the margin term.
    let bradford_total =
        print_total + paper_cost_total + bradford_print_margin + bradford_paper_margin;
    let bradford_total_margin = bradford_print_margin + bradford_paper_margin;

    let paper_weight_per_1000 = rule.paper_weight_per_1000.unwrap_or(0.0);

    Ok(PricingResult {
        size_id: rule.size_id.clone(),
        size_name: rule.size_name.clone(),
        quantity,
        customer_cpm: rule.base_cpm,
        print_cpm: rule.print_cpm,
        paper_cost_cpm,
        paper_charged_cpm,
        impact_margin_cpm: impact_margin / thousands,
        bradford_print_margin_cpm: bradford_print_margin / thousands,
        bradford_paper_margin_cpm: bradford_paper_margin / thousands,
        bradford_total_margin_cpm: bradford_total_margin / thousands,
        bradford_total_cpm: bradford_total / thousands,
        customer_total,
        print_total,
        paper_cost_total,
        paper_charged_total,
        impact_margin,
        bradford_print_margin,
        bradford_paper_margin,
        bradford_total_margin,
        bradford_total,
        paper_weight_per_1000,
        paper_weight_total: paper_weight_per_1000 * thousands,
        is_custom_pricing: false,
        standard_customer_price: customer_total,
        is_loss: false,
        loss_amount: 0.0,
    })
}

// ---------------------------------------------------------------------------
// Custom pricing
// ---------------------------------------------------------------------------

/// Price a job with a negotiated customer price and/or paper rate.
///
/// With no overrides this is exactly the standard calculation. With an
/// override the whole chain is re-allocated: paper margin becomes charged
/// minus cost (and may go negative), the remaining residual splits evenly,
/// and a price below hard pass-through cost (print plus paper at cost) is
/// flagged via `is_loss`/`loss_amount` rather than rejected — the approval
/// workflow upstream decides whether to accept it.
pub fn calculate_custom_pricing(
    catalog: &RateCatalog,
    size_id: &str,
    quantity: i64,
    custom_price: Option<f64>,
    custom_paper_cpm: Option<f64>,
) -> Result<PricingResult, CoreError> {
    if let Some(price) = custom_price {
        validate_price(price, "custom_price")?;
    }
    if let Some(paper_cpm) = custom_paper_cpm {
        validate_rate(paper_cpm, "custom_paper_cpm")?;
    }

    let standard = calculate_standard_pricing(catalog, size_id, quantity)?;
    if custom_price.is_none() && custom_paper_cpm.is_none() {
        return Ok(standard);
    }

    let thousands = quantity as f64 / UNITS_PER_THOUSAND;

    let effective_price = custom_price.unwrap_or(standard.customer_total);
    let paper_charged_cpm = custom_paper_cpm.unwrap_or(standard.paper_charged_cpm);
    let paper_charged_total = paper_charged_cpm * thousands;
    let bradford_paper_margin = paper_charged_total - standard.paper_cost_total;

    let residual = effective_price - standard.print_total - paper_charged_total;
    let impact_margin = residual * BROKER_MARGIN_SHARE;
    let bradford_print_margin = residual - impact_margin;

    // Paper at cost here too: the charged/cost difference is already in
    // bradford_paper_margin, so adding paper as charged would count the
    // markup twice and break conservation.
    let bradford_total = standard.print_total
        + standard.paper_cost_total
        + bradford_print_margin
        + bradford_paper_margin;
    let bradford_total_margin = bradford_print_margin + bradford_paper_margin;

    // Loss means the price fails to cover even print plus paper at cost.
    let hard_cost = standard.print_total + standard.paper_cost_total;
    let shortfall = hard_cost - effective_price;
    let is_loss = shortfall > LOSS_EPSILON;

    Ok(PricingResult {
        customer_cpm: effective_price / thousands,
        paper_charged_cpm,
        impact_margin_cpm: impact_margin / thousands,
        bradford_print_margin_cpm: bradford_print_margin / thousands,
        bradford_paper_margin_cpm: bradford_paper_margin / thousands,
        bradford_total_margin_cpm: bradford_total_margin / thousands,
        bradford_total_cpm: bradford_total / thousands,
        customer_total: effective_price,
        paper_charged_total,
        impact_margin,
        bradford_print_margin,
        bradford_paper_margin,
        bradford_total_margin,
        bradford_total,
        is_custom_pricing: true,
        standard_customer_price: standard.customer_total,
        is_loss,
        loss_amount: if is_loss { shortfall } else { 0.0 },
        ..standard
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::cents_eq;
    use crate::rates::{RateCatalog, RateRule};
    use assert_matches::assert_matches;

    /// One paperless size at $100/$40 CPM, one papered size.
    fn test_catalog() -> RateCatalog {
        RateCatalog::from_rules(vec![
            RateRule {
                size_id: "test".to_string(),
                size_name: "Test Size".to_string(),
                base_cpm: 100.0,
                print_cpm: 40.0,
                paper_weight_per_1000: None,
                paper_cost_per_lb: None,
                roll_size: None,
            },
            RateRule {
                size_id: "papered".to_string(),
                size_name: "Papered Size".to_string(),
                base_cpm: 120.0,
                print_cpm: 40.0,
                paper_weight_per_1000: Some(20.0),
                paper_cost_per_lb: Some(0.5),
                roll_size: Some(26.0),
            },
        ])
        .unwrap()
    }

    fn assert_conserved(p: &PricingResult) {
        let parts = p.print_total
            + p.paper_cost_total
            + p.impact_margin
            + p.bradford_print_margin
            + p.bradford_paper_margin;
        assert!(
            cents_eq(p.customer_total, parts),
            "allocation not conserved: customer_total={} parts={}",
            p.customer_total,
            parts
        );
        assert!(cents_eq(
            p.customer_total,
            p.bradford_total + p.impact_margin
        ));
        assert!(cents_eq(
            p.bradford_total,
            p.print_total + p.paper_cost_total + p.bradford_print_margin + p.bradford_paper_margin
        ));
    }

    // -- standard pricing --

    #[test]
    fn standard_splits_residual_evenly() {
        let p = calculate_standard_pricing(&test_catalog(), "test", 10_000).unwrap();
        assert!(cents_eq(p.customer_total, 1000.0));
        assert!(cents_eq(p.print_total, 400.0));
        assert!(cents_eq(p.impact_margin, 300.0));
        assert!(cents_eq(p.bradford_print_margin, 300.0));
        assert!(cents_eq(p.bradford_total, 700.0));
        assert!(!p.is_loss);
        assert!(!p.is_custom_pricing);
        assert_conserved(&p);
    }

    #[test]
    fn standard_paper_is_pass_through_at_cost() {
        let p = calculate_standard_pricing(&test_catalog(), "papered", 10_000).unwrap();
        // 20 lb x $0.50 = $10 CPM.
        assert!(cents_eq(p.paper_cost_cpm, 10.0));
        assert!(cents_eq(p.paper_charged_cpm, 10.0));
        assert!(cents_eq(p.paper_cost_total, 100.0));
        assert!(cents_eq(p.bradford_paper_margin, 0.0));
        // Residual: 1200 - 400 - 100 = 700, split 350/350.
        assert!(cents_eq(p.impact_margin, 350.0));
        assert!(cents_eq(p.bradford_print_margin, 350.0));
        assert!(cents_eq(p.paper_weight_total, 200.0));
        assert_conserved(&p);
    }

    #[test]
    fn standard_fractional_thousands() {
        let p = calculate_standard_pricing(&test_catalog(), "test", 12_500).unwrap();
        assert!(cents_eq(p.customer_total, 1250.0));
        assert!(cents_eq(p.print_total, 500.0));
        assert_conserved(&p);
    }

    #[test]
    fn standard_quantity_1000_totals_equal_cpms() {
        let p = calculate_standard_pricing(&test_catalog(), "papered", 1000).unwrap();
        assert_eq!(p.customer_total, p.customer_cpm);
        assert_eq!(p.print_total, p.print_cpm);
        assert_eq!(p.paper_charged_total, p.paper_charged_cpm);
        assert_eq!(p.impact_margin, p.impact_margin_cpm);
        assert_eq!(p.bradford_total, p.bradford_total_cpm);
    }

    #[test]
    fn standard_echoes_rule_identity() {
        let p = calculate_standard_pricing(&test_catalog(), "test", 5000).unwrap();
        assert_eq!(p.size_id, "test");
        assert_eq!(p.size_name, "Test Size");
        assert_eq!(p.quantity, 5000);
        assert_eq!(p.standard_customer_price, p.customer_total);
    }

    #[test]
    fn standard_rejects_zero_quantity() {
        assert_matches!(
            calculate_standard_pricing(&test_catalog(), "test", 0),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn standard_rejects_negative_quantity() {
        assert_matches!(
            calculate_standard_pricing(&test_catalog(), "test", -5),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn standard_unknown_size_is_not_found() {
        assert_matches!(
            calculate_standard_pricing(&test_catalog(), "nope", 1000),
            Err(CoreError::NotFound { .. })
        );
    }

    // -- custom pricing --

    #[test]
    fn custom_without_overrides_matches_standard() {
        let catalog = test_catalog();
        let standard = calculate_standard_pricing(&catalog, "papered", 7500).unwrap();
        let custom = calculate_custom_pricing(&catalog, "papered", 7500, None, None).unwrap();
        assert_eq!(standard, custom);
        assert!(!custom.is_custom_pricing);
    }

    #[test]
    fn custom_price_reallocates_the_chain() {
        let p =
            calculate_custom_pricing(&test_catalog(), "test", 10_000, Some(800.0), None).unwrap();
        assert!(p.is_custom_pricing);
        assert!(cents_eq(p.customer_total, 800.0));
        // Residual: 800 - 400 = 400, split 200/200.
        assert!(cents_eq(p.impact_margin, 200.0));
        assert!(cents_eq(p.bradford_print_margin, 200.0));
        assert!(cents_eq(p.standard_customer_price, 1000.0));
        assert!(!p.is_loss);
        assert_conserved(&p);
    }

    #[test]
    fn custom_price_below_hard_cost_is_a_loss() {
        let p =
            calculate_custom_pricing(&test_catalog(), "test", 10_000, Some(350.0), None).unwrap();
        assert!(p.is_loss);
        assert!(cents_eq(p.loss_amount, 50.0));
        // The loss is still allocated consistently (negative margins).
        assert!(p.impact_margin < 0.0);
        assert_conserved(&p);
    }

    #[test]
    fn custom_price_at_exact_hard_cost_is_not_a_loss() {
        let p =
            calculate_custom_pricing(&test_catalog(), "test", 10_000, Some(400.0), None).unwrap();
        assert!(!p.is_loss);
        assert_eq!(p.loss_amount, 0.0);
        assert!(cents_eq(p.impact_margin, 0.0));
    }

    #[test]
    fn loss_accounts_for_paper_cost() {
        // Hard cost for papered @10k: print 400 + paper 100 = 500.
        let p = calculate_custom_pricing(&test_catalog(), "papered", 10_000, Some(450.0), None)
            .unwrap();
        assert!(p.is_loss);
        assert!(cents_eq(p.loss_amount, 50.0));
    }

    #[test]
    fn custom_paper_rate_moves_paper_margin() {
        // Charge paper at $12 CPM against a $10 CPM cost.
        let p = calculate_custom_pricing(&test_catalog(), "papered", 10_000, None, Some(12.0))
            .unwrap();
        assert!(p.is_custom_pricing);
        assert!(cents_eq(p.paper_charged_total, 120.0));
        assert!(cents_eq(p.bradford_paper_margin, 20.0));
        // Customer price unchanged, so the markup squeezes the print split:
        // residual = 1200 - 400 - 120 = 680.
        assert!(cents_eq(p.impact_margin, 340.0));
        assert!(cents_eq(p.bradford_print_margin, 340.0));
        // Ledger keeps paper at cost: 400 + 100 + 340 + 20.
        assert!(cents_eq(p.bradford_total, 860.0));
        assert_conserved(&p);
    }

    #[test]
    fn paper_override_never_creates_or_destroys_money() {
        // A markup or an undercut moves money between parties; the
        // customer total must not change either way.
        for paper_cpm in [12.0, 8.0] {
            let p = calculate_custom_pricing(
                &test_catalog(),
                "papered",
                10_000,
                None,
                Some(paper_cpm),
            )
            .unwrap();
            assert!(cents_eq(p.customer_total, 1200.0));
            assert!(cents_eq(
                p.customer_total,
                p.bradford_total + p.impact_margin
            ));
            assert!(cents_eq(
                p.bradford_total,
                p.print_total + p.paper_cost_total + p.bradford_total_margin
            ));
        }
    }

    #[test]
    fn custom_paper_rate_below_cost_goes_negative() {
        let p = calculate_custom_pricing(&test_catalog(), "papered", 10_000, None, Some(8.0))
            .unwrap();
        assert!(cents_eq(p.bradford_paper_margin, -20.0));
        // Loss detection compares against paper at cost, not as charged.
        assert!(!p.is_loss);
        assert_conserved(&p);
    }

    #[test]
    fn negative_custom_paper_rate_rejected() {
        assert_matches!(
            calculate_custom_pricing(&test_catalog(), "papered", 10_000, None, Some(-1.0)),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn non_finite_custom_price_rejected() {
        assert_matches!(
            calculate_custom_pricing(&test_catalog(), "test", 1000, Some(f64::NAN), None),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn custom_propagates_standard_errors() {
        assert_matches!(
            calculate_custom_pricing(&test_catalog(), "nope", 1000, Some(100.0), None),
            Err(CoreError::NotFound { .. })
        );
        assert_matches!(
            calculate_custom_pricing(&test_catalog(), "test", 0, Some(100.0), None),
            Err(CoreError::Validation(_))
        );
    }

    // -- rounding --

    #[test]
    fn rounded_preserves_conservation_within_a_cent() {
        // 3,333 units gives awkward thirds everywhere.
        let p = calculate_custom_pricing(&test_catalog(), "papered", 3333, Some(399.99), None)
            .unwrap()
            .rounded();
        let parts = p.print_total
            + p.paper_cost_total
            + p.impact_margin
            + p.bradford_print_margin
            + p.bradford_paper_margin;
        assert!((p.customer_total - parts).abs() <= 0.02);
    }

    #[test]
    fn rounded_flags_and_identity_untouched() {
        let p = calculate_custom_pricing(&test_catalog(), "test", 10_000, Some(350.0), None)
            .unwrap();
        let r = p.rounded();
        assert_eq!(r.size_id, p.size_id);
        assert_eq!(r.quantity, p.quantity);
        assert_eq!(r.is_loss, p.is_loss);
        assert_eq!(r.is_custom_pricing, p.is_custom_pricing);
        assert_eq!(r.loss_amount, 50.0);
    }
}
