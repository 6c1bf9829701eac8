//! Per-leg document amounts for the vendor chain.
//!
//! Turns a pricing result into the three amounts the document services
//! persist when a job is created: the broker's invoice to the customer,
//! the broker's purchase order to the sub-broker, and the sub-broker's
//! purchase order to the manufacturer. Pure derivation; persistence and PO
//! numbering live upstream.

use serde::Serialize;

use crate::pricing::PricingResult;

/// Dollar amounts for each leg of the customer → broker → sub-broker →
/// manufacturer chain, plus the approval flag for loss-priced jobs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainAmounts {
    /// Broker invoices the customer the full job price.
    pub customer_invoice_total: f64,
    /// Broker's PO to the sub-broker: pass-through costs plus the
    /// sub-broker's margins.
    pub subbroker_po_total: f64,
    /// Sub-broker's PO to the manufacturer: print plus paper at cost.
    pub manufacturer_po_total: f64,
    /// Broker profit on the job.
    pub broker_profit: f64,
    /// Sub-broker profit on the job.
    pub subbroker_profit: f64,
    /// Loss-priced jobs need sign-off before the POs are released.
    pub requires_approval: bool,
}

/// Derive the chain document amounts from a pricing result.
pub fn derive_chain_amounts(pricing: &PricingResult) -> ChainAmounts {
    let manufacturer_po_total = pricing.print_total + pricing.paper_cost_total;
    ChainAmounts {
        customer_invoice_total: pricing.customer_total,
        subbroker_po_total: pricing.bradford_total,
        manufacturer_po_total,
        broker_profit: pricing.impact_margin,
        subbroker_profit: pricing.bradford_total - manufacturer_po_total,
        requires_approval: pricing.is_loss,
    }
}
