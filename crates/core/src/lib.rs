//! Pure pricing domain logic for the print-brokerage order system.
//!
//! Holds the rate catalog and the multi-party pricing calculators that the
//! job, purchase-order, and invoice services build on. Everything here is
//! synchronous, side-effect free, and safe to call concurrently; the only
//! state is an immutable [`rates::RateCatalog`] constructed by the caller.

pub mod chain;
pub mod error;
pub mod money;
pub mod pricing;
pub mod rates;
pub mod validation;

pub use error::CoreError;
