//! Bill total arithmetic.
//!
//! All amounts are `f64`. The subtotal is summed left to right in item order
//! and the combined percentage is applied to it afterwards; totals must stay
//! bit-identical to receipts already issued, so no intermediate rounding.
//!
//! # Example
//!
//! ```
//! use bill_kit::billing::compute_totals;
//! use bill_kit::model::{BillItem, BillType, TaxRates};
//!
//! let items = vec![BillItem::new("Gold Ring", 15000.0)];
//! let totals = compute_totals(&items, BillType::White, TaxRates::new(1.5, 1.5));
//!
//! assert_eq!(totals.subtotal, 15000.0);
//! assert_eq!(totals.tax_amount, 450.0);
//! assert_eq!(totals.total, 15450.0);
//! ```

use crate::model::{BillItem, BillType, TaxRates};
use serde::{Deserialize, Serialize};

/// Derived totals of a bill.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BillTotals {
    pub subtotal: f64,
    pub tax_amount: f64,
    pub cgst_amount: f64,
    pub sgst_amount: f64,
    pub total: f64,
    /// Number of lines, zero-priced ones included.
    pub item_count: usize,
}

/// Per-component tax amounts.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TaxSplit {
    pub cgst: f64,
    pub sgst: f64,
}

/// Sum of item prices in item order.
pub fn subtotal(items: &[BillItem]) -> f64 {
    items.iter().fold(0.0, |acc, item| acc + item.price)
}

/// Tax on `subtotal` for the given bill type. Green bills are never taxed.
pub fn tax_amount(subtotal: f64, bill_type: BillType, rates: TaxRates) -> f64 {
    match bill_type {
        BillType::Green => 0.0,
        BillType::White => subtotal * (rates.combined() / 100.0),
    }
}

/// Split `tax_amount` in the ratio `cgst_percent : sgst_percent`.
///
/// Both parts are zero when both rates are zero.
pub fn tax_split(tax_amount: f64, rates: TaxRates) -> TaxSplit {
    let combined = rates.combined();
    if combined > 0.0 {
        TaxSplit {
            cgst: tax_amount * (rates.cgst_percent / combined),
            sgst: tax_amount * (rates.sgst_percent / combined),
        }
    } else {
        TaxSplit::default()
    }
}

/// Compute every derived total of a bill. Pure; inputs are not touched.
pub fn compute_totals(items: &[BillItem], bill_type: BillType, rates: TaxRates) -> BillTotals {
    let subtotal = subtotal(items);
    let tax_amount = tax_amount(subtotal, bill_type, rates);
    let split = match bill_type {
        BillType::Green => TaxSplit::default(),
        BillType::White => tax_split(tax_amount, rates),
    };

    BillTotals {
        subtotal,
        tax_amount,
        cgst_amount: split.cgst,
        sgst_amount: split.sgst,
        total: subtotal + tax_amount,
        item_count: items.len(),
    }
}
