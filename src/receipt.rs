//! Printable receipt for a submitted bill.

use crate::model::{Bill, BillType, PaymentMethod};
use chrono::{DateTime, Utc};
use std::fmt;

/// Format an amount as Indian rupees with lakh/crore digit grouping.
///
/// Non-finite amounts render as `₹0.00`.
///
/// ```
/// use bill_kit::receipt::format_inr;
///
/// assert_eq!(format_inr(1234567.5), "₹12,34,567.50");
/// assert_eq!(format_inr(999.0), "₹999.00");
/// assert_eq!(format_inr(f64::NAN), "₹0.00");
/// ```
pub fn format_inr(amount: f64) -> String {
    if !amount.is_finite() {
        return "₹0.00".to_string();
    }

    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let negative = amount < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0');

    let grouped = if whole.len() <= 3 {
        whole.to_string()
    } else {
        let (head, last_three) = whole.split_at(whole.len() - 3);
        let mut groups: Vec<&str> = Vec::new();
        let mut end = head.len();
        while end > 0 {
            let start = end.saturating_sub(2);
            groups.push(&head[start..end]);
            end = start;
        }
        groups.reverse();
        format!("{},{}", groups.join(","), last_three)
    };

    format!("{}₹{}.{}", if negative { "-" } else { "" }, grouped, fraction)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptLine {
    pub label: String,
    pub amount: f64,
}

/// Receipt view of a finalized bill.
///
/// White bills show CGST and SGST lines; green bills show a note instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub bill_number: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub bill_type: BillType,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
    pub items: Vec<ReceiptLine>,
    pub subtotal: f64,
    pub taxes: Vec<ReceiptLine>,
    pub total: f64,
}

impl Receipt {
    pub fn from_bill(bill: &Bill) -> Self {
        let taxes = if bill.bill_type.is_taxed() {
            vec![
                ReceiptLine {
                    label: format!("CGST ({}%)", bill.rates.cgst_percent),
                    amount: bill.totals.cgst_amount,
                },
                ReceiptLine {
                    label: format!("SGST ({}%)", bill.rates.sgst_percent),
                    amount: bill.totals.sgst_amount,
                },
            ]
        } else {
            Vec::new()
        };

        Receipt {
            bill_number: bill.bill_number.clone(),
            customer_name: bill.customer_name.clone(),
            customer_phone: bill.customer_phone.clone(),
            bill_type: bill.bill_type,
            payment_method: bill.payment_method,
            created_at: bill.created_at,
            items: bill
                .items
                .iter()
                .map(|item| ReceiptLine {
                    label: item.name.clone(),
                    amount: item.price,
                })
                .collect(),
            subtotal: bill.totals.subtotal,
            taxes,
            total: bill.totals.total,
        }
    }
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const WIDTH: usize = 24;

        writeln!(f, "Bill {}", self.bill_number)?;
        writeln!(f, "Customer: {} ({})", self.customer_name, self.customer_phone)?;
        writeln!(f, "Date: {}", self.created_at.format("%d %b %Y"))?;
        writeln!(f, "{}", "-".repeat(WIDTH + 16))?;
        for line in &self.items {
            writeln!(f, "{:<WIDTH$}{:>16}", line.label, format_inr(line.amount))?;
        }
        writeln!(f, "{}", "-".repeat(WIDTH + 16))?;
        writeln!(f, "{:<WIDTH$}{:>16}", "Subtotal", format_inr(self.subtotal))?;
        if self.bill_type.is_taxed() {
            for line in &self.taxes {
                writeln!(f, "{:<WIDTH$}{:>16}", line.label, format_inr(line.amount))?;
            }
        } else {
            writeln!(f, "GST not applicable (green bill)")?;
        }
        writeln!(f, "{:<WIDTH$}{:>16}", "Total", format_inr(self.total))?;
        write!(f, "Payment: {}", self.payment_method)
    }
}
