//! Domain types shared by the wizard, the computation and the collaborators.

use crate::billing::BillTotals;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Jewelry material of a line item, and the ItemEntry variant shown for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Material {
    #[default]
    Silver,
    Gold,
}

impl Material {
    /// Tax rates surfaced when item entry opens for this material.
    pub fn default_rates(&self) -> TaxRates {
        match self {
            Material::Silver => TaxRates::new(1.5, 1.5),
            Material::Gold => TaxRates::new(3.0, 3.0),
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Material::Silver => write!(f, "silver"),
            Material::Gold => write!(f, "gold"),
        }
    }
}

/// White bills carry CGST + SGST; green bills are total-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillType {
    White,
    Green,
}

impl BillType {
    pub fn is_taxed(&self) -> bool {
        matches!(self, BillType::White)
    }
}

impl fmt::Display for BillType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BillType::White => write!(f, "white"),
            BillType::Green => write!(f, "green"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Upi,
    BankTransfer,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Card => write!(f, "card"),
            PaymentMethod::Upi => write!(f, "upi"),
            PaymentMethod::BankTransfer => write!(f, "bank_transfer"),
        }
    }
}

/// One product line on a bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillItem {
    pub name: String,
    pub price: f64,
    pub material: Option<Material>,
}

impl BillItem {
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        BillItem {
            name: name.into(),
            price,
            material: None,
        }
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = Some(material);
        self
    }

    /// Row added by the editor's "add item" action.
    pub fn blank() -> Self {
        BillItem {
            name: String::new(),
            price: 0.0,
            material: Some(Material::Silver),
        }
    }
}

/// Partial update applied to one item row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub material: Option<Material>,
}

impl ItemPatch {
    pub fn name(name: impl Into<String>) -> Self {
        ItemPatch {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn price(price: f64) -> Self {
        ItemPatch {
            price: Some(price),
            ..Default::default()
        }
    }

    pub fn material(material: Material) -> Self {
        ItemPatch {
            material: Some(material),
            ..Default::default()
        }
    }
}

/// CGST and SGST percentages. Only meaningful for white bills.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TaxRates {
    pub cgst_percent: f64,
    pub sgst_percent: f64,
}

impl TaxRates {
    pub fn new(cgst_percent: f64, sgst_percent: f64) -> Self {
        TaxRates {
            cgst_percent,
            sgst_percent,
        }
    }

    /// Combined rate applied to the subtotal.
    pub fn combined(&self) -> f64 {
        self.cgst_percent + self.sgst_percent
    }
}

/// Customer identity and contact record. `phone` is the dedup key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

/// Result of resolving a phone number in the directory.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CustomerLookup {
    pub exists: bool,
    pub customer: Option<Customer>,
}

impl CustomerLookup {
    pub fn found(customer: Customer) -> Self {
        CustomerLookup {
            exists: true,
            customer: Some(customer),
        }
    }

    pub fn not_found() -> Self {
        CustomerLookup::default()
    }
}

/// Product line as sent to the bill API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductLine {
    pub product_name: String,
    pub price: f64,
    pub quantity: u32,
    pub weight: String,
    pub subtotal: f64,
    /// Item tag as entered; not part of the wire format.
    #[serde(skip)]
    pub material: Option<Material>,
}

impl From<&BillItem> for ProductLine {
    fn from(item: &BillItem) -> Self {
        ProductLine {
            product_name: item.name.clone(),
            price: item.price,
            quantity: 1,
            weight: String::new(),
            subtotal: item.price,
            material: item.material,
        }
    }
}

/// Bill submission payload.
///
/// Green bills always carry zero rates, whatever was configured in the draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillPayload {
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub customer_phone: String,
    pub jewelry_type: Material,
    pub bill_type: BillType,
    pub products: Vec<ProductLine>,
    pub cgst_rate: f64,
    pub sgst_rate: f64,
    pub payment_method: PaymentMethod,
}

impl BillPayload {
    /// Items as the computation sees them, in product order.
    pub fn items(&self) -> Vec<BillItem> {
        self.products
            .iter()
            .map(|p| BillItem {
                name: p.product_name.clone(),
                price: p.subtotal,
                material: p.material,
            })
            .collect()
    }

    pub fn rates(&self) -> TaxRates {
        TaxRates::new(self.cgst_rate, self.sgst_rate)
    }
}

/// Finalized bill. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub id: String,
    pub bill_number: String,
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub customer_phone: String,
    pub material: Material,
    pub bill_type: BillType,
    pub payment_method: PaymentMethod,
    pub items: Vec<BillItem>,
    pub rates: TaxRates,
    pub totals: BillTotals,
    pub created_at: DateTime<Utc>,
}

impl Bill {
    /// Build a bill from a submitted payload, snapshotting its totals.
    pub fn from_payload(
        id: impl Into<String>,
        bill_number: impl Into<String>,
        payload: &BillPayload,
        created_at: DateTime<Utc>,
    ) -> Self {
        let items = payload.items();
        let rates = payload.rates();
        let totals = crate::billing::compute_totals(&items, payload.bill_type, rates);

        Bill {
            id: id.into(),
            bill_number: bill_number.into(),
            customer_id: payload.customer_id.clone(),
            customer_name: payload.customer_name.clone(),
            customer_phone: payload.customer_phone.clone(),
            material: payload.jewelry_type,
            bill_type: payload.bill_type,
            payment_method: payload.payment_method,
            items,
            rates,
            totals,
            created_at,
        }
    }
}

/// Generate a bill number of the form `BILL-YYMMDD-NNN`.
pub fn generate_bill_number(now: DateTime<Utc>) -> String {
    let suffix: u16 = rand::random_range(0..1000);
    format!("BILL-{}-{:03}", now.format("%y%m%d"), suffix)
}
