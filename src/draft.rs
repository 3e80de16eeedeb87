//! The wizard's accumulating bill draft.
//!
//! Fields are read-only from outside the crate; every mutation goes through
//! [`WizardStateMachine`](crate::wizard::WizardStateMachine) so its guards
//! cannot be bypassed.

use crate::billing::{compute_totals, BillTotals};
use crate::error::{Error, Field, Result};
use crate::model::{
    BillItem, BillPayload, BillType, Customer, ItemPatch, Material, PaymentMethod, ProductLine,
    TaxRates,
};

/// Exact length of a valid phone number.
pub const PHONE_LENGTH: usize = 10;

/// Check the `^\d{10}$` pattern on the trimmed input.
pub fn is_valid_phone(phone: &str) -> bool {
    let phone = phone.trim();
    phone.len() == PHONE_LENGTH && phone.bytes().all(|b| b.is_ascii_digit())
}

/// Check the customer-name rule: more than one character after trimming.
pub fn is_valid_name(name: &str) -> bool {
    name.trim().chars().count() > 1
}

fn check_amount(value: f64, field: Field, what: &str) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::validation(
            field,
            format!("{} must be a non-negative number", what),
        ));
    }
    Ok(())
}

/// In-progress bill. Totals are derived on demand, never stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BillDraft {
    pub(crate) phone: String,
    pub(crate) customer_name: String,
    pub(crate) existing_customer: Option<Customer>,
    /// Phone the current Details seed was resolved for.
    pub(crate) resolved_phone: Option<String>,
    pub(crate) material: Material,
    pub(crate) bill_type: Option<BillType>,
    pub(crate) payment_method: PaymentMethod,
    pub(crate) items: Vec<BillItem>,
    pub(crate) rates: TaxRates,
}

impl BillDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    /// Existing directory record the draft was seeded from, if any.
    pub fn existing_customer(&self) -> Option<&Customer> {
        self.existing_customer.as_ref()
    }

    /// Name is locked when it was pre-filled from an existing customer.
    pub fn is_name_locked(&self) -> bool {
        self.existing_customer.is_some()
    }

    pub fn material(&self) -> Material {
        self.material
    }

    pub fn bill_type(&self) -> Option<BillType> {
        self.bill_type
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn items(&self) -> &[BillItem] {
        &self.items
    }

    pub fn rates(&self) -> TaxRates {
        self.rates
    }

    /// Totals for the current items. An unselected bill type counts as green.
    pub fn totals(&self) -> BillTotals {
        compute_totals(
            &self.items,
            self.bill_type.unwrap_or(BillType::Green),
            self.rates,
        )
    }

    // ------------------------------------------------------------------
    // Guards
    // ------------------------------------------------------------------

    pub(crate) fn check_phone(&self) -> Result<()> {
        if is_valid_phone(&self.phone) {
            Ok(())
        } else {
            Err(Error::validation(
                Field::Phone,
                "please enter a valid 10-digit phone number",
            ))
        }
    }

    pub(crate) fn check_details(&self) -> Result<()> {
        if !is_valid_name(&self.customer_name) {
            return Err(Error::validation(
                Field::CustomerName,
                "customer name must be at least 2 characters",
            ));
        }
        if self.bill_type.is_none() {
            return Err(Error::validation(Field::BillType, "select a bill type"));
        }
        Ok(())
    }

    pub(crate) fn check_items(&self) -> Result<()> {
        if self.items.is_empty() {
            return Err(Error::validation(Field::Items, "add at least one item"));
        }
        if let Some(index) = self.items.iter().position(|i| i.name.trim().is_empty()) {
            return Err(Error::validation(
                Field::ItemName(index),
                "product name is required",
            ));
        }
        if self.totals().subtotal <= 0.0 {
            return Err(Error::validation(
                Field::Items,
                "bill subtotal must be greater than zero",
            ));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Mutations (crate-internal, called by the wizard)
    // ------------------------------------------------------------------

    /// Start item entry from scratch with the material's default rates.
    pub(crate) fn reset_items(&mut self) {
        self.items.clear();
        self.rates = self.material.default_rates();
    }

    pub(crate) fn push_item(&mut self, item: BillItem) -> Result<usize> {
        let index = self.items.len();
        check_amount(item.price, Field::ItemPrice(index), "price")?;
        self.items.push(item);
        Ok(index)
    }

    pub(crate) fn patch_item(&mut self, index: usize, patch: ItemPatch) -> Result<()> {
        if index >= self.items.len() {
            return Err(Error::validation(Field::ItemIndex(index), "no such item"));
        }
        if let Some(price) = patch.price {
            check_amount(price, Field::ItemPrice(index), "price")?;
        }

        let item = &mut self.items[index];
        if let Some(name) = patch.name {
            item.name = name;
        }
        if let Some(price) = patch.price {
            item.price = price;
        }
        if let Some(material) = patch.material {
            item.material = Some(material);
        }
        Ok(())
    }

    pub(crate) fn take_item(&mut self, index: usize) -> Result<BillItem> {
        if index >= self.items.len() {
            return Err(Error::validation(Field::ItemIndex(index), "no such item"));
        }
        Ok(self.items.remove(index))
    }

    pub(crate) fn set_cgst(&mut self, percent: f64) -> Result<()> {
        check_amount(percent, Field::TaxRate, "CGST %")?;
        self.rates.cgst_percent = percent;
        Ok(())
    }

    pub(crate) fn set_sgst(&mut self, percent: f64) -> Result<()> {
        check_amount(percent, Field::TaxRate, "SGST %")?;
        self.rates.sgst_percent = percent;
        Ok(())
    }

    /// Seed Details from a directory resolution for `phone`.
    pub(crate) fn seed_customer(&mut self, phone: &str, customer: Option<Customer>) {
        self.customer_name = customer
            .as_ref()
            .map(|c| c.name.clone())
            .unwrap_or_default();
        self.existing_customer = customer;
        self.resolved_phone = Some(phone.to_string());
    }

    pub(crate) fn is_resolved_for(&self, phone: &str) -> bool {
        self.resolved_phone.as_deref() == Some(phone)
    }

    /// Submission payload for this draft. Green bills carry zero rates.
    pub(crate) fn to_payload(&self, customer_id: Option<String>) -> Result<BillPayload> {
        let bill_type = self
            .bill_type
            .ok_or_else(|| Error::validation(Field::BillType, "select a bill type"))?;
        let (cgst_rate, sgst_rate) = if bill_type.is_taxed() {
            (self.rates.cgst_percent, self.rates.sgst_percent)
        } else {
            (0.0, 0.0)
        };

        Ok(BillPayload {
            customer_id,
            customer_name: self.customer_name.trim().to_string(),
            customer_phone: self.phone.clone(),
            jewelry_type: self.material,
            bill_type,
            products: self.items.iter().map(ProductLine::from).collect(),
            cgst_rate,
            sgst_rate,
            payment_method: self.payment_method,
        })
    }
}
