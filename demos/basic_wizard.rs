//! Basic usage of the bill creation wizard.
//!
//! Runs two sessions against the in-memory store: a new customer with a
//! white (taxed) gold bill, then the same customer again with a green bill.

use bill_kit::backend::InMemoryStore;
use bill_kit::local::{LocalBillStore, LocalDirectory};
use bill_kit::model::{BillItem, BillType, ItemPatch, Material, PaymentMethod};
use bill_kit::observability::LogMetrics;
use bill_kit::{error::Result, WizardConfig, WizardStateMachine};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .try_init()
        .ok();

    println!("\n=== bill-kit - Basic Wizard ===\n");

    // 1. Collaborators over one in-memory store
    let store = InMemoryStore::new();
    let bills = LocalBillStore::new(store.clone());
    let mut wizard = WizardStateMachine::new(LocalDirectory::new(store.clone()), bills.clone())
        .with_config(WizardConfig::from_env()?)
        .with_metrics(Box::new(LogMetrics));

    // 2. New customer, white gold bill
    println!("1. New customer (9876543210):");
    wizard.set_phone("9876543210").await?;
    wizard.next().await?;
    println!("   name locked: {}", wizard.draft().is_name_locked());

    wizard.set_customer_name("Asha Verma")?;
    wizard.set_bill_type(BillType::White)?;
    wizard.set_material(Material::Gold)?;
    wizard.next().await?;
    println!("   default rates: {:?}", wizard.draft().rates());

    wizard.add_item(BillItem::new("Gold Ring", 15000.0).with_material(Material::Gold))?;
    let row = wizard.add_blank_item()?;
    wizard.update_item(row, ItemPatch::name("Gold Chain"))?;
    wizard.update_item(row, ItemPatch::price(42500.0))?;
    wizard.set_payment_method(PaymentMethod::Upi)?;
    wizard.next().await?;

    let bill = wizard.submit().await?;
    println!("   ✓ Created {}\n", bill.bill_number);
    if let Some(receipt) = wizard.receipt() {
        println!("{}\n", receipt);
    }

    // 3. Same phone again: name comes from the directory
    println!("2. Returning customer:");
    wizard.reset();
    wizard.set_phone("9876543210").await?;
    wizard.next().await?;
    println!(
        "   name: {} (locked: {})",
        wizard.draft().customer_name(),
        wizard.draft().is_name_locked()
    );

    wizard.set_bill_type(BillType::Green)?;
    wizard.next().await?;
    wizard.add_item(BillItem::new("Silver Anklet", 1800.0))?;
    wizard.next().await?;

    let bill = wizard.submit().await?;
    println!("   ✓ Created {}\n", bill.bill_number);
    if let Some(receipt) = wizard.receipt() {
        println!("{}\n", receipt);
    }

    // 4. History
    println!("3. Stored bills (newest first):");
    for bill in bills.list_bills().await? {
        println!(
            "   {} {} {:>12}",
            bill.bill_number,
            bill.bill_type,
            bill_kit::receipt::format_inr(bill.totals.total)
        );
    }

    store.log_stats().await;
    println!("\n=== Done ===\n");
    Ok(())
}
