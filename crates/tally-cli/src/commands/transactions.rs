//! Transaction command implementations

use anyhow::Result;
use tally_core::models::ClassificationUpdate;

use super::{truncate, Session};

/// A slot edit: `--x ID` sets, `--clear-x` clears, neither leaves it alone
pub fn slot(value: Option<i64>, clear: bool) -> Option<Option<i64>> {
    if clear {
        Some(None)
    } else {
        value.map(Some)
    }
}

fn format_amount(amount: f64) -> String {
    if amount < 0.0 {
        format!("\x1b[31m${:.2}\x1b[0m", amount.abs()) // Red for money out
    } else {
        format!("\x1b[32m+${:.2}\x1b[0m", amount) // Green for money in
    }
}

pub fn cmd_transactions_list(session: &Session, limit: usize) -> Result<()> {
    let Some(transactions) =
        session.emit(session.service.list_transactions(session.user(), Some(limit)))?
    else {
        return Ok(());
    };

    if transactions.is_empty() {
        println!("No transactions found. Import some with:");
        println!("  tally import --file statement.csv --mapping <name>");
        return Ok(());
    }

    println!();
    println!("📝 Recent Transactions");
    println!("   ─────────────────────────────────────────────────────────────");
    for tx in transactions {
        let merchant = tx
            .merchant_id
            .map(|id| format!("m{}", id))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "   {:>5} │ {} │ {:>10} │ {:<5} │ {}",
            tx.id,
            tx.date,
            format_amount(tx.amount),
            merchant,
            truncate(&tx.description, 40)
        );
    }
    Ok(())
}

pub fn cmd_transactions_edit(session: &Session, id: i64, update: ClassificationUpdate) -> Result<()> {
    if let Some(tx) = session.emit(session.service.edit_transaction(session.user(), id, update))? {
        println!("✅ Updated transaction {}: {}", tx.id, tx.description);
        println!(
            "   merchant: {:?}  category: {:?}  subcategory: {:?}",
            tx.merchant_id, tx.category_id, tx.subcategory_id
        );
    }
    Ok(())
}

pub fn cmd_unassigned(session: &Session, limit: usize) -> Result<()> {
    let Some(report) =
        session.emit(session.service.unassigned_descriptions(session.user(), Some(limit)))?
    else {
        return Ok(());
    };

    if report.is_empty() {
        println!("Every transaction has a merchant.");
        return Ok(());
    }

    println!();
    println!("❓ Unassigned Descriptions");
    println!("   ─────────────────────────────────────────────────────────────");
    for entry in &report {
        println!("   {:>5} × {}", entry.count, truncate(&entry.description, 60));
    }
    println!();
    if let Some(first) = report.first() {
        if let Some(seed) = session
            .service
            .merchant_seed_from_description(&first.description)
            .into_data()
        {
            println!("💡 Create a rule for the most common one:");
            println!(
                "   tally merchants add \"{}\" --includes \"{}\"",
                seed.name,
                seed.includes.join(",")
            );
        }
    }
    Ok(())
}

pub fn cmd_reclassify(session: &Session) -> Result<()> {
    if let Some(classified) = session.emit(session.service.reclassify(session.user()))? {
        println!("✅ Classified {} transactions", classified);
    }
    Ok(())
}
