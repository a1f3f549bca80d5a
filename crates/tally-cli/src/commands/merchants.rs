//! Merchant rule command implementations

use anyhow::Result;
use tally_core::models::{Merchant, MerchantChange, NewMerchant};

use super::{truncate, Session};

/// Optional field changes for `merchants update`
#[derive(Debug, Default)]
pub struct MerchantEdit {
    pub name: Option<String>,
    pub includes: Option<Vec<String>>,
    pub category_id: Option<i64>,
    pub subcategory_id: Option<i64>,
    pub clear_category: bool,
}

impl MerchantEdit {
    /// Apply to the stored merchant. A new category without a subcategory
    /// drops the old subcategory.
    pub fn apply(self, mut merchant: Merchant) -> Merchant {
        if let Some(name) = self.name {
            merchant.name = name;
        }
        if let Some(includes) = self.includes {
            merchant.includes = includes;
        }
        if self.clear_category {
            merchant.category_id = None;
            merchant.subcategory_id = None;
        } else if let Some(category_id) = self.category_id {
            merchant.category_id = Some(category_id);
            merchant.subcategory_id = self.subcategory_id;
        } else if let Some(subcategory_id) = self.subcategory_id {
            merchant.subcategory_id = Some(subcategory_id);
        }
        merchant
    }
}

fn print_change(verb: &str, change: &MerchantChange) {
    println!(
        "✅ {} merchant '{}' (id {})",
        verb, change.merchant.name, change.merchant.id
    );
    println!("   Transactions affected: {}", change.affected);
}

pub fn cmd_merchants_list(session: &Session) -> Result<()> {
    let Some(merchants) = session.emit(session.service.list_merchants(session.user()))? else {
        return Ok(());
    };

    if merchants.is_empty() {
        println!("No merchant rules found. Add one with:");
        println!("  tally merchants add \"Coffee Shop\" --includes \"coffee shop,cafe\"");
        return Ok(());
    }

    println!();
    println!("🏪 Merchants");
    println!("   ─────────────────────────────────────────────────────────────");
    for m in &merchants {
        let category = match (m.category_id, m.subcategory_id) {
            (Some(c), Some(s)) => format!("cat {} / sub {}", c, s),
            (Some(c), None) => format!("cat {}", c),
            _ => "-".to_string(),
        };
        println!(
            "   {:>4} │ {:<24} │ {:<16} │ {}",
            m.id,
            truncate(&m.name, 24),
            category,
            truncate(&m.includes.join(", "), 40)
        );
    }
    Ok(())
}

pub fn cmd_merchants_add(
    session: &Session,
    name: &str,
    includes: Vec<String>,
    category_id: Option<i64>,
    subcategory_id: Option<i64>,
) -> Result<()> {
    let includes = if includes.is_empty() {
        vec![name.to_string()]
    } else {
        includes
    };
    let merchant = NewMerchant {
        name: name.to_string(),
        includes,
        category_id,
        subcategory_id,
    };

    if let Some(change) = session.emit(session.service.create_merchant(session.user(), merchant))? {
        print_change("Created", &change);
    }
    Ok(())
}

pub fn cmd_merchants_update(session: &Session, id: i64, edit: MerchantEdit) -> Result<()> {
    let current = session.expect_data(session.service.get_merchant(session.user(), id))?;
    let updated = edit.apply(current);

    if let Some(change) = session.emit(session.service.update_merchant(session.user(), updated))? {
        print_change("Updated", &change);
    }
    Ok(())
}

pub fn cmd_merchants_delete(session: &Session, id: i64) -> Result<()> {
    if let Some(change) = session.emit(session.service.delete_merchant(session.user(), id))? {
        print_change("Deleted", &change);
    }
    Ok(())
}
