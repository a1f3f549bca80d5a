//! Category and subcategory command implementations

use anyhow::{anyhow, Result};
use tally_core::models::CategoryGroup;

use super::Session;

pub fn cmd_categories_list(session: &Session) -> Result<()> {
    let Some(categories) = session.emit(session.service.list_categories(session.user()))? else {
        return Ok(());
    };

    if categories.is_empty() {
        println!("No categories found. Run 'tally init' to seed default categories.");
        return Ok(());
    }

    println!();
    println!("📂 Categories");
    println!("   ─────────────────────────────────────────────────────────────");
    let mut group = None;
    for entry in &categories {
        if group != Some(entry.category.group) {
            group = Some(entry.category.group);
            println!("   [{}]", entry.category.group);
        }
        println!("   {:>4} • {}", entry.category.id, entry.category.name);
        for sub in &entry.subcategories {
            println!("   {:>4}     – {}", sub.id, sub.name);
        }
    }
    Ok(())
}

pub fn cmd_categories_add(session: &Session, name: &str, group: &str) -> Result<()> {
    let group: CategoryGroup = group.parse().map_err(|e: String| anyhow!(e))?;
    if let Some(category) =
        session.emit(session.service.create_category(session.user(), name, group))?
    {
        println!(
            "✅ Created {} category '{}' (id {})",
            category.group, category.name, category.id
        );
    }
    Ok(())
}

pub fn cmd_categories_rename(session: &Session, id: i64, name: &str) -> Result<()> {
    if let Some(category) =
        session.emit(session.service.rename_category(session.user(), id, name))?
    {
        println!("✅ Renamed category {} to '{}'", category.id, category.name);
    }
    Ok(())
}

pub fn cmd_categories_delete(session: &Session, id: i64) -> Result<()> {
    if let Some(category) = session.emit(session.service.delete_category(session.user(), id))? {
        println!(
            "🗑️  Deleted category '{}' and its subcategories",
            category.name
        );
    }
    Ok(())
}

pub fn cmd_subcategories_add(session: &Session, category_id: i64, name: &str) -> Result<()> {
    if let Some(sub) =
        session.emit(session.service.create_subcategory(session.user(), category_id, name))?
    {
        println!(
            "✅ Created subcategory '{}' (id {}) under category {}",
            sub.name, sub.id, sub.category_id
        );
    }
    Ok(())
}

pub fn cmd_subcategories_delete(session: &Session, id: i64) -> Result<()> {
    if let Some(sub) = session.emit(session.service.delete_subcategory(session.user(), id))? {
        println!("🗑️  Deleted subcategory '{}'", sub.name);
    }
    Ok(())
}
