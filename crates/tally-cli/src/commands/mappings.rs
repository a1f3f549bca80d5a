//! Column mapping command implementations

use anyhow::{anyhow, Result};
use tally_core::models::{ColumnFieldMapping, FieldName, Mapping, NegativeAmountMeans, NewMapping};

use super::{truncate, Session};

/// Find a saved mapping by id or (case-insensitive) name
pub fn find_mapping(session: &Session, reference: &str) -> Result<Mapping> {
    let reference = reference.trim();
    if let Ok(id) = reference.parse::<i64>() {
        if let Some(mapping) = session.service.get_mapping(session.user(), id).into_data() {
            return Ok(mapping);
        }
    }
    session
        .service
        .list_mappings(session.user())
        .into_data()
        .unwrap_or_default()
        .into_iter()
        .find(|m| m.name.eq_ignore_ascii_case(reference))
        .ok_or_else(|| anyhow!("Mapping '{}' not found. List mappings with: tally mappings", reference))
}

/// Parse "date,,description,amount" into a column mapping
pub fn parse_columns(columns: &str) -> Result<ColumnFieldMapping> {
    let fields = columns
        .split(',')
        .map(|f| f.parse::<FieldName>().map_err(|e| anyhow!(e)))
        .collect::<Result<Vec<_>>>()?;
    Ok(ColumnFieldMapping::from_fields(&fields))
}

pub fn cmd_mappings_list(session: &Session) -> Result<()> {
    let Some(mappings) = session.emit(session.service.list_mappings(session.user()))? else {
        return Ok(());
    };

    if mappings.is_empty() {
        println!("No mappings found. Add one with:");
        println!("  tally mappings add <name> --columns date,description,amount --negative-means debit");
        return Ok(());
    }

    println!();
    println!("🗂️  Mappings");
    println!("   ─────────────────────────────────────────────────────────────");
    for m in &mappings {
        let fields: Vec<String> = m
            .column_field_mapping
            .iter()
            .map(|c| c.field_name.to_string())
            .collect();
        println!(
            "   {:>4} │ {:<30} │ {}",
            m.id,
            truncate(&m.name, 30),
            fields.join(", ")
        );
    }
    Ok(())
}

pub fn cmd_mappings_show(session: &Session, reference: &str) -> Result<()> {
    let mapping = find_mapping(session, reference)?;
    let Some(mapping) = session.emit(session.service.get_mapping(session.user(), mapping.id))?
    else {
        return Ok(());
    };

    println!();
    println!("🗂️  {} (id {})", mapping.name, mapping.id);
    if !mapping.account_name.is_empty() {
        println!("   Account:        {}", mapping.account_name);
    }
    println!("   Header row:     {}", if mapping.includes_header { "yes" } else { "no" });
    if mapping.negative_amount_means != NegativeAmountMeans::Unset {
        println!("   Negative means: {}", mapping.negative_amount_means.as_str());
    }
    println!("   Columns:");
    for column in mapping.column_field_mapping.iter() {
        println!("     {:>3} → {}", column.column_index, column.field_name);
    }
    Ok(())
}

pub fn cmd_mappings_add(
    session: &Session,
    name: &str,
    columns: &str,
    negative_means: Option<&str>,
    account: Option<&str>,
    no_header: bool,
) -> Result<()> {
    let negative_amount_means = match negative_means {
        Some(s) => s.parse::<NegativeAmountMeans>().map_err(|e| anyhow!(e))?,
        None => NegativeAmountMeans::Unset,
    };
    let mapping = NewMapping {
        name: name.to_string(),
        account_name: account.unwrap_or_default().to_string(),
        includes_header: !no_header,
        column_field_mapping: parse_columns(columns)?,
        negative_amount_means,
    };

    let Some(saved) = session.emit(session.service.create_mapping(session.user(), mapping))? else {
        return Ok(());
    };
    println!("✅ Saved mapping '{}' (id {})", saved.name, saved.id);
    Ok(())
}

pub fn cmd_mappings_delete(session: &Session, reference: &str) -> Result<()> {
    let mapping = find_mapping(session, reference)?;
    if session
        .emit(session.service.delete_mapping(session.user(), mapping.id))?
        .is_some()
    {
        println!("🗑️  Deleted mapping '{}'", mapping.name);
    }
    Ok(())
}
