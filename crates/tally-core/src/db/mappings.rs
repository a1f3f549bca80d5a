//! Saved column mapping operations

use rusqlite::{params, OptionalExtension};

use super::{conflict_on_violation, Database};
use crate::error::Result;
use crate::models::{ColumnFieldMapping, Mapping, NewMapping};

const MAPPING_COLUMNS: &str =
    "id, name, account_name, includes_header, column_field_mapping, negative_amount_means";

fn row_to_mapping(row: &rusqlite::Row) -> rusqlite::Result<Mapping> {
    let includes_header: i64 = row.get(3)?;
    let columns_json: String = row.get(4)?;
    let negative_str: String = row.get(5)?;
    Ok(Mapping {
        id: row.get(0)?,
        name: row.get(1)?,
        account_name: row.get(2)?,
        includes_header: includes_header != 0,
        column_field_mapping: serde_json::from_str::<ColumnFieldMapping>(&columns_json)
            .unwrap_or_default(),
        negative_amount_means: negative_str.parse().unwrap_or_default(),
    })
}

impl Database {
    pub fn list_mappings(&self, user_id: &str) -> Result<Vec<Mapping>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM mappings WHERE user_id = ? ORDER BY name COLLATE NOCASE",
            MAPPING_COLUMNS
        ))?;
        let mappings = stmt
            .query_map(params![user_id], row_to_mapping)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(mappings)
    }

    pub fn get_mapping(&self, user_id: &str, id: i64) -> Result<Option<Mapping>> {
        let conn = self.conn()?;
        let mapping = conn
            .query_row(
                &format!(
                    "SELECT {} FROM mappings WHERE user_id = ? AND id = ?",
                    MAPPING_COLUMNS
                ),
                params![user_id, id],
                row_to_mapping,
            )
            .optional()?;
        Ok(mapping)
    }

    pub fn create_mapping(&self, user_id: &str, mapping: &NewMapping) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO mappings
                (user_id, name, account_name, includes_header, column_field_mapping, negative_amount_means)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                mapping.name.trim(),
                mapping.account_name,
                mapping.includes_header,
                serde_json::to_string(&mapping.column_field_mapping)?,
                mapping.negative_amount_means.as_str(),
            ],
        )
        .map_err(|e| {
            conflict_on_violation(e, || {
                format!("A mapping named '{}' already exists", mapping.name.trim())
            })
        })?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update_mapping(&self, user_id: &str, mapping: &Mapping) -> Result<bool> {
        let conn = self.conn()?;
        let updated = conn
            .execute(
                r#"
                UPDATE mappings
                SET name = ?, account_name = ?, includes_header = ?,
                    column_field_mapping = ?, negative_amount_means = ?
                WHERE user_id = ? AND id = ?
                "#,
                params![
                    mapping.name.trim(),
                    mapping.account_name,
                    mapping.includes_header,
                    serde_json::to_string(&mapping.column_field_mapping)?,
                    mapping.negative_amount_means.as_str(),
                    user_id,
                    mapping.id,
                ],
            )
            .map_err(|e| {
                conflict_on_violation(e, || {
                    format!("A mapping named '{}' already exists", mapping.name.trim())
                })
            })?;
        Ok(updated > 0)
    }

    pub fn delete_mapping(&self, user_id: &str, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM mappings WHERE user_id = ? AND id = ?",
            params![user_id, id],
        )?;
        Ok(deleted > 0)
    }
}
