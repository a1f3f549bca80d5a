//! Merchant rule operations

use rusqlite::{params, OptionalExtension};

use super::{conflict_on_violation, Database};
use crate::error::Result;
use crate::models::{Merchant, NewMerchant};

const MERCHANT_COLUMNS: &str = "id, name, includes, category_id, subcategory_id";

fn row_to_merchant(row: &rusqlite::Row) -> rusqlite::Result<Merchant> {
    let includes_json: String = row.get(2)?;
    Ok(Merchant {
        id: row.get(0)?,
        name: row.get(1)?,
        includes: serde_json::from_str(&includes_json).unwrap_or_default(),
        category_id: row.get(3)?,
        subcategory_id: row.get(4)?,
    })
}

impl Database {
    /// List merchants ordered by id
    pub fn list_merchants(&self, user_id: &str) -> Result<Vec<Merchant>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM merchants WHERE user_id = ? ORDER BY id",
            MERCHANT_COLUMNS
        ))?;
        let merchants = stmt
            .query_map(params![user_id], row_to_merchant)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(merchants)
    }

    pub fn get_merchant(&self, user_id: &str, id: i64) -> Result<Option<Merchant>> {
        let conn = self.conn()?;
        let merchant = conn
            .query_row(
                &format!(
                    "SELECT {} FROM merchants WHERE user_id = ? AND id = ?",
                    MERCHANT_COLUMNS
                ),
                params![user_id, id],
                row_to_merchant,
            )
            .optional()?;
        Ok(merchant)
    }

    pub fn create_merchant(&self, user_id: &str, merchant: &NewMerchant) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO merchants (user_id, name, includes, category_id, subcategory_id)
            VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                merchant.name.trim(),
                serde_json::to_string(&merchant.includes)?,
                merchant.category_id,
                merchant.subcategory_id,
            ],
        )
        .map_err(|e| {
            conflict_on_violation(e, || {
                format!("A merchant named '{}' already exists", merchant.name.trim())
            })
        })?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update_merchant(&self, user_id: &str, merchant: &Merchant) -> Result<bool> {
        let conn = self.conn()?;
        let updated = conn
            .execute(
                r#"
                UPDATE merchants
                SET name = ?, includes = ?, category_id = ?, subcategory_id = ?
                WHERE user_id = ? AND id = ?
                "#,
                params![
                    merchant.name.trim(),
                    serde_json::to_string(&merchant.includes)?,
                    merchant.category_id,
                    merchant.subcategory_id,
                    user_id,
                    merchant.id,
                ],
            )
            .map_err(|e| {
                conflict_on_violation(e, || {
                    format!("A merchant named '{}' already exists", merchant.name.trim())
                })
            })?;
        Ok(updated > 0)
    }

    /// Delete a merchant, unlinking its transactions
    pub fn delete_merchant(&self, user_id: &str, id: i64) -> Result<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "UPDATE transactions SET merchant_id = NULL WHERE user_id = ? AND merchant_id = ?",
            params![user_id, id],
        )?;
        let deleted = tx.execute(
            "DELETE FROM merchants WHERE user_id = ? AND id = ?",
            params![user_id, id],
        )?;
        tx.commit()?;
        Ok(deleted > 0)
    }
}
