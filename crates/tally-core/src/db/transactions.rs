//! Transaction operations

use rusqlite::{params, params_from_iter, OptionalExtension};
use tracing::debug;

use super::Database;
use crate::error::Result;
use crate::models::{CandidateTransaction, ClassificationUpdate, Transaction};

const TRANSACTION_COLUMNS: &str =
    "id, date, account_name, description, amount, merchant_id, category_id, subcategory_id";

/// SQLite's default limit on bound parameters is 999; stay well under it
const ID_CHUNK: usize = 500;

fn row_to_transaction(row: &rusqlite::Row) -> rusqlite::Result<Transaction> {
    let date_str: String = row.get(1)?;
    Ok(Transaction {
        id: row.get(0)?,
        date: chrono::NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").unwrap_or_default(),
        account_name: row.get(2)?,
        description: row.get(3)?,
        amount: row.get(4)?,
        merchant_id: row.get(5)?,
        category_id: row.get(6)?,
        subcategory_id: row.get(7)?,
    })
}

impl Database {
    /// Insert a batch of candidates in one SQLite transaction
    pub fn insert_transactions(
        &self,
        user_id: &str,
        candidates: &[CandidateTransaction],
    ) -> Result<Vec<i64>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut ids = Vec::with_capacity(candidates.len());
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO transactions
                    (user_id, date, account_name, description, amount, merchant_id, category_id, subcategory_id)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )?;
            for c in candidates {
                stmt.execute(params![
                    user_id,
                    c.date.format("%Y-%m-%d").to_string(),
                    c.account_name,
                    c.description,
                    c.amount,
                    c.merchant_id,
                    c.category_id,
                    c.subcategory_id,
                ])?;
                ids.push(tx.last_insert_rowid());
            }
        }
        tx.commit()?;
        debug!(user_id, inserted = ids.len(), "Inserted transactions");
        Ok(ids)
    }

    /// List transactions, most recent first
    pub fn list_transactions(&self, user_id: &str, limit: Option<usize>) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions WHERE user_id = ? ORDER BY date DESC, id DESC LIMIT ?",
            TRANSACTION_COLUMNS
        ))?;
        let transactions = stmt
            .query_map(params![user_id, limit], row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(transactions)
    }

    pub fn get_transaction(&self, user_id: &str, id: i64) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        let transaction = conn
            .query_row(
                &format!(
                    "SELECT {} FROM transactions WHERE user_id = ? AND id = ?",
                    TRANSACTION_COLUMNS
                ),
                params![user_id, id],
                row_to_transaction,
            )
            .optional()?;
        Ok(transaction)
    }

    /// Transactions linked to a merchant, or with no merchant when `None`
    pub fn transactions_by_merchant(
        &self,
        user_id: &str,
        merchant_id: Option<i64>,
    ) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions WHERE user_id = ?1 AND merchant_id IS ?2 ORDER BY id",
            TRANSACTION_COLUMNS
        ))?;
        let transactions = stmt
            .query_map(params![user_id, merchant_id], row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(transactions)
    }

    /// Apply a partial classification update to a set of transactions
    pub fn update_classification(
        &self,
        user_id: &str,
        ids: &[i64],
        update: &ClassificationUpdate,
    ) -> Result<usize> {
        let mut sets = Vec::new();
        let mut values: Vec<Option<i64>> = Vec::new();
        for (column, slot) in [
            ("merchant_id", update.merchant_id),
            ("category_id", update.category_id),
            ("subcategory_id", update.subcategory_id),
        ] {
            if let Some(value) = slot {
                sets.push(format!("{} = ?", column));
                values.push(value);
            }
        }
        if sets.is_empty() || ids.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut changed = 0;
        for chunk in ids.chunks(ID_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "UPDATE transactions SET {} WHERE user_id = ? AND id IN ({})",
                sets.join(", "),
                placeholders
            );
            let params = values
                .iter()
                .map(|v| rusqlite::types::Value::from(*v))
                .chain(std::iter::once(rusqlite::types::Value::from(
                    user_id.to_string(),
                )))
                .chain(chunk.iter().map(|id| rusqlite::types::Value::from(*id)));
            changed += tx.execute(&sql, params_from_iter(params))?;
        }
        tx.commit()?;
        Ok(changed)
    }
}
