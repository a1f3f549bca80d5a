//! Category and subcategory operations

use rusqlite::{params, OptionalExtension};
use tracing::info;

use super::{conflict_on_violation, Database};
use crate::error::{Error, Result};
use crate::models::{Category, CategoryGroup, Subcategory};

fn row_to_category(row: &rusqlite::Row) -> rusqlite::Result<Category> {
    let group_str: String = row.get(2)?;
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        group: group_str.parse().unwrap_or(CategoryGroup::Expense),
    })
}

fn row_to_subcategory(row: &rusqlite::Row) -> rusqlite::Result<Subcategory> {
    Ok(Subcategory {
        id: row.get(0)?,
        name: row.get(1)?,
        category_id: row.get(2)?,
    })
}

impl Database {
    /// List categories ordered by group, then name
    pub fn list_categories(&self, user_id: &str) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, name, category_group FROM categories
            WHERE user_id = ?
            ORDER BY category_group, name COLLATE NOCASE
            "#,
        )?;
        let categories = stmt
            .query_map(params![user_id], row_to_category)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    pub fn get_category(&self, user_id: &str, id: i64) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let category = conn
            .query_row(
                "SELECT id, name, category_group FROM categories WHERE user_id = ? AND id = ?",
                params![user_id, id],
                row_to_category,
            )
            .optional()?;
        Ok(category)
    }

    /// Find a category by name within a group (case-insensitive)
    pub fn find_category(
        &self,
        user_id: &str,
        name: &str,
        group: CategoryGroup,
    ) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let category = conn
            .query_row(
                r#"
                SELECT id, name, category_group FROM categories
                WHERE user_id = ? AND category_group = ? AND name = ? COLLATE NOCASE
                "#,
                params![user_id, group.as_str(), name.trim()],
                row_to_category,
            )
            .optional()?;
        Ok(category)
    }

    /// Create a category. Names are unique per user and group.
    pub fn create_category(&self, user_id: &str, name: &str, group: CategoryGroup) -> Result<i64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::invalid("Category name is required"));
        }
        if self.find_category(user_id, name, group)?.is_some() {
            return Err(Error::Conflict(format!(
                "A {} category named '{}' already exists",
                group, name
            )));
        }

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO categories (user_id, name, category_group) VALUES (?, ?, ?)",
            params![user_id, name, group.as_str()],
        )
        .map_err(|e| {
            conflict_on_violation(e, || {
                format!("A {} category named '{}' already exists", group, name)
            })
        })?;
        let id = conn.last_insert_rowid();

        info!(user_id, id, name, group = %group, "Created category");
        Ok(id)
    }

    /// Rename a category, keeping names unique within its group
    pub fn rename_category(&self, user_id: &str, id: i64, name: &str) -> Result<bool> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::invalid("Category name is required"));
        }
        let Some(current) = self.get_category(user_id, id)? else {
            return Ok(false);
        };
        if let Some(other) = self.find_category(user_id, name, current.group)? {
            if other.id != id {
                return Err(Error::Conflict(format!(
                    "A {} category named '{}' already exists",
                    current.group, other.name
                )));
            }
        }

        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE categories SET name = ? WHERE user_id = ? AND id = ?",
            params![name, user_id, id],
        )?;
        Ok(updated > 0)
    }

    /// Delete a category, its subcategories, and every reference to them
    pub fn delete_category(&self, user_id: &str, id: i64) -> Result<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let exists: bool = tx
            .query_row(
                "SELECT 1 FROM categories WHERE user_id = ? AND id = ?",
                params![user_id, id],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        if !exists {
            return Ok(false);
        }

        for table in ["transactions", "merchants"] {
            tx.execute(
                &format!(
                    r#"
                    UPDATE {} SET subcategory_id = NULL
                    WHERE user_id = ?1
                      AND subcategory_id IN (SELECT id FROM subcategories WHERE category_id = ?2)
                    "#,
                    table
                ),
                params![user_id, id],
            )?;
            tx.execute(
                &format!(
                    "UPDATE {} SET category_id = NULL WHERE user_id = ?1 AND category_id = ?2",
                    table
                ),
                params![user_id, id],
            )?;
        }
        let subcategories = tx.execute(
            "DELETE FROM subcategories WHERE user_id = ? AND category_id = ?",
            params![user_id, id],
        )?;
        tx.execute(
            "DELETE FROM categories WHERE user_id = ? AND id = ?",
            params![user_id, id],
        )?;
        tx.commit()?;

        info!(user_id, id, subcategories, "Deleted category");
        Ok(true)
    }

    /// List subcategories, optionally for one category
    pub fn list_subcategories(
        &self,
        user_id: &str,
        category_id: Option<i64>,
    ) -> Result<Vec<Subcategory>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, name, category_id FROM subcategories
            WHERE user_id = ?1 AND (?2 IS NULL OR category_id = ?2)
            ORDER BY category_id, name COLLATE NOCASE
            "#,
        )?;
        let subcategories = stmt
            .query_map(params![user_id, category_id], row_to_subcategory)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(subcategories)
    }

    pub fn get_subcategory(&self, user_id: &str, id: i64) -> Result<Option<Subcategory>> {
        let conn = self.conn()?;
        let subcategory = conn
            .query_row(
                "SELECT id, name, category_id FROM subcategories WHERE user_id = ? AND id = ?",
                params![user_id, id],
                row_to_subcategory,
            )
            .optional()?;
        Ok(subcategory)
    }

    /// Create a subcategory. Names are unique within their category.
    pub fn create_subcategory(&self, user_id: &str, category_id: i64, name: &str) -> Result<i64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::invalid("Subcategory name is required"));
        }
        let category = self
            .get_category(user_id, category_id)?
            .ok_or_else(|| Error::NotFound(format!("category {}", category_id)))?;

        let conn = self.conn()?;
        let taken: bool = conn
            .query_row(
                "SELECT 1 FROM subcategories WHERE category_id = ? AND name = ? COLLATE NOCASE",
                params![category_id, name],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        if taken {
            return Err(Error::Conflict(format!(
                "'{}' already has a subcategory named '{}'",
                category.name, name
            )));
        }

        conn.execute(
            "INSERT INTO subcategories (user_id, category_id, name) VALUES (?, ?, ?)",
            params![user_id, category_id, name],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Delete a subcategory and clear references to it
    pub fn delete_subcategory(&self, user_id: &str, id: i64) -> Result<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        for table in ["transactions", "merchants"] {
            tx.execute(
                &format!(
                    "UPDATE {} SET subcategory_id = NULL WHERE user_id = ?1 AND subcategory_id = ?2",
                    table
                ),
                params![user_id, id],
            )?;
        }
        let deleted = tx.execute(
            "DELETE FROM subcategories WHERE user_id = ? AND id = ?",
            params![user_id, id],
        )?;
        tx.commit()?;
        Ok(deleted > 0)
    }
}
