//! Boundary operations invoked by the UI layer and the CLI
//!
//! Every public method takes the acting user's id and returns an
//! [`Envelope`]. Validation runs before anything is written. The work itself
//! is done in `Result`-returning helpers; only the public wrappers translate
//! errors into envelopes.
//!
//! This module is organized by domain:
//! - `imports` - File import pipeline
//! - `mappings` - Saved column mappings
//! - `merchants` - Merchant rules and their effect on stored transactions
//! - `categories` - Categories and subcategories
//! - `transactions` - Listing, manual edits, unassigned report, reclassify

use tracing::info;

use crate::config::ImportConfig;
use crate::envelope::{Envelope, STATUS_CREATED};
use crate::error::{Error, Result};
use crate::models::{Category, Subcategory};
use crate::seed::{self, SeedSummary};
use crate::store::Store;

mod categories;
mod imports;
mod mappings;
mod merchants;
mod transactions;

pub use imports::{ImportRequest, MappingSource};

/// Operations over a [`Store`], one instance per process
pub struct Service<S: Store> {
    store: S,
    import: ImportConfig,
}

impl<S: Store> Service<S> {
    pub fn new(store: S) -> Self {
        Self::with_import_config(store, ImportConfig::default())
    }

    pub fn with_import_config(store: S, import: ImportConfig) -> Self {
        Self { store, import }
    }

    /// The underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn import_config(&self) -> &ImportConfig {
        &self.import
    }

    /// Seed the fixed categories, merchants and mappings for a user.
    /// Entities that already exist are left alone.
    pub fn provision_user(&self, user_id: &str) -> Envelope<SeedSummary> {
        let result = seed::provision_user(&self.store, user_id).inspect(|summary| {
            info!(
                user_id,
                categories = summary.categories,
                subcategories = summary.subcategories,
                merchants = summary.merchants,
                mappings = summary.mappings,
                "Provisioned user"
            );
        });
        Envelope::from_result(result, STATUS_CREATED)
    }

    /// Check that a category/subcategory pair exists and is consistent
    fn check_category_refs(
        &self,
        user_id: &str,
        category_id: Option<i64>,
        subcategory_id: Option<i64>,
    ) -> Result<()> {
        let category: Option<Category> = match category_id {
            Some(id) => Some(
                self.store
                    .get_category(user_id, id)?
                    .ok_or_else(|| Error::NotFound(format!("category {}", id)))?,
            ),
            None => None,
        };
        let Some(sub_id) = subcategory_id else {
            return Ok(());
        };
        let subcategory: Subcategory = self
            .store
            .get_subcategory(user_id, sub_id)?
            .ok_or_else(|| Error::NotFound(format!("subcategory {}", sub_id)))?;

        match category {
            None => Err(Error::invalid(format!(
                "Subcategory '{}' requires a category",
                subcategory.name
            ))),
            Some(c) if c.id != subcategory.category_id => Err(Error::invalid(format!(
                "Subcategory '{}' does not belong to category '{}'",
                subcategory.name, c.name
            ))),
            Some(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests;
