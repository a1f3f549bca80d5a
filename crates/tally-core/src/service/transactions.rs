//! Transactions: listing, manual edits, the unassigned report, reclassify

use tracing::info;

use super::Service;
use crate::classify::{self, merchant_seed};
use crate::envelope::Envelope;
use crate::error::{Error, Result};
use crate::maintain;
use crate::models::{ClassificationUpdate, NewMerchant, Transaction, UnassignedDescription};
use crate::store::Store;

impl<S: Store> Service<S> {
    /// Most recent first
    pub fn list_transactions(&self, user_id: &str, limit: Option<usize>) -> Envelope<Vec<Transaction>> {
        self.store.list_transactions(user_id, limit).into()
    }

    pub fn get_transaction(&self, user_id: &str, id: i64) -> Envelope<Transaction> {
        self.find_transaction(user_id, id).into()
    }

    /// Set, change or clear any part of a transaction's classification by hand
    pub fn edit_transaction(
        &self,
        user_id: &str,
        id: i64,
        update: ClassificationUpdate,
    ) -> Envelope<Transaction> {
        self.try_edit_transaction(user_id, id, update).into()
    }

    /// Descriptions no merchant claims, most frequent first
    pub fn unassigned_descriptions(
        &self,
        user_id: &str,
        limit: Option<usize>,
    ) -> Envelope<Vec<UnassignedDescription>> {
        let result = self
            .store
            .transactions_by_merchant(user_id, None)
            .map(|unlinked| {
                let mut report = classify::unassigned_descriptions(&unlinked);
                if let Some(limit) = limit {
                    report.truncate(limit);
                }
                report
            });
        result.into()
    }

    /// A merchant pre-filled from a description, ready to be saved
    pub fn merchant_seed_from_description(&self, description: &str) -> Envelope<NewMerchant> {
        if description.trim().is_empty() {
            return Envelope::bad_request("Description is required");
        }
        Envelope::ok(merchant_seed(description))
    }

    /// Classify every stored transaction that has no classification
    pub fn reclassify(&self, user_id: &str) -> Envelope<usize> {
        let result = maintain::reclassify_unclassified(&self.store, user_id).inspect(|classified| {
            info!(user_id, classified, "Reclassified transactions");
        });
        result.into()
    }

    fn find_transaction(&self, user_id: &str, id: i64) -> Result<Transaction> {
        self.store
            .get_transaction(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("transaction {}", id)))
    }

    fn try_edit_transaction(
        &self,
        user_id: &str,
        id: i64,
        update: ClassificationUpdate,
    ) -> Result<Transaction> {
        if update.is_empty() {
            return Err(Error::invalid("Nothing to change"));
        }
        let current = self.find_transaction(user_id, id)?;

        if let Some(Some(merchant_id)) = update.merchant_id {
            self.store
                .get_merchant(user_id, merchant_id)?
                .ok_or_else(|| Error::NotFound(format!("merchant {}", merchant_id)))?;
        }
        let next = current.classification().updated(&update);
        self.check_category_refs(user_id, next.category_id, next.subcategory_id)?;

        self.store.update_classification(user_id, &[id], &update)?;
        info!(
            user_id,
            id,
            merchant_id = ?next.merchant_id,
            category_id = ?next.category_id,
            subcategory_id = ?next.subcategory_id,
            "Edited transaction"
        );
        self.find_transaction(user_id, id)
    }
}
