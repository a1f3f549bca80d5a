//! Merchant rules
//!
//! Every mutation is followed by the matching consistency pass so stored
//! transactions follow the rule set. The number of transactions the pass
//! touched is returned as `affected`.

use tracing::info;

use super::Service;
use crate::classify::normalize_includes;
use crate::envelope::{Envelope, STATUS_CREATED};
use crate::error::{Error, Result};
use crate::maintain;
use crate::models::{Merchant, MerchantChange, NewMerchant};
use crate::store::Store;

impl<S: Store> Service<S> {
    pub fn list_merchants(&self, user_id: &str) -> Envelope<Vec<Merchant>> {
        self.store.list_merchants(user_id).into()
    }

    pub fn get_merchant(&self, user_id: &str, id: i64) -> Envelope<Merchant> {
        self.find_merchant(user_id, id).into()
    }

    /// Create a merchant and attach it to matching transactions
    pub fn create_merchant(&self, user_id: &str, merchant: NewMerchant) -> Envelope<MerchantChange> {
        Envelope::from_result(self.try_create_merchant(user_id, merchant), STATUS_CREATED)
    }

    /// Update a merchant and bring its transactions in line
    pub fn update_merchant(&self, user_id: &str, merchant: Merchant) -> Envelope<MerchantChange> {
        self.try_update_merchant(user_id, merchant).into()
    }

    /// Delete a merchant, clearing the category it gave its transactions
    pub fn delete_merchant(&self, user_id: &str, id: i64) -> Envelope<MerchantChange> {
        self.try_delete_merchant(user_id, id).into()
    }

    fn find_merchant(&self, user_id: &str, id: i64) -> Result<Merchant> {
        self.store
            .get_merchant(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("merchant {}", id)))
    }

    /// Normalize fields and check the name and category references.
    /// An empty includes list is allowed; such a merchant is only assigned by hand.
    fn prepare_merchant(
        &self,
        user_id: &str,
        own_id: Option<i64>,
        merchant: NewMerchant,
    ) -> Result<NewMerchant> {
        let prepared = NewMerchant {
            name: merchant.name.trim().to_string(),
            includes: normalize_includes(&merchant.includes),
            category_id: merchant.category_id,
            subcategory_id: merchant.subcategory_id,
        };

        if prepared.name.is_empty() {
            return Err(Error::invalid("Merchant name is required"));
        }

        let existing = self.store.list_merchants(user_id)?;
        if let Some(clash) = existing
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(&prepared.name) && Some(m.id) != own_id)
        {
            return Err(Error::Conflict(format!(
                "A merchant named '{}' already exists (id {})",
                clash.name, clash.id
            )));
        }

        self.check_category_refs(user_id, prepared.category_id, prepared.subcategory_id)?;
        Ok(prepared)
    }

    fn try_create_merchant(&self, user_id: &str, merchant: NewMerchant) -> Result<MerchantChange> {
        let prepared = self.prepare_merchant(user_id, None, merchant)?;
        let id = self.store.insert_merchant(user_id, &prepared)?;
        let merchant = prepared.with_id(id);

        let affected = maintain::on_merchant_created(&self.store, user_id, &merchant)?;
        info!(user_id, id, name = %merchant.name, affected, "Created merchant");
        Ok(MerchantChange { merchant, affected })
    }

    fn try_update_merchant(&self, user_id: &str, merchant: Merchant) -> Result<MerchantChange> {
        let before = self.find_merchant(user_id, merchant.id)?;
        let prepared = self.prepare_merchant(
            user_id,
            Some(merchant.id),
            NewMerchant {
                name: merchant.name,
                includes: merchant.includes,
                category_id: merchant.category_id,
                subcategory_id: merchant.subcategory_id,
            },
        )?;
        let after = prepared.with_id(before.id);

        if !self.store.update_merchant(user_id, &after)? {
            return Err(Error::NotFound(format!("merchant {}", after.id)));
        }
        let affected = maintain::on_merchant_updated(&self.store, user_id, &before, &after)?;
        info!(user_id, id = after.id, name = %after.name, affected, "Updated merchant");
        Ok(MerchantChange {
            merchant: after,
            affected,
        })
    }

    fn try_delete_merchant(&self, user_id: &str, id: i64) -> Result<MerchantChange> {
        let merchant = self.find_merchant(user_id, id)?;
        // Linked rows must be read before the link is dropped
        let affected = maintain::on_merchant_deleted(&self.store, user_id, &merchant)?;
        self.store.delete_merchant(user_id, id)?;
        info!(user_id, id, name = %merchant.name, affected, "Deleted merchant");
        Ok(MerchantChange { merchant, affected })
    }
}
