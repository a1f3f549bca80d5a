//! `Store` implementation for the SQLite database

use super::Database;
use crate::error::Result;
use crate::models::{
    CandidateTransaction, Category, CategoryGroup, ClassificationUpdate, Mapping, Merchant,
    NewMapping, NewMerchant, Subcategory, Transaction,
};
use crate::store::Store;

impl Store for Database {
    fn list_categories(&self, user_id: &str) -> Result<Vec<Category>> {
        Database::list_categories(self, user_id)
    }

    fn get_category(&self, user_id: &str, id: i64) -> Result<Option<Category>> {
        Database::get_category(self, user_id, id)
    }

    fn insert_category(&self, user_id: &str, name: &str, group: CategoryGroup) -> Result<i64> {
        self.create_category(user_id, name, group)
    }

    fn rename_category(&self, user_id: &str, id: i64, name: &str) -> Result<bool> {
        Database::rename_category(self, user_id, id, name)
    }

    fn delete_category(&self, user_id: &str, id: i64) -> Result<bool> {
        Database::delete_category(self, user_id, id)
    }

    fn list_subcategories(
        &self,
        user_id: &str,
        category_id: Option<i64>,
    ) -> Result<Vec<Subcategory>> {
        Database::list_subcategories(self, user_id, category_id)
    }

    fn get_subcategory(&self, user_id: &str, id: i64) -> Result<Option<Subcategory>> {
        Database::get_subcategory(self, user_id, id)
    }

    fn insert_subcategory(&self, user_id: &str, category_id: i64, name: &str) -> Result<i64> {
        self.create_subcategory(user_id, category_id, name)
    }

    fn delete_subcategory(&self, user_id: &str, id: i64) -> Result<bool> {
        Database::delete_subcategory(self, user_id, id)
    }

    fn list_merchants(&self, user_id: &str) -> Result<Vec<Merchant>> {
        Database::list_merchants(self, user_id)
    }

    fn get_merchant(&self, user_id: &str, id: i64) -> Result<Option<Merchant>> {
        Database::get_merchant(self, user_id, id)
    }

    fn insert_merchant(&self, user_id: &str, merchant: &NewMerchant) -> Result<i64> {
        self.create_merchant(user_id, merchant)
    }

    fn update_merchant(&self, user_id: &str, merchant: &Merchant) -> Result<bool> {
        Database::update_merchant(self, user_id, merchant)
    }

    fn delete_merchant(&self, user_id: &str, id: i64) -> Result<bool> {
        Database::delete_merchant(self, user_id, id)
    }

    fn list_mappings(&self, user_id: &str) -> Result<Vec<Mapping>> {
        Database::list_mappings(self, user_id)
    }

    fn get_mapping(&self, user_id: &str, id: i64) -> Result<Option<Mapping>> {
        Database::get_mapping(self, user_id, id)
    }

    fn insert_mapping(&self, user_id: &str, mapping: &NewMapping) -> Result<i64> {
        self.create_mapping(user_id, mapping)
    }

    fn update_mapping(&self, user_id: &str, mapping: &Mapping) -> Result<bool> {
        Database::update_mapping(self, user_id, mapping)
    }

    fn delete_mapping(&self, user_id: &str, id: i64) -> Result<bool> {
        Database::delete_mapping(self, user_id, id)
    }

    fn insert_transactions(
        &self,
        user_id: &str,
        candidates: &[CandidateTransaction],
    ) -> Result<Vec<i64>> {
        Database::insert_transactions(self, user_id, candidates)
    }

    fn list_transactions(&self, user_id: &str, limit: Option<usize>) -> Result<Vec<Transaction>> {
        Database::list_transactions(self, user_id, limit)
    }

    fn get_transaction(&self, user_id: &str, id: i64) -> Result<Option<Transaction>> {
        Database::get_transaction(self, user_id, id)
    }

    fn transactions_by_merchant(
        &self,
        user_id: &str,
        merchant_id: Option<i64>,
    ) -> Result<Vec<Transaction>> {
        Database::transactions_by_merchant(self, user_id, merchant_id)
    }

    fn update_classification(
        &self,
        user_id: &str,
        ids: &[i64],
        update: &ClassificationUpdate,
    ) -> Result<usize> {
        Database::update_classification(self, user_id, ids, update)
    }
}
