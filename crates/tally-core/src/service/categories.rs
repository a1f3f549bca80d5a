//! Categories and subcategories

use tracing::info;

use super::Service;
use crate::envelope::{Envelope, STATUS_CREATED};
use crate::error::{Error, Result};
use crate::models::{Category, CategoryGroup, CategoryWithSubcategories, Subcategory};
use crate::store::Store;

impl<S: Store> Service<S> {
    /// Every category with its subcategories
    pub fn list_categories(&self, user_id: &str) -> Envelope<Vec<CategoryWithSubcategories>> {
        self.try_list_categories(user_id).into()
    }

    pub fn list_subcategories(
        &self,
        user_id: &str,
        category_id: Option<i64>,
    ) -> Envelope<Vec<Subcategory>> {
        self.store.list_subcategories(user_id, category_id).into()
    }

    pub fn create_category(
        &self,
        user_id: &str,
        name: &str,
        group: CategoryGroup,
    ) -> Envelope<Category> {
        let result = self
            .store
            .insert_category(user_id, name, group)
            .map(|id| Category {
                id,
                name: name.trim().to_string(),
                group,
            });
        Envelope::from_result(result, STATUS_CREATED)
    }

    pub fn rename_category(&self, user_id: &str, id: i64, name: &str) -> Envelope<Category> {
        self.try_rename_category(user_id, id, name).into()
    }

    /// Delete a category and its subcategories, returning the category
    pub fn delete_category(&self, user_id: &str, id: i64) -> Envelope<Category> {
        self.try_delete_category(user_id, id).into()
    }

    pub fn create_subcategory(
        &self,
        user_id: &str,
        category_id: i64,
        name: &str,
    ) -> Envelope<Subcategory> {
        let result = self
            .store
            .insert_subcategory(user_id, category_id, name)
            .map(|id| Subcategory {
                id,
                name: name.trim().to_string(),
                category_id,
            });
        Envelope::from_result(result, STATUS_CREATED)
    }

    pub fn delete_subcategory(&self, user_id: &str, id: i64) -> Envelope<Subcategory> {
        self.try_delete_subcategory(user_id, id).into()
    }

    fn try_list_categories(&self, user_id: &str) -> Result<Vec<CategoryWithSubcategories>> {
        let categories = self.store.list_categories(user_id)?;
        let subcategories = self.store.list_subcategories(user_id, None)?;

        Ok(categories
            .into_iter()
            .map(|category| CategoryWithSubcategories {
                subcategories: subcategories
                    .iter()
                    .filter(|s| s.category_id == category.id)
                    .cloned()
                    .collect(),
                category,
            })
            .collect())
    }

    fn try_rename_category(&self, user_id: &str, id: i64, name: &str) -> Result<Category> {
        if !self.store.rename_category(user_id, id, name)? {
            return Err(Error::NotFound(format!("category {}", id)));
        }
        let category = self
            .store
            .get_category(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("category {}", id)))?;
        info!(user_id, id, name = %category.name, "Renamed category");
        Ok(category)
    }

    fn try_delete_category(&self, user_id: &str, id: i64) -> Result<Category> {
        let category = self
            .store
            .get_category(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("category {}", id)))?;
        self.store.delete_category(user_id, id)?;
        Ok(category)
    }

    fn try_delete_subcategory(&self, user_id: &str, id: i64) -> Result<Subcategory> {
        let subcategory = self
            .store
            .get_subcategory(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("subcategory {}", id)))?;
        self.store.delete_subcategory(user_id, id)?;
        info!(user_id, id, name = %subcategory.name, "Deleted subcategory");
        Ok(subcategory)
    }
}
