//! Saved column mappings

use tracing::info;

use super::Service;
use crate::envelope::{Envelope, STATUS_CREATED};
use crate::error::{Error, Result};
use crate::mapping::validate_for_save;
use crate::models::{Mapping, NewMapping};
use crate::store::Store;

impl<S: Store> Service<S> {
    pub fn list_mappings(&self, user_id: &str) -> Envelope<Vec<Mapping>> {
        self.store.list_mappings(user_id).into()
    }

    pub fn get_mapping(&self, user_id: &str, id: i64) -> Envelope<Mapping> {
        self.find_mapping(user_id, id).into()
    }

    /// Validate and save a new mapping
    pub fn create_mapping(&self, user_id: &str, mapping: NewMapping) -> Envelope<Mapping> {
        Envelope::from_result(self.try_create_mapping(user_id, mapping), STATUS_CREATED)
    }

    /// Replace a saved mapping. It may keep its own name.
    pub fn update_mapping(&self, user_id: &str, mapping: Mapping) -> Envelope<Mapping> {
        self.try_update_mapping(user_id, mapping).into()
    }

    /// Delete a mapping, returning its id
    pub fn delete_mapping(&self, user_id: &str, id: i64) -> Envelope<i64> {
        let result = self.store.delete_mapping(user_id, id).and_then(|deleted| {
            if deleted {
                info!(user_id, id, "Deleted mapping");
                Ok(id)
            } else {
                Err(Error::NotFound(format!("mapping {}", id)))
            }
        });
        result.into()
    }

    fn find_mapping(&self, user_id: &str, id: i64) -> Result<Mapping> {
        self.store
            .get_mapping(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("mapping {}", id)))
    }

    fn try_create_mapping(&self, user_id: &str, mut mapping: NewMapping) -> Result<Mapping> {
        mapping.name = mapping.name.trim().to_string();
        let existing = self.store.list_mappings(user_id)?;
        validate_for_save(&mapping, None, &existing)?;

        let id = self.store.insert_mapping(user_id, &mapping)?;
        info!(user_id, id, name = %mapping.name, "Created mapping");
        Ok(mapping.with_id(id))
    }

    fn try_update_mapping(&self, user_id: &str, mut mapping: Mapping) -> Result<Mapping> {
        self.find_mapping(user_id, mapping.id)?;
        mapping.name = mapping.name.trim().to_string();

        let existing = self.store.list_mappings(user_id)?;
        validate_for_save(&NewMapping::from(mapping.clone()), Some(mapping.id), &existing)?;

        if !self.store.update_mapping(user_id, &mapping)? {
            return Err(Error::NotFound(format!("mapping {}", mapping.id)));
        }
        info!(user_id, id = mapping.id, name = %mapping.name, "Updated mapping");
        Ok(mapping)
    }
}
