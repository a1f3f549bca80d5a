//! Write-through cache with optimistic mutation
//!
//! A [`CachedCollection`] holds a client-side copy of one collection (the
//! user's merchants, say). A mutation is applied locally first and the
//! pre-mutation contents are kept as a snapshot until the server answers:
//!
//! ```text
//! Idle --mutate--> OptimisticallyMutated --confirm--> Confirmed
//!                                        --rollback-> RolledBack
//! Confirmed | RolledBack --mutate--> OptimisticallyMutated
//! ```
//!
//! Confirming returns the collections the mutation made stale, so the caller
//! can refetch them.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::envelope::Envelope;
use crate::error::{Error, Result};

pub const TRANSACTIONS: &str = "transactions";
pub const MERCHANTS: &str = "merchants";
pub const MAPPINGS: &str = "mappings";
pub const CATEGORIES: &str = "categories";
pub const UNASSIGNED: &str = "unassigned";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    ImportTransactions,
    EditTransaction,
    CreateMerchant,
    UpdateMerchant,
    DeleteMerchant,
    SaveMapping,
    DeleteMapping,
    ChangeCategories,
}

impl MutationKind {
    /// Collections whose server state changes when this mutation succeeds
    pub fn invalidates(&self) -> &'static [&'static str] {
        match self {
            Self::ImportTransactions | Self::EditTransaction => &[TRANSACTIONS, UNASSIGNED],
            Self::CreateMerchant | Self::UpdateMerchant | Self::DeleteMerchant => {
                &[MERCHANTS, TRANSACTIONS, UNASSIGNED]
            }
            Self::SaveMapping | Self::DeleteMapping => &[MAPPINGS],
            // Deleting a category clears it on merchants and transactions
            Self::ChangeCategories => &[CATEGORIES, MERCHANTS, TRANSACTIONS],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheState {
    Idle,
    OptimisticallyMutated,
    Confirmed,
    RolledBack,
}

#[derive(Debug, Clone)]
pub struct CachedCollection<T: Clone> {
    key: &'static str,
    items: Vec<T>,
    state: CacheState,
    snapshot: Option<Vec<T>>,
    pending: Option<MutationKind>,
    stale: bool,
}

impl<T: Clone> CachedCollection<T> {
    pub fn new(key: &'static str, items: Vec<T>) -> Self {
        Self {
            key,
            items,
            state: CacheState::Idle,
            snapshot: None,
            pending: None,
            stale: false,
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn state(&self) -> CacheState {
        self.state
    }

    /// The mutation awaiting an answer
    pub fn pending(&self) -> Option<MutationKind> {
        self.pending
    }

    /// Whether the contents should be refetched
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Apply a mutation locally, keeping the current contents as a snapshot
    pub fn mutate(&mut self, kind: MutationKind, f: impl FnOnce(&mut Vec<T>)) -> Result<()> {
        if self.state == CacheState::OptimisticallyMutated {
            return Err(Error::InvalidState(format!(
                "{} already has a pending {:?}",
                self.key, self.pending
            )));
        }
        self.snapshot = Some(self.items.clone());
        f(&mut self.items);
        self.pending = Some(kind);
        self.state = CacheState::OptimisticallyMutated;
        debug!(collection = self.key, ?kind, "Optimistic mutation");
        Ok(())
    }

    /// Accept the pending mutation. Returns the collections to refetch.
    pub fn confirm(&mut self) -> Result<&'static [&'static str]> {
        let kind = self.take_pending("confirm")?;
        self.snapshot = None;
        self.state = CacheState::Confirmed;

        let invalidated = kind.invalidates();
        if invalidated.contains(&self.key) {
            self.stale = true;
        }
        Ok(invalidated)
    }

    /// Discard the pending mutation, restoring the snapshot
    pub fn rollback(&mut self) -> Result<()> {
        let kind = self.take_pending("roll back")?;
        if let Some(snapshot) = self.snapshot.take() {
            self.items = snapshot;
        }
        self.state = CacheState::RolledBack;
        debug!(collection = self.key, ?kind, "Rolled back mutation");
        Ok(())
    }

    /// Confirm or roll back depending on the server's answer
    pub fn settle<U>(&mut self, response: &Envelope<U>) -> Result<&'static [&'static str]> {
        if response.is_success() {
            self.confirm()
        } else {
            self.rollback()?;
            Ok(&[])
        }
    }

    /// Mark the contents as out of date
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    /// Replace the contents with freshly fetched data
    pub fn refresh(&mut self, items: Vec<T>) -> Result<()> {
        if self.state == CacheState::OptimisticallyMutated {
            return Err(Error::InvalidState(format!(
                "cannot refresh {} while a mutation is pending",
                self.key
            )));
        }
        self.items = items;
        self.stale = false;
        self.state = CacheState::Idle;
        Ok(())
    }

    fn take_pending(&mut self, action: &str) -> Result<MutationKind> {
        match (self.state, self.pending.take()) {
            (CacheState::OptimisticallyMutated, Some(kind)) => Ok(kind),
            (state, _) => Err(Error::InvalidState(format!(
                "cannot {} {} in state {:?}",
                action, self.key, state
            ))),
        }
    }
}
