//! Tally Core Library
//!
//! Transaction import and rule-based classification for the Tally personal
//! finance tracker:
//! - File parsing for CSV/TSV text and spreadsheets
//! - Column mapping validation and row materialization
//! - Merchant rule classification and the unassigned-description report
//! - Consistency maintenance as merchant rules change
//! - SQLite storage behind the `Store` trait
//! - Service operations returning a uniform response envelope
//! - New-user provisioning and an optimistic client cache

pub mod cache;
pub mod classify;
pub mod config;
pub mod db;
pub mod envelope;
pub mod error;
pub mod maintain;
pub mod mapping;
pub mod materialize;
pub mod models;
pub mod parse;
pub mod seed;
pub mod service;
pub mod store;

pub use cache::{CacheState, CachedCollection, MutationKind};
pub use classify::MerchantClassifier;
pub use config::{Config, ImportConfig};
pub use db::Database;
pub use envelope::Envelope;
pub use error::{Error, Result};
pub use mapping::ResolvedMapping;
pub use parse::ParsedFile;
pub use seed::SeedSummary;
pub use service::{ImportRequest, MappingSource, Service};
pub use store::Store;
