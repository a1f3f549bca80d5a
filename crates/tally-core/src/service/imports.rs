//! File import pipeline

use std::path::Path;

use tracing::{debug, info};

use super::Service;
use crate::classify::MerchantClassifier;
use crate::envelope::{Envelope, STATUS_CREATED};
use crate::error::{Error, Result};
use crate::mapping;
use crate::materialize::{materialize, MaterializeOptions};
use crate::models::{ImportSummary, Mapping, NewMapping};
use crate::parse::{parse_file, ParsedFile};
use crate::store::Store;

/// Where an import gets its column mapping
#[derive(Debug, Clone, PartialEq)]
pub enum MappingSource {
    /// A mapping saved earlier
    Saved(i64),
    /// A mapping authored for this upload only
    Inline(NewMapping),
}

/// One upload
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRequest {
    pub mapping: MappingSource,
    /// Overrides the mapping's header flag
    pub includes_header: Option<bool>,
    /// Overrides the mapping's account name when non-empty
    pub account_name: Option<String>,
}

impl ImportRequest {
    pub fn saved(mapping_id: i64) -> Self {
        Self {
            mapping: MappingSource::Saved(mapping_id),
            includes_header: None,
            account_name: None,
        }
    }

    pub fn inline(mapping: NewMapping) -> Self {
        Self {
            mapping: MappingSource::Inline(mapping),
            includes_header: None,
            account_name: None,
        }
    }

    pub fn includes_header(mut self, includes_header: bool) -> Self {
        self.includes_header = Some(includes_header);
        self
    }

    pub fn account_name(mut self, account_name: impl Into<String>) -> Self {
        self.account_name = Some(account_name.into());
        self
    }
}

impl<S: Store> Service<S> {
    /// Parse a file and import it
    pub fn import_file(
        &self,
        user_id: &str,
        path: &Path,
        request: &ImportRequest,
    ) -> Envelope<ImportSummary> {
        let result = parse_file(path).and_then(|parsed| self.run_import(user_id, &parsed, request));
        Envelope::from_result(result, STATUS_CREATED)
    }

    /// Import rows that were already parsed
    pub fn import_rows(
        &self,
        user_id: &str,
        parsed: &ParsedFile,
        request: &ImportRequest,
    ) -> Envelope<ImportSummary> {
        Envelope::from_result(self.run_import(user_id, parsed, request), STATUS_CREATED)
    }

    fn run_import(
        &self,
        user_id: &str,
        parsed: &ParsedFile,
        request: &ImportRequest,
    ) -> Result<ImportSummary> {
        if parsed.rows.len() > self.import.max_rows {
            return Err(Error::invalid(format!(
                "File has {} rows; the limit is {}",
                parsed.rows.len(),
                self.import.max_rows
            )));
        }

        let mapping = self.import_mapping(user_id, &request.mapping)?;
        let resolved = mapping::resolve_mapping(&mapping, parsed.column_count())?;
        let options = MaterializeOptions::for_mapping(
            &mapping,
            request.includes_header,
            request.account_name.as_deref(),
        )
        .with_date_formats(&self.import.date_formats);

        let mut materialized = materialize(&parsed.rows, &resolved, &options)?;
        for err in &mut materialized.row_errors {
            err.line = parsed.line_of(err.row);
        }

        let merchants = self.store.list_merchants(user_id)?;
        let classified = MerchantClassifier::new(&merchants).classify_all(&mut materialized.candidates);
        debug!(
            candidates = materialized.candidates.len(),
            classified, "Classified candidates"
        );

        let ids = self
            .store
            .insert_transactions(user_id, &materialized.candidates)?;

        let summary = ImportSummary {
            imported: ids.len(),
            classified,
            skipped_empty: parsed.empty_rows + materialized.skipped_empty,
            row_errors: materialized.row_errors,
        };
        info!(
            user_id,
            mapping = %mapping.name,
            imported = summary.imported,
            classified = summary.classified,
            skipped_empty = summary.skipped_empty,
            row_errors = summary.row_errors.len(),
            "Import complete"
        );
        Ok(summary)
    }

    fn import_mapping(&self, user_id: &str, source: &MappingSource) -> Result<Mapping> {
        match source {
            MappingSource::Saved(id) => self
                .store
                .get_mapping(user_id, *id)?
                .ok_or_else(|| Error::NotFound(format!("mapping {}", id))),
            MappingSource::Inline(mapping) => Ok(mapping.clone().with_id(0)),
        }
    }
}
