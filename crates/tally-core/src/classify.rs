//! Merchant classification
//!
//! A merchant matches a description when the lowercased description contains
//! any of the merchant's lowercase `includes` substrings. When several
//! merchants match, the one with the longest matching substring wins, and
//! ties go to the lowest merchant id.

use std::collections::HashMap;

use tracing::debug;

use crate::models::{CandidateTransaction, Merchant, NewMerchant, Transaction, UnassignedDescription};

/// Normalize an include list: trimmed, lowercased, non-empty, first occurrence kept
pub fn normalize_includes<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in raw {
        let s = item.as_ref().trim().to_lowercase();
        if !s.is_empty() && !out.contains(&s) {
            out.push(s);
        }
    }
    out
}

/// Whether `description` contains any of `includes`, ignoring case
pub fn description_matches(description: &str, includes: &[String]) -> bool {
    longest_match(&description.to_lowercase(), includes).is_some()
}

/// Length of the longest include found in an already-lowercased description
fn longest_match(description_lower: &str, includes: &[String]) -> Option<usize> {
    includes
        .iter()
        .map(|s| s.to_lowercase())
        .filter(|s| !s.is_empty() && description_lower.contains(s.as_str()))
        .map(|s| s.len())
        .max()
}

/// Matches descriptions against a user's merchant rules
pub struct MerchantClassifier<'a> {
    merchants: Vec<&'a Merchant>,
}

impl<'a> MerchantClassifier<'a> {
    pub fn new(merchants: &'a [Merchant]) -> Self {
        let mut merchants: Vec<&Merchant> = merchants
            .iter()
            .filter(|m| !m.includes.is_empty())
            .collect();
        merchants.sort_by_key(|m| m.id);
        Self { merchants }
    }

    /// The merchant that claims `description`, if any
    pub fn best_match(&self, description: &str) -> Option<&'a Merchant> {
        let lower = description.to_lowercase();
        let mut best: Option<(&'a Merchant, usize)> = None;
        for &merchant in &self.merchants {
            if let Some(len) = longest_match(&lower, &merchant.includes) {
                // Strictly longer only, so the lower id keeps a tie
                if best.map_or(true, |(_, best_len)| len > best_len) {
                    best = Some((merchant, len));
                }
            }
        }
        best.map(|(m, _)| m)
    }

    /// Classify one candidate if it has no merchant, category or subcategory yet.
    /// Returns whether it was classified.
    pub fn classify(&self, candidate: &mut CandidateTransaction) -> bool {
        if !candidate.classification().is_unclassified() {
            return false;
        }
        match self.best_match(&candidate.description) {
            Some(merchant) => {
                candidate.set_classification(merchant.classification());
                true
            }
            None => false,
        }
    }

    /// Classify every unclassified candidate, returning how many were matched
    pub fn classify_all(&self, candidates: &mut [CandidateTransaction]) -> usize {
        let mut classified = 0;
        for candidate in candidates.iter_mut() {
            if self.classify(candidate) {
                classified += 1;
            }
        }
        debug!(
            classified,
            total = candidates.len(),
            rules = self.merchants.len(),
            "Classified candidates"
        );
        classified
    }
}

/// Descriptions of transactions with no merchant, most frequent first
pub fn unassigned_descriptions(transactions: &[Transaction]) -> Vec<UnassignedDescription> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for tx in transactions.iter().filter(|t| t.merchant_id.is_none()) {
        *counts.entry(tx.description.as_str()).or_default() += 1;
    }

    let mut out: Vec<UnassignedDescription> = counts
        .into_iter()
        .map(|(description, count)| UnassignedDescription {
            description: description.to_string(),
            count,
        })
        .collect();
    out.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.description.cmp(&b.description))
    });
    out
}

/// A merchant pre-filled from an unassigned description
pub fn merchant_seed(description: &str) -> NewMerchant {
    NewMerchant {
        name: description.trim().to_string(),
        includes: normalize_includes(&[description]),
        category_id: None,
        subcategory_id: None,
    }
}
