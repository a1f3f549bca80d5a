//! Keeps stored transaction classifications consistent as merchant rules
//! change.
//!
//! Every pass reads candidate rows by merchant link, filters them by
//! description in memory with the same matcher the classifier uses, then
//! applies one bulk update per pass. A transaction whose category was changed
//! by hand away from its merchant's category is never given a new category
//! here; at most its merchant link is moved.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::debug;

use crate::classify::{description_matches, MerchantClassifier};
use crate::error::Result;
use crate::models::{ClassificationUpdate, Merchant, Transaction};
use crate::store::Store;

/// Tracks which transactions a sequence of passes touched
#[derive(Default)]
struct Affected(BTreeSet<i64>);

impl Affected {
    fn apply<S: Store + ?Sized>(
        &mut self,
        store: &S,
        user_id: &str,
        pass: &str,
        ids: Vec<i64>,
        update: ClassificationUpdate,
    ) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let changed = store.update_classification(user_id, &ids, &update)?;
        debug!(pass, matched = ids.len(), changed, "Classification pass");
        self.0.extend(ids);
        Ok(())
    }

    fn count(&self) -> usize {
        self.0.len()
    }
}

fn ids_where(txs: &[Transaction], pred: impl Fn(&Transaction) -> bool) -> Vec<i64> {
    txs.iter().filter(|t| pred(t)).map(|t| t.id).collect()
}

/// Attach a new merchant to matching transactions that have no merchant.
///
/// Fully unclassified matches get merchant, category and subcategory. Matches
/// that already carry a category chosen independently get the merchant only.
pub fn on_merchant_created<S: Store + ?Sized>(
    store: &S,
    user_id: &str,
    merchant: &Merchant,
) -> Result<usize> {
    let mut affected = Affected::default();
    attach(store, user_id, merchant, &mut affected)?;
    Ok(affected.count())
}

/// Bring transactions in line with an edited merchant.
///
/// With changed includes, transactions matched by the old substrings are
/// detached (fully when they still carry the old category, merchant only
/// otherwise). With a changed category, transactions still linked and still
/// carrying the old category move to the new one. With changed includes, the
/// new substrings are then attached as on creation.
pub fn on_merchant_updated<S: Store + ?Sized>(
    store: &S,
    user_id: &str,
    before: &Merchant,
    after: &Merchant,
) -> Result<usize> {
    let includes_changed = includes_differ(&before.includes, &after.includes);
    let category_changed = before.category_id != after.category_id
        || before.subcategory_id != after.subcategory_id;
    let mut affected = Affected::default();

    if includes_changed {
        let linked = store.transactions_by_merchant(user_id, Some(before.id))?;
        let matched: Vec<Transaction> = linked
            .into_iter()
            .filter(|t| description_matches(&t.description, &before.includes))
            .collect();

        affected.apply(
            store,
            user_id,
            "detach_full",
            ids_where(&matched, |t| before.carries_category_of(&t.classification())),
            ClassificationUpdate::clear_all(),
        )?;
        affected.apply(
            store,
            user_id,
            "detach_merchant",
            ids_where(&matched, |t| !before.carries_category_of(&t.classification())),
            ClassificationUpdate::clear_merchant(),
        )?;
    }

    if category_changed {
        let linked = store.transactions_by_merchant(user_id, Some(before.id))?;
        affected.apply(
            store,
            user_id,
            "repropagate_category",
            ids_where(&linked, |t| before.carries_category_of(&t.classification())),
            ClassificationUpdate::category(after.category_id, after.subcategory_id),
        )?;
    }

    if includes_changed {
        attach(store, user_id, after, &mut affected)?;
    }

    Ok(affected.count())
}

/// Clear the category a deleted merchant gave its transactions.
///
/// Only transactions still carrying the merchant's category and subcategory
/// are cleared, and only those are counted. Every linked transaction loses
/// its merchant link.
pub fn on_merchant_deleted<S: Store + ?Sized>(
    store: &S,
    user_id: &str,
    merchant: &Merchant,
) -> Result<usize> {
    let linked = store.transactions_by_merchant(user_id, Some(merchant.id))?;
    let mut affected = Affected::default();

    if merchant.category_id.is_some() || merchant.subcategory_id.is_some() {
        affected.apply(
            store,
            user_id,
            "clear_category",
            ids_where(&linked, |t| merchant.carries_category_of(&t.classification())),
            ClassificationUpdate::category(None, None),
        )?;
    }

    let ids: Vec<i64> = linked.iter().map(|t| t.id).collect();
    if !ids.is_empty() {
        let detached =
            store.update_classification(user_id, &ids, &ClassificationUpdate::clear_merchant())?;
        debug!(detached, "Detached deleted merchant");
    }

    Ok(affected.count())
}

/// Run the classifier over every stored transaction that has no
/// classification at all. Returns how many were classified.
pub fn reclassify_unclassified<S: Store + ?Sized>(store: &S, user_id: &str) -> Result<usize> {
    let merchants = store.list_merchants(user_id)?;
    let classifier = MerchantClassifier::new(&merchants);
    let unlinked = store.transactions_by_merchant(user_id, None)?;

    let mut by_merchant: BTreeMap<i64, (&Merchant, Vec<i64>)> = BTreeMap::new();
    for tx in unlinked.iter().filter(|t| t.classification().is_unclassified()) {
        if let Some(merchant) = classifier.best_match(&tx.description) {
            by_merchant
                .entry(merchant.id)
                .or_insert_with(|| (merchant, Vec::new()))
                .1
                .push(tx.id);
        }
    }

    let mut affected = Affected::default();
    for (merchant, ids) in by_merchant.into_values() {
        affected.apply(
            store,
            user_id,
            "reclassify",
            ids,
            ClassificationUpdate::full(merchant),
        )?;
    }
    Ok(affected.count())
}

fn attach<S: Store + ?Sized>(
    store: &S,
    user_id: &str,
    merchant: &Merchant,
    affected: &mut Affected,
) -> Result<()> {
    if merchant.includes.is_empty() {
        return Ok(());
    }
    let unlinked = store.transactions_by_merchant(user_id, None)?;
    let matched: Vec<Transaction> = unlinked
        .into_iter()
        .filter(|t| description_matches(&t.description, &merchant.includes))
        .collect();

    affected.apply(
        store,
        user_id,
        "attach_full",
        ids_where(&matched, |t| t.classification().is_unclassified()),
        ClassificationUpdate::full(merchant),
    )?;
    affected.apply(
        store,
        user_id,
        "attach_merchant",
        ids_where(&matched, |t| !t.classification().is_unclassified()),
        ClassificationUpdate::merchant_only(merchant.id),
    )
}

/// Set inequality, ignoring order and duplicates
fn includes_differ(a: &[String], b: &[String]) -> bool {
    let a: HashSet<&str> = a.iter().map(String::as_str).collect();
    let b: HashSet<&str> = b.iter().map(String::as_str).collect();
    a != b
}
