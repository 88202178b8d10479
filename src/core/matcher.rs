//! Street-in-postcode matching.
//!
//! A fragment matches a reference row when its uppercased text is contained in the
//! row's uppercased street name or single-line address. Empty fragments and absent
//! reference fields never contribute a match.

use crate::domain::model::ReferenceRecord;
use std::collections::HashMap;

/// Linear scan over the whole reference set, in reference order.
pub fn matches<S: AsRef<str>>(postcode: &str, fragments: &[S], reference: &[ReferenceRecord]) -> bool {
    let fragments = upper_fragments(fragments);
    if fragments.is_empty() {
        return false;
    }

    reference
        .iter()
        .filter(|record| record.postcode == postcode)
        .any(|record| {
            let street = record.street_name.as_deref().map(str::to_uppercase);
            let address = record.full_address.as_deref().map(str::to_uppercase);
            row_matches(street.as_deref(), address.as_deref(), &fragments)
        })
}

fn upper_fragments<S: AsRef<str>>(fragments: &[S]) -> Vec<String> {
    fragments
        .iter()
        .map(|fragment| AsRef::<str>::as_ref(fragment))
        .filter(|fragment| !fragment.is_empty())
        .map(str::to_uppercase)
        .collect()
}

fn row_matches(street: Option<&str>, address: Option<&str>, fragments: &[String]) -> bool {
    fragments.iter().any(|fragment| {
        street.is_some_and(|street| street.contains(fragment.as_str()))
            || address.is_some_and(|address| address.contains(fragment.as_str()))
    })
}

#[derive(Debug, Clone)]
struct IndexedRow {
    street: Option<String>,
    address: Option<String>,
}

/// Reference rows grouped by exact postcode, with text fields uppercased once.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    by_postcode: HashMap<String, Vec<IndexedRow>>,
    record_count: usize,
}

impl ReferenceIndex {
    pub fn build<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a ReferenceRecord>,
    {
        let mut index = Self::default();
        for record in records {
            index.record_count += 1;
            index
                .by_postcode
                .entry(record.postcode.clone())
                .or_default()
                .push(IndexedRow {
                    street: record.street_name.as_deref().map(str::to_uppercase),
                    address: record.full_address.as_deref().map(str::to_uppercase),
                });
        }
        index
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub fn postcode_count(&self) -> usize {
        self.by_postcode.len()
    }

    #[cfg(test)]
    fn rows_for(&self, postcode: &str) -> usize {
        self.by_postcode.get(postcode).map_or(0, Vec::len)
    }

    /// Same result as [`matches`] over the records the index was built from.
    pub fn matches<S: AsRef<str>>(&self, postcode: &str, fragments: &[S]) -> bool {
        let Some(rows) = self.by_postcode.get(postcode) else {
            return false;
        };
        let fragments = upper_fragments(fragments);
        if fragments.is_empty() {
            return false;
        }

        rows.iter()
            .any(|row| row_matches(row.street.as_deref(), row.address.as_deref(), &fragments))
    }
}
