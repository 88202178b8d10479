use crate::core::matcher::ReferenceIndex;
use crate::domain::model::{AnnotatedRecord, InputRecord, StreetFlag};

/// Flags one record. A record without a postcode is flagged `No`.
pub fn annotate_record(record: &InputRecord, reference: &ReferenceIndex) -> StreetFlag {
    match record.postcode.as_deref() {
        Some(postcode) => StreetFlag::from(reference.matches(postcode, &record.fragments())),
        None => StreetFlag::No,
    }
}

/// Produces a new annotated record per input record; the inputs are left untouched.
pub fn annotate(records: &[InputRecord], reference: &ReferenceIndex) -> Vec<AnnotatedRecord> {
    records
        .iter()
        .map(|record| AnnotatedRecord {
            record: record.clone(),
            street_in_postcode: annotate_record(record, reference),
        })
        .collect()
}
