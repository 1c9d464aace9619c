//! r1 ← r2 enrichment join
//!
//! Registro 1 has no matricula column of its own. Each r1 record gets
//! `MATRICULA_INMOBILIARIA` copied from the first r2 record sharing its
//! `NUMERO_PREDIAL`. Keys are compared exactly, without normalization.

use crate::record::{Dataset, FieldValue, Record};
use std::collections::HashMap;
use tracing::debug;

/// Join key shared by r1 and r2
pub const JOIN_FIELD: &str = "NUMERO_PREDIAL";

/// Field added to every r1 record
pub const DERIVED_FIELD: &str = "MATRICULA_INMOBILIARIA";

/// Enrich `primary` with the derived identifier from `secondary`
///
/// Returns new records; neither input is modified. When `secondary` holds
/// duplicate join keys the first occurrence wins. A primary record without a
/// join key never matches.
pub fn enrich(primary: &Dataset, secondary: &Dataset) -> Dataset {
    // First occurrence per key, so lookups stay O(1) on large extracts
    let mut index: HashMap<String, &Record> = HashMap::with_capacity(secondary.len());
    for record in &secondary.data {
        if let Some(key) = join_key(record) {
            index.entry(key).or_insert(record);
        }
    }

    let mut unmatched = 0usize;
    let data = primary
        .data
        .iter()
        .map(|record| {
            let derived = join_key(record)
                .and_then(|key| index.get(&key))
                .and_then(|matched| matched.get(DERIVED_FIELD))
                .filter(|value| value.is_truthy())
                .cloned();

            let mut enriched = record.clone();
            match derived {
                Some(value) => enriched.insert(DERIVED_FIELD, value),
                None => {
                    unmatched += 1;
                    enriched.insert(DERIVED_FIELD, FieldValue::Text(String::new()));
                }
            }
            enriched
        })
        .collect();

    debug!(
        primary = primary.len(),
        secondary = secondary.len(),
        unmatched,
        "Enriched dataset"
    );

    Dataset::new(data)
}

/// Exact join key: value kind and content must both agree
fn join_key(record: &Record) -> Option<String> {
    match record.get(JOIN_FIELD)? {
        FieldValue::Text(s) => Some(format!("s:{}", s)),
        number @ FieldValue::Number(_) => Some(format!("n:{}", number)),
        FieldValue::Bool(b) => Some(format!("b:{}", b)),
        FieldValue::Null | FieldValue::Json(_) => None,
    }
}
