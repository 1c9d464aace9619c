//! Cross-reference resolution: every record for one matricula

use std::collections::BTreeMap;

use crate::datasets::DatasetKey;
use crate::matricula::normalize;
use crate::record::{Dataset, Record};

/// Records matching `matricula` in each dataset present in `datasets`
///
/// Each record's identifier column (per [`DatasetKey::identifier_column`])
/// is normalized and compared with the normalized query. Keys whose dataset
/// is missing yield an empty list. Source order is kept.
pub fn resolve(
    matricula: &str,
    datasets: &BTreeMap<DatasetKey, Option<Dataset>>,
) -> BTreeMap<DatasetKey, Vec<Record>> {
    let target = normalize(matricula);

    datasets
        .iter()
        .map(|(&key, dataset)| {
            let column = key.identifier_column();
            let matches = dataset
                .iter()
                .flat_map(|d| d.data.iter())
                .filter(|record| normalize(&record.text(column)) == target)
                .cloned()
                .collect();
            (key, matches)
        })
        .collect()
}

/// Keys with at least one matching record
pub fn datasets_with_matches(resolved: &BTreeMap<DatasetKey, Vec<Record>>) -> Vec<DatasetKey> {
    resolved
        .iter()
        .filter(|(_, records)| !records.is_empty())
        .map(|(&key, _)| key)
        .collect()
}
