//! Aggregation statistics for the analytics views
//!
//! Everything here is a pure function of the input records and is
//! recomputed on every call.

use serde::Serialize;
use std::collections::HashMap;

use crate::record::Record;

pub const NOT_ASSIGNED: &str = "No asignado";
pub const NOT_SPECIFIED: &str = "No especificado";
pub const WITH_OBSERVATIONS: &str = "Con observaciones";
pub const WITHOUT_OBSERVATIONS: &str = "Sin observaciones";

/// Fields whose presence marks a reconocedores record as complete
pub const COMPLETION_FIELDS: [&str; 5] = [
    "MUTACIONES",
    "MUTACIONES2",
    "SOLICITUDES TRAMITADAS",
    "OBSERVACIONES",
    "OBSERVACION RECONOCEDOR",
];

/// One category with its records, for counts and drill-down
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub label: String,
    pub count: usize,
    pub members: Vec<Record>,
}

/// Partition records by `accessor`, in first-seen order
///
/// An empty accessor result is replaced by `default_label`.
pub fn group_by<F>(records: &[Record], accessor: F, default_label: &str) -> Vec<Group>
where
    F: Fn(&Record) -> String,
{
    let mut groups: Vec<Group> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let mut label = accessor(record);
        if label.is_empty() {
            label = default_label.to_string();
        }

        let slot = match index.get(&label) {
            Some(&slot) => slot,
            None => {
                index.insert(label.clone(), groups.len());
                groups.push(Group {
                    label,
                    count: 0,
                    members: Vec::new(),
                });
                groups.len() - 1
            }
        };

        groups[slot].count += 1;
        groups[slot].members.push(record.clone());
    }

    groups
}

/// Group on a single field's text value
pub fn group_by_field(records: &[Record], field: &str, default_label: &str) -> Vec<Group> {
    group_by(records, |r| r.text(field), default_label)
}

/// Two groups: records with and without a value in `field`
pub fn group_by_presence(records: &[Record], field: &str) -> Vec<Group> {
    group_by(
        records,
        |r| {
            if r.has(field) {
                WITH_OBSERVATIONS.to_string()
            } else {
                WITHOUT_OBSERVATIONS.to_string()
            }
        },
        WITHOUT_OBSERVATIONS,
    )
}

// ---------------------------------------------------------------------------
// Mutation codes
// ---------------------------------------------------------------------------

/// The two independent mutation-code fields of a reconocedores record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MutationField {
    Mutaciones,
    Mutaciones2,
}

impl MutationField {
    pub fn column(&self) -> &'static str {
        match self {
            MutationField::Mutaciones => "MUTACIONES",
            MutationField::Mutaciones2 => "MUTACIONES2",
        }
    }

    /// 1-based index used in drill-down paths
    pub fn index(&self) -> u8 {
        match self {
            MutationField::Mutaciones => 1,
            MutationField::Mutaciones2 => 2,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            1 => Some(MutationField::Mutaciones),
            2 => Some(MutationField::Mutaciones2),
            _ => None,
        }
    }
}

/// The six fixed mutation buckets
pub const MUTATION_BUCKETS: [&str; 6] = ["0", "1", "2", "3", "4", "5"];

/// Chart label for a mutation bucket
pub fn mutation_bucket_label(bucket: &str) -> String {
    if bucket == "0" {
        "Sin mutaciones".to_string()
    } else {
        format!("Tipo {}", bucket)
    }
}

/// Counts for one fixed bucket across both fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MutationRow {
    pub bucket: String,
    pub label: String,
    pub mutaciones: usize,
    pub mutaciones2: usize,
}

/// Mutation-code distribution with per-(field, bucket) detail lists
///
/// A missing code reads as `"0"`. Codes outside `0`-`5` are still tracked
/// but do not appear in [`MutationStats::rows`].
#[derive(Debug, Clone, Default)]
pub struct MutationStats {
    details: HashMap<(MutationField, String), Vec<Record>>,
}

impl MutationStats {
    pub fn compute(records: &[Record]) -> Self {
        let mut details: HashMap<(MutationField, String), Vec<Record>> = HashMap::new();

        for record in records {
            for field in [MutationField::Mutaciones, MutationField::Mutaciones2] {
                let mut code = record.text(field.column());
                if code.is_empty() {
                    code = "0".to_string();
                }
                details.entry((field, code)).or_default().push(record.clone());
            }
        }

        Self { details }
    }

    pub fn count(&self, field: MutationField, bucket: &str) -> usize {
        self.details(field, bucket).len()
    }

    pub fn details(&self, field: MutationField, bucket: &str) -> &[Record] {
        self.details
            .get(&(field, bucket.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// One row per fixed bucket, in bucket order
    pub fn rows(&self) -> Vec<MutationRow> {
        MUTATION_BUCKETS
            .iter()
            .map(|&bucket| MutationRow {
                bucket: bucket.to_string(),
                label: mutation_bucket_label(bucket),
                mutaciones: self.count(MutationField::Mutaciones, bucket),
                mutaciones2: self.count(MutationField::Mutaciones2, bucket),
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

/// Complete when any completion field carries a value
pub fn is_complete(record: &Record) -> bool {
    COMPLETION_FIELDS.iter().any(|field| record.has(field))
}

/// Complete/incomplete split for one owner
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionGroup {
    pub owner: String,
    pub complete: Vec<Record>,
    pub incomplete: Vec<Record>,
}

/// Bucket records by `owner_field`, then by completion, in first-seen order
pub fn completion_by(records: &[Record], owner_field: &str, default_owner: &str) -> Vec<CompletionGroup> {
    group_by_field(records, owner_field, default_owner)
        .into_iter()
        .map(|group| {
            let (complete, incomplete): (Vec<Record>, Vec<Record>) =
                group.members.into_iter().partition(is_complete);
            CompletionGroup {
                owner: group.label,
                complete,
                incomplete,
            }
        })
        .collect()
}

/// Flatten completion groups into labeled chart groups
pub fn completion_groups(groups: &[CompletionGroup]) -> Vec<Group> {
    groups
        .iter()
        .flat_map(|g| {
            [
                Group {
                    label: format!("{} (Completos)", g.owner),
                    count: g.complete.len(),
                    members: g.complete.clone(),
                },
                Group {
                    label: format!("{} (Incompletos)", g.owner),
                    count: g.incomplete.len(),
                    members: g.incomplete.clone(),
                },
            ]
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Per-dataset bundles
// ---------------------------------------------------------------------------

/// CICA analytics: distribution by user, coordinator, tenure and stage
#[derive(Debug, Clone, Serialize)]
pub struct CicaStats {
    pub users: Vec<Group>,
    pub coordinators: Vec<Group>,
    pub tenure: Vec<Group>,
    pub stages: Vec<Group>,
}

impl CicaStats {
    pub fn compute(records: &[Record]) -> Self {
        Self {
            users: group_by_field(records, "Usuario", NOT_ASSIGNED),
            coordinators: group_by_field(records, "Coordinador", NOT_ASSIGNED),
            tenure: group_by_field(records, "Tenencia", NOT_SPECIFIED),
            stages: group_by_field(records, "Etapa", NOT_SPECIFIED),
        }
    }
}

/// Reconocedores analytics
#[derive(Debug, Clone, Serialize)]
pub struct ReconocedoresStats {
    pub mutations: Vec<MutationRow>,
    pub requests: Vec<Group>,
    pub observations: Vec<Group>,
    pub recognizer_observations: Vec<Group>,
    pub completion: Vec<Group>,
}

impl ReconocedoresStats {
    pub fn compute(records: &[Record]) -> Self {
        Self {
            mutations: MutationStats::compute(records).rows(),
            requests: group_by_field(records, "SOLICITUDES TRAMITADAS", NOT_SPECIFIED),
            observations: group_by_presence(records, "OBSERVACIONES"),
            recognizer_observations: group_by_presence(records, "OBSERVACION RECONOCEDOR"),
            completion: completion_groups(&completion_by(records, "RECONOCEDOR", NOT_ASSIGNED)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(pairs: &[(&str, &str)]) -> Record {
        Record::from_pairs(pairs.iter().copied())
    }

    #[test]
    fn test_group_by_first_seen_order() {
        let records = vec![rec(&[("role", "A")]), rec(&[("role", "B")]), rec(&[("role", "A")])];

        let groups = group_by(&records, |r| r.text("role"), "none");

        assert_eq!(groups.len(), 2);
        assert_eq!((groups[0].label.as_str(), groups[0].count), ("A", 2));
        assert_eq!((groups[1].label.as_str(), groups[1].count), ("B", 1));
        assert_eq!(groups[0].members, vec![records[0].clone(), records[2].clone()]);
    }

    #[test]
    fn test_group_by_default_label() {
        let records = vec![rec(&[("role", "")]), rec(&[]), rec(&[("role", "X")])];

        let groups = group_by_field(&records, "role", "none");
        assert_eq!(groups[0].label, "none");
        assert_eq!(groups[0].count, 2);
        assert_eq!(groups[1].label, "X");
    }

    #[test]
    fn test_numeric_labels_keep_insertion_order() {
        let records = vec![rec(&[("Etapa", "10")]), rec(&[("Etapa", "2")])];
        let labels: Vec<String> = group_by_field(&records, "Etapa", NOT_SPECIFIED)
            .into_iter()
            .map(|g| g.label)
            .collect();
        assert_eq!(labels, vec!["10", "2"]);
    }

    #[test]
    fn test_mutation_buckets() {
        let records = vec![
            rec(&[("MUTACIONES", "1"), ("MUTACIONES2", "3")]),
            rec(&[("MUTACIONES", "1")]),
            rec(&[("MUTACIONES", "9"), ("MUTACIONES2", "0")]),
        ];

        let stats = MutationStats::compute(&records);

        assert_eq!(stats.count(MutationField::Mutaciones, "1"), 2);
        assert_eq!(stats.count(MutationField::Mutaciones2, "0"), 2);
        assert_eq!(stats.count(MutationField::Mutaciones2, "3"), 1);
        assert_eq!(stats.count(MutationField::Mutaciones, "9"), 1);
        assert_eq!(stats.details(MutationField::Mutaciones2, "3"), &records[..1]);

        let rows = stats.rows();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0].label, "Sin mutaciones");
        assert_eq!(rows[0].mutaciones, 0);
        assert_eq!(rows[0].mutaciones2, 2);
        assert_eq!(rows[1].label, "Tipo 1");
        assert_eq!(rows[1].mutaciones, 2);
        // "9" is outside the fixed buckets
        let charted: usize = rows.iter().map(|r| r.mutaciones).sum();
        assert_eq!(charted, 2);
    }

    #[test]
    fn test_completion_split() {
        let records = vec![
            rec(&[("RECONOCEDOR", "Luis"), ("OBSERVACIONES", "ok")]),
            rec(&[("RECONOCEDOR", "Luis")]),
            rec(&[("MUTACIONES2", "2")]),
        ];

        let groups = completion_by(&records, "RECONOCEDOR", NOT_ASSIGNED);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].owner, "Luis");
        assert_eq!(groups[0].complete.len(), 1);
        assert_eq!(groups[0].incomplete.len(), 1);
        assert_eq!(groups[1].owner, NOT_ASSIGNED);
        assert_eq!(groups[1].complete.len(), 1);

        let flat = completion_groups(&groups);
        let labels: Vec<&str> = flat.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "Luis (Completos)",
                "Luis (Incompletos)",
                "No asignado (Completos)",
                "No asignado (Incompletos)"
            ]
        );
        assert_eq!(flat[3].count, 0);
    }

    #[test]
    fn test_presence_grouping() {
        let records = vec![rec(&[("OBSERVACIONES", "x")]), rec(&[]), rec(&[("OBSERVACIONES", "")])];
        let groups = group_by_presence(&records, "OBSERVACIONES");
        assert_eq!(groups[0].label, WITH_OBSERVATIONS);
        assert_eq!(groups[0].count, 1);
        assert_eq!(groups[1].label, WITHOUT_OBSERVATIONS);
        assert_eq!(groups[1].count, 2);
    }

    #[test]
    fn test_cica_bundle_defaults() {
        let records = vec![rec(&[("Usuario", "ana"), ("Tenencia", "Propia")]), rec(&[])];
        let stats = CicaStats::compute(&records);
        assert_eq!(stats.users[1].label, NOT_ASSIGNED);
        assert_eq!(stats.coordinators[0].label, NOT_ASSIGNED);
        assert_eq!(stats.coordinators[0].count, 2);
        assert_eq!(stats.tenure[1].label, NOT_SPECIFIED);
        assert_eq!(stats.stages.len(), 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(group_by_field(&[], "x", "none").is_empty());
        let stats = ReconocedoresStats::compute(&[]);
        assert!(stats.completion.is_empty());
        assert_eq!(stats.mutations.len(), 6);
    }
}
