//! Free-text record search

use crate::record::Record;

/// True when any non-empty field value contains `term`, ignoring case
///
/// `term` must already be lowercased. Falsy values (`null`, `false`, `0`,
/// `""`) are not searchable text.
fn matches_lowered(record: &Record, term: &str) -> bool {
    record
        .values()
        .filter(|value| value.is_truthy())
        .any(|value| value.to_string().to_lowercase().contains(term))
}

/// Records containing `term` in any field; an empty term keeps everything
pub fn filter_records<'a>(records: &'a [Record], term: &str) -> Vec<&'a Record> {
    if term.is_empty() {
        return records.iter().collect();
    }
    let term = term.to_lowercase();
    records.iter().filter(|r| matches_lowered(r, &term)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldValue;

    #[test]
    fn test_case_insensitive_substring() {
        let records = vec![
            Record::from_pairs([("Propietario", "María Gómez")]),
            Record::from_pairs([("Propietario", "Luis Pérez")]),
        ];

        let hits = filter_records(&records, "GÓMEZ");
        assert_eq!(hits, vec![&records[0]]);
    }

    #[test]
    fn test_empty_term_keeps_all() {
        let records = vec![Record::new(), Record::new()];
        assert_eq!(filter_records(&records, "").len(), 2);
    }

    #[test]
    fn test_null_fields_do_not_match_their_display_text() {
        let records = vec![
            Record::from_pairs([("Notas", FieldValue::Null)]),
            Record::from_pairs([("Notas", FieldValue::Bool(false))]),
            Record::from_pairs([("Notas", FieldValue::from("nulla"))]),
        ];

        assert_eq!(filter_records(&records, "null"), vec![&records[2]]);
        assert!(filter_records(&records, "false").is_empty());
    }

    #[test]
    fn test_numbers_are_searchable() {
        let mut record = Record::new();
        record.insert("Area", 1250i64);
        let records = vec![record];

        assert_eq!(filter_records(&records, "125").len(), 1);
        assert!(filter_records(&records, "999").is_empty());
    }
}
