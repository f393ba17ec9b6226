//! Relationship resolution over a flattened working list.
//!
//! Resolution is a pure pass: candidate matching always reads the original
//! input documents, and rewrites land in a fresh output list. What a rule
//! sees therefore never depends on which records were processed before it.

use std::collections::HashMap;

use docweft_model::{Document, DocumentRef, Value};
use tracing::debug;

use crate::import::report::UnresolvedField;
use crate::import::RelationRule;

/// One input record with its allocated identity.
#[derive(Debug, Clone)]
pub(crate) struct WorkingRecord {
    /// Source collection name.
    pub collection: String,
    /// Position within the collection's input sequence.
    pub index: usize,
    /// Identity allocated for the record before any write.
    pub reference: DocumentRef,
    /// The record as loaded. Candidate keys are read from here.
    pub document: Document,
}

/// Rewritten documents parallel to the input list, plus the counters that
/// feed the import report.
#[derive(Debug)]
pub(crate) struct Resolution {
    pub documents: Vec<Document>,
    pub resolved: usize,
    pub self_matches: usize,
    pub unresolved: Vec<UnresolvedField>,
}

/// Applies every relationship rule to every record.
///
/// Rules for a collection run in declaration order. A rule whose
/// `from_property` is absent, or holds a value with no string form, is
/// skipped for that record.
pub(crate) fn resolve(
    records: &[WorkingRecord],
    relations: &HashMap<String, Vec<RelationRule>>,
) -> Resolution {
    let mut resolution = Resolution {
        documents: Vec::with_capacity(records.len()),
        resolved: 0,
        self_matches: 0,
        unresolved: Vec::new(),
    };

    for (origin, record) in records.iter().enumerate() {
        let mut document = record.document.clone();
        if let Some(rules) = relations.get(&record.collection) {
            for rule in rules {
                apply_rule(records, origin, rule, &mut document, &mut resolution);
            }
        }
        resolution.documents.push(document);
    }

    resolution
}

fn apply_rule(
    records: &[WorkingRecord],
    origin: usize,
    rule: &RelationRule,
    document: &mut Document,
    resolution: &mut Resolution,
) {
    let Some(value) = document.get(&rule.from_property).cloned() else {
        return;
    };
    match value {
        Value::Array(mut items) => {
            resolve_array(records, origin, rule, &mut items, resolution);
            document.insert(rule.from_property.clone(), Value::Array(items));
        }
        scalar => resolve_scalar(records, origin, rule, &scalar, document, resolution),
    }
}

/// Scalar origin: the first candidate in discovery order replaces the
/// whole field with its reference.
fn resolve_scalar(
    records: &[WorkingRecord],
    origin: usize,
    rule: &RelationRule,
    value: &Value,
    document: &mut Document,
    resolution: &mut Resolution,
) {
    let Some(form) = value.coerce_string() else {
        return;
    };

    let candidate = records.iter().enumerate().find(|(_, target)| {
        target.collection == rule.to_collection
            && key_matches(target.document.get(&rule.to_property), &form)
    });

    match candidate {
        Some((target_pos, target)) => {
            note_self_match(records, origin, target_pos, rule, resolution);
            document.insert(
                rule.from_property.clone(),
                Value::Reference(target.reference.clone()),
            );
            resolution.resolved += 1;
        }
        None => resolution.unresolved.push(UnresolvedField {
            collection: records[origin].collection.clone(),
            index: records[origin].index,
            field: rule.from_property.clone(),
            position: None,
            value: value.clone(),
        }),
    }
}

/// Array origin: each candidate claims the positions whose string form
/// matches its key. Claimed positions hold references and stop matching,
/// so later candidates can only resolve the remaining positions.
fn resolve_array(
    records: &[WorkingRecord],
    origin: usize,
    rule: &RelationRule,
    items: &mut [Value],
    resolution: &mut Resolution,
) {
    let mut claimed = vec![false; items.len()];

    for (target_pos, target) in records.iter().enumerate() {
        if target.collection != rule.to_collection {
            continue;
        }
        let Some(key) = target.document.get(&rule.to_property) else {
            continue;
        };
        for (slot, item) in items.iter_mut().enumerate() {
            if claimed[slot] {
                continue;
            }
            let Some(form) = item.coerce_string() else {
                continue;
            };
            if key_matches(Some(key), &form) {
                note_self_match(records, origin, target_pos, rule, resolution);
                *item = Value::Reference(target.reference.clone());
                claimed[slot] = true;
                resolution.resolved += 1;
            }
        }
    }

    for (slot, item) in items.iter().enumerate() {
        if !claimed[slot] && item.coerce_string().is_some() {
            resolution.unresolved.push(UnresolvedField {
                collection: records[origin].collection.clone(),
                index: records[origin].index,
                field: rule.from_property.clone(),
                position: Some(slot),
                value: item.clone(),
            });
        }
    }
}

/// Whether a candidate's key field equals or contains the given string form.
///
/// An array key matches when any element's string form equals the form; a
/// missing key never matches.
fn key_matches(key: Option<&Value>, form: &str) -> bool {
    match key {
        Some(Value::Array(elements)) => elements
            .iter()
            .any(|element| element.coerce_string().is_some_and(|s| s == form)),
        Some(value) => value.coerce_string().is_some_and(|s| s == form),
        None => false,
    }
}

/// A record is allowed to be its own candidate; the match is counted and
/// logged rather than suppressed.
fn note_self_match(
    records: &[WorkingRecord],
    origin: usize,
    target: usize,
    rule: &RelationRule,
    resolution: &mut Resolution,
) {
    if origin == target {
        let record = &records[origin];
        debug!(
            "record {} of {:?} resolved {:?} to its own reference",
            record.index, record.collection, rule.from_property
        );
        resolution.self_matches += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(collection: &str, index: usize, document: Document) -> WorkingRecord {
        WorkingRecord {
            collection: collection.to_string(),
            index,
            reference: DocumentRef::new(collection, format!("{collection}-{index}")),
            document,
        }
    }

    fn rules(
        collection: &str,
        list: Vec<RelationRule>,
    ) -> HashMap<String, Vec<RelationRule>> {
        let mut relations = HashMap::new();
        relations.insert(collection.to_string(), list);
        relations
    }

    fn reference_to(record: &WorkingRecord) -> Value {
        Value::Reference(record.reference.clone())
    }

    #[test]
    fn scalar_resolves_to_first_match_in_discovery_order() {
        let records = vec![
            record("books", 0, Document::new().with("author", "dup")),
            record("authors", 0, Document::new().with("slug", "dup")),
            record("authors", 1, Document::new().with("slug", "dup")),
        ];
        let relations = rules("books", vec![RelationRule::new("author", "authors", "slug")]);

        let resolution = resolve(&records, &relations);

        assert_eq!(resolution.resolved, 1);
        assert_eq!(
            resolution.documents[0].get("author"),
            Some(&reference_to(&records[1]))
        );
    }

    #[test]
    fn scalar_without_match_is_reported_not_failed() {
        let records = vec![
            record("books", 0, Document::new().with("author", "z")),
            record("authors", 0, Document::new().with("slug", "x")),
        ];
        let relations = rules("books", vec![RelationRule::new("author", "authors", "slug")]);

        let resolution = resolve(&records, &relations);

        assert_eq!(resolution.resolved, 0);
        assert_eq!(
            resolution.documents[0].get("author"),
            Some(&Value::from("z"))
        );
        assert_eq!(resolution.unresolved.len(), 1);
        let entry = &resolution.unresolved[0];
        assert_eq!(entry.collection, "books");
        assert_eq!(entry.field, "author");
        assert_eq!(entry.position, None);
        assert_eq!(entry.value, Value::from("z"));
    }

    #[test]
    fn array_positions_claimed_by_different_candidates() {
        let records = vec![
            record(
                "books",
                0,
                Document::new().with("tags", vec!["t1", "t2", "t9"]),
            ),
            record("tags", 0, Document::new().with("id", "t2")),
            record("tags", 1, Document::new().with("id", "t1")),
        ];
        let relations = rules("books", vec![RelationRule::new("tags", "tags", "id")]);

        let resolution = resolve(&records, &relations);

        assert_eq!(resolution.resolved, 2);
        let Some(Value::Array(items)) = resolution.documents[0].get("tags") else {
            panic!("tags is not an array");
        };
        assert_eq!(items[0], reference_to(&records[2]));
        assert_eq!(items[1], reference_to(&records[1]));
        assert_eq!(items[2], Value::from("t9"));

        assert_eq!(resolution.unresolved.len(), 1);
        assert_eq!(resolution.unresolved[0].position, Some(2));
        assert_eq!(resolution.unresolved[0].value, Value::from("t9"));
    }

    #[test]
    fn array_valued_key_field_matches_each_element() {
        let records = vec![
            record("books", 0, Document::new().with("series", "hyperion")),
            record(
                "series",
                0,
                Document::new().with("aliases", vec!["cantos", "hyperion"]),
            ),
        ];
        let relations = rules(
            "books",
            vec![RelationRule::new("series", "series", "aliases")],
        );

        let resolution = resolve(&records, &relations);

        assert_eq!(resolution.resolved, 1);
        assert_eq!(
            resolution.documents[0].get("series"),
            Some(&reference_to(&records[1]))
        );
    }

    #[test]
    fn numeric_and_text_forms_compare_equal() {
        let records = vec![
            record("orders", 0, Document::new().with("customer", 1)),
            record("orders", 1, Document::new().with("customer", 2.0)),
            record("customers", 0, Document::new().with("number", "1")),
            record("customers", 1, Document::new().with("number", 2)),
        ];
        let relations = rules(
            "orders",
            vec![RelationRule::new("customer", "customers", "number")],
        );

        let resolution = resolve(&records, &relations);

        assert_eq!(resolution.resolved, 2);
        assert_eq!(
            resolution.documents[0].get("customer"),
            Some(&reference_to(&records[2]))
        );
        assert_eq!(
            resolution.documents[1].get("customer"),
            Some(&reference_to(&records[3]))
        );
    }

    #[test]
    fn missing_or_formless_origins_are_skipped_silently() {
        let records = vec![
            record("books", 0, Document::new().with("title", "no author field")),
            record("books", 1, Document::new().with("author", Value::Null)),
            record(
                "books",
                2,
                Document::new().with("author", Document::new().with("name", "inline")),
            ),
            record("authors", 0, Document::new().with("slug", "x")),
        ];
        let relations = rules("books", vec![RelationRule::new("author", "authors", "slug")]);

        let resolution = resolve(&records, &relations);

        assert_eq!(resolution.resolved, 0);
        assert!(resolution.unresolved.is_empty());
        assert_eq!(resolution.documents[1], records[1].document);
        assert_eq!(resolution.documents[2], records[2].document);
    }

    #[test]
    fn unknown_target_collection_means_no_candidates() {
        let records = vec![record("books", 0, Document::new().with("author", "x"))];
        let relations = rules("books", vec![RelationRule::new("author", "nowhere", "id")]);

        let resolution = resolve(&records, &relations);

        assert_eq!(resolution.resolved, 0);
        assert_eq!(resolution.unresolved.len(), 1);
        assert_eq!(
            resolution.documents[0].get("author"),
            Some(&Value::from("x"))
        );
    }

    #[test]
    fn self_relating_collection_resolves_across_records() {
        let records = vec![
            record(
                "staff",
                0,
                Document::new().with("id", "s1").with("manager", "s2"),
            ),
            record(
                "staff",
                1,
                Document::new().with("id", "s2").with("manager", "s1"),
            ),
        ];
        let relations = rules("staff", vec![RelationRule::new("manager", "staff", "id")]);

        let resolution = resolve(&records, &relations);

        assert_eq!(resolution.resolved, 2);
        assert_eq!(resolution.self_matches, 0);
        assert_eq!(
            resolution.documents[0].get("manager"),
            Some(&reference_to(&records[1]))
        );
        assert_eq!(
            resolution.documents[1].get("manager"),
            Some(&reference_to(&records[0]))
        );
    }

    #[test]
    fn record_may_match_itself_and_is_counted() {
        let records = vec![record(
            "staff",
            0,
            Document::new().with("id", "s1").with("manager", "s1"),
        )];
        let relations = rules("staff", vec![RelationRule::new("manager", "staff", "id")]);

        let resolution = resolve(&records, &relations);

        assert_eq!(resolution.resolved, 1);
        assert_eq!(resolution.self_matches, 1);
        assert_eq!(
            resolution.documents[0].get("manager"),
            Some(&reference_to(&records[0]))
        );
    }

    #[test]
    fn candidate_matching_reads_original_values() {
        // The authors' own rule rewrites the very field the books' rule
        // matches against; candidates still see the original value no
        // matter which record is processed first.
        let records = vec![
            record("authors", 0, Document::new().with("slug", "frank")),
            record("slugs", 0, Document::new().with("id", "frank")),
            record("books", 0, Document::new().with("author", "frank")),
        ];
        let mut relations = rules("books", vec![RelationRule::new("author", "authors", "slug")]);
        relations.insert(
            "authors".to_string(),
            vec![RelationRule::new("slug", "slugs", "id")],
        );

        let resolution = resolve(&records, &relations);

        assert_eq!(resolution.resolved, 2);
        assert_eq!(
            resolution.documents[0].get("slug"),
            Some(&reference_to(&records[1]))
        );
        assert_eq!(
            resolution.documents[2].get("author"),
            Some(&reference_to(&records[0]))
        );
    }

    #[test]
    fn rules_run_in_declaration_order_per_record() {
        let records = vec![
            record(
                "books",
                0,
                Document::new().with("author", "a1").with("publisher", "p1"),
            ),
            record("authors", 0, Document::new().with("id", "a1")),
            record("publishers", 0, Document::new().with("id", "p1")),
        ];
        let relations = rules(
            "books",
            vec![
                RelationRule::new("author", "authors", "id"),
                RelationRule::new("publisher", "publishers", "id"),
            ],
        );

        let resolution = resolve(&records, &relations);

        assert_eq!(resolution.resolved, 2);
        assert_eq!(
            resolution.documents[0].get("author"),
            Some(&reference_to(&records[1]))
        );
        assert_eq!(
            resolution.documents[0].get("publisher"),
            Some(&reference_to(&records[2]))
        );
    }
}
