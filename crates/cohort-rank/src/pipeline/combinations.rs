use super::inference::SubjectClassification;
use super::merger::MergedRecord;
use super::normalizer::{canonical_combination, strip_combination_delimiters};
use super::patterns;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// A fixed elective grouping, e.g. physics + chemistry + biology (`物化生`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CombinationDefinition {
    pub label: String,
    pub codes: BTreeSet<char>,
}

impl CombinationDefinition {
    /// Every non-delimiter character of the label is a subject code. Needs at
    /// least two distinct codes.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = strip_combination_delimiters(label);
        let codes: BTreeSet<char> = label.chars().collect();
        if codes.len() < 2 || codes.len() != label.chars().count() {
            return None;
        }
        Some(Self { label, codes })
    }

    pub fn canonical_key(&self) -> String {
        self.codes.iter().collect()
    }
}

/// Maps one subject code to the keywords that identify its column.
#[derive(Debug, Clone)]
pub struct SubjectCode {
    pub code: char,
    pub keywords: Vec<String>,
}

impl SubjectCode {
    pub fn new<'a>(code: char, keywords: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            code,
            keywords: keywords.into_iter().map(str::to_string).collect(),
        }
    }
}

/// Assigns every record its set of combination labels.
///
/// A record whose elective label matches one or more definitions takes exactly
/// those. Otherwise membership is inferred: a definition applies when each of
/// its subjects resolves to a column and the record scored above zero in all of
/// them.
pub fn classify_combinations(
    records: &[MergedRecord],
    classification: &SubjectClassification,
    definitions: &[CombinationDefinition],
    subject_codes: &[SubjectCode],
) -> Vec<BTreeSet<String>> {
    let Some(first) = records.first() else {
        return Vec::new();
    };

    let label_field = first
        .raw()
        .field_names()
        .find(|field| patterns::is_elective_label(field))
        .map(str::to_string);
    let resolved = resolve_definition_fields(classification, definitions, subject_codes);

    let mut explicit = 0usize;
    let mut inferred = 0usize;
    let memberships = records
        .iter()
        .map(|record| {
            let mut labels = BTreeSet::new();

            if let Some(field) = &label_field {
                let value = record.raw().value(field);
                if value.is_present() {
                    let key = canonical_combination(&value.key_string());
                    for definition in definitions {
                        if definition.canonical_key() == key {
                            labels.insert(definition.label.clone());
                        }
                    }
                }
            }

            if labels.is_empty() {
                for (definition, fields) in &resolved {
                    let qualifies = fields.iter().all(|field| {
                        record
                            .raw()
                            .value(field)
                            .as_number()
                            .is_some_and(|score| score > 0.0)
                    });
                    if qualifies {
                        labels.insert(definition.label.clone());
                    }
                }
                if !labels.is_empty() {
                    inferred += 1;
                }
            } else {
                explicit += 1;
            }

            labels
        })
        .collect();

    debug!(
        label_field = label_field.as_deref().unwrap_or("-"),
        explicit, inferred, "classified combination memberships"
    );

    memberships
}

/// Definitions whose every code maps to a subject column, with those columns.
fn resolve_definition_fields<'a>(
    classification: &SubjectClassification,
    definitions: &'a [CombinationDefinition],
    subject_codes: &[SubjectCode],
) -> Vec<(&'a CombinationDefinition, Vec<String>)> {
    let code_fields: HashMap<char, &str> = subject_codes
        .iter()
        .filter_map(|entry| {
            classification
                .subjects
                .iter()
                .find(|subject| patterns::contains_keyword(subject, &entry.keywords))
                .map(|subject| (entry.code, subject.as_str()))
        })
        .collect();

    definitions
        .iter()
        .filter_map(|definition| {
            definition
                .codes
                .iter()
                .map(|code| code_fields.get(code).map(|field| field.to_string()))
                .collect::<Option<Vec<_>>>()
                .map(|fields| (definition, fields))
        })
        .collect()
}

/// Definitions with at least one member, in configuration order.
pub fn populated_definitions(
    definitions: &[CombinationDefinition],
    memberships: &[BTreeSet<String>],
) -> Vec<CombinationDefinition> {
    definitions
        .iter()
        .filter(|definition| {
            memberships
                .iter()
                .any(|labels| labels.contains(&definition.label))
        })
        .cloned()
        .collect()
}
