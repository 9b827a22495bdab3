use super::merger::MergedRecord;
use super::patterns;
use super::record::{FieldValue, Record};
use super::PipelineError;
use serde::Serialize;
use std::collections::HashSet;

/// Scorable fields of a run, computed once from the merged schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectClassification {
    pub subjects: Vec<String>,
    pub rebasing_subjects: Vec<String>,
    pub other_subjects: Vec<String>,
}

/// Picks the field that identifies a student, using the first record's schema.
///
/// Tries the identity name patterns in priority order, then the first field
/// whose values are present, of one kind, and distinct across every record,
/// then the first field of the schema.
pub fn select_identity_field(records: &[Record]) -> Result<String, PipelineError> {
    let first = records.first().ok_or(PipelineError::EmptyInput)?;
    let schema: Vec<&str> = first.field_names().collect();
    let fallback = schema
        .first()
        .copied()
        .ok_or_else(|| PipelineError::InvalidInput("first record has no fields".to_string()))?;

    for pattern in patterns::identity_patterns() {
        let matched = schema.iter().find(|field| {
            pattern.is_match(field) && !matches!(first.value(field), FieldValue::Opaque(_))
        });
        if let Some(field) = matched {
            return Ok((*field).to_string());
        }
    }

    if let Some(field) = schema
        .iter()
        .find(|field| is_structurally_unique(records, field))
    {
        return Ok((*field).to_string());
    }

    Ok(fallback.to_string())
}

#[derive(PartialEq)]
enum ValueKind {
    Number,
    Text,
}

fn is_structurally_unique(records: &[Record], field: &str) -> bool {
    let mut kind = None;
    let mut seen = HashSet::with_capacity(records.len());

    for record in records {
        let value = record.value(field);
        if !value.is_present() {
            return false;
        }
        let current = match value {
            FieldValue::Number(_) => ValueKind::Number,
            FieldValue::Text(_) => ValueKind::Text,
            FieldValue::Opaque(_) | FieldValue::Empty => return false,
        };
        match &kind {
            None => kind = Some(current),
            Some(expected) if *expected != current => return false,
            Some(_) => {}
        }
        seen.insert(value.key_string());
    }

    seen.len() == records.len()
}

/// Splits the first merged record's fields into scorable subjects and the
/// rebasing subset named by `rebasing_keywords`.
pub fn classify_subjects(
    first: &MergedRecord,
    identity_field: &str,
    rebasing_keywords: &[String],
) -> SubjectClassification {
    let subjects: Vec<String> = first
        .raw()
        .iter()
        .filter(|(field, _)| *field != identity_field)
        .filter(|(field, _)| !patterns::is_structural(field) && !patterns::is_pre_combined(field))
        .filter(|(_, value)| value.as_number().is_some())
        .map(|(field, _)| field.to_string())
        .collect();

    let (rebasing_subjects, other_subjects): (Vec<String>, Vec<String>) = subjects
        .iter()
        .cloned()
        .partition(|subject| patterns::contains_keyword(subject, rebasing_keywords));

    SubjectClassification {
        subjects,
        rebasing_subjects,
        other_subjects,
    }
}
