use super::inference::select_identity_field;
use super::normalizer::{canonical_class, UNCLASSIFIED};
use super::patterns;
use super::record::Record;
use super::PipelineError;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use tracing::warn;

const RESOLVED_KEYS: [&str; 4] = ["id", "name", "class", "grade"];

/// One raw record joined against the roster, with resolved identity fields.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord {
    pub id: String,
    pub name: String,
    pub class: String,
    pub grade: String,
    raw: Record,
}

impl MergedRecord {
    /// The originating raw record, fields verbatim.
    pub fn raw(&self) -> &Record {
        &self.raw
    }

    /// Resolved fields followed by the raw fields, flattened into one map.
    /// Raw fields named like a resolved field, or accepted by `shadowed`, are
    /// left out.
    pub(crate) fn write_entries<M: SerializeMap>(
        &self,
        map: &mut M,
        shadowed: impl Fn(&str) -> bool,
    ) -> Result<(), M::Error> {
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("class", &self.class)?;
        map.serialize_entry("grade", &self.grade)?;
        for (field, value) in self.raw.iter() {
            if !RESOLVED_KEYS.contains(&field) && !shadowed(field) {
                map.serialize_entry(field, value)?;
            }
        }
        Ok(())
    }
}

impl Serialize for MergedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        self.write_entries(&mut map, |_| false)?;
        map.end()
    }
}

/// Left-joins `raw` against `roster` by identity value.
///
/// Name, class and grade are read from the raw record overlaid with its roster
/// row (roster wins on collisions), then from the raw record alone, then fall
/// back to the identity value for the name and [`UNCLASSIFIED`] otherwise.
pub fn merge_records(
    raw: &[Record],
    roster: &[Record],
    identity_field: &str,
) -> Result<Vec<MergedRecord>, PipelineError> {
    if raw.is_empty() {
        return Err(PipelineError::InvalidInput(
            "raw records must be a non-empty list".to_string(),
        ));
    }

    let lookup = roster_lookup(roster);
    let empty = Record::new();

    let merged = raw
        .iter()
        .map(|record| {
            let id = record.value(identity_field).key_string();
            let roster_row = lookup.get(id.as_str()).copied().unwrap_or(&empty);
            let combined = record.overlaid_with(roster_row);

            let resolve = |is_role: fn(&str) -> bool| {
                first_present(&combined, is_role).or_else(|| first_present(record, is_role))
            };

            let name = resolve(patterns::is_name_field).unwrap_or_else(|| id.clone());
            let class = resolve(patterns::is_class_field)
                .map(|value| canonical_class(&value))
                .unwrap_or_else(|| UNCLASSIFIED.to_string());
            let grade = resolve(patterns::is_grade_field).unwrap_or_else(|| UNCLASSIFIED.to_string());

            MergedRecord {
                id,
                name,
                class,
                grade,
                raw: record.clone(),
            }
        })
        .collect();

    Ok(merged)
}

/// Roster rows keyed by the string form of their own identity field. Later
/// rows replace earlier rows with the same key. A roster whose identity field
/// cannot be inferred is ignored.
fn roster_lookup(roster: &[Record]) -> HashMap<String, &Record> {
    if roster.is_empty() {
        return HashMap::new();
    }

    let identity_field = match select_identity_field(roster) {
        Ok(field) => field,
        Err(err) => {
            warn!(rows = roster.len(), error = %err, "roster ignored");
            return HashMap::new();
        }
    };
    let mut lookup = HashMap::with_capacity(roster.len());
    let mut skipped = 0usize;
    for row in roster {
        let key = row.value(&identity_field).key_string();
        if key.is_empty() {
            skipped += 1;
            continue;
        }
        lookup.insert(key, row);
    }

    if skipped > 0 {
        warn!(
            skipped,
            identity_field = identity_field.as_str(),
            "roster rows without an identity value were ignored"
        );
    }

    lookup
}

fn first_present(record: &Record, is_role: fn(&str) -> bool) -> Option<String> {
    record
        .iter()
        .find(|(field, value)| is_role(field) && value.is_present())
        .map(|(_, value)| value.key_string())
}
