use super::PipelineError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single scalar cell of a schema-free record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    /// Nested structure carried as its JSON text. Never numeric.
    Opaque(String),
    #[default]
    Empty,
}

static EMPTY: FieldValue = FieldValue::Empty;

impl FieldValue {
    /// Numeric coercion: finite numbers pass through, text is trimmed and parsed.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(value) if value.is_finite() => Some(*value),
            FieldValue::Text(text) => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite()),
            _ => None,
        }
    }

    pub fn number_or_zero(&self) -> f64 {
        self.as_number().unwrap_or(0.0)
    }

    /// True when the cell carries something other than blank text or nothing.
    pub fn is_present(&self) -> bool {
        match self {
            FieldValue::Empty => false,
            FieldValue::Text(text) => !text.trim().is_empty(),
            FieldValue::Number(value) => !value.is_nan(),
            FieldValue::Opaque(_) => true,
        }
    }

    /// String form used for identity lookups and display.
    pub fn key_string(&self) -> String {
        match self {
            FieldValue::Number(value) => format_number(*value),
            FieldValue::Text(text) => text.trim().to_string(),
            FieldValue::Opaque(raw) => raw.clone(),
            FieldValue::Empty => String::new(),
        }
    }

    pub(crate) fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Empty,
            Value::Bool(flag) => FieldValue::Text(flag.to_string()),
            Value::Number(number) => number
                .as_f64()
                .map(FieldValue::Number)
                .unwrap_or_else(|| FieldValue::Text(number.to_string())),
            Value::String(text) => FieldValue::Text(text.clone()),
            Value::Array(_) | Value::Object(_) => FieldValue::Opaque(value.to_string()),
        }
    }

    /// Spreadsheet cell: blank is empty, anything else is kept as trimmed text
    /// so identifiers keep leading zeros and every digit. Numeric coercion
    /// happens on read through [`FieldValue::as_number`].
    pub(crate) fn from_cell(cell: &str) -> Self {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            FieldValue::Empty
        } else {
            FieldValue::Text(trimmed.to_string())
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(f64::from(value))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Insertion-ordered mapping from field name to cell. The order of the first
/// record of a collection is treated as the schema order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_object(object: &serde_json::Map<String, Value>) -> Self {
        object
            .iter()
            .map(|(key, value)| (key.clone(), FieldValue::from_json(value)))
            .collect()
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Missing fields read as [`FieldValue::Empty`].
    pub fn value(&self, field: &str) -> &FieldValue {
        self.fields.get(field).unwrap_or(&EMPTY)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Copy of `self` with every field of `overlay` written on top.
    pub fn overlaid_with(&self, overlay: &Record) -> Record {
        let mut combined = self.clone();
        for (key, value) in &overlay.fields {
            combined.fields.insert(key.clone(), value.clone());
        }
        combined
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// Converts decoded JSON rows into records. Every row must be an object.
pub fn records_from_json(rows: &[Value]) -> Result<Vec<Record>, PipelineError> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| match row {
            Value::Object(object) => Ok(Record::from_json_object(object)),
            other => Err(PipelineError::InvalidRecordShape {
                index,
                reason: format!("expected an object, found {}", json_kind(other)),
            }),
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
