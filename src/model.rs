use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, TrellisError};
use crate::task_id::TaskId;

/// Per-task content payload. Holds no status or dependency data — that lives
/// in the index exclusively.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentRecord {
    pub title: String,
    pub description: Option<String>,
    /// Open set of string-valued extension fields. Values are validated at
    /// parse time; arrays, numbers, objects and friends are a format error.
    pub custom: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentRecord {
    pub fn new(title: String, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            title,
            description,
            custom: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(TrellisError::EmptyTitle);
        }
        Ok(())
    }

    /// Route a user-supplied field edit to the right slot.
    pub fn set_field(&mut self, key: &str, value: String) -> Result<()> {
        match key {
            "title" => self.title = value,
            "description" => self.description = Some(value),
            "created_at" | "updated_at" => {
                return Err(TrellisError::ReservedField(key.to_string()));
            }
            _ => {
                self.custom.insert(key.to_string(), value);
            }
        }
        Ok(())
    }

    pub fn append_description(&mut self, text: &str) {
        match &mut self.description {
            Some(existing) => {
                existing.push('\n');
                existing.push_str(text);
            }
            None => self.description = Some(text.to_string()),
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Encode to the on-disk JSON object form: known fields first, then the
    /// custom fields flattened alongside them.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("title".to_string(), Value::String(self.title.clone()));
        if let Some(description) = &self.description {
            map.insert(
                "description".to_string(),
                Value::String(description.clone()),
            );
        }
        map.insert(
            "created_at".to_string(),
            Value::String(self.created_at.to_rfc3339()),
        );
        map.insert(
            "updated_at".to_string(),
            Value::String(self.updated_at.to_rfc3339()),
        );
        for (key, value) in &self.custom {
            map.insert(key.clone(), Value::String(value.clone()));
        }
        Value::Object(map)
    }

    /// Decode from the on-disk JSON object form. Non-string custom fields and
    /// a missing title are format errors, reported against `id`.
    pub fn from_value(id: &TaskId, value: Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(TrellisError::MalformedContent(
                id.to_string(),
                "expected a JSON object".to_string(),
            ));
        };

        let mut title = None;
        let mut description = None;
        let mut created_at = None;
        let mut updated_at = None;
        let mut custom = BTreeMap::new();

        for (key, field) in map {
            if key == "title" {
                title = Some(expect_string(id, &key, field)?);
            } else if key == "description" {
                description = Some(expect_string(id, &key, field)?);
            } else if key == "created_at" {
                created_at = Some(expect_timestamp(id, &key, field)?);
            } else if key == "updated_at" {
                updated_at = Some(expect_timestamp(id, &key, field)?);
            } else {
                let text = expect_string(id, &key, field)?;
                custom.insert(key, text);
            }
        }

        let title = title.ok_or_else(|| {
            TrellisError::MalformedContent(
                id.to_string(),
                "missing required field 'title'".to_string(),
            )
        })?;

        Ok(Self {
            title,
            description,
            custom,
            created_at: created_at.unwrap_or_else(Utc::now),
            updated_at: updated_at.unwrap_or_else(Utc::now),
        })
    }
}

fn expect_string(id: &TaskId, key: &str, value: Value) -> Result<String> {
    match value {
        Value::String(text) => Ok(text),
        other => Err(TrellisError::MalformedContent(
            id.to_string(),
            format!("field '{key}' must be a string, got {}", json_type_name(&other)),
        )),
    }
}

fn expect_timestamp(id: &TaskId, key: &str, value: Value) -> Result<DateTime<Utc>> {
    let text = expect_string(id, key, value)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            TrellisError::MalformedContent(
                id.to_string(),
                format!("field '{key}' is not an RFC 3339 timestamp: {e}"),
            )
        })
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Status + dependency set for one task, held in the side-index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub status: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub dependencies: BTreeSet<TaskId>,
}

impl IndexEntry {
    pub fn new(status: String) -> Self {
        Self {
            status,
            dependencies: BTreeSet::new(),
        }
    }
}
