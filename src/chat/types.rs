//! Persisted conversation records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::llm::Message;

/// Open attribute/metadata mapping
pub type Attributes = Map<String, Value>;

/// A named fact stored alongside the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique key in the entity store
    pub name: String,
    /// Free-form attributes
    #[serde(default)]
    pub attributes: Attributes,
    /// When the entity was (last) added
    #[serde(with = "timestamp", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Entity {
    /// Create an entity stamped with the current time
    pub fn new(name: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            name: name.into(),
            attributes,
            created_at: Utc::now(),
        }
    }
}

/// One completed query/response exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    pub query: String,
    pub response: String,
    #[serde(default)]
    pub metadata: Attributes,
}

impl HistoryEntry {
    /// Create an entry stamped with the current time
    pub fn new(query: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            query: query.into(),
            response: response.into(),
            metadata: Attributes::new(),
        }
    }

    /// Attach metadata
    pub fn with_metadata(mut self, metadata: Attributes) -> Self {
        self.metadata = metadata;
        self
    }

    /// The exchange as a user message followed by an assistant message
    pub fn messages(&self) -> [Message; 2] {
        [
            Message::user(self.query.as_str()),
            Message::assistant(self.response.as_str()),
        ]
    }
}

/// RFC 3339 timestamps that also accept naive ISO-8601 date-times
///
/// Naive values (no offset) are read as local time.
pub mod timestamp {
    use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(de::Error::custom)
    }

    /// Render with as many fractional digits as needed to round-trip
    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    /// Parse RFC 3339, falling back to a naive local date-time
    pub fn parse(raw: &str) -> Result<DateTime<Utc>, String> {
        if let Ok(value) = DateTime::parse_from_rfc3339(raw) {
            return Ok(value.with_timezone(&Utc));
        }
        let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map_err(|e| format!("invalid timestamp '{}': {}", raw, e))?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|value| value.with_timezone(&Utc))
            .ok_or_else(|| format!("timestamp '{}' does not exist in local time", raw))
    }
}
