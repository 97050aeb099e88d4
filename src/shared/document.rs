//! Documents and Payloads
//!
//! A [`Payload`] is one write destined for the remote document store: an id,
//! a type tag naming the target collection, and any number of extra fields.
//! Before delivery a payload is normalized into a [`RemoteDocument`], the
//! `{ id, type, data }` shape the store's upsert endpoint accepts.
//!
//! The type tag is kept as a [`PayloadKind`] rather than a bare
//! [`DocumentType`] so that documents with an unrecognized type can still be
//! read back from local storage, detected, and purged.

use crate::shared::error::SyncError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Collections the remote store accepts writes for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentType {
    User,
    Post,
    Group,
    DailyProgress,
    Comment,
    Report,
    Achievement,
    Karma,
    Audit,
    Error,
}

impl DocumentType {
    /// Every recognized document type (the delivery allow-list)
    pub const ALL: [DocumentType; 10] = [
        DocumentType::User,
        DocumentType::Post,
        DocumentType::Group,
        DocumentType::DailyProgress,
        DocumentType::Comment,
        DocumentType::Report,
        DocumentType::Achievement,
        DocumentType::Karma,
        DocumentType::Audit,
        DocumentType::Error,
    ];

    /// Wire name of the type
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::User => "user",
            DocumentType::Post => "post",
            DocumentType::Group => "group",
            DocumentType::DailyProgress => "daily-progress",
            DocumentType::Comment => "comment",
            DocumentType::Report => "report",
            DocumentType::Achievement => "achievement",
            DocumentType::Karma => "karma",
            DocumentType::Audit => "audit",
            DocumentType::Error => "error",
        }
    }

    /// Look up a type by its wire name
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == name)
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type tag of a payload as it was written
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PayloadKind {
    /// A type on the allow-list
    Known(DocumentType),
    /// Anything else, including the empty string for a missing type
    Unrecognized(String),
}

impl PayloadKind {
    /// Wire name of the tag
    pub fn as_str(&self) -> &str {
        match self {
            PayloadKind::Known(t) => t.as_str(),
            PayloadKind::Unrecognized(raw) => raw,
        }
    }

    /// The recognized document type, if any
    pub fn document_type(&self) -> Option<DocumentType> {
        match self {
            PayloadKind::Known(t) => Some(*t),
            PayloadKind::Unrecognized(_) => None,
        }
    }

    /// Whether the tag was absent or blank
    pub fn is_missing(&self) -> bool {
        matches!(self, PayloadKind::Unrecognized(raw) if raw.trim().is_empty())
    }
}

impl Default for PayloadKind {
    fn default() -> Self {
        PayloadKind::Unrecognized(String::new())
    }
}

impl From<String> for PayloadKind {
    fn from(raw: String) -> Self {
        match DocumentType::parse(&raw) {
            Some(t) => PayloadKind::Known(t),
            None => PayloadKind::Unrecognized(raw),
        }
    }
}

impl From<&str> for PayloadKind {
    fn from(raw: &str) -> Self {
        PayloadKind::from(raw.to_string())
    }
}

impl From<DocumentType> for PayloadKind {
    fn from(t: DocumentType) -> Self {
        PayloadKind::Known(t)
    }
}

impl From<PayloadKind> for String {
    fn from(kind: PayloadKind) -> Self {
        match kind {
            PayloadKind::Known(t) => t.as_str().to_string(),
            PayloadKind::Unrecognized(raw) => raw,
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pending write: id, type tag and extra fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    /// Document id, unique within its type
    #[serde(default)]
    pub id: String,
    /// Target collection
    #[serde(rename = "type", default)]
    pub kind: PayloadKind,
    /// Remaining document fields
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Payload {
    /// Create a payload with no extra fields
    pub fn new(id: impl Into<String>, kind: impl Into<PayloadKind>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            fields: Map::new(),
        }
    }

    /// Add or overwrite a field
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Read a field
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Whether the payload carries a usable id
    pub fn has_id(&self) -> bool {
        !self.id.trim().is_empty()
    }

    /// Build a payload from an arbitrary JSON document.
    ///
    /// A missing `id` or `type` yields an empty value rather than an error;
    /// callers decide whether that is acceptable.
    pub fn from_value(value: Value) -> Result<Self, SyncError> {
        if !value.is_object() {
            return Err(SyncError::validation("payload", "expected a JSON object"));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Build a payload from any serializable record
    pub fn from_record<T: Serialize>(
        id: impl Into<String>,
        kind: DocumentType,
        record: &T,
    ) -> Result<Self, SyncError> {
        let mut payload = Self::from_value(serde_json::to_value(record)?)?;
        payload.id = id.into();
        payload.kind = kind.into();
        Ok(payload)
    }

    /// Normalize into the store's document shape, stripping `_`-prefixed keys.
    pub fn normalize(&self) -> Result<RemoteDocument, SyncError> {
        if !self.has_id() {
            return Err(SyncError::validation("id", "payload id is missing"));
        }
        if self.kind.is_missing() {
            return Err(SyncError::validation("type", "payload type is missing"));
        }

        let mut data = Map::new();
        data.insert("id".to_string(), Value::String(self.id.clone()));
        data.insert("type".to_string(), Value::String(self.kind.to_string()));
        for (key, value) in &self.fields {
            if key.starts_with('_') || key == "id" || key == "type" {
                continue;
            }
            data.insert(key.clone(), value.clone());
        }

        Ok(RemoteDocument {
            id: self.id.clone(),
            doc_type: self.kind.to_string(),
            data,
        })
    }
}

/// Document as exchanged with the remote store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteDocument {
    /// Document id
    pub id: String,
    /// Collection name
    #[serde(rename = "type")]
    pub doc_type: String,
    /// Document body
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl RemoteDocument {
    /// Encode a record as a document body
    pub fn encode<T: Serialize>(
        id: impl Into<String>,
        doc_type: DocumentType,
        record: &T,
    ) -> Result<Self, SyncError> {
        Payload::from_record(id, doc_type, record)?.normalize()
    }

    /// Decode the document body into a record
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, SyncError> {
        Ok(serde_json::from_value(Value::Object(self.data.clone()))?)
    }
}
