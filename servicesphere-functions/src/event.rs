//! Firestore trigger event decoding.
//!
//! Three delivery shapes are accepted:
//!
//! - CloudEvents binary mode (Eventarc): the body is the document event data
//!   and the subject arrives in the `ce-subject` header.
//! - CloudEvents structured mode: `{"subject", "id", "data": {...}}`.
//! - The legacy background-function envelope:
//!   `{"data": {...}, "context": {"resource", "eventId", "eventType"}}`.

use http::HeaderMap;
use serde::Deserialize;
use serde_json::{Map, Value};
use servicesphere_firestore::{Document, DocumentPath, value};
use servicesphere_notify::JobRecord;
use tracing::debug;

use crate::{FunctionError, Result};

/// Firestore document change data.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentEventData {
    /// Document before the change; absent or empty on create.
    #[serde(default)]
    pub old_value: Option<Document>,
    /// Document after the change; absent or empty on delete.
    #[serde(default)]
    pub value: Option<Document>,
    /// Fields touched by the change.
    #[serde(default)]
    pub update_mask: Option<DocumentMask>,
}

/// Changed field paths of an update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMask {
    #[serde(default)]
    pub field_paths: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyContext {
    #[serde(default)]
    resource: Option<String>,
    #[serde(default)]
    event_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    data: DocumentEventData,
    #[serde(default)]
    context: Option<LegacyContext>,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    id: Option<String>,
}

/// A decoded job update.
#[derive(Debug, Clone, Default)]
pub struct TriggerEvent {
    /// Job document id, empty when no source names the document.
    pub job_id: String,
    /// Collection the document lives in, when known.
    pub collection: Option<String>,
    /// Job before the change.
    pub before: Option<JobRecord>,
    /// Job after the change.
    pub after: Option<JobRecord>,
    /// Event id for log correlation.
    pub event_id: Option<String>,
    /// Fields touched by the change.
    pub changed_fields: Vec<String>,
}

impl TriggerEvent {
    /// Decode an HTTP delivery.
    pub fn from_http(headers: &HeaderMap, body: &[u8]) -> Result<Self> {
        let raw: serde_json::Value = serde_json::from_slice(body)?;
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        let is_envelope = raw.get("data").is_some_and(|data| data.is_object());
        let (data, subject, event_id) = if is_envelope {
            let envelope: Envelope = serde_json::from_value(raw)?;
            let context = envelope.context.unwrap_or_default();
            (
                envelope.data,
                header("ce-subject").or(envelope.subject).or(context.resource),
                header("ce-id").or(envelope.id).or(context.event_id),
            )
        } else {
            let data: DocumentEventData = serde_json::from_value(raw)?;
            (data, header("ce-subject"), header("ce-id"))
        };

        Self::from_data(data, subject.as_deref(), event_id)
    }

    /// Build from already-parsed document change data.
    pub fn from_data(
        data: DocumentEventData,
        subject: Option<&str>,
        event_id: Option<String>,
    ) -> Result<Self> {
        let old_value = data.old_value.filter(|doc| !is_empty(doc));
        let value = data.value.filter(|doc| !is_empty(doc));

        let path = subject
            .and_then(DocumentPath::parse)
            .or_else(|| value.as_ref().and_then(Document::path))
            .or_else(|| old_value.as_ref().and_then(Document::path));

        Ok(Self {
            job_id: path.as_ref().map(|p| p.id.clone()).unwrap_or_default(),
            collection: path.map(|p| p.collection),
            before: old_value.as_ref().map(decode_job).transpose()?,
            after: value.as_ref().map(decode_job).transpose()?,
            event_id,
            changed_fields: data.update_mask.map(|m| m.field_paths).unwrap_or_default(),
        })
    }

    /// Whether the event concerns `collection`. Events whose collection is
    /// unknown are accepted.
    pub fn is_in(&self, collection: &str) -> bool {
        self.collection.as_deref().is_none_or(|c| c == collection)
    }
}

fn is_empty(doc: &Document) -> bool {
    doc.name.is_empty() && doc.fields.is_empty()
}

// Fields whose typed value cannot be decoded are dropped, leaving the rest of
// the job usable.
fn decode_job(doc: &Document) -> Result<JobRecord> {
    let mut fields = Map::with_capacity(doc.fields.len());
    for (name, typed) in &doc.fields {
        match value::decode_value(typed) {
            Ok(decoded) => {
                fields.insert(name.clone(), decoded);
            }
            Err(e) => debug!(document = %doc.name, field = %name, error = %e, "Skipping undecodable field"),
        }
    }

    JobRecord::from_json(Value::Object(fields))
        .map_err(|e| FunctionError::InvalidEvent(format!("job document {}: {}", doc.name, e)))
}
