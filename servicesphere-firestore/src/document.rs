//! Firestore documents.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Result, value};

/// A Firestore document in REST/event JSON form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name
    /// (`projects/{p}/databases/{d}/documents/{collection}/{id}`).
    #[serde(default)]
    pub name: String,
    /// Typed fields.
    #[serde(default)]
    pub fields: Map<String, Value>,
    /// Creation time (RFC 3339).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    /// Last update time (RFC 3339).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

impl Document {
    /// Fields as plain JSON.
    pub fn to_json(&self) -> Result<Value> {
        value::decode_fields(&self.fields)
    }

    /// Decode a single field, `None` if absent.
    pub fn field(&self, name: &str) -> Result<Option<Value>> {
        self.fields.get(name).map(value::decode_value).transpose()
    }

    /// Path of the document relative to the database root.
    pub fn path(&self) -> Option<DocumentPath> {
        DocumentPath::parse(&self.name)
    }
}

/// Collection/document path of a document, relative to the database root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPath {
    /// Collection path (`serviceRequests`, or `a/b/c` for subcollections).
    pub collection: String,
    /// Document id.
    pub id: String,
}

impl DocumentPath {
    /// Parse a full resource name, a `documents/...` subject, or a bare
    /// `collection/id` path.
    pub fn parse(path: &str) -> Option<Self> {
        let relative = match path.find("/documents/") {
            Some(idx) => &path[idx + "/documents/".len()..],
            None => path.strip_prefix("documents/").unwrap_or(path),
        };

        let (collection, id) = relative.trim_matches('/').rsplit_once('/')?;
        if collection.is_empty() || id.is_empty() {
            return None;
        }

        Some(Self {
            collection: collection.to_string(),
            id: id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_name() {
        let path = DocumentPath::parse(
            "projects/servicesphere/databases/(default)/documents/serviceRequests/job-42",
        )
        .unwrap();
        assert_eq!(path.collection, "serviceRequests");
        assert_eq!(path.id, "job-42");
    }

    #[test]
    fn test_parse_subject_and_bare_paths() {
        assert_eq!(
            DocumentPath::parse("documents/serviceRequests/job-1").unwrap().id,
            "job-1"
        );
        assert_eq!(
            DocumentPath::parse("users/u1").unwrap().collection,
            "users"
        );
        let nested = DocumentPath::parse("documents/regions/blr/serviceRequests/j9").unwrap();
        assert_eq!(nested.collection, "regions/blr/serviceRequests");
        assert_eq!(nested.id, "j9");
    }

    #[test]
    fn test_parse_rejects_collection_only() {
        assert!(DocumentPath::parse("serviceRequests").is_none());
        assert!(DocumentPath::parse("").is_none());
    }

    #[test]
    fn test_document_decode() {
        let doc: Document = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/users/u1",
            "fields": {
                "fcmToken": {"stringValue": "tok"},
                "visits": {"integerValue": "7"}
            },
            "updateTime": "2024-05-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(doc.field("fcmToken").unwrap(), Some(json!("tok")));
        assert_eq!(doc.field("missing").unwrap(), None);
        assert_eq!(doc.to_json().unwrap(), json!({"fcmToken": "tok", "visits": 7}));
        assert_eq!(doc.path().unwrap().id, "u1");
    }
}
