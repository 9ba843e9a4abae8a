use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::fields::FieldSet;

/// A named binary resource (design asset or project image)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedBlob {
    pub name: String,
    /// Raw bytes, base64 in the serialized form
    #[serde(with = "base64_bytes")]
    pub content: Vec<u8>,
}

/// A report design: field schemas plus the template and assets to render with
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectType {
    pub id: String,
    pub name: String,
    pub language: String,
    pub report_template: String,
    pub report_styles: String,
    #[serde(default)]
    pub report_fields: FieldSet,
    #[serde(default)]
    pub finding_fields: FieldSet,
    #[serde(default)]
    pub assets: Vec<NamedBlob>,
}

/// The account profile projected into rendered output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title_before: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub title_after: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
}

/// A project member with a live account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMember {
    pub user: UserProfile,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// One stored finding row: identity and creation time beside the
/// schema-driven field data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindingRow {
    pub id: String,
    pub created: DateTime<Utc>,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

/// A pentest project as read from the persistence layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub language: String,
    /// Stored report field data (shaped by the design's report schema)
    #[serde(default)]
    pub report: Map<String, Value>,
    #[serde(default)]
    pub findings: Vec<FindingRow>,
    #[serde(default)]
    pub members: Vec<ProjectMember>,
    /// People recorded on the report without a live account. Plain maps in
    /// the member projection shape, carrying at least `id`.
    #[serde(default)]
    pub imported_members: Vec<Map<String, Value>>,
    #[serde(default)]
    pub images: Vec<NamedBlob>,
}

/// Lookup of persisted project members by id, the last stop of user
/// reference resolution. A trait so formatting stays testable without a
/// backing store.
pub trait MemberLookup {
    fn member_by_id(&self, id: &str) -> Option<&ProjectMember>;
}

impl MemberLookup for Vec<ProjectMember> {
    fn member_by_id(&self, id: &str) -> Option<&ProjectMember> {
        self.iter().find(|m| m.user.id == id)
    }
}

impl MemberLookup for Project {
    fn member_by_id(&self, id: &str) -> Option<&ProjectMember> {
        self.members.member_by_id(id)
    }
}

/// Empty lookup for preview renders, which have no project context
pub struct NoMembers;

impl MemberLookup for NoMembers {
    fn member_by_id(&self, _id: &str) -> Option<&ProjectMember> {
        None
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded.as_bytes()).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blob_content_round_trips_as_base64() {
        let blob = NamedBlob {
            name: "logo.png".into(),
            content: b"\x89PNG fake".to_vec(),
        };
        let raw = serde_json::to_value(&blob).unwrap();
        assert_eq!(raw["content"], json!("iVBORyBmYWtl"));
        let back: NamedBlob = serde_json::from_value(raw).unwrap();
        assert_eq!(back.content, blob.content);
    }

    #[test]
    fn finding_row_flattens_field_data() {
        let row: FindingRow = serde_json::from_value(json!({
            "id": "f-1",
            "created": "2026-01-10T12:00:00Z",
            "title": "Stored XSS",
            "cvss": "CVSS:3.1/AV:N/AC:L/PR:N/UI:R/S:C/C:L/I:L/A:N",
        }))
        .unwrap();
        assert_eq!(row.data["title"], json!("Stored XSS"));
        assert!(!row.data.contains_key("id"));
    }
}
