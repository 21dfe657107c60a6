use crate::model::ServiceType;
use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// A single service request.
///
/// Deserialization goes through [`StoredTask`] so that imported documents are
/// taken as they are: absent or `null` fields read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredTask")]
pub struct Task {
    pub id: String,
    pub name: String,
    pub service_type: ServiceType,
    pub description: String,
    pub remarks: String,
    pub created_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_time: Option<String>,
}

/// A task as found in a document. The browser version named the creation
/// stamp `time`; `createdTime` wins when both are present.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTask {
    #[serde(default, deserialize_with = "null_as_default")]
    id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    service_type: ServiceType,
    #[serde(default, deserialize_with = "null_as_default")]
    description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    remarks: String,
    #[serde(default)]
    created_time: Option<String>,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    completed_time: Option<String>,
}

impl From<StoredTask> for Task {
    fn from(stored: StoredTask) -> Self {
        Self {
            id: stored.id,
            name: stored.name,
            service_type: stored.service_type,
            description: stored.description,
            remarks: stored.remarks,
            created_time: stored.created_time.or(stored.time).unwrap_or_default(),
            completed_time: stored.completed_time,
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.completed_time.is_some()
    }

    /// `None` when the stamp is not RFC 3339.
    pub fn created_at(&self) -> Option<OffsetDateTime> {
        parse_timestamp(&self.created_time)
    }

    pub fn completed_at(&self) -> Option<OffsetDateTime> {
        self.completed_time.as_deref().and_then(parse_timestamp)
    }
}

fn parse_timestamp(value: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(value, &Rfc3339).ok()
}
