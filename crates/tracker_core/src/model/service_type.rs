use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a service request.
///
/// Documents loaded from disk or imported from a file may carry a category
/// outside the known set; those are kept verbatim as [`ServiceType::Unlisted`]
/// so a round trip never rewrites them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ServiceType {
    Cleaning,
    Plumbing,
    Electrical,
    Carpentry,
    Painting,
    Gardening,
    Moving,
    /// Requires a free-text description.
    Other,
    Unlisted(String),
}

impl ServiceType {
    pub const KNOWN: [ServiceType; 8] = [
        ServiceType::Cleaning,
        ServiceType::Plumbing,
        ServiceType::Electrical,
        ServiceType::Carpentry,
        ServiceType::Painting,
        ServiceType::Gardening,
        ServiceType::Moving,
        ServiceType::Other,
    ];

    /// Parses user input, ignoring case. Only the known categories are accepted.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AppError::invalid_input("service type is required"));
        }

        Self::KNOWN
            .iter()
            .find(|known| known.as_str().eq_ignore_ascii_case(trimmed))
            .cloned()
            .ok_or_else(|| AppError::invalid_input(format!("unknown service type '{trimmed}'")))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Cleaning => "Cleaning",
            Self::Plumbing => "Plumbing",
            Self::Electrical => "Electrical",
            Self::Carpentry => "Carpentry",
            Self::Painting => "Painting",
            Self::Gardening => "Gardening",
            Self::Moving => "Moving",
            Self::Other => "Other",
            Self::Unlisted(raw) => raw,
        }
    }

    pub fn requires_description(&self) -> bool {
        matches!(self, Self::Other)
    }

    /// False for values carried over from a stored or imported document.
    pub fn is_listed(&self) -> bool {
        !matches!(self, Self::Unlisted(_))
    }
}

impl Default for ServiceType {
    fn default() -> Self {
        Self::Unlisted(String::new())
    }
}

impl From<String> for ServiceType {
    fn from(value: String) -> Self {
        Self::KNOWN
            .iter()
            .find(|known| known.as_str() == value)
            .cloned()
            .unwrap_or(Self::Unlisted(value))
    }
}

impl From<ServiceType> for String {
    fn from(value: ServiceType) -> Self {
        match value {
            ServiceType::Unlisted(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
