use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// Registry lifecycle label attached to a model version.
///
/// Serialized with the registry's capitalized names (`"Staging"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Stage {
    #[default]
    None,
    Staging,
    Production,
    Archived,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::None => "None",
            Stage::Staging => "Staging",
            Stage::Production => "Production",
            Stage::Archived => "Archived",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = crate::error::StagehandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Stage::None),
            "staging" => Ok(Stage::Staging),
            "production" => Ok(Stage::Production),
            "archived" => Ok(Stage::Archived),
            _ => Err(crate::error::StagehandError::InvalidStage(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// VersionStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VersionStatus {
    PendingRegistration,
    FailedRegistration,
    #[default]
    Ready,
}

// ---------------------------------------------------------------------------
// ModelVersion
// ---------------------------------------------------------------------------

/// A registry-owned binding of a model name to an artifact source.
///
/// `version` stays a string because the registry transports it as one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVersion {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub current_stage: Stage,
    #[serde(default)]
    pub status: VersionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_timestamp: Option<i64>,
}

impl ModelVersion {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            current_stage: Stage::None,
            status: VersionStatus::Ready,
            status_message: None,
            source: None,
            run_id: None,
            creation_timestamp: None,
            last_updated_timestamp: None,
        }
    }

    /// Last update time, converted from the registry's epoch milliseconds.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated_timestamp
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
