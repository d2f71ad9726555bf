//! Issue data model for civic-core
//!
//! Records mirror what the issue service returns. The client never computes
//! derived fields itself; every change arrives as a whole new record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Issue category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Water,
    Electricity,
    Road,
    #[serde(alias = "waste")]
    Garbage,
    Flood,
    Drainage,
    /// Anything the service sends that this client does not know about
    #[default]
    #[serde(other)]
    Other,
}

impl std::str::FromStr for Category {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "water" => Ok(Category::Water),
            "electricity" | "power" => Ok(Category::Electricity),
            "road" | "roads" => Ok(Category::Road),
            "garbage" | "waste" => Ok(Category::Garbage),
            "flood" => Ok(Category::Flood),
            "drainage" => Ok(Category::Drainage),
            "other" => Ok(Category::Other),
            _ => Err(crate::Error::InvalidCategory(s.to_string())),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Water => write!(f, "water"),
            Category::Electricity => write!(f, "electricity"),
            Category::Road => write!(f, "road"),
            Category::Garbage => write!(f, "garbage"),
            Category::Flood => write!(f, "flood"),
            Category::Drainage => write!(f, "drainage"),
            Category::Other => write!(f, "other"),
        }
    }
}

/// Issue priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
    #[serde(other)]
    Unknown,
}

impl std::str::FromStr for Priority {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            _ => Err(crate::Error::InvalidPriority(s.to_string())),
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
            Priority::Critical => write!(f, "critical"),
            Priority::Unknown => write!(f, "unknown"),
        }
    }
}

/// Issue status
///
/// Transitions are decided by the service; the client only displays them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Pending,
    Verified,
    InProgress,
    Solved,
    Rejected,
    #[serde(other)]
    Unknown,
}

impl std::str::FromStr for Status {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Status::Pending),
            "verified" => Ok(Status::Verified),
            "in_progress" | "in-progress" | "inprogress" => Ok(Status::InProgress),
            "solved" => Ok(Status::Solved),
            "rejected" => Ok(Status::Rejected),
            _ => Err(crate::Error::InvalidStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Pending => write!(f, "pending"),
            Status::Verified => write!(f, "verified"),
            Status::InProgress => write!(f, "in_progress"),
            Status::Solved => write!(f, "solved"),
            Status::Rejected => write!(f, "rejected"),
            Status::Unknown => write!(f, "unknown"),
        }
    }
}

/// Where the problem is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Location {
    pub address: String,
    pub district: String,
    /// Coordinate pair exactly as the service sent it
    #[serde(default)]
    pub coordinates: Vec<f64>,
}

/// Reporter summary embedded by the detail endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reporter {
    pub id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub profile_pic: Option<String>,
}

/// A single civic problem report as last seen from the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueRecord {
    /// Service-assigned identifier, stable for the issue's lifetime
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub category: Category,

    #[serde(default)]
    pub location: Location,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub status: Status,

    /// Reporting user
    #[serde(rename = "user_id", alias = "owner_id")]
    pub owner_id: String,

    #[serde(default)]
    pub verification_count: u32,

    /// Users who verified this issue. Not reconciled against the count.
    #[serde(default)]
    pub verified_by: Vec<String>,

    #[serde(default, with = "timestamp::option")]
    pub verified_at: Option<DateTime<Utc>>,

    // Server-populated pass-through fields
    #[serde(default)]
    pub government_response: Option<serde_json::Value>,

    #[serde(default)]
    pub ngo_claim: Option<serde_json::Value>,

    #[serde(default)]
    pub tagged_ministries: Vec<String>,

    #[serde(default)]
    pub is_crisis: bool,

    #[serde(default)]
    pub images: Vec<String>,

    #[serde(default)]
    pub solution_verified: bool,

    #[serde(default, rename = "user", skip_serializing_if = "Option::is_none")]
    pub reporter: Option<Reporter>,

    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,

    #[serde(default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl IssueRecord {
    /// Whether `user_id` already appears among the verifiers
    pub fn is_verified_by(&self, user_id: &str) -> bool {
        self.verified_by.iter().any(|v| v == user_id)
    }
}

impl std::fmt::Display for IssueRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] [{}] {} - {}",
            self.id, self.priority, self.category, self.status, self.title
        )
    }
}

/// Payload for reporting a new issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueDraft {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub location: Location,
    pub priority: Priority,
}

/// Owner-editable fields; absent fields are left alone by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct IssuePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

impl IssuePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.images.is_none()
    }
}

/// Filter and pagination parameters for list calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_crisis: Option<bool>,
}

impl ListParams {
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Self::default()
        }
    }
}

/// Page metadata returned alongside list results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            total: 0,
            pages: 0,
        }
    }
}

/// The service writes naive UTC timestamps (no offset); accept those and RFC 3339.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(dt) => serializer.serialize_some(&dt.to_rfc3339()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => parse(&raw)
                    .map(Some)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}"))),
                None => Ok(None),
            }
        }
    }
}
