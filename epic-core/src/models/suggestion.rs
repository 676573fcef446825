use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::autopilot::{Platform, TriggerType};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialSuggestion {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub trigger_type: TriggerType,
    pub content: String,
    pub image_url: Option<String>,
    pub suggested_platforms: Vec<Platform>,
    pub post_platforms: Vec<Platform>,
    pub status: SuggestionStatus,
    pub post_id: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub dismissed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SuggestionStatus {
    Pending,
    Approved,
    Posted,
    Dismissed,
}

impl SuggestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Posted => "POSTED",
            Self::Dismissed => "DISMISSED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "APPROVED" => Some(Self::Approved),
            "POSTED" => Some(Self::Posted),
            "DISMISSED" => Some(Self::Dismissed),
            _ => None,
        }
    }

    /// Posted and dismissed suggestions accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Posted | Self::Dismissed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSuggestionInput {
    pub trigger_type: TriggerType,
    pub content: String,
    pub image_url: Option<String>,
    pub suggested_platforms: Vec<Platform>,
    pub status: SuggestionStatus,
}

/// One successful publication, also the counter behind the auto-post
/// rate limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostLogEntry {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub suggestion_id: Uuid,
    pub post_id: String,
    pub platforms: Vec<Platform>,
    pub created_at: DateTime<Utc>,
}
