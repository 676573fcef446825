use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default daily auto-post budget for organizations that never set one.
pub const DEFAULT_MAX_POSTS_PER_DAY: u32 = 3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitter,
    Linkedin,
    Facebook,
    Instagram,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Twitter => "twitter",
            Self::Linkedin => "linkedin",
            Self::Facebook => "facebook",
            Self::Instagram => "instagram",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "twitter" => Some(Self::Twitter),
            "linkedin" => Some(Self::Linkedin),
            "facebook" => Some(Self::Facebook),
            "instagram" => Some(Self::Instagram),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalMode {
    AutoPost,
    #[default]
    RequiresApproval,
}

impl ApprovalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AutoPost => "AUTO_POST",
            Self::RequiresApproval => "REQUIRES_APPROVAL",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "AUTO_POST" => Some(Self::AutoPost),
            "REQUIRES_APPROVAL" => Some(Self::RequiresApproval),
            _ => None,
        }
    }
}

/// Business event that can start the autopilot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerType {
    LeadConverted,
    FiveStarCall,
    WeeklyContent,
    Manual,
}

impl TriggerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LeadConverted => "LEAD_CONVERTED",
            Self::FiveStarCall => "FIVE_STAR_CALL",
            Self::WeeklyContent => "WEEKLY_CONTENT",
            Self::Manual => "MANUAL",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "LEAD_CONVERTED" => Some(Self::LeadConverted),
            "FIVE_STAR_CALL" => Some(Self::FiveStarCall),
            "WEEKLY_CONTENT" => Some(Self::WeeklyContent),
            "MANUAL" => Some(Self::Manual),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AutopilotSettings {
    pub organization_id: Uuid,
    pub enabled: bool,
    pub on_lead_converted: bool,
    pub on_five_star_call: bool,
    pub on_weekly_schedule: bool,
    pub approval_mode: ApprovalMode,
    pub default_platforms: BTreeSet<Platform>,
    pub max_posts_per_day: u32,
    pub updated_at: DateTime<Utc>,
}

impl AutopilotSettings {
    /// Settings reported for an organization that has never configured
    /// the autopilot.
    pub fn disabled(organization_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            organization_id,
            enabled: false,
            on_lead_converted: false,
            on_five_star_call: false,
            on_weekly_schedule: false,
            approval_mode: ApprovalMode::default(),
            default_platforms: BTreeSet::new(),
            max_posts_per_day: DEFAULT_MAX_POSTS_PER_DAY,
            updated_at: now,
        }
    }

    /// Manual triggers are always accepted.
    pub fn trigger_enabled(&self, trigger: TriggerType) -> bool {
        match trigger {
            TriggerType::LeadConverted => self.on_lead_converted,
            TriggerType::FiveStarCall => self.on_five_star_call,
            TriggerType::WeeklyContent => self.on_weekly_schedule,
            TriggerType::Manual => true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAutopilotSettingsInput {
    pub enabled: Option<bool>,
    pub on_lead_converted: Option<bool>,
    pub on_five_star_call: Option<bool>,
    pub on_weekly_schedule: Option<bool>,
    pub approval_mode: Option<ApprovalMode>,
    pub default_platforms: Option<BTreeSet<Platform>>,
    pub max_posts_per_day: Option<u32>,
}
