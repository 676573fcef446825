//! Social autopilot.
//!
//! Business events (a converted lead, a five-star call, the weekly content
//! slot, or a manual request) become social suggestions. Depending on the
//! organization's settings a suggestion waits for review or is published
//! straight away.
//!
//! Creating the suggestion is the primary effect of a trigger. Publishing
//! is secondary: once the suggestion is stored, a publishing failure is
//! logged and reported in [`PublishOutcome`] but never fails the trigger.

pub mod generator;
pub mod publisher;
pub mod rate_limit;

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::db::Database;
use crate::models::*;
use generator::{GenerationRequest, SuggestionGenerator, TemplateGenerator};
use publisher::{NewPost, PublishError, Publisher};
use rate_limit::{PostLogRateLimiter, RateLimiter};

#[derive(Debug, Error)]
pub enum AutopilotError {
    #[error("suggestion not found")]
    NotFound,

    #[error("suggestion is already {}", .0.as_str())]
    InvalidState(SuggestionStatus),

    #[error("no platforms selected for publishing")]
    NoPlatforms,

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Why a trigger produced no suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AutopilotDisabled,
    TriggerDisabled,
}

impl SkipReason {
    pub fn message(&self) -> &'static str {
        match self {
            Self::AutopilotDisabled => "Autopilot not enabled",
            Self::TriggerDisabled => "Trigger not enabled",
        }
    }
}

/// What happened to the secondary publishing step.
#[derive(Debug, Clone)]
pub enum PublishOutcome {
    /// Auto-posting was not requested for this suggestion.
    NotAttempted,
    Posted(PostLogEntry),
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct Dispatch {
    pub suggestion: SocialSuggestion,
    /// Whether the suggestion was sent down the auto-post path, regardless
    /// of how publishing went.
    pub auto_posted: bool,
    /// Auto-posting was configured but the organization's budget was spent.
    pub rate_limited: bool,
    pub publish: PublishOutcome,
}

#[derive(Debug, Clone)]
pub enum TriggerOutcome {
    NotDispatched(SkipReason),
    Dispatched(Dispatch),
}

pub struct AutopilotDispatcher {
    db: Database,
    generator: Arc<dyn SuggestionGenerator>,
    publisher: Arc<dyn Publisher>,
    limiter: Arc<dyn RateLimiter>,
}

impl AutopilotDispatcher {
    pub fn new(
        db: Database,
        generator: Arc<dyn SuggestionGenerator>,
        publisher: Arc<dyn Publisher>,
        limiter: Arc<dyn RateLimiter>,
    ) -> Self {
        Self {
            db,
            generator,
            publisher,
            limiter,
        }
    }

    /// Template content and the post-log rate limiter.
    pub fn with_publisher(db: Database, publisher: Arc<dyn Publisher>) -> Self {
        let limiter = Arc::new(PostLogRateLimiter::new(db.clone()));
        Self::new(db, Arc::new(TemplateGenerator), publisher, limiter)
    }

    /// Handles one trigger event for an organization.
    ///
    /// Errors only cover the primary path (settings, rate-limit lookup,
    /// generation, storing the suggestion).
    pub async fn handle_trigger(
        &self,
        organization_id: Uuid,
        trigger_type: TriggerType,
        data: Value,
    ) -> anyhow::Result<TriggerOutcome> {
        let settings = match self.db.get_autopilot_settings(organization_id)? {
            Some(settings) if settings.enabled => settings,
            _ => {
                tracing::debug!(%organization_id, "Autopilot not enabled, ignoring trigger");
                return Ok(TriggerOutcome::NotDispatched(SkipReason::AutopilotDisabled));
            }
        };

        if !settings.trigger_enabled(trigger_type) {
            tracing::debug!(%organization_id, trigger = trigger_type.as_str(), "Trigger not enabled");
            return Ok(TriggerOutcome::NotDispatched(SkipReason::TriggerDisabled));
        }

        let wants_auto_post = settings.approval_mode == ApprovalMode::AutoPost;
        let can_post = if wants_auto_post {
            self.limiter.can_auto_post(organization_id).await?
        } else {
            false
        };
        let should_auto_post = wants_auto_post && can_post;
        let rate_limited = wants_auto_post && !can_post;
        if rate_limited {
            tracing::info!(%organization_id, "Auto-post budget spent, suggestion will wait for approval");
        }

        let brand_name = self.db.get_brand(organization_id)?.map(|b| b.name);
        let generated = self
            .generator
            .generate(&GenerationRequest {
                organization_id,
                trigger_type,
                data,
                brand_name,
            })
            .await?;

        let platforms: Vec<Platform> = settings.default_platforms.iter().copied().collect();
        let suggestion = self.db.create_suggestion(
            organization_id,
            CreateSuggestionInput {
                trigger_type,
                content: generated.content,
                image_url: generated.image_url,
                suggested_platforms: platforms,
                status: if should_auto_post {
                    SuggestionStatus::Approved
                } else {
                    SuggestionStatus::Pending
                },
            },
        )?;
        tracing::info!(
            %organization_id,
            suggestion_id = %suggestion.id,
            trigger = trigger_type.as_str(),
            auto_post = should_auto_post,
            "Created social suggestion"
        );

        let publish = if !should_auto_post {
            PublishOutcome::NotAttempted
        } else if settings.default_platforms.is_empty() {
            tracing::warn!(
                %organization_id,
                suggestion_id = %suggestion.id,
                "Auto-post requested but no default platforms configured"
            );
            PublishOutcome::Skipped("no default platforms configured".into())
        } else {
            match self.publish(&suggestion, &settings.default_platforms).await {
                Ok(entry) => PublishOutcome::Posted(entry),
                Err(err) => {
                    tracing::error!(
                        %organization_id,
                        suggestion_id = %suggestion.id,
                        error = %err,
                        "Auto-post failed, suggestion left for manual publishing"
                    );
                    PublishOutcome::Failed(err.to_string())
                }
            }
        };

        let mut suggestion = suggestion;
        if let PublishOutcome::Posted(entry) = &publish {
            suggestion.status = SuggestionStatus::Posted;
            suggestion.post_id = Some(entry.post_id.clone());
            suggestion.post_platforms = entry.platforms.clone();
            suggestion.posted_at = Some(entry.created_at);
            suggestion.updated_at = entry.created_at;
        }

        Ok(TriggerOutcome::Dispatched(Dispatch {
            suggestion,
            auto_posted: should_auto_post,
            rate_limited,
            publish,
        }))
    }

    /// Publishes a reviewed suggestion to its suggested platforms, falling
    /// back to the organization's defaults.
    pub async fn approve(
        &self,
        organization_id: Uuid,
        suggestion_id: Uuid,
    ) -> Result<SocialSuggestion, AutopilotError> {
        let suggestion = self
            .db
            .get_suggestion(organization_id, suggestion_id)?
            .ok_or(AutopilotError::NotFound)?;
        if suggestion.status.is_terminal() {
            return Err(AutopilotError::InvalidState(suggestion.status));
        }

        let mut platforms: BTreeSet<Platform> = suggestion.suggested_platforms.iter().copied().collect();
        if platforms.is_empty() {
            if let Some(settings) = self.db.get_autopilot_settings(organization_id)? {
                platforms = settings.default_platforms;
            }
        }
        if platforms.is_empty() {
            return Err(AutopilotError::NoPlatforms);
        }

        self.publish(&suggestion, &platforms).await?;
        tracing::info!(%organization_id, %suggestion_id, "Published approved suggestion");

        self.db
            .get_suggestion(organization_id, suggestion_id)?
            .ok_or(AutopilotError::NotFound)
    }

    pub fn dismiss(
        &self,
        organization_id: Uuid,
        suggestion_id: Uuid,
    ) -> Result<SocialSuggestion, AutopilotError> {
        let suggestion = self
            .db
            .get_suggestion(organization_id, suggestion_id)?
            .ok_or(AutopilotError::NotFound)?;
        if suggestion.status.is_terminal() {
            return Err(AutopilotError::InvalidState(suggestion.status));
        }

        if !self.db.dismiss_suggestion(organization_id, suggestion_id)? {
            // Lost a race with another transition; report what it became.
            let current = self
                .db
                .get_suggestion(organization_id, suggestion_id)?
                .ok_or(AutopilotError::NotFound)?;
            return Err(AutopilotError::InvalidState(current.status));
        }

        self.db
            .get_suggestion(organization_id, suggestion_id)?
            .ok_or(AutopilotError::NotFound)
    }

    async fn publish(
        &self,
        suggestion: &SocialSuggestion,
        platforms: &BTreeSet<Platform>,
    ) -> Result<PostLogEntry, AutopilotError> {
        let organization_id = suggestion.organization_id;

        let integrations = self.publisher.list_integrations(organization_id).await?;
        let targets: Vec<_> = integrations
            .iter()
            .filter(|i| !i.disabled && i.platform.is_some_and(|p| platforms.contains(&p)))
            .collect();
        let Some(first) = targets.first() else {
            return Err(PublishError::NoMatchingIntegration(platforms.iter().copied().collect()).into());
        };

        let publish_at = self.publisher.find_next_slot(organization_id, &first.id).await?;
        let post_id = self
            .publisher
            .create_post(
                organization_id,
                &NewPost {
                    content: suggestion.content.clone(),
                    image_url: suggestion.image_url.clone(),
                    integration_ids: targets.iter().map(|i| i.id.clone()).collect(),
                    publish_at,
                },
            )
            .await?;

        let posted_to: Vec<Platform> = targets
            .iter()
            .filter_map(|i| i.platform)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Ok(self
            .db
            .record_post(organization_id, suggestion.id, &post_id, &posted_to)?)
    }
}
