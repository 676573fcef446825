use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{ApiError, ApiResult, AppState};
use crate::auth::{secret_matches, Identity};
use crate::autopilot::{PublishOutcome, TriggerOutcome};
use crate::models::*;

pub const TRIGGER_SECRET_HEADER: &str = "x-trigger-secret";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRequest {
    organization_id: Uuid,
    trigger_type: TriggerType,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestion_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    auto_posted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListSuggestionsQuery {
    status: Option<String>,
}

/// Internal webhook fired by business events. The shared secret is checked
/// before the body is looked at.
pub async fn trigger(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<TriggerResponse>> {
    let presented = headers
        .get(TRIGGER_SECRET_HEADER)
        .and_then(|value| value.to_str().ok());
    if !secret_matches(&state.trigger_secret, presented) {
        tracing::warn!("Rejected autopilot trigger with a bad secret");
        return Err(ApiError::Unauthenticated);
    }

    let request: TriggerRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::validation("body", e.to_string()))?;

    let outcome = state
        .dispatcher
        .handle_trigger(request.organization_id, request.trigger_type, request.data)
        .await?;

    let response = match outcome {
        TriggerOutcome::NotDispatched(skip) => TriggerResponse {
            success: false,
            reason: Some(skip.message().to_string()),
            ..Default::default()
        },
        TriggerOutcome::Dispatched(dispatch) => {
            if let PublishOutcome::Failed(reason) | PublishOutcome::Skipped(reason) = &dispatch.publish {
                tracing::debug!(
                    suggestion_id = %dispatch.suggestion.id,
                    reason = reason.as_str(),
                    "Trigger succeeded without publishing"
                );
            }
            TriggerResponse {
                success: true,
                suggestion_id: Some(dispatch.suggestion.id),
                auto_posted: Some(dispatch.auto_posted),
                reason: dispatch.rate_limited.then(|| "Rate limited".to_string()),
            }
        }
    };

    Ok(Json(response))
}

pub async fn list_suggestions(
    identity: Identity,
    State(state): State<AppState>,
    query: Result<Query<ListSuggestionsQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<SocialSuggestion>>> {
    let organization_id = identity.organization()?;
    let Query(query) = query?;

    let status = query
        .status
        .as_deref()
        .map(|s| {
            SuggestionStatus::from_str(&s.to_ascii_uppercase())
                .ok_or_else(|| ApiError::validation("status", format!("unknown status '{}'", s)))
        })
        .transpose()?;

    Ok(Json(state.db.list_suggestions(organization_id, status)?))
}

pub async fn approve(
    identity: Identity,
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<SocialSuggestion>> {
    let organization_id = identity.organization()?;
    let Path(id) = id?;

    let suggestion = state.dispatcher.approve(organization_id, id).await?;
    Ok(Json(suggestion))
}

pub async fn dismiss(
    identity: Identity,
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<SocialSuggestion>> {
    let organization_id = identity.organization()?;
    let Path(id) = id?;

    let suggestion = state.dispatcher.dismiss(organization_id, id)?;
    tracing::info!(%organization_id, suggestion_id = %id, "Dismissed suggestion");
    Ok(Json(suggestion))
}

/// Stored settings, or the disabled defaults when none were saved yet.
pub async fn get_settings(
    identity: Identity,
    State(state): State<AppState>,
) -> ApiResult<Json<AutopilotSettings>> {
    let organization_id = identity.organization()?;

    let settings = state
        .db
        .get_autopilot_settings(organization_id)?
        .unwrap_or_else(|| AutopilotSettings::disabled(organization_id, Utc::now()));
    Ok(Json(settings))
}

pub async fn update_settings(
    identity: Identity,
    State(state): State<AppState>,
    body: Result<Json<UpdateAutopilotSettingsInput>, JsonRejection>,
) -> ApiResult<Json<AutopilotSettings>> {
    let organization_id = identity.organization()?;
    let Json(input) = body?;

    if input.max_posts_per_day == Some(0) {
        return Err(ApiError::validation("maxPostsPerDay", "must be at least 1"));
    }

    let settings = state.db.upsert_autopilot_settings(organization_id, input)?;
    tracing::info!(
        %organization_id,
        enabled = settings.enabled,
        approval_mode = settings.approval_mode.as_str(),
        "Updated autopilot settings"
    );
    Ok(Json(settings))
}
