use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};

use super::{ApiError, ApiResult, AppState};
use crate::auth::Identity;
use crate::flywheel::{build_state, merge_guided_data};
use crate::models::*;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePhaseResponse {
    success: bool,
    status: PhaseStatus,
    current_step: u32,
    overall_progress: u8,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    success: bool,
}

pub async fn get_phases(
    identity: Identity,
    State(state): State<AppState>,
) -> ApiResult<Json<FlywheelState>> {
    let progress = state.db.get_or_create_progress(identity.user_id)?;
    Ok(Json(build_state(&progress)))
}

pub async fn update_phase(
    identity: Identity,
    State(state): State<AppState>,
    Path(phase): Path<String>,
    body: Result<Json<UpdatePhaseInput>, JsonRejection>,
) -> ApiResult<Json<UpdatePhaseResponse>> {
    let phase = Phase::from_str(&phase)
        .ok_or_else(|| ApiError::validation("phase", format!("unknown phase '{}'", phase)))?;
    let Json(input) = body?;

    let step = input
        .current_step
        .map(|step| {
            if step < 0 {
                return Err(ApiError::validation("currentStep", "must not be negative"));
            }
            u32::try_from(step).map_err(|_| ApiError::validation("currentStep", "is too large"))
        })
        .transpose()?;

    let progress = state.db.update_phase(
        identity.user_id,
        phase,
        PhaseUpdate {
            status: input.status,
            step,
            data: input.data,
        },
    )?;

    let stored = progress.phase(phase);
    tracing::debug!(
        user_id = %identity.user_id,
        phase = phase.as_str(),
        status = stored.status.as_str(),
        overall_progress = progress.overall_progress,
        "Updated flywheel phase"
    );

    Ok(Json(UpdatePhaseResponse {
        success: true,
        status: stored.status,
        current_step: stored.step,
        overall_progress: progress.overall_progress,
    }))
}

/// Flattened phase data for guided mode, with the organization's brand on top.
pub async fn guided(
    identity: Identity,
    State(state): State<AppState>,
) -> ApiResult<Json<Map<String, Value>>> {
    let progress = state.db.get_or_create_progress(identity.user_id)?;
    let brand = match identity.organization_id {
        Some(organization_id) => state.db.get_brand(organization_id)?,
        None => None,
    };

    Ok(Json(merge_guided_data(&progress, brand.as_ref())))
}

pub async fn activate(
    identity: Identity,
    State(state): State<AppState>,
) -> ApiResult<Json<FlywheelState>> {
    match state.db.activate_flywheel(identity.user_id)? {
        ActivationResult::Activated(progress) => Ok(Json(build_state(&progress))),
        ActivationResult::Blocked(incomplete) => Err(ApiError::Blocked(incomplete)),
    }
}

pub async fn reset(
    identity: Identity,
    State(state): State<AppState>,
) -> ApiResult<Json<ResetResponse>> {
    let removed = state.db.reset_progress(identity.user_id)?;
    tracing::info!(user_id = %identity.user_id, removed, "Reset flywheel progress");
    Ok(Json(ResetResponse { success: true }))
}
