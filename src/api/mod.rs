//! HTTP API.
//!
//! Per-user flywheel routes and organization-scoped suggestion routes take
//! the caller from a session token. The trigger webhook is authenticated
//! with a shared secret instead.

mod auth;
mod error;
mod flywheel;
mod social;

use std::sync::Arc;

use axum::{
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::TokenService;
use crate::autopilot::AutopilotDispatcher;
use crate::db::Database;

pub use error::{ApiError, ApiResult};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub tokens: TokenService,
    pub trigger_secret: Arc<str>,
    pub dispatcher: Arc<AutopilotDispatcher>,
}

impl AppState {
    pub fn new(
        db: Database,
        tokens: TokenService,
        trigger_secret: impl Into<Arc<str>>,
        dispatcher: AutopilotDispatcher,
    ) -> Self {
        Self {
            db,
            tokens,
            trigger_secret: trigger_secret.into(),
            dispatcher: Arc::new(dispatcher),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        // Flywheel
        .route("/flywheel", delete(flywheel::reset))
        .route("/flywheel/phases", get(flywheel::get_phases))
        .route("/flywheel/phases/{phase}", patch(flywheel::update_phase))
        .route("/flywheel/guided", get(flywheel::guided))
        .route("/flywheel/activate", post(flywheel::activate))
        // Social autopilot
        .route("/social/trigger", post(social::trigger))
        .route("/social/suggestions", get(social::list_suggestions))
        .route("/social/suggestions/{id}/approve", post(social::approve))
        .route("/social/suggestions/{id}/dismiss", post(social::dismiss))
        .route(
            "/social/autopilot",
            get(social::get_settings).put(social::update_settings),
        )
        // Auth
        .route("/auth/auto-login", post(auth::auto_login))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
