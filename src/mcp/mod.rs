use std::sync::Arc;

use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerInfo},
    tool, tool_handler, tool_router,
    schemars::JsonSchema,
    ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::autopilot::{AutopilotDispatcher, PublishOutcome, TriggerOutcome};
use crate::db::Database;
use crate::flywheel::build_state;
use crate::models::*;

#[derive(Clone)]
pub struct McpServer {
    db: Database,
    dispatcher: Arc<AutopilotDispatcher>,
    tool_router: ToolRouter<Self>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetFlywheelStateRequest {
    #[schemars(description = "The user whose flywheel to read")]
    pub user_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdatePhaseRequest {
    #[schemars(description = "The user whose flywheel to update")]
    pub user_id: String,
    #[schemars(description = "Phase name: UNDERSTAND, CREATE, DISTRIBUTE, LEARN or AUTOMATE")]
    pub phase: String,
    #[schemars(description = "New status: NOT_STARTED, IN_PROGRESS or COMPLETED")]
    #[serde(default)]
    pub status: Option<String>,
    #[schemars(description = "Current step within the phase")]
    #[serde(default)]
    pub current_step: Option<u32>,
    #[schemars(description = "Opaque phase data, replaces the stored payload")]
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TriggerAutopilotRequest {
    #[schemars(description = "The organization the event belongs to")]
    pub organization_id: String,
    #[schemars(description = "LEAD_CONVERTED, FIVE_STAR_CALL, WEEKLY_CONTENT or MANUAL")]
    pub trigger_type: String,
    #[schemars(description = "Event payload used to write the suggestion")]
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerSummary {
    pub dispatched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<SocialSuggestion>,
    pub auto_posted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_error: Option<String>,
}

impl McpServer {
    pub fn new(db: Database, dispatcher: Arc<AutopilotDispatcher>) -> Self {
        Self {
            db,
            dispatcher,
            tool_router: Self::tool_router(),
        }
    }

    fn parse_uuid(s: &str) -> Result<Uuid, McpError> {
        Uuid::parse_str(s)
            .map_err(|e| McpError::invalid_params(format!("Invalid UUID: {}", e), None))
    }

    fn to_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }
}

#[tool_router]
impl McpServer {
    #[tool(description = "Get the flywheel state of a user: every phase with its status, step, data and blockers")]
    async fn get_flywheel_state(
        &self,
        params: Parameters<GetFlywheelStateRequest>,
    ) -> Result<CallToolResult, McpError> {
        let user_id = Self::parse_uuid(&params.0.user_id)?;

        let progress = self.db.get_or_create_progress(user_id)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        Self::to_json(&build_state(&progress))
    }

    #[tool(description = "Update the status, step or data of one flywheel phase")]
    async fn update_phase(
        &self,
        params: Parameters<UpdatePhaseRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let user_id = Self::parse_uuid(&req.user_id)?;
        let phase = Phase::from_str(&req.phase)
            .ok_or_else(|| McpError::invalid_params(format!("Unknown phase: {}", req.phase), None))?;
        let status = req
            .status
            .as_deref()
            .map(|s| {
                PhaseStatus::from_str(s)
                    .ok_or_else(|| McpError::invalid_params(format!("Unknown status: {}", s), None))
            })
            .transpose()?;

        let progress = self.db.update_phase(user_id, phase, PhaseUpdate {
            status,
            step: req.current_step,
            data: req.data,
        })
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        Self::to_json(&build_state(&progress))
    }

    #[tool(description = "Fire an autopilot trigger for an organization, creating a social suggestion if enabled")]
    async fn trigger_autopilot(
        &self,
        params: Parameters<TriggerAutopilotRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let organization_id = Self::parse_uuid(&req.organization_id)?;
        let trigger_type = TriggerType::from_str(&req.trigger_type)
            .ok_or_else(|| McpError::invalid_params(format!("Unknown trigger type: {}", req.trigger_type), None))?;

        let outcome = self
            .dispatcher
            .handle_trigger(organization_id, trigger_type, req.data.unwrap_or(Value::Null))
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        let summary = match outcome {
            TriggerOutcome::NotDispatched(skip) => TriggerSummary {
                dispatched: false,
                suggestion: None,
                auto_posted: false,
                reason: Some(skip.message().to_string()),
                publish_error: None,
            },
            TriggerOutcome::Dispatched(dispatch) => TriggerSummary {
                dispatched: true,
                auto_posted: dispatch.auto_posted,
                reason: dispatch.rate_limited.then(|| "Rate limited".to_string()),
                publish_error: match dispatch.publish {
                    PublishOutcome::Failed(reason) | PublishOutcome::Skipped(reason) => Some(reason),
                    PublishOutcome::NotAttempted | PublishOutcome::Posted(_) => None,
                },
                suggestion: Some(dispatch.suggestion),
            },
        };

        Self::to_json(&summary)
    }
}

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some("Epic AI MCP server for the marketing flywheel and social autopilot".into()),
            ..Default::default()
        }
    }
}

pub async fn run_stdio_server(db: Database, dispatcher: Arc<AutopilotDispatcher>) -> anyhow::Result<()> {
    use tokio::io::{stdin, stdout};

    tracing::info!("Starting MCP server via stdio");

    let service = McpServer::new(db, dispatcher);
    let server = service.serve((stdin(), stdout())).await?;

    let quit_reason = server.waiting().await?;
    tracing::info!("MCP server stopped: {:?}", quit_reason);

    Ok(())
}
