#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use uuid::Uuid;

use epic_ai::api::{create_router, AppState};
use epic_ai::auth::{SsoClaims, TokenService};
use epic_ai::autopilot::publisher::{Integration, NewPost, PublishError, Publisher};
use epic_ai::autopilot::AutopilotDispatcher;
use epic_ai::db::Database;
use epic_ai::models::*;

pub const SESSION_SECRET: &str = "test-session-secret-0123456789abcdefghij";
pub const SSO_SECRET: &str = "test-sso-secret-0123456789abcdefghijklmno";
pub const TRIGGER_SECRET: &str = "test-trigger-secret";

pub const TRIGGER_HEADER: HeaderName = HeaderName::from_static("x-trigger-secret");

pub fn trigger_secret() -> HeaderValue {
    HeaderValue::from_static(TRIGGER_SECRET)
}

/// Publisher that accepts every post and remembers it.
pub struct RecordingPublisher {
    integrations: Vec<Integration>,
    pub posts: Mutex<Vec<NewPost>>,
}

impl RecordingPublisher {
    pub fn new(platforms: &[Platform]) -> Self {
        let integrations = platforms
            .iter()
            .enumerate()
            .map(|(i, platform)| Integration {
                id: format!("integration-{}", i),
                name: platform.as_str().to_string(),
                platform: Some(*platform),
                disabled: false,
            })
            .collect();

        Self {
            integrations,
            posts: Mutex::new(Vec::new()),
        }
    }

    pub fn post_count(&self) -> usize {
        self.posts.lock().unwrap().len()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn list_integrations(&self, _: Uuid) -> Result<Vec<Integration>, PublishError> {
        Ok(self.integrations.clone())
    }

    async fn find_next_slot(&self, _: Uuid, _: &str) -> Result<DateTime<Utc>, PublishError> {
        Ok(Utc::now() + Duration::minutes(10))
    }

    async fn create_post(&self, _: Uuid, post: &NewPost) -> Result<String, PublishError> {
        let mut posts = self.posts.lock().unwrap();
        posts.push(post.clone());
        Ok(format!("post-{}", posts.len()))
    }
}

/// Publisher whose API is always down.
pub struct FailingPublisher;

#[async_trait]
impl Publisher for FailingPublisher {
    async fn list_integrations(&self, _: Uuid) -> Result<Vec<Integration>, PublishError> {
        Err(PublishError::Api {
            status: 503,
            message: "service unavailable".into(),
        })
    }

    async fn find_next_slot(&self, _: Uuid, _: &str) -> Result<DateTime<Utc>, PublishError> {
        unreachable!("no integrations are ever listed")
    }

    async fn create_post(&self, _: Uuid, _: &NewPost) -> Result<String, PublishError> {
        unreachable!("no integrations are ever listed")
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub db: Database,
    pub tokens: TokenService,
}

impl TestApp {
    pub fn new(publisher: Arc<dyn Publisher>) -> Self {
        let db = Database::open_memory().expect("Failed to create test database");
        let tokens = TokenService::new(SESSION_SECRET.into(), SSO_SECRET.into(), 3600)
            .expect("Failed to create token service");
        let dispatcher = AutopilotDispatcher::with_publisher(db.clone(), publisher);

        let state = AppState::new(db.clone(), tokens.clone(), TRIGGER_SECRET, dispatcher);
        let server = TestServer::new(create_router(state)).expect("Failed to start test server");

        Self { server, db, tokens }
    }

    pub fn with_recording(platforms: &[Platform]) -> (Self, Arc<RecordingPublisher>) {
        let publisher = Arc::new(RecordingPublisher::new(platforms));
        (Self::new(publisher.clone()), publisher)
    }

    /// A provisioned user and a session token for them.
    pub fn login(&self, email: &str, organization_id: Option<Uuid>) -> (User, String) {
        let (user, _) = self
            .db
            .provision_user(ProvisionUserInput {
                email: email.into(),
                name: None,
                organization_id,
            })
            .expect("Failed to provision user");
        let token = self.tokens.issue_session(&user).expect("Failed to issue session");
        (user, token)
    }

    pub fn enable_autopilot(&self, organization_id: Uuid, input: UpdateAutopilotSettingsInput) -> AutopilotSettings {
        self.db
            .upsert_autopilot_settings(
                organization_id,
                UpdateAutopilotSettingsInput {
                    enabled: Some(true),
                    ..input
                },
            )
            .expect("Failed to save autopilot settings")
    }
}

pub fn sso_token(secret: &str, email: &str, organization_id: Option<Uuid>, expires_in: Duration) -> String {
    let claims = SsoClaims {
        email: email.into(),
        name: Some("SSO User".into()),
        organization_id,
        exp: (Utc::now() + expires_in).timestamp() as u64,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("Failed to sign SSO token")
}
