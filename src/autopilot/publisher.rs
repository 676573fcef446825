//! Publishing collaborator.
//!
//! Social posts go out through a Postiz instance: list the organization's
//! connected integrations, ask for the next free slot, then create the post.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::Platform;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("publishing is not configured")]
    NotConfigured,

    #[error("no connected integration for platforms {0:?}")]
    NoMatchingIntegration(Vec<Platform>),

    #[error("publishing request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("publishing API returned {status}: {message}")]
    Api { status: u16, message: String },
}

/// A connected social account on the publishing side.
#[derive(Debug, Clone, PartialEq)]
pub struct Integration {
    pub id: String,
    pub name: String,
    /// `None` for providers this service does not post to.
    pub platform: Option<Platform>,
    pub disabled: bool,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub content: String,
    pub image_url: Option<String>,
    pub integration_ids: Vec<String>,
    pub publish_at: DateTime<Utc>,
}

#[async_trait]
pub trait Publisher: Send + Sync {
    async fn list_integrations(&self, organization_id: Uuid) -> Result<Vec<Integration>, PublishError>;

    async fn find_next_slot(
        &self,
        organization_id: Uuid,
        integration_id: &str,
    ) -> Result<DateTime<Utc>, PublishError>;

    /// Returns the publishing side's post id.
    async fn create_post(&self, organization_id: Uuid, post: &NewPost) -> Result<String, PublishError>;
}

/// Stand-in used when no publishing backend is configured.
pub struct DisabledPublisher;

#[async_trait]
impl Publisher for DisabledPublisher {
    async fn list_integrations(&self, _: Uuid) -> Result<Vec<Integration>, PublishError> {
        Err(PublishError::NotConfigured)
    }

    async fn find_next_slot(&self, _: Uuid, _: &str) -> Result<DateTime<Utc>, PublishError> {
        Err(PublishError::NotConfigured)
    }

    async fn create_post(&self, _: Uuid, _: &NewPost) -> Result<String, PublishError> {
        Err(PublishError::NotConfigured)
    }
}

/// Client for the Postiz public API.
pub struct PostizClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct PostizIntegration {
    id: String,
    name: String,
    identifier: String,
    #[serde(default)]
    disabled: bool,
}

#[derive(Debug, Deserialize)]
struct PostizSlot {
    date: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PostizCreatePost<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    date: DateTime<Utc>,
    short_link: bool,
    tags: Vec<String>,
    posts: Vec<PostizPostItem<'a>>,
}

#[derive(Debug, Serialize)]
struct PostizPostItem<'a> {
    integration: PostizIntegrationRef<'a>,
    value: Vec<PostizPostValue<'a>>,
    settings: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct PostizIntegrationRef<'a> {
    id: &'a str,
}

#[derive(Debug, Serialize)]
struct PostizPostValue<'a> {
    content: &'a str,
    image: Vec<PostizImage<'a>>,
}

#[derive(Debug, Serialize)]
struct PostizImage<'a> {
    id: String,
    path: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostizCreated {
    post_id: String,
}

impl PostizClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, PublishError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/public/v1{}", self.base_url, path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, PublishError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(PublishError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl Publisher for PostizClient {
    async fn list_integrations(&self, organization_id: Uuid) -> Result<Vec<Integration>, PublishError> {
        tracing::debug!(%organization_id, "Listing Postiz integrations");
        let response = self
            .http
            .get(self.url("/integrations"))
            .header(reqwest::header::AUTHORIZATION, &self.api_key)
            .send()
            .await?;
        let integrations: Vec<PostizIntegration> = Self::check(response).await?.json().await?;

        Ok(integrations
            .into_iter()
            .map(|i| Integration {
                platform: platform_for_identifier(&i.identifier),
                id: i.id,
                name: i.name,
                disabled: i.disabled,
            })
            .collect())
    }

    async fn find_next_slot(
        &self,
        organization_id: Uuid,
        integration_id: &str,
    ) -> Result<DateTime<Utc>, PublishError> {
        tracing::debug!(%organization_id, integration_id, "Finding next Postiz slot");
        let response = self
            .http
            .get(self.url(&format!("/find-slot/{}", integration_id)))
            .header(reqwest::header::AUTHORIZATION, &self.api_key)
            .send()
            .await?;
        let slot: PostizSlot = Self::check(response).await?.json().await?;
        Ok(slot.date)
    }

    async fn create_post(&self, organization_id: Uuid, post: &NewPost) -> Result<String, PublishError> {
        let image_id = Uuid::new_v4().to_string();

        let body = PostizCreatePost {
            kind: "schedule",
            date: post.publish_at,
            short_link: false,
            tags: Vec::new(),
            posts: post
                .integration_ids
                .iter()
                .map(|id| PostizPostItem {
                    integration: PostizIntegrationRef { id },
                    value: vec![PostizPostValue {
                        content: &post.content,
                        image: post
                            .image_url
                            .as_deref()
                            .map(|path| PostizImage {
                                id: image_id.clone(),
                                path,
                            })
                            .into_iter()
                            .collect(),
                    }],
                    settings: serde_json::Value::Object(Default::default()),
                })
                .collect(),
        };

        tracing::debug!(%organization_id, integrations = post.integration_ids.len(), "Creating Postiz post");
        let response = self
            .http
            .post(self.url("/posts"))
            .header(reqwest::header::AUTHORIZATION, &self.api_key)
            .json(&body)
            .send()
            .await?;
        let created: Vec<PostizCreated> = Self::check(response).await?.json().await?;

        created
            .into_iter()
            .next()
            .map(|c| c.post_id)
            .ok_or_else(|| PublishError::Api {
                status: 200,
                message: "post created without an id".into(),
            })
    }
}

/// Maps a Postiz provider identifier onto a platform.
pub fn platform_for_identifier(identifier: &str) -> Option<Platform> {
    match identifier {
        "x" | "twitter" => Some(Platform::Twitter),
        "linkedin" | "linkedin-page" => Some(Platform::Linkedin),
        "facebook" => Some(Platform::Facebook),
        "instagram" | "instagram-standalone" => Some(Platform::Instagram),
        _ => None,
    }
}
