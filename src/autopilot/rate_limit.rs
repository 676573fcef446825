//! Per-organization auto-post budget.
//!
//! The dispatcher asks a single question, `can_auto_post`, so a stricter
//! implementation can reserve the slot atomically behind the same call.
//! The default limiter does not reserve anything: two triggers racing for
//! the last slot can both be allowed.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::db::Database;
use crate::models::DEFAULT_MAX_POSTS_PER_DAY;

#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn can_auto_post(&self, organization_id: Uuid) -> anyhow::Result<bool>;
}

/// Counts post-log entries in a trailing window against the
/// organization's `maxPostsPerDay`.
pub struct PostLogRateLimiter {
    db: Database,
    window: Duration,
}

impl PostLogRateLimiter {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            window: Duration::hours(24),
        }
    }
}

#[async_trait]
impl RateLimiter for PostLogRateLimiter {
    async fn can_auto_post(&self, organization_id: Uuid) -> anyhow::Result<bool> {
        let max_posts = self
            .db
            .get_autopilot_settings(organization_id)?
            .map(|s| s.max_posts_per_day)
            .unwrap_or(DEFAULT_MAX_POSTS_PER_DAY);

        let posted = self
            .db
            .count_posts_since(organization_id, Utc::now() - self.window)?;

        tracing::debug!(%organization_id, posted, max_posts, "Checked auto-post budget");
        Ok(posted < max_posts)
    }
}
