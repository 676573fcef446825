use anyhow::{anyhow, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{
    from_json, parse_enum, parse_optional_timestamp, parse_timestamp, timestamp, to_json, Database,
};
use crate::models::*;

const SUGGESTION_COLUMNS: &str = "id, organization_id, trigger_type, content, image_url,
    suggested_platforms, post_platforms, status, post_id, posted_at, dismissed_at,
    created_at, updated_at";

impl Database {
    pub fn create_suggestion(
        &self,
        organization_id: Uuid,
        input: CreateSuggestionInput,
    ) -> Result<SocialSuggestion> {
        let now = Utc::now();
        let suggestion = SocialSuggestion {
            id: Uuid::new_v4(),
            organization_id,
            trigger_type: input.trigger_type,
            content: input.content,
            image_url: input.image_url,
            suggested_platforms: input.suggested_platforms,
            post_platforms: Vec::new(),
            status: input.status,
            post_id: None,
            posted_at: None,
            dismissed_at: None,
            created_at: now,
            updated_at: now,
        };

        self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO social_suggestions (id, organization_id, trigger_type, content,
                    image_url, suggested_platforms, post_platforms, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, '[]', ?7, ?8, ?8)",
                params![
                    suggestion.id.to_string(),
                    organization_id.to_string(),
                    suggestion.trigger_type.as_str(),
                    suggestion.content,
                    suggestion.image_url,
                    to_json(&suggestion.suggested_platforms)?,
                    suggestion.status.as_str(),
                    timestamp(now),
                ],
            )?;
            Ok(())
        })?;

        Ok(suggestion)
    }

    /// Looks a suggestion up within its organization only.
    pub fn get_suggestion(&self, organization_id: Uuid, id: Uuid) -> Result<Option<SocialSuggestion>> {
        self.with_connection(|conn| load_suggestion(conn, organization_id, id))
    }

    /// Newest first, optionally filtered by status.
    pub fn list_suggestions(
        &self,
        organization_id: Uuid,
        status: Option<SuggestionStatus>,
    ) -> Result<Vec<SocialSuggestion>> {
        self.with_connection(|conn| {
            let sql = format!(
                "SELECT {} FROM social_suggestions
                 WHERE organization_id = ?1 AND (?2 IS NULL OR status = ?2)
                 ORDER BY created_at DESC, rowid DESC",
                SUGGESTION_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(
                params![organization_id.to_string(), status.map(|s| s.as_str())],
                read_suggestion_row,
            )?;

            let mut suggestions = Vec::new();
            for row in rows {
                suggestions.push(row?.into_suggestion()?);
            }
            Ok(suggestions)
        })
    }

    /// Marks a suggestion posted and appends the post-log entry in one
    /// transaction. Fails if the suggestion is already posted or dismissed.
    pub fn record_post(
        &self,
        organization_id: Uuid,
        suggestion_id: Uuid,
        post_id: &str,
        platforms: &[Platform],
    ) -> Result<PostLogEntry> {
        self.with_connection(|conn| {
            let tx = conn.transaction()?;
            let now = Utc::now();

            let updated = tx.execute(
                "UPDATE social_suggestions
                 SET status = 'POSTED', post_id = ?3, post_platforms = ?4, posted_at = ?5, updated_at = ?5
                 WHERE id = ?1 AND organization_id = ?2 AND status IN ('PENDING', 'APPROVED')",
                params![
                    suggestion_id.to_string(),
                    organization_id.to_string(),
                    post_id,
                    to_json(&platforms)?,
                    timestamp(now),
                ],
            )?;
            if updated == 0 {
                return Err(anyhow!(
                    "suggestion {} is not awaiting publication",
                    suggestion_id
                ));
            }

            let entry = PostLogEntry {
                id: Uuid::new_v4(),
                organization_id,
                suggestion_id,
                post_id: post_id.to_string(),
                platforms: platforms.to_vec(),
                created_at: now,
            };
            tx.execute(
                "INSERT INTO post_log (id, organization_id, suggestion_id, post_id, platforms, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    entry.id.to_string(),
                    organization_id.to_string(),
                    suggestion_id.to_string(),
                    entry.post_id,
                    to_json(&entry.platforms)?,
                    timestamp(now),
                ],
            )?;

            tx.commit()?;
            Ok(entry)
        })
    }

    /// Returns `false` when the suggestion does not exist or is already in a
    /// terminal state.
    pub fn dismiss_suggestion(&self, organization_id: Uuid, id: Uuid) -> Result<bool> {
        self.with_connection(|conn| {
            let now = timestamp(Utc::now());
            let updated = conn.execute(
                "UPDATE social_suggestions
                 SET status = 'DISMISSED', dismissed_at = ?3, updated_at = ?3
                 WHERE id = ?1 AND organization_id = ?2 AND status IN ('PENDING', 'APPROVED')",
                params![id.to_string(), organization_id.to_string(), now],
            )?;
            Ok(updated > 0)
        })
    }

    pub fn list_post_log(&self, organization_id: Uuid) -> Result<Vec<PostLogEntry>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, suggestion_id, post_id, platforms, created_at
                 FROM post_log WHERE organization_id = ?1 ORDER BY created_at DESC",
            )?;
            let rows = stmt.query_map(params![organization_id.to_string()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?;

            let mut entries = Vec::new();
            for row in rows {
                let (id, suggestion_id, post_id, platforms, created_at) = row?;
                entries.push(PostLogEntry {
                    id: Uuid::parse_str(&id)?,
                    organization_id,
                    suggestion_id: Uuid::parse_str(&suggestion_id)?,
                    post_id,
                    platforms: from_json(&platforms)?,
                    created_at: parse_timestamp(&created_at)?,
                });
            }
            Ok(entries)
        })
    }
}

fn load_suggestion(
    conn: &Connection,
    organization_id: Uuid,
    id: Uuid,
) -> Result<Option<SocialSuggestion>> {
    let sql = format!(
        "SELECT {} FROM social_suggestions WHERE id = ?1 AND organization_id = ?2",
        SUGGESTION_COLUMNS
    );
    conn.query_row(
        &sql,
        params![id.to_string(), organization_id.to_string()],
        read_suggestion_row,
    )
    .optional()?
    .map(SuggestionRow::into_suggestion)
    .transpose()
}

/// Raw column values; decoding happens outside the rusqlite callback so
/// errors carry context.
struct SuggestionRow {
    id: String,
    organization_id: String,
    trigger_type: String,
    content: String,
    image_url: Option<String>,
    suggested_platforms: String,
    post_platforms: String,
    status: String,
    post_id: Option<String>,
    posted_at: Option<String>,
    dismissed_at: Option<String>,
    created_at: String,
    updated_at: String,
}

fn read_suggestion_row(row: &Row<'_>) -> rusqlite::Result<SuggestionRow> {
    Ok(SuggestionRow {
        id: row.get(0)?,
        organization_id: row.get(1)?,
        trigger_type: row.get(2)?,
        content: row.get(3)?,
        image_url: row.get(4)?,
        suggested_platforms: row.get(5)?,
        post_platforms: row.get(6)?,
        status: row.get(7)?,
        post_id: row.get(8)?,
        posted_at: row.get(9)?,
        dismissed_at: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

impl SuggestionRow {
    fn into_suggestion(self) -> Result<SocialSuggestion> {
        Ok(SocialSuggestion {
            id: Uuid::parse_str(&self.id)?,
            organization_id: Uuid::parse_str(&self.organization_id)?,
            trigger_type: parse_enum(&self.trigger_type, TriggerType::from_str, "trigger type")?,
            content: self.content,
            image_url: self.image_url,
            suggested_platforms: from_json(&self.suggested_platforms)?,
            post_platforms: from_json(&self.post_platforms)?,
            status: parse_enum(&self.status, SuggestionStatus::from_str, "suggestion status")?,
            post_id: self.post_id,
            posted_at: parse_optional_timestamp(self.posted_at)?,
            dismissed_at: parse_optional_timestamp(self.dismissed_at)?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}
