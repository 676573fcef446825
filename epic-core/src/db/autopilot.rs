use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{from_json, parse_enum, parse_timestamp, timestamp, to_json, Database};
use crate::models::*;

impl Database {
    pub fn get_autopilot_settings(&self, organization_id: Uuid) -> Result<Option<AutopilotSettings>> {
        self.with_connection(|conn| load_settings(conn, organization_id))
    }

    /// Applies a partial update, starting from disabled defaults when the
    /// organization has no settings yet.
    pub fn upsert_autopilot_settings(
        &self,
        organization_id: Uuid,
        input: UpdateAutopilotSettingsInput,
    ) -> Result<AutopilotSettings> {
        self.with_connection(|conn| {
            let tx = conn.transaction()?;
            let now = Utc::now();

            let mut settings = load_settings(&tx, organization_id)?
                .unwrap_or_else(|| AutopilotSettings::disabled(organization_id, now));

            if let Some(enabled) = input.enabled {
                settings.enabled = enabled;
            }
            if let Some(on) = input.on_lead_converted {
                settings.on_lead_converted = on;
            }
            if let Some(on) = input.on_five_star_call {
                settings.on_five_star_call = on;
            }
            if let Some(on) = input.on_weekly_schedule {
                settings.on_weekly_schedule = on;
            }
            if let Some(mode) = input.approval_mode {
                settings.approval_mode = mode;
            }
            if let Some(platforms) = input.default_platforms {
                settings.default_platforms = platforms;
            }
            if let Some(max) = input.max_posts_per_day {
                settings.max_posts_per_day = max;
            }
            settings.updated_at = now;

            tx.execute(
                "INSERT INTO autopilot_settings (organization_id, enabled, on_lead_converted,
                    on_five_star_call, on_weekly_schedule, approval_mode, default_platforms,
                    max_posts_per_day, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(organization_id) DO UPDATE SET
                    enabled = excluded.enabled,
                    on_lead_converted = excluded.on_lead_converted,
                    on_five_star_call = excluded.on_five_star_call,
                    on_weekly_schedule = excluded.on_weekly_schedule,
                    approval_mode = excluded.approval_mode,
                    default_platforms = excluded.default_platforms,
                    max_posts_per_day = excluded.max_posts_per_day,
                    updated_at = excluded.updated_at",
                params![
                    organization_id.to_string(),
                    settings.enabled,
                    settings.on_lead_converted,
                    settings.on_five_star_call,
                    settings.on_weekly_schedule,
                    settings.approval_mode.as_str(),
                    to_json(&settings.default_platforms)?,
                    settings.max_posts_per_day,
                    timestamp(now),
                ],
            )?;

            tx.commit()?;
            Ok(settings)
        })
    }

    /// Number of publications logged for the organization at or after `since`.
    pub fn count_posts_since(&self, organization_id: Uuid, since: DateTime<Utc>) -> Result<u32> {
        self.with_connection(|conn| {
            let count: u32 = conn.query_row(
                "SELECT COUNT(*) FROM post_log WHERE organization_id = ?1 AND created_at >= ?2",
                params![organization_id.to_string(), timestamp(since)],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }
}

fn load_settings(conn: &Connection, organization_id: Uuid) -> Result<Option<AutopilotSettings>> {
    let row = conn
        .query_row(
            "SELECT enabled, on_lead_converted, on_five_star_call, on_weekly_schedule,
                    approval_mode, default_platforms, max_posts_per_day, updated_at
             FROM autopilot_settings WHERE organization_id = ?1",
            params![organization_id.to_string()],
            |row| {
                Ok((
                    row.get::<_, bool>(0)?,
                    row.get::<_, bool>(1)?,
                    row.get::<_, bool>(2)?,
                    row.get::<_, bool>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, u32>(6)?,
                    row.get::<_, String>(7)?,
                ))
            },
        )
        .optional()?;

    let Some((enabled, lead, call, weekly, mode, platforms, max_posts, updated_at)) = row else {
        return Ok(None);
    };

    Ok(Some(AutopilotSettings {
        organization_id,
        enabled,
        on_lead_converted: lead,
        on_five_star_call: call,
        on_weekly_schedule: weekly,
        approval_mode: parse_enum(&mode, ApprovalMode::from_str, "approval mode")?,
        default_platforms: from_json(&platforms)?,
        max_posts_per_day: max_posts,
        updated_at: parse_timestamp(&updated_at)?,
    }))
}
