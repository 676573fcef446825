use anyhow::{anyhow, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{
    from_json, parse_enum, parse_optional_timestamp, parse_timestamp, timestamp, to_json, Database,
};
use crate::flywheel::aggregate;
use crate::models::*;

impl Database {
    /// Returns the user's progress record, creating it on first access.
    ///
    /// Creation is an insert-if-absent on the user key, so callers racing
    /// on a brand new user all observe the same single record.
    pub fn get_or_create_progress(&self, user_id: Uuid) -> Result<FlywheelProgress> {
        self.with_connection(|conn| {
            if ensure_progress_row(conn, user_id)? {
                tracing::debug!(%user_id, "Created flywheel progress");
            }
            load_progress(conn, user_id)?
                .ok_or_else(|| anyhow!("flywheel progress for {} vanished after insert", user_id))
        })
    }

    pub fn get_progress(&self, user_id: Uuid) -> Result<Option<FlywheelProgress>> {
        self.with_connection(|conn| load_progress(conn, user_id))
    }

    /// Writes one phase and recomputes the overall percentage in a single
    /// transaction.
    ///
    /// The percentage is recomputed on every call, whether or not the
    /// status changed. Status transitions are not checked against the
    /// dependency chain and steps are not checked against the phase's
    /// step count.
    pub fn update_phase(
        &self,
        user_id: Uuid,
        phase: Phase,
        update: PhaseUpdate,
    ) -> Result<FlywheelProgress> {
        self.with_connection(|conn| {
            let tx = conn.transaction()?;
            let now = Utc::now();

            ensure_progress_row(&tx, user_id)?;
            let mut progress = load_progress(&tx, user_id)?
                .ok_or_else(|| anyhow!("flywheel progress for {} missing", user_id))?;

            let stored = progress.phase_mut(phase);
            if let Some(status) = update.status {
                stored.status = status;
            }
            if let Some(step) = update.step {
                stored.step = step;
            }
            if let Some(data) = update.data {
                stored.data = data;
            }

            tx.execute(
                "INSERT INTO flywheel_phases (user_id, phase, status, step, data, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(user_id, phase) DO UPDATE SET
                    status = excluded.status,
                    step = excluded.step,
                    data = excluded.data,
                    updated_at = excluded.updated_at",
                params![
                    user_id.to_string(),
                    phase.as_str(),
                    stored.status.as_str(),
                    stored.step,
                    to_json(&stored.data)?,
                    timestamp(now),
                ],
            )?;

            progress.overall_progress = aggregate::recompute(&progress);
            progress.last_active_phase = Some(phase);
            progress.last_active_at = Some(now);
            progress.updated_at = now;

            tx.execute(
                "UPDATE flywheel_progress
                 SET overall_progress = ?2, last_active_phase = ?3, last_active_at = ?4, updated_at = ?4
                 WHERE user_id = ?1",
                params![
                    user_id.to_string(),
                    progress.overall_progress,
                    phase.as_str(),
                    timestamp(now),
                ],
            )?;

            tx.commit()?;
            Ok(progress)
        })
    }

    /// Turns the flywheel on once every phase is complete. Activating an
    /// already active flywheel keeps the original activation time.
    pub fn activate_flywheel(&self, user_id: Uuid) -> Result<ActivationResult> {
        self.with_connection(|conn| {
            let tx = conn.transaction()?;
            ensure_progress_row(&tx, user_id)?;
            let mut progress = load_progress(&tx, user_id)?
                .ok_or_else(|| anyhow!("flywheel progress for {} missing", user_id))?;

            let completed = progress.completed_phases();
            let blocked_by: Vec<Phase> = Phase::ALL
                .into_iter()
                .filter(|phase| !completed.contains(phase))
                .collect();
            if !blocked_by.is_empty() {
                return Ok(ActivationResult::Blocked(blocked_by));
            }

            if !progress.flywheel_active {
                let now = Utc::now();
                tx.execute(
                    "UPDATE flywheel_progress
                     SET flywheel_active = 1, activated_at = ?2, updated_at = ?2
                     WHERE user_id = ?1",
                    params![user_id.to_string(), timestamp(now)],
                )?;
                progress.flywheel_active = true;
                progress.activated_at = Some(now);
                progress.updated_at = now;
                tracing::info!(%user_id, "Flywheel activated");
            }

            tx.commit()?;
            Ok(ActivationResult::Activated(progress))
        })
    }

    /// Deletes the user's record. The next read starts over.
    pub fn reset_progress(&self, user_id: Uuid) -> Result<bool> {
        self.with_connection(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM flywheel_phases WHERE user_id = ?1",
                params![user_id.to_string()],
            )?;
            let deleted = tx.execute(
                "DELETE FROM flywheel_progress WHERE user_id = ?1",
                params![user_id.to_string()],
            )?;
            tx.commit()?;
            Ok(deleted > 0)
        })
    }
}

/// Returns whether a row was inserted.
fn ensure_progress_row(conn: &Connection, user_id: Uuid) -> Result<bool> {
    let now = timestamp(Utc::now());
    let inserted = conn.execute(
        "INSERT INTO flywheel_progress (user_id, overall_progress, flywheel_active, created_at, updated_at)
         VALUES (?1, 0, 0, ?2, ?2)
         ON CONFLICT(user_id) DO NOTHING",
        params![user_id.to_string(), now],
    )?;
    Ok(inserted > 0)
}

fn load_progress(conn: &Connection, user_id: Uuid) -> Result<Option<FlywheelProgress>> {
    let row = conn
        .query_row(
            "SELECT overall_progress, flywheel_active, activated_at, last_active_phase,
                    last_active_at, created_at, updated_at
             FROM flywheel_progress WHERE user_id = ?1",
            params![user_id.to_string()],
            |row| {
                Ok((
                    row.get::<_, u8>(0)?,
                    row.get::<_, bool>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                ))
            },
        )
        .optional()?;

    let Some((overall, active, activated_at, last_phase, last_active_at, created_at, updated_at)) =
        row
    else {
        return Ok(None);
    };

    let mut progress = FlywheelProgress::new(user_id, parse_timestamp(&created_at)?);
    progress.overall_progress = overall;
    progress.flywheel_active = active;
    progress.activated_at = parse_optional_timestamp(activated_at)?;
    progress.last_active_phase = last_phase
        .as_deref()
        .map(|p| parse_enum(p, Phase::from_str, "phase"))
        .transpose()?;
    progress.last_active_at = parse_optional_timestamp(last_active_at)?;
    progress.updated_at = parse_timestamp(&updated_at)?;

    let mut stmt =
        conn.prepare("SELECT phase, status, step, data FROM flywheel_phases WHERE user_id = ?1")?;
    let rows = stmt.query_map(params![user_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, u32>(2)?,
            row.get::<_, String>(3)?,
        ))
    })?;

    for row in rows {
        let (phase, status, step, data) = row?;
        let phase = parse_enum(&phase, Phase::from_str, "phase")?;
        *progress.phase_mut(phase) = PhaseProgress {
            status: parse_enum(&status, PhaseStatus::from_str, "phase status")?,
            step,
            data: from_json(&data)?,
        };
    }

    Ok(Some(progress))
}
