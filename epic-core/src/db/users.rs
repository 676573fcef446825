use anyhow::{anyhow, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{parse_timestamp, timestamp, Database};
use crate::models::*;

impl Database {
    pub fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        self.with_connection(|conn| load_user(conn, SELECT_BY_ID, &id.to_string()))
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.with_connection(|conn| load_user(conn, SELECT_BY_EMAIL, &normalize_email(email)))
    }

    /// Just-in-time provisioning: returns the user with this email, creating
    /// it first if needed. The flag is `true` when the user was created.
    ///
    /// An existing user without an organization adopts the one supplied.
    pub fn provision_user(&self, input: ProvisionUserInput) -> Result<(User, bool)> {
        let email = normalize_email(&input.email);
        if email.is_empty() {
            return Err(anyhow!("cannot provision a user without an email"));
        }

        self.with_connection(|conn| {
            let tx = conn.transaction()?;
            let inserted = tx.execute(
                "INSERT INTO users (id, email, name, organization_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(email) DO NOTHING",
                params![
                    Uuid::new_v4().to_string(),
                    email,
                    input.name,
                    input.organization_id.map(|id| id.to_string()),
                    timestamp(Utc::now()),
                ],
            )?;

            if inserted == 0 {
                if let Some(org) = input.organization_id {
                    tx.execute(
                        "UPDATE users SET organization_id = ?2 WHERE email = ?1 AND organization_id IS NULL",
                        params![email, org.to_string()],
                    )?;
                }
            }

            let user = load_user(&tx, SELECT_BY_EMAIL, &email)?
                .ok_or_else(|| anyhow!("user {} missing after provisioning", email))?;
            tx.commit()?;
            Ok((user, inserted > 0))
        })
    }

    pub fn get_brand(&self, organization_id: Uuid) -> Result<Option<Brand>> {
        self.with_connection(|conn| {
            let row = conn
                .query_row(
                    "SELECT name, description, updated_at FROM brands WHERE organization_id = ?1",
                    params![organization_id.to_string()],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, Option<String>>(1)?,
                            row.get::<_, String>(2)?,
                        ))
                    },
                )
                .optional()?;

            let Some((name, description, updated_at)) = row else {
                return Ok(None);
            };
            Ok(Some(Brand {
                organization_id,
                name,
                description,
                updated_at: parse_timestamp(&updated_at)?,
            }))
        })
    }

    pub fn upsert_brand(
        &self,
        organization_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Brand> {
        let now = Utc::now();
        self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO brands (organization_id, name, description, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(organization_id) DO UPDATE SET
                    name = excluded.name,
                    description = excluded.description,
                    updated_at = excluded.updated_at",
                params![organization_id.to_string(), name, description, timestamp(now)],
            )?;
            Ok(())
        })?;

        Ok(Brand {
            organization_id,
            name: name.to_string(),
            description: description.map(str::to_string),
            updated_at: now,
        })
    }
}

const SELECT_BY_ID: &str =
    "SELECT id, email, name, organization_id, created_at FROM users WHERE id = ?1";

const SELECT_BY_EMAIL: &str =
    "SELECT id, email, name, organization_id, created_at FROM users WHERE email = ?1";

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn load_user(conn: &Connection, sql: &str, key: &str) -> Result<Option<User>> {
    let row = conn
        .query_row(sql, params![key], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, String>(4)?,
            ))
        })
        .optional()?;

    let Some((id, email, name, organization_id, created_at)) = row else {
        return Ok(None);
    };
    Ok(Some(User {
        id: Uuid::parse_str(&id)?,
        email,
        name,
        organization_id: organization_id.as_deref().map(Uuid::parse_str).transpose()?,
        created_at: parse_timestamp(&created_at)?,
    }))
}
