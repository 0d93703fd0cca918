use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;

use shared::{
    domain::{Action, ActionId},
    protocol::ActionPayload,
};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid sqlite url '{database_url}'"))?
            .create_if_missing(true);
        // Every connection to an in-memory database sees its own empty database.
        let pool_options = if is_in_memory(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(connect_options).await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run actions migrations")?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn list_actions(&self) -> Result<Vec<Action>> {
        let rows = sqlx::query("SELECT id, description, date, points FROM actions ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("failed to list actions")?;
        rows.iter().map(action_from_row).collect()
    }

    pub async fn create_action(&self, payload: &ActionPayload) -> Result<Action> {
        let row = sqlx::query(
            "INSERT INTO actions (description, date, points) VALUES (?, ?, ?)
             RETURNING id, description, date, points",
        )
        .bind(&payload.description)
        .bind(payload.date)
        .bind(payload.points)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert action")?;
        let action = action_from_row(&row)?;
        debug!(action_id = action.id.0, "stored new action");
        Ok(action)
    }

    pub async fn update_action(
        &self,
        action_id: ActionId,
        payload: &ActionPayload,
    ) -> Result<Option<Action>> {
        let row = sqlx::query(
            "UPDATE actions
             SET description = ?, date = ?, points = ?, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?
             RETURNING id, description, date, points",
        )
        .bind(&payload.description)
        .bind(payload.date)
        .bind(payload.points)
        .bind(action_id.0)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to update action {action_id}"))?;
        row.as_ref().map(action_from_row).transpose()
    }

    pub async fn delete_action(&self, action_id: ActionId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM actions WHERE id = ?")
            .bind(action_id.0)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete action {action_id}"))?;
        Ok(result.rows_affected() > 0)
    }
}

fn action_from_row(row: &SqliteRow) -> Result<Action> {
    Ok(Action {
        id: ActionId(row.try_get::<i64, _>("id")?),
        description: row.try_get("description")?,
        date: row.try_get::<NaiveDate, _>("date")?,
        points: row.try_get::<f64, _>("points")?,
    })
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if is_in_memory(database_url) || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
