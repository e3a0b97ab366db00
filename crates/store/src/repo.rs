//! Repository for facts, media entries, log entries and stored criteria.
//!
//! One repository rather than one per table: the media engine needs facts
//! and media rows in the same breath, and they all share the pool anyway.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{Fact, FactDataRow, LogEntry, LogEvent, LogRow, MediaEntry, MediaRow, StoredCriterion};
use exn::ResultExt;
use sqlx::SqlitePool;
use time::UtcDateTime;

/// Repository over the record store.
///
/// # Relationships
///
/// - A fact owns its field rows; deleting a fact cascades to its fields.
/// - Media entries are *not* linked to facts. Many facts (or tooling outside
///   this application) may share a media file, so deleting a fact never
///   touches the media registry.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Facts
    // =========================================================================

    /// Insert a fact, or replace all field values of an existing one.
    pub async fn upsert_fact(&self, fact: &Fact) -> Result<()> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        sqlx::query(include_str!("../queries/insert_fact.sql"))
            .bind(&fact.id)
            .bind(UtcDateTime::now().unix_timestamp())
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        sqlx::query(include_str!("../queries/delete_fact_data.sql"))
            .bind(&fact.id)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        for (key, value) in &fact.fields {
            sqlx::query(include_str!("../queries/upsert_fact_field.sql"))
                .bind(&fact.id)
                .bind(key)
                .bind(value)
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    pub async fn get_fact(&self, id: impl AsRef<str>) -> Result<Option<Fact>> {
        let rows: Vec<FactDataRow> = sqlx::query_as(include_str!("../queries/get_fact_data.sql"))
            .bind(id.as_ref())
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        if rows.is_empty() {
            return Ok(None);
        }
        Fact::try_from(rows).map(Some)
    }

    /// Update a single field value of a stored fact.
    ///
    /// Returns [`ErrorKind::FactNotFound`] if the fact has no such field.
    pub async fn update_fact_field(
        &self,
        fact_id: impl AsRef<str>,
        key: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> Result<()> {
        let fact_id = fact_id.as_ref();
        let result = sqlx::query(include_str!("../queries/update_fact_field.sql"))
            .bind(value.as_ref())
            .bind(fact_id)
            .bind(key.as_ref())
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        if result.rows_affected() == 0 {
            exn::bail!(ErrorKind::FactNotFound(fact_id.to_string()));
        }
        Ok(())
    }

    /// Delete a fact and its fields. Media files referenced by the fact are
    /// left alone.
    ///
    /// Returns `true` if a fact was deleted.
    pub async fn delete_fact(&self, id: impl AsRef<str>) -> Result<bool> {
        let result = sqlx::query(include_str!("../queries/delete_fact.sql"))
            .bind(id.as_ref())
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    /// Every field value of every fact, as raw text.
    pub async fn list_field_values(&self) -> Result<Vec<String>> {
        sqlx::query_scalar(include_str!("../queries/list_field_values.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    /// Field values that might contain a media reference (`src=` anywhere,
    /// ASCII case-insensitive). Callers still need to parse the references.
    pub async fn list_field_values_with_media(&self) -> Result<Vec<String>> {
        sqlx::query_scalar(include_str!("../queries/list_field_values_with_media.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    // =========================================================================
    // Media registry
    // =========================================================================

    pub async fn get_media(&self, filename: impl AsRef<str>) -> Result<Option<MediaEntry>> {
        let row: Option<MediaRow> = sqlx::query_as(include_str!("../queries/get_media.sql"))
            .bind(filename.as_ref())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(row.map(MediaEntry::from))
    }

    /// Register a media file.
    ///
    /// Returns `false` (and leaves the existing row untouched) if the filename
    /// is already registered.
    pub async fn insert_media(&self, entry: &MediaEntry) -> Result<bool> {
        let result = sqlx::query(include_str!("../queries/insert_media.sql"))
            .bind(&entry.filename)
            .bind(&entry.drift)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns `true` if a registered entry was updated.
    pub async fn update_media_drift(&self, filename: impl AsRef<str>, drift: impl AsRef<str>) -> Result<bool> {
        let result = sqlx::query(include_str!("../queries/update_media_drift.sql"))
            .bind(drift.as_ref())
            .bind(filename.as_ref())
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns `true` if a registered entry was removed.
    pub async fn delete_media(&self, filename: impl AsRef<str>) -> Result<bool> {
        let result = sqlx::query(include_str!("../queries/delete_media.sql"))
            .bind(filename.as_ref())
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_media(&self) -> Result<Vec<MediaEntry>> {
        let rows: Vec<MediaRow> = sqlx::query_as(include_str!("../queries/list_media.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(rows.into_iter().map(MediaEntry::from).collect())
    }

    // =========================================================================
    // Event log
    // =========================================================================

    /// Append an event and return its id.
    pub async fn append_log(&self, event: LogEvent, object: impl AsRef<str>) -> Result<i64> {
        sqlx::query_scalar(include_str!("../queries/append_log.sql"))
            .bind(event.to_string())
            .bind(object.as_ref())
            .bind(UtcDateTime::now().unix_timestamp())
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    /// List the event log, oldest first.
    pub async fn list_log(&self) -> Result<Vec<LogEntry>> {
        let rows: Vec<LogRow> = sqlx::query_as(include_str!("../queries/list_log.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(LogEntry::try_from).collect()
    }

    // =========================================================================
    // Activity criteria
    // =========================================================================

    pub async fn save_criterion(&self, criterion: &StoredCriterion) -> Result<()> {
        sqlx::query(include_str!("../queries/upsert_criterion.sql"))
            .bind(&criterion.id)
            .bind(&criterion.kind)
            .bind(&criterion.name)
            .bind(&criterion.data)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    pub async fn load_criterion(&self, id: impl AsRef<str>) -> Result<Option<StoredCriterion>> {
        sqlx::query_as(include_str!("../queries/get_criterion.sql"))
            .bind(id.as_ref())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }
}
