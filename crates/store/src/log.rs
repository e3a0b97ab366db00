//! Event log sink.
//!
//! The media engine reports what it did through [`EventLog`] rather than
//! writing log rows itself, so a sync layer (or a test) can intercept events.
//! [`Repository`] is the default sink and appends to the `log` table.

use crate::error::Result;
use crate::models::LogEvent;
use crate::repo::Repository;
use async_trait::async_trait;
use std::sync::Arc;

pub type LogHandle = Arc<dyn EventLog>;

#[async_trait]
pub trait EventLog: Send + Sync {
    async fn added_media_file(&self, filename: &str) -> Result<()>;
    async fn edited_media_file(&self, filename: &str) -> Result<()>;
    async fn deleted_media_file(&self, filename: &str) -> Result<()>;
}

#[async_trait]
impl EventLog for Repository {
    async fn added_media_file(&self, filename: &str) -> Result<()> {
        self.append_log(LogEvent::AddedMediaFile, filename).await.map(|_| ())
    }

    async fn edited_media_file(&self, filename: &str) -> Result<()> {
        self.append_log(LogEvent::EditedMediaFile, filename).await.map(|_| ())
    }

    async fn deleted_media_file(&self, filename: &str) -> Result<()> {
        self.append_log(LogEvent::DeletedMediaFile, filename).await.map(|_| ())
    }
}
