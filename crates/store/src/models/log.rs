use crate::error::{Error, ErrorKind};
use derive_more::Display;
use exn::ResultExt;
use std::str::FromStr;
use time::UtcDateTime;

/// Media events recorded for sync.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogEvent {
    #[display("added_media_file")]
    AddedMediaFile,
    #[display("edited_media_file")]
    EditedMediaFile,
    #[display("deleted_media_file")]
    DeletedMediaFile,
}
impl FromStr for LogEvent {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "added_media_file" => Self::AddedMediaFile,
            "edited_media_file" => Self::EditedMediaFile,
            "deleted_media_file" => Self::DeletedMediaFile,
            _ => exn::bail!(ErrorKind::InvalidData("log event")),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub id: i64,
    pub event: LogEvent,
    /// The subject of the event, e.g. a media filename.
    pub object: String,
    pub timestamp: UtcDateTime,
}

#[derive(sqlx::FromRow)]
pub(crate) struct LogRow {
    id: i64,
    event: String,
    object: String,
    timestamp: i64,
}
impl TryFrom<LogRow> for LogEntry {
    type Error = Error;
    fn try_from(row: LogRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            event: row.event.parse()?,
            object: row.object,
            timestamp: UtcDateTime::from_unix_timestamp(row.timestamp)
                .or_raise(|| ErrorKind::InvalidData("log timestamp"))?,
        })
    }
}
