/// A registered media file.
///
/// `filename` is relative to the media directory and always uses forward
/// slashes, regardless of the host OS. `drift` is an opaque signal that is
/// only ever compared for equality with a freshly computed one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaEntry {
    pub filename: String,
    pub drift: String,
}
impl MediaEntry {
    pub fn new(filename: impl Into<String>, drift: impl Into<String>) -> Self {
        Self { filename: filename.into(), drift: drift.into() }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct MediaRow {
    filename: String,
    drift: String,
}
impl From<MediaRow> for MediaEntry {
    fn from(row: MediaRow) -> Self {
        Self { filename: row.filename, drift: row.drift }
    }
}
