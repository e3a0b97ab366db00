mod criterion;
mod fact;
mod log;
mod media;

pub use self::criterion::StoredCriterion;
pub use self::fact::Fact;
pub(crate) use self::fact::FactDataRow;
pub use self::log::{LogEntry, LogEvent};
pub(crate) use self::log::LogRow;
pub use self::media::MediaEntry;
pub(crate) use self::media::MediaRow;
