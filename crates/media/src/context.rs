/// Caller-supplied context for ingestion.
///
/// While a sync session replays remote log entries, the sync algorithm takes
/// care of logging added media itself; the engine must not append duplicates.
/// Deletions are always logged. The caller
/// creates a [`Context::syncing`] value for the duration of the session and
/// passes it in. The engine only ever reads it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Context {
    syncing: bool,
}
impl Context {
    /// Regular, local operation: events are logged.
    pub const fn local() -> Self {
        Self { syncing: false }
    }

    /// Replaying a sync session: `added_media_file` events are suppressed.
    pub const fn syncing() -> Self {
        Self { syncing: true }
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing
    }
}
