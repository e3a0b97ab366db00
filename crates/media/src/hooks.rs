//! Extension points run by the media engine.
//!
//! Plugins (a LaTeX renderer regenerating its images, say) register a
//! [`MediaHook`] under a [`HookKind`]. The engine only ever asks a
//! [`HookRegistry`] for the hooks of a kind and runs them in order.

use crate::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

pub type HookHandle = Arc<dyn MediaHook>;
pub type RegistryHandle = Arc<dyn HookRegistry>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HookKind {
    /// Run once for every field value of every fact during
    /// [`detect_edited_media_files`](crate::MediaEngine::detect_edited_media_files),
    /// so hooks can notice stale media they derive themselves.
    EditedMediaCheck,
}

#[async_trait]
pub trait MediaHook: Send + Sync {
    fn name(&self) -> &str;
    async fn run(&self, payload: &str) -> Result<()>;
}

pub trait HookRegistry: Send + Sync {
    /// Hooks registered for `kind`, in registration order.
    fn hooks(&self, kind: HookKind) -> Vec<HookHandle>;
}

/// In-memory [`HookRegistry`].
#[derive(Default, Clone)]
pub struct Registry {
    hooks: BTreeMap<HookKind, Vec<HookHandle>>,
}
impl Registry {
    pub fn register(&mut self, kind: HookKind, hook: HookHandle) {
        self.hooks.entry(kind).or_default().push(hook);
    }

    pub fn with(mut self, kind: HookKind, hook: HookHandle) -> Self {
        self.register(kind, hook);
        self
    }
}
impl HookRegistry for Registry {
    fn hooks(&self, kind: HookKind) -> Vec<HookHandle> {
        self.hooks.get(&kind).cloned().unwrap_or_default()
    }
}
