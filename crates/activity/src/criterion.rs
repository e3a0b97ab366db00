use crate::error::Result;
use crate::models::{Card, CardType, Tag};

/// Notified when tags and card types come and go, so rules can follow.
///
/// Every method defaults to doing nothing.
pub trait LifecycleObserver {
    fn tag_created(&mut self, _tag: &Tag) {}
    fn tag_deleted(&mut self, _tag: &Tag) {}
    fn card_type_created(&mut self, _card_type: &CardType) {}
    fn card_type_deleted(&mut self, _card_type: &CardType) {}
}

/// A rule set deciding which cards are eligible for study.
pub trait ActivityCriterion: LifecycleObserver + Send + Sync {
    /// Identifies the implementation, so stored data is only ever restored
    /// into the kind of criterion that wrote it.
    fn kind(&self) -> &'static str;
    fn name(&self) -> &str;
    /// Set `card.active`. Depends on nothing but the card and the rule set.
    fn apply_to_card(&self, card: &mut Card);
    fn serialize(&self) -> Result<String>;
    /// Replace the rule set with one read from [`serialize`](Self::serialize)
    /// output. On error the current rule set is kept as it was.
    fn restore(&mut self, data: &str) -> Result<()>;
}
