//! Activity criteria: which cards are currently eligible for study.
//!
//! A criterion is a rule set evaluated per card. It writes nothing but the
//! card's `active` flag, and it is kept in step with the tag and card type
//! catalog through [`LifecycleObserver`] notifications.
//!
//! ```
//! use recall_activity::{ActivityCriterion, Card, DefaultCriterion};
//!
//! let mut criterion = DefaultCriterion::new();
//! criterion.require_tag("nouns");
//! criterion.forbid_tag("hard");
//!
//! let mut card = Card::new("c1", "f1", "1", "1.1").with_tag("nouns");
//! criterion.apply_to_card(&mut card);
//! assert!(card.active);
//!
//! let mut card = card.with_tag("hard");
//! criterion.apply_to_card(&mut card);
//! assert!(!card.active);
//! ```

mod catalog;
mod criterion;
mod default;
pub mod error;
mod models;
mod persist;
mod study;

pub use crate::catalog::Catalog;
pub use crate::criterion::{ActivityCriterion, LifecycleObserver};
pub use crate::default::DefaultCriterion;
pub use crate::models::{Card, CardType, CardTypeId, FactView, FactViewId, Tag, TagId};
pub use crate::persist::{load_criterion, save_criterion};
pub use crate::study::{Component, ReviewController, Scheduler, StudyMode};
