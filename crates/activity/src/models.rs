use derive_more::Display;
use std::collections::BTreeSet;

macro_rules! id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
        #[display("{_0}")]
        pub struct $name(String);
        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }
        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }
        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

id!(TagId);
id!(CardTypeId);
id!(
    /// Only unique within its card type.
    FactViewId
);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}
impl Tag {
    pub fn new(id: impl Into<TagId>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into() }
    }
}

/// A named rendering side of a card type ("Front", "Back", ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactView {
    pub id: FactViewId,
    pub name: String,
}
impl FactView {
    pub fn new(id: impl Into<FactViewId>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardType {
    pub id: CardTypeId,
    pub name: String,
    /// Keys of the fact fields this card type uses.
    pub fields: Vec<String>,
    /// One card is generated per fact view.
    pub fact_views: Vec<FactView>,
}
impl CardType {
    pub fn new(id: impl Into<CardTypeId>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into(), fields: Vec::new(), fact_views: Vec::new() }
    }

    pub fn with_field(mut self, key: impl Into<String>) -> Self {
        self.fields.push(key.into());
        self
    }

    pub fn with_fact_view(mut self, view: FactView) -> Self {
        self.fact_views.push(view);
        self
    }
}

/// One renderable view of a fact.
///
/// `active` is derived: only an activity criterion writes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: String,
    pub fact_id: String,
    pub card_type: CardTypeId,
    pub fact_view: FactViewId,
    pub tags: BTreeSet<TagId>,
    pub active: bool,
}
impl Card {
    pub fn new(
        id: impl Into<String>,
        fact_id: impl Into<String>,
        card_type: impl Into<CardTypeId>,
        fact_view: impl Into<FactViewId>,
    ) -> Self {
        Self {
            id: id.into(),
            fact_id: fact_id.into(),
            card_type: card_type.into(),
            fact_view: fact_view.into(),
            tags: BTreeSet::new(),
            active: false,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<TagId>) -> Self {
        self.tags.insert(tag.into());
        self
    }
}
