//! Tag and card type registry.
//!
//! Criteria keep their own copies of tag and card type ids, so every
//! creation or deletion has to reach them. The catalog does that explicitly:
//! each mutator takes the observers to notify.

use crate::criterion::LifecycleObserver;
use crate::error::{ErrorKind, Result};
use crate::models::{CardType, CardTypeId, Tag, TagId};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tags: BTreeMap<TagId, Tag>,
    card_types: BTreeMap<CardTypeId, CardType>,
}
impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag(&self, id: &TagId) -> Option<&Tag> {
        self.tags.get(id)
    }

    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.tags.values()
    }

    pub fn card_type(&self, id: &CardTypeId) -> Option<&CardType> {
        self.card_types.get(id)
    }

    pub fn card_types(&self) -> impl Iterator<Item = &CardType> {
        self.card_types.values()
    }

    pub fn create_tag(&mut self, tag: Tag, observers: &mut [&mut dyn LifecycleObserver]) -> Result<()> {
        if self.tags.contains_key(&tag.id) {
            exn::bail!(ErrorKind::DuplicateTag(tag.id));
        }
        for observer in observers.iter_mut() {
            observer.tag_created(&tag);
        }
        tracing::debug!(tag = %tag.id, "Created tag");
        self.tags.insert(tag.id.clone(), tag);
        Ok(())
    }

    pub fn delete_tag(&mut self, id: &TagId, observers: &mut [&mut dyn LifecycleObserver]) -> Result<Tag> {
        let Some(tag) = self.tags.remove(id) else {
            exn::bail!(ErrorKind::TagNotFound(id.clone()));
        };
        for observer in observers.iter_mut() {
            observer.tag_deleted(&tag);
        }
        tracing::debug!(tag = %tag.id, "Deleted tag");
        Ok(tag)
    }

    pub fn create_card_type(
        &mut self,
        card_type: CardType,
        observers: &mut [&mut dyn LifecycleObserver],
    ) -> Result<()> {
        if self.card_types.contains_key(&card_type.id) {
            exn::bail!(ErrorKind::DuplicateCardType(card_type.id));
        }
        for observer in observers.iter_mut() {
            observer.card_type_created(&card_type);
        }
        tracing::debug!(card_type = %card_type.id, "Created card type");
        self.card_types.insert(card_type.id.clone(), card_type);
        Ok(())
    }

    pub fn delete_card_type(
        &mut self,
        id: &CardTypeId,
        observers: &mut [&mut dyn LifecycleObserver],
    ) -> Result<CardType> {
        let Some(card_type) = self.card_types.remove(id) else {
            exn::bail!(ErrorKind::CardTypeNotFound(id.clone()));
        };
        for observer in observers.iter_mut() {
            observer.card_type_deleted(&card_type);
        }
        tracing::debug!(card_type = %card_type.id, "Deleted card type");
        Ok(card_type)
    }
}
