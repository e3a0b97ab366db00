use crate::criterion::{ActivityCriterion, LifecycleObserver};
use crate::error::{ErrorKind, Result};
use crate::models::{Card, CardTypeId, FactViewId, Tag, TagId};
use exn::ResultExt;
use facet_json::{from_str as from_json, to_string as to_json};
use std::collections::BTreeSet;

/// The stock activity criterion: tag allow/deny lists plus a set of
/// deactivated `(card type, fact view)` pairs.
///
/// A card is active when it carries at least one required tag, unless its
/// card type and fact view are deactivated or it carries a forbidden tag.
/// The vetoes always win over the grant. Tags may sit in both lists at once.
///
/// New tags are required by default, so a freshly created tag makes its cards
/// eligible; only forbidding a tag takes cards out of study.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultCriterion {
    name: String,
    deactivated: BTreeSet<(CardTypeId, FactViewId)>,
    required: BTreeSet<TagId>,
    forbidden: BTreeSet<TagId>,
}
impl DefaultCriterion {
    pub const KIND: &'static str = "default";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    pub fn require_tag(&mut self, tag: impl Into<TagId>) {
        self.required.insert(tag.into());
    }

    pub fn unrequire_tag(&mut self, tag: &TagId) -> bool {
        self.required.remove(tag)
    }

    pub fn forbid_tag(&mut self, tag: impl Into<TagId>) {
        self.forbidden.insert(tag.into());
    }

    pub fn unforbid_tag(&mut self, tag: &TagId) -> bool {
        self.forbidden.remove(tag)
    }

    pub fn deactivate(&mut self, card_type: impl Into<CardTypeId>, fact_view: impl Into<FactViewId>) {
        self.deactivated.insert((card_type.into(), fact_view.into()));
    }

    /// Returns `true` if the pair was deactivated.
    pub fn reactivate(&mut self, card_type: impl Into<CardTypeId>, fact_view: impl Into<FactViewId>) -> bool {
        self.deactivated.remove(&(card_type.into(), fact_view.into()))
    }

    pub fn required_tags(&self) -> &BTreeSet<TagId> {
        &self.required
    }

    pub fn forbidden_tags(&self) -> &BTreeSet<TagId> {
        &self.forbidden
    }

    pub fn deactivated(&self) -> &BTreeSet<(CardTypeId, FactViewId)> {
        &self.deactivated
    }

    /// Whether a card would be active, without touching it.
    pub fn is_active(&self, card: &Card) -> bool {
        let mut active = false;
        if !card.tags.is_disjoint(&self.required) {
            active = true;
        }
        // Pairs are only ever matched whole; a fact view id on its own means
        // nothing outside its card type.
        if self.deactivated.contains(&(card.card_type.clone(), card.fact_view.clone())) {
            active = false;
        }
        if !card.tags.is_disjoint(&self.forbidden) {
            active = false;
        }
        active
    }
}

impl LifecycleObserver for DefaultCriterion {
    fn tag_created(&mut self, tag: &Tag) {
        self.required.insert(tag.id.clone());
    }

    fn tag_deleted(&mut self, tag: &Tag) {
        self.required.remove(&tag.id);
        self.forbidden.remove(&tag.id);
    }
}

impl ActivityCriterion for DefaultCriterion {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn apply_to_card(&self, card: &mut Card) {
        card.active = self.is_active(card);
    }

    fn serialize(&self) -> Result<String> {
        to_json(&RuleSetProxy::from(self)).or_raise(|| ErrorKind::InvalidData("default criterion"))
    }

    fn restore(&mut self, data: &str) -> Result<()> {
        let proxy = from_json::<RuleSetProxy>(data).or_raise(|| ErrorKind::InvalidData("default criterion"))?;
        self.deactivated =
            proxy.deactivated.into_iter().map(|pair| (pair.card_type.into(), pair.fact_view.into())).collect();
        self.required = proxy.required.into_iter().map(TagId::from).collect();
        self.forbidden = proxy.forbidden.into_iter().map(TagId::from).collect();
        Ok(())
    }
}

/// Stored shape: three sorted sequences under fixed keys.
#[derive(facet::Facet)]
#[cfg_attr(test, derive(Debug, PartialEq))]
struct RuleSetProxy {
    deactivated: Vec<PairProxy>,
    required: Vec<String>,
    forbidden: Vec<String>,
}
impl From<&DefaultCriterion> for RuleSetProxy {
    fn from(criterion: &DefaultCriterion) -> Self {
        Self {
            deactivated: criterion
                .deactivated
                .iter()
                .map(|(card_type, fact_view)| PairProxy {
                    card_type: card_type.as_str().to_string(),
                    fact_view: fact_view.as_str().to_string(),
                })
                .collect(),
            required: criterion.required.iter().map(|tag| tag.as_str().to_string()).collect(),
            forbidden: criterion.forbidden.iter().map(|tag| tag.as_str().to_string()).collect(),
        }
    }
}

#[derive(facet::Facet)]
#[cfg_attr(test, derive(Debug, PartialEq))]
struct PairProxy {
    card_type: String,
    fact_view: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn card(tags: &[&str]) -> Card {
        tags.iter().fold(Card::new("c1", "f1", "1", "1.1"), |card, tag| card.with_tag(*tag))
    }

    fn criterion() -> DefaultCriterion {
        let mut criterion = DefaultCriterion::named("everything but verbs");
        criterion.require_tag("nouns");
        criterion.require_tag("verbs");
        criterion.require_tag("both");
        criterion.forbid_tag("verbs");
        criterion.forbid_tag("both");
        criterion.deactivate("2", "2.2");
        criterion
    }

    #[rstest]
    #[case::no_tags(&[], "1", "1.1", false)]
    #[case::required(&["nouns"], "1", "1.1", true)]
    #[case::unrelated(&["other"], "1", "1.1", false)]
    #[case::forbidden_beats_required(&["nouns", "verbs"], "1", "1.1", false)]
    #[case::tag_in_both_lists(&["both"], "1", "1.1", false)]
    #[case::deactivated_pair_beats_required(&["nouns"], "2", "2.2", false)]
    #[case::other_view_of_same_type(&["nouns"], "2", "2.1", true)]
    #[case::same_view_id_other_type(&["nouns"], "1", "2.2", true)]
    fn test_apply_to_card(
        #[case] tags: &[&str],
        #[case] card_type: &str,
        #[case] fact_view: &str,
        #[case] expected: bool,
    ) {
        let mut card = Card { card_type: card_type.into(), fact_view: fact_view.into(), ..card(tags) };
        card.active = !expected;
        criterion().apply_to_card(&mut card);
        assert_eq!(card.active, expected);
    }

    #[test]
    fn test_empty_criterion_deactivates_everything() {
        let mut card = card(&["nouns"]);
        card.active = true;
        DefaultCriterion::new().apply_to_card(&mut card);
        assert!(!card.active);
    }

    #[test]
    fn test_tag_created_is_required() {
        let mut criterion = DefaultCriterion::new();
        criterion.tag_created(&Tag::new("t", "Tag"));
        assert!(criterion.required_tags().contains(&TagId::new("t")));
        assert!(criterion.is_active(&card(&["t"])));
    }

    #[test]
    fn test_tag_deleted_cleans_up() {
        let mut criterion = criterion();
        assert!(criterion.is_active(&card(&["nouns"])));
        let nouns = Tag::new("nouns", "Nouns");
        let verbs = Tag::new("verbs", "Verbs");
        criterion.tag_deleted(&nouns);
        criterion.tag_deleted(&verbs);
        assert!(!criterion.required_tags().contains(&nouns.id));
        assert!(!criterion.required_tags().contains(&verbs.id));
        assert!(!criterion.forbidden_tags().contains(&verbs.id));
        assert!(!criterion.is_active(&card(&["nouns"])));
        // Deleting a tag nobody knows about is harmless.
        criterion.tag_deleted(&Tag::new("ghost", "Ghost"));
    }

    #[test]
    fn test_card_type_events_change_nothing() {
        let mut criterion = criterion();
        let before = criterion.clone();
        let card_type = crate::models::CardType::new("2", "Vocabulary");
        criterion.card_type_created(&card_type);
        criterion.card_type_deleted(&card_type);
        assert_eq!(criterion, before);
    }

    #[test]
    fn test_reactivate() {
        let mut criterion = criterion();
        assert!(criterion.reactivate("2", "2.2"));
        assert!(!criterion.reactivate("2", "2.2"));
        let card = Card { card_type: "2".into(), fact_view: "2.2".into(), ..card(&["nouns"]) };
        assert!(criterion.is_active(&card));
    }

    #[test]
    fn test_serialize_format() {
        let mut criterion = DefaultCriterion::new();
        criterion.require_tag("b");
        criterion.require_tag("a");
        criterion.forbid_tag("c");
        criterion.deactivate("1", "1.2");
        assert_eq!(
            criterion.serialize().unwrap(),
            r#"{"deactivated":[{"card_type":"1","fact_view":"1.2"}],"required":["a","b"],"forbidden":["c"]}"#
        );
    }

    #[test]
    fn test_round_trip_evaluates_identically() {
        let original = criterion();
        let mut restored = DefaultCriterion::named(original.name());
        restored.restore(&original.serialize().unwrap()).unwrap();
        assert_eq!(restored, original);

        let samples = [
            card(&[]),
            card(&["nouns"]),
            card(&["verbs"]),
            card(&["nouns", "both"]),
            Card { card_type: "2".into(), fact_view: "2.2".into(), ..card(&["nouns"]) },
            Card { card_type: "2".into(), fact_view: "2.1".into(), ..card(&["nouns"]) },
        ];
        for sample in samples {
            assert_eq!(restored.is_active(&sample), original.is_active(&sample), "{sample:?}");
        }
    }

    #[rstest]
    #[case::empty("")]
    #[case::not_json("set(['nouns'])")]
    #[case::wrong_type(r#"{"deactivated":[],"required":"nouns","forbidden":[]}"#)]
    #[case::bad_pair(r#"{"deactivated":[["1","1.1"]],"required":[],"forbidden":[]}"#)]
    fn test_restore_rejects_corrupt_data(#[case] data: &str) {
        let mut criterion = criterion();
        let before = criterion.clone();
        let err = criterion.restore(data).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidData(_)));
        assert_eq!(criterion, before);
    }
}
