/// A serialized activity criterion as persisted in the store.
///
/// `data` is opaque to the store; only the owning criterion kind knows how to
/// read it back.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct StoredCriterion {
    pub id: String,
    pub kind: String,
    pub name: String,
    pub data: String,
}
