use crate::criterion::ActivityCriterion;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use recall_store::{Repository, StoredCriterion};

/// Store a criterion under `id`, replacing whatever was stored there.
pub async fn save_criterion(repo: &Repository, id: &str, criterion: &dyn ActivityCriterion) -> Result<()> {
    let stored = StoredCriterion {
        id: id.to_string(),
        kind: criterion.kind().to_string(),
        name: criterion.name().to_string(),
        data: criterion.serialize()?,
    };
    repo.save_criterion(&stored).await.or_raise(|| ErrorKind::Store)
}

/// Restore the criterion stored under `id` into `criterion`.
///
/// Returns `false` if nothing is stored under `id`. Data written by a
/// different kind of criterion is rejected rather than misread.
pub async fn load_criterion(repo: &Repository, id: &str, criterion: &mut dyn ActivityCriterion) -> Result<bool> {
    let Some(stored) = repo.load_criterion(id).await.or_raise(|| ErrorKind::Store)? else {
        return Ok(false);
    };
    if stored.kind != criterion.kind() {
        exn::bail!(ErrorKind::InvalidData("criterion kind"));
    }
    criterion.restore(&stored.data)?;
    Ok(true)
}
