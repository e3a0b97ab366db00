use crate::error::{Error, ErrorKind};
use exn::OptionExt;
use std::collections::BTreeMap;

/// Structured content that cards are derived from.
///
/// Field order carries no meaning; keys are unique per fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fact {
    pub id: String,
    pub fields: BTreeMap<String, String>,
}
impl Fact {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), fields: BTreeMap::new() }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// One row of the `facts LEFT JOIN fact_data` lookup. A fact without fields
/// still yields one row, with `key` and `value` both `NULL`.
#[derive(sqlx::FromRow)]
pub(crate) struct FactDataRow {
    pub(crate) fact_id: String,
    pub(crate) key: Option<String>,
    pub(crate) value: Option<String>,
}

impl TryFrom<Vec<FactDataRow>> for Fact {
    type Error = Error;
    fn try_from(rows: Vec<FactDataRow>) -> Result<Self, Self::Error> {
        let id = rows.first().map(|row| row.fact_id.clone()).ok_or_raise(|| ErrorKind::InvalidData("fact id"))?;
        let mut fact = Fact::new(id);
        for row in rows {
            match (row.key, row.value) {
                (Some(key), Some(value)) => {
                    fact.fields.insert(key, value);
                },
                (None, None) => {},
                _ => exn::bail!(ErrorKind::InvalidData("fact field")),
            }
        }
        Ok(fact)
    }
}
