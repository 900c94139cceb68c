use std::collections::BTreeMap;

use crate::domain::{Field, Record};
use crate::error::IntegrateError;

/// Records bucketed by join-key value.
#[derive(Debug, Clone)]
pub struct Grouping {
    key: Field,
    groups: BTreeMap<String, Vec<Record>>,
    discarded: usize,
}

impl Grouping {
    pub fn key(&self) -> &Field {
        &self.key
    }

    pub fn groups(&self) -> &BTreeMap<String, Vec<Record>> {
        &self.groups
    }

    pub fn get(&self, key: &str) -> Option<&[Record]> {
        self.groups.get(key).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Records dropped because they carry no value for the join key.
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    pub fn into_groups(self) -> BTreeMap<String, Vec<Record>> {
        self.groups
    }
}

/// Groups records by the field named `key`.
///
/// A multi-valued key places the record into the group of every member.
/// Records without the key are counted in [`Grouping::discarded`]. Fails only
/// when `key` is not part of the controlled vocabulary.
pub fn group_records<I>(records: I, key: &str) -> Result<Grouping, IntegrateError>
where
    I: IntoIterator<Item = Record>,
{
    let field = Field::parse_schema(key)?;
    Ok(group_by_field(records, field))
}

pub fn group_by_field<I>(records: I, key: Field) -> Grouping
where
    I: IntoIterator<Item = Record>,
{
    let mut groups: BTreeMap<String, Vec<Record>> = BTreeMap::new();
    let mut discarded = 0usize;

    for record in records {
        let Some(value) = record.get(&key) else {
            discarded += 1;
            continue;
        };
        let members = value.members().map(str::to_string).collect::<Vec<_>>();
        let Some((last, rest)) = members.split_last() else {
            discarded += 1;
            continue;
        };
        for member in rest {
            groups
                .entry(member.clone())
                .or_default()
                .push(record.clone());
        }
        groups.entry(last.clone()).or_default().push(record);
    }

    Grouping {
        key,
        groups,
        discarded,
    }
}
