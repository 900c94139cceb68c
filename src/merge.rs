use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::{Entity, Field, FieldValue, Record};
use crate::group::Grouping;

/// Which rule settled a two-value merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// At least one side was a set; both were unioned.
    Union,
    /// Case-insensitively equal strings; the first operand is kept.
    Equal,
    /// One string contains the other; the shorter one is kept.
    Subsumed,
    /// Unrelated display names; the shorter one is kept.
    ShorterName,
    /// Unrelated values of a non-name field, promoted to a two-element set.
    Ambiguous,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    pub groups: usize,
    pub merged_groups: usize,
    pub ambiguous_fields: usize,
}

impl MergeStats {
    fn absorb(&mut self, other: MergeStats) {
        self.groups += other.groups;
        self.merged_groups += other.merged_groups;
        self.ambiguous_fields += other.ambiguous_fields;
    }
}

/// Merges two values of `field` into one.
pub fn merge_values(field: &Field, a: &FieldValue, b: &FieldValue) -> FieldValue {
    resolve(field, a, b).0
}

/// Like [`merge_values`], also reporting the rule that applied.
pub fn resolve(field: &Field, a: &FieldValue, b: &FieldValue) -> (FieldValue, Resolution) {
    let (left, right) = match (a, b) {
        (FieldValue::Scalar(left), FieldValue::Scalar(right)) => (left, right),
        _ => {
            let mut union = a.clone().into_set();
            union.extend(b.members().map(str::to_string));
            return (FieldValue::Set(union), Resolution::Union);
        }
    };

    let upper_left = left.to_uppercase();
    let upper_right = right.to_uppercase();
    if upper_left == upper_right {
        return (FieldValue::Scalar(left.clone()), Resolution::Equal);
    }
    if upper_right.contains(&upper_left) {
        return (FieldValue::Scalar(left.clone()), Resolution::Subsumed);
    }
    if upper_left.contains(&upper_right) {
        return (FieldValue::Scalar(right.clone()), Resolution::Subsumed);
    }
    if field.is_display_name() {
        return (
            FieldValue::Scalar(shorter(left, right).to_string()),
            Resolution::ShorterName,
        );
    }
    (
        FieldValue::set([left.as_str(), right.as_str()]),
        Resolution::Ambiguous,
    )
}

// Equal lengths fall back to the lexicographically smaller string so the
// result does not depend on argument order.
fn shorter<'a>(left: &'a str, right: &'a str) -> &'a str {
    let (left_len, right_len) = (left.chars().count(), right.chars().count());
    if left_len < right_len || (left_len == right_len && left <= right) {
        left
    } else {
        right
    }
}

/// Folds one group into a single entity keyed by `key`. An empty group has
/// no entity.
pub fn merge_group(key: &str, members: &[Record]) -> Option<Entity> {
    merge_group_with_stats(key, members).map(|(entity, _)| entity)
}

pub fn merge_group_with_stats(key: &str, members: &[Record]) -> Option<(Entity, MergeStats)> {
    if members.is_empty() {
        return None;
    }
    let mut stats = MergeStats {
        groups: 1,
        ..MergeStats::default()
    };

    if let [single] = members {
        let fields = single.iter().map(|(f, v)| (f.clone(), v.clone())).collect();
        return Some((Entity::new(key, fields), stats));
    }

    stats.merged_groups = 1;
    let mut merged: BTreeMap<Field, FieldValue> = BTreeMap::new();
    for record in members {
        for (field, value) in record.iter() {
            match merged.get_mut(field) {
                None => {
                    merged.insert(field.clone(), value.clone());
                }
                Some(current) => {
                    if *current == *value {
                        continue;
                    }
                    let (resolved, resolution) = resolve(field, current, value);
                    if resolution == Resolution::Ambiguous {
                        stats.ambiguous_fields += 1;
                    }
                    *current = resolved;
                }
            }
        }
    }

    Some((Entity::new(key, merged), stats))
}

/// Merges every group of `grouping`, returning entities in key order.
pub fn integrate(grouping: &Grouping) -> (Vec<Entity>, MergeStats) {
    let mut stats = MergeStats::default();
    let entities = grouping
        .groups()
        .iter()
        .filter_map(|(key, members)| {
            let (entity, group_stats) = merge_group_with_stats(key, members)?;
            stats.absorb(group_stats);
            Some(entity)
        })
        .collect();
    (entities, stats)
}
