//! Key-based partitioning of a record collection into ordered groups.

use crate::record::{FieldKey, FlightField, FlightRecord};
use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;

/// Members that share one key, in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group<K, V> {
    pub key: K,
    pub members: Vec<V>,
}

/// Groups in the order their keys were first seen.
///
/// Serializes as a plain list of `{ key, members }` objects.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct GroupedCollection<K, V> {
    groups: Vec<Group<K, V>>,
    #[serde(skip)]
    index: HashMap<K, usize>,
}

impl<K: Eq + Hash + Clone, V> GroupedCollection<K, V> {
    pub fn new() -> Self {
        GroupedCollection {
            groups: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Appends `value` to the group for `key`, opening a new group at the end
    /// if the key has not been seen yet.
    pub fn insert(&mut self, key: K, value: V) {
        match self.index.get(&key) {
            Some(&pos) => self.groups[pos].members.push(value),
            None => {
                self.index.insert(key.clone(), self.groups.len());
                self.groups.push(Group {
                    key,
                    members: vec![value],
                });
            }
        }
    }

    pub fn get(&self, key: &K) -> Option<&[V]> {
        self.index
            .get(key)
            .map(|&pos| self.groups[pos].members.as_slice())
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.groups.iter().map(|g| &g.key)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Group<K, V>> {
        self.groups.iter()
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Sum of all group sizes.
    pub fn member_count(&self) -> usize {
        self.groups.iter().map(|g| g.members.len()).sum()
    }

    pub fn into_groups(self) -> Vec<Group<K, V>> {
        self.groups
    }
}

impl<K: Eq + Hash + Clone, V> Default for GroupedCollection<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for GroupedCollection<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.groups == other.groups
    }
}

impl<'c, K, V> IntoIterator for &'c GroupedCollection<K, V> {
    type Item = &'c Group<K, V>;
    type IntoIter = std::slice::Iter<'c, Group<K, V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

/// Groups `items` by the key `key_fn` derives for each of them.
///
/// Key order is the order of first appearance, member order is input order.
pub fn group_by<'a, T, K, F>(items: &'a [T], key_fn: F) -> GroupedCollection<K, &'a T>
where
    K: Eq + Hash + Clone,
    F: Fn(&T) -> K,
{
    group_iter(items, key_fn)
}

/// [`group_by`] over any iterator of borrowed items, e.g. a filtered view.
pub fn group_iter<'a, T, K, F, I>(items: I, key_fn: F) -> GroupedCollection<K, &'a T>
where
    T: 'a,
    K: Eq + Hash + Clone,
    F: Fn(&T) -> K,
    I: IntoIterator<Item = &'a T>,
{
    let mut grouped = GroupedCollection::new();
    for item in items {
        grouped.insert(key_fn(item), item);
    }
    grouped
}

/// Builds one independent grouping per selector.
///
/// Each selector gets its own [`GroupedCollection`], so a record shows up once
/// in every returned view. Keys from different selectors are never combined.
pub fn group_by_each<'a, T, K, F>(items: &'a [T], selectors: &[F]) -> Vec<GroupedCollection<K, &'a T>>
where
    K: Eq + Hash + Clone,
    F: Fn(&T) -> K,
{
    selectors
        .iter()
        .map(|selector| group_by(items, selector))
        .collect()
}

/// [`group_by_each`] over typed record fields, paired with the field used.
pub fn group_by_fields<'a>(
    records: &'a [FlightRecord],
    fields: &[FlightField],
) -> Vec<(FlightField, GroupedCollection<FieldKey, &'a FlightRecord>)> {
    fields
        .iter()
        .map(|field| (*field, group_by(records, |r| field.key(r))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Stage;
    use proptest::prelude::*;

    #[test]
    fn test_group_by_preserves_first_seen_order() {
        let records = vec![
            record("F1", "SU200"),
            record("F2", "SU100"),
            record("F3", "SU200"),
            record("F4", "SU300"),
        ];

        let grouped = group_by(&records, |r| r.flight_number.clone());

        let keys: Vec<_> = grouped.keys().cloned().collect();
        assert_eq!(keys, vec!["SU200", "SU100", "SU300"]);

        let su200: Vec<_> = grouped
            .get(&"SU200".to_string())
            .unwrap()
            .iter()
            .map(|r| r.flight_id.as_str())
            .collect();
        assert_eq!(su200, vec!["F1", "F3"]);
    }

    #[test]
    fn test_group_iter_over_filtered_view() {
        let mut records = vec![record("F1", "SU100"), record("F1", "SU100")];
        records[1].stage = Stage::Result;

        let grouped = group_iter(
            records.iter().filter(|r| r.stage == Stage::Result),
            |r| r.flight_id.clone(),
        );

        assert_eq!(grouped.member_count(), 1);
        assert_eq!(grouped.get(&"F1".to_string()).unwrap()[0].stage, Stage::Result);
    }

    #[test]
    fn test_group_by_empty_input() {
        let records: Vec<FlightRecord> = vec![];
        let grouped = group_by(&records, |r| r.flight_number.clone());

        assert!(grouped.is_empty());
        assert_eq!(grouped.member_count(), 0);
    }

    #[test]
    fn test_group_by_each_builds_independent_views() {
        let records = vec![
            record("F1", "SU100"),
            record("F2", "SU100"),
            record("F2", "SU200"),
        ];

        let views = group_by_fields(&records, &[FlightField::FlightNumber, FlightField::FlightId]);

        assert_eq!(views.len(), 2);
        assert_eq!(views[0].0, FlightField::FlightNumber);
        assert_eq!(views[0].1.len(), 2);
        assert_eq!(views[1].0, FlightField::FlightId);
        assert_eq!(views[1].1.len(), 2);
        for (_, view) in &views {
            assert_eq!(view.member_count(), records.len());
        }
    }

    #[test]
    fn test_same_selector_twice_yields_equal_views() {
        let records = vec![record("F1", "SU100"), record("F2", "SU200")];
        let by_number = |r: &FlightRecord| r.flight_number.clone();

        let views = group_by_each(&records, &[by_number, by_number]);

        assert_eq!(views[0], views[1]);
    }

    #[test]
    fn test_undefined_key_is_its_own_group() {
        let mut with_type = record("F1", "SU100");
        with_type.aircraft_type = Some("A320".into());
        let records = vec![with_type, record("F2", "SU100"), record("F3", "SU200")];

        let grouped = group_by(&records, |r| FlightField::AircraftType.key(r));

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped.get(&FieldKey::Undefined).unwrap().len(), 2);
        assert_eq!(grouped.get(&FieldKey::text("A320")).unwrap().len(), 1);
    }

    #[test]
    fn test_serializes_as_list_of_groups() {
        let records = vec![record("F1", "SU100")];
        let grouped = group_by(&records, |r| r.flight_number.clone());

        let value = serde_json::to_value(&grouped).unwrap();

        assert!(value.is_array());
        assert_eq!(value[0]["key"], "SU100");
        assert_eq!(value[0]["members"][0]["flight_id"], "F1");
    }

    proptest! {
        #[test]
        fn prop_groups_partition_input(keys in proptest::collection::vec(0u8..6, 0..64)) {
            let items: Vec<(usize, u8)> = keys.iter().copied().enumerate().collect();
            let grouped = group_by(&items, |(_, k)| *k);

            prop_assert_eq!(grouped.member_count(), items.len());

            let mut seen = vec![0usize; items.len()];
            for group in &grouped {
                for (pos, key) in &group.members {
                    prop_assert_eq!(*key, group.key);
                    seen[*pos] += 1;
                }
            }
            prop_assert!(seen.iter().all(|&c| c == 1));
        }

        #[test]
        fn prop_grouping_is_deterministic(keys in proptest::collection::vec(0u8..6, 0..64)) {
            let first = group_by(&keys, |k| *k);
            let second = group_by(&keys, |k| *k);
            prop_assert_eq!(first, second);
        }
    }

    // Helper functions for tests
    fn record(flight_id: &str, flight_number: &str) -> FlightRecord {
        FlightRecord::new(flight_id, flight_number, Stage::Start, 0, 0.0, false)
    }
}
