use super::combinations::CombinationDefinition;
use super::inference::SubjectClassification;
use super::merger::MergedRecord;
use super::scoring::ScoreCard;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Population a rank is computed over.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RankScope {
    Cohort,
    Class,
    CombinationCohort(String),
    CombinationClass(String),
}

/// Value a rank is computed on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RankMetric {
    RawTotal,
    AssignedTotal,
    Subject(String),
    Assigned(String),
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RankKey {
    pub scope: RankScope,
    pub metric: RankMetric,
}

impl RankKey {
    pub fn new(scope: RankScope, metric: RankMetric) -> Self {
        Self { scope, metric }
    }

    /// Flat output column name, e.g. `rank_class_assigned_化学`.
    pub fn field_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RankKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            RankScope::Cohort => write!(f, "rank_cohort_")?,
            RankScope::Class => write!(f, "rank_class_")?,
            RankScope::CombinationCohort(label) => write!(f, "rank_combo_{label}_cohort_")?,
            RankScope::CombinationClass(label) => write!(f, "rank_combo_{label}_class_")?,
        }
        match &self.metric {
            RankMetric::RawTotal => write!(f, "rawTotal"),
            RankMetric::AssignedTotal => write!(f, "assignedTotal"),
            RankMetric::Subject(subject) => write!(f, "{subject}"),
            RankMetric::Assigned(subject) => write!(f, "assigned_{subject}"),
        }
    }
}

/// Every rank held by one record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankTable {
    ranks: BTreeMap<RankKey, u32>,
}

impl RankTable {
    pub fn get(&self, scope: RankScope, metric: RankMetric) -> Option<u32> {
        self.ranks.get(&RankKey::new(scope, metric)).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RankKey, u32)> {
        self.ranks.iter().map(|(key, rank)| (key, *rank))
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    fn insert(&mut self, key: RankKey, rank: u32) {
        self.ranks.insert(key, rank);
    }

    pub(crate) fn write_entries<M: SerializeMap>(&self, map: &mut M) -> Result<(), M::Error> {
        for (key, rank) in &self.ranks {
            map.serialize_entry(&key.field_name(), rank)?;
        }
        Ok(())
    }
}

impl Serialize for RankTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.ranks.len()))?;
        self.write_entries(&mut map)?;
        map.end()
    }
}

/// Standard competition ranking ("1, 1, 3, 4") of `members` by `metric`,
/// highest first. Non-finite values rank as 0. Equal values keep member order,
/// so the result is deterministic.
pub fn rank_scope<F>(members: &[usize], metric: F) -> Vec<(usize, u32)>
where
    F: Fn(usize) -> f64,
{
    let mut ordered: Vec<(usize, f64)> = members
        .iter()
        .map(|&member| {
            let value = metric(member);
            (member, if value.is_finite() { value } else { 0.0 })
        })
        .collect();
    ordered.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let mut ranked = Vec::with_capacity(ordered.len());
    let mut previous: Option<(f64, u32)> = None;
    for (position, (member, value)) in ordered.into_iter().enumerate() {
        let rank = match previous {
            Some((previous_value, previous_rank)) if value >= previous_value => previous_rank,
            _ => position as u32 + 1,
        };
        ranked.push((member, rank));
        previous = Some((value, rank));
    }
    ranked
}

/// Computes every required (scope, metric) pair for the cohort.
pub fn rank_records(
    records: &[MergedRecord],
    cards: &[ScoreCard],
    memberships: &[BTreeSet<String>],
    classification: &SubjectClassification,
    definitions: &[CombinationDefinition],
) -> Vec<RankTable> {
    let mut tables = vec![RankTable::default(); records.len()];
    let cohort: Vec<usize> = (0..records.len()).collect();

    let mut metrics = vec![RankMetric::RawTotal, RankMetric::AssignedTotal];
    metrics.extend(classification.subjects.iter().cloned().map(RankMetric::Subject));
    metrics.extend(
        classification
            .rebasing_subjects
            .iter()
            .cloned()
            .map(RankMetric::Assigned),
    );

    let value_of = |metric: &RankMetric, index: usize| -> f64 {
        let card = &cards[index];
        match metric {
            RankMetric::RawTotal => card.raw_total,
            RankMetric::AssignedTotal => card.assigned_total,
            RankMetric::Subject(subject) => records[index].raw().value(subject).number_or_zero(),
            RankMetric::Assigned(subject) => card.assigned_score(subject).unwrap_or(0.0),
        }
    };

    let mut apply = |scope: &RankScope, members: &[usize], metrics: &[RankMetric]| {
        for metric in metrics {
            for (member, rank) in rank_scope(members, |index| value_of(metric, index)) {
                tables[member].insert(RankKey::new(scope.clone(), metric.clone()), rank);
            }
        }
    };

    apply(&RankScope::Cohort, &cohort, &metrics);
    for members in partition_by_class(records, &cohort).values() {
        apply(&RankScope::Class, members, &metrics);
    }

    let total_metrics = [RankMetric::RawTotal, RankMetric::AssignedTotal];
    for definition in definitions {
        let members: Vec<usize> = cohort
            .iter()
            .copied()
            .filter(|&index| memberships[index].contains(&definition.label))
            .collect();
        if members.is_empty() {
            continue;
        }

        let label = definition.label.clone();
        apply(
            &RankScope::CombinationCohort(label.clone()),
            &members,
            &total_metrics,
        );
        for class_members in partition_by_class(records, &members).values() {
            apply(
                &RankScope::CombinationClass(label.clone()),
                class_members,
                &total_metrics,
            );
        }
    }

    tables
}

fn partition_by_class(records: &[MergedRecord], members: &[usize]) -> BTreeMap<String, Vec<usize>> {
    let mut classes: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for &index in members {
        classes
            .entry(records[index].class.clone())
            .or_default()
            .push(index);
    }
    classes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranks(values: &[f64]) -> Vec<u32> {
        let members: Vec<usize> = (0..values.len()).collect();
        let mut ranked = rank_scope(&members, |index| values[index]);
        ranked.sort_by_key(|(member, _)| *member);
        ranked.into_iter().map(|(_, rank)| rank).collect()
    }

    #[test]
    fn ties_share_rank_and_skip_the_next() {
        assert_eq!(ranks(&[90.0, 90.0, 80.0]), vec![1, 1, 3]);
        assert_eq!(ranks(&[70.0, 100.0, 100.0, 60.0]), vec![3, 1, 1, 4]);
    }

    #[test]
    fn non_finite_values_rank_as_zero() {
        assert_eq!(ranks(&[f64::NAN, 10.0, 0.0]), vec![2, 1, 2]);
    }

    #[test]
    fn empty_scope_has_no_ranks() {
        assert!(rank_scope(&[], |_| 0.0).is_empty());
    }

    #[test]
    fn field_names_are_stable() {
        let key = RankKey::new(
            RankScope::CombinationClass("物化生".to_string()),
            RankMetric::AssignedTotal,
        );
        assert_eq!(key.field_name(), "rank_combo_物化生_class_assignedTotal");
        let key = RankKey::new(RankScope::Class, RankMetric::Assigned("化学".to_string()));
        assert_eq!(key.field_name(), "rank_class_assigned_化学");
    }
}
