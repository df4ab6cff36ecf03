//! Retrieval ground truth as evidence groups.
//!
//! A query is answered correctly by a retriever when any single group is
//! matched in full: groups are alternatives (OR), items inside a group are all
//! required (AND). In storage each item is one `retrieval_relation` row keyed by
//! `(query_id, group_index, group_order)`.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ChunkRef;
use crate::domain::entities::RetrievalRelation;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroundTruthError {
    #[error("ground truth needs at least one target")]
    NoTargets,
    #[error("evidence group {0} is empty")]
    EmptyGroup(i32),
    #[error("target {0} appears twice in the same evidence group")]
    DuplicateTarget(ChunkRef),
    #[error("invalid relation kind: {0}")]
    InvalidRelationKind(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceGroup {
    pub index: i32,
    pub items: Vec<ChunkRef>,
}

impl EvidenceGroup {
    pub fn is_matched_by(&self, evidence: &HashSet<ChunkRef>) -> bool {
        self.items.iter().all(|item| evidence.contains(item))
    }
}

/// How the annotator combined the selected targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    /// Each target alone answers the query.
    Or,
    /// All targets are needed together (multi-hop).
    And,
}

impl std::str::FromStr for RelationKind {
    type Err = GroundTruthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "or" => Ok(RelationKind::Or),
            "and" => Ok(RelationKind::And),
            other => Err(GroundTruthError::InvalidRelationKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroundTruthShape {
    Empty,
    Single,
    Alternatives,
    MultiHop,
    Mixed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalGroundTruth {
    groups: Vec<EvidenceGroup>,
}

impl RetrievalGroundTruth {
    /// Builds ground truth from ordered groups; group indices are assigned from 0.
    pub fn new(groups: Vec<Vec<ChunkRef>>) -> Result<Self, GroundTruthError> {
        if groups.is_empty() {
            return Err(GroundTruthError::NoTargets);
        }

        let mut built = Vec::with_capacity(groups.len());
        for (index, items) in groups.into_iter().enumerate() {
            let index = index as i32;
            if items.is_empty() {
                return Err(GroundTruthError::EmptyGroup(index));
            }
            let mut seen = HashSet::new();
            for item in &items {
                if !seen.insert(*item) {
                    return Err(GroundTruthError::DuplicateTarget(*item));
                }
            }
            built.push(EvidenceGroup { index, items });
        }

        Ok(Self { groups: built })
    }

    pub fn single(target: ChunkRef) -> Self {
        Self {
            groups: vec![EvidenceGroup {
                index: 0,
                items: vec![target],
            }],
        }
    }

    /// Every target is an alternative on its own.
    pub fn or_all(targets: impl IntoIterator<Item = ChunkRef>) -> Result<Self, GroundTruthError> {
        Self::new(targets.into_iter().map(|t| vec![t]).collect())
    }

    /// All targets are required together.
    pub fn and_all(targets: impl IntoIterator<Item = ChunkRef>) -> Result<Self, GroundTruthError> {
        let items: Vec<ChunkRef> = targets.into_iter().collect();
        if items.is_empty() {
            return Err(GroundTruthError::NoTargets);
        }
        Self::new(vec![items])
    }

    pub fn from_selection(
        targets: Vec<ChunkRef>,
        kind: RelationKind,
    ) -> Result<Self, GroundTruthError> {
        match (targets.as_slice(), kind) {
            ([], _) => Err(GroundTruthError::NoTargets),
            ([only], _) => Ok(Self::single(*only)),
            (_, RelationKind::Or) => Self::or_all(targets),
            (_, RelationKind::And) => Self::and_all(targets),
        }
    }

    /// Regroups stored rows by `group_index`, ordering items by `group_order`.
    pub fn from_relations(relations: impl IntoIterator<Item = RetrievalRelation>) -> Self {
        let mut grouped: BTreeMap<i32, Vec<(i32, ChunkRef)>> = BTreeMap::new();
        for relation in relations {
            grouped
                .entry(relation.group_index)
                .or_default()
                .push((relation.group_order, relation.target));
        }

        let groups = grouped
            .into_iter()
            .map(|(index, mut items)| {
                items.sort_by_key(|(order, _)| *order);
                EvidenceGroup {
                    index,
                    items: items.into_iter().map(|(_, target)| target).collect(),
                }
            })
            .collect();

        Self { groups }
    }

    pub fn to_relations(&self, query_id: i64) -> Vec<RetrievalRelation> {
        self.groups
            .iter()
            .flat_map(|group| {
                group
                    .items
                    .iter()
                    .enumerate()
                    .map(move |(order, target)| RetrievalRelation {
                        query_id,
                        group_index: group.index,
                        group_order: order as i32,
                        target: *target,
                    })
            })
            .collect()
    }

    pub fn groups(&self) -> &[EvidenceGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn targets(&self) -> BTreeSet<ChunkRef> {
        self.groups
            .iter()
            .flat_map(|g| g.items.iter().copied())
            .collect()
    }

    /// Indices of the groups fully covered by `evidence`.
    pub fn matched_groups<'a>(&self, evidence: impl IntoIterator<Item = &'a ChunkRef>) -> Vec<i32> {
        let evidence: HashSet<ChunkRef> = evidence.into_iter().copied().collect();
        self.groups
            .iter()
            .filter(|group| group.is_matched_by(&evidence))
            .map(|group| group.index)
            .collect()
    }

    pub fn is_satisfied_by<'a>(&self, evidence: impl IntoIterator<Item = &'a ChunkRef>) -> bool {
        !self.matched_groups(evidence).is_empty()
    }

    pub fn shape(&self) -> GroundTruthShape {
        match self.groups.as_slice() {
            [] => GroundTruthShape::Empty,
            [only] if only.items.len() == 1 => GroundTruthShape::Single,
            [_] => GroundTruthShape::MultiHop,
            groups if groups.iter().all(|g| g.items.len() == 1) => GroundTruthShape::Alternatives,
            _ => GroundTruthShape::Mixed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relation(group_index: i32, group_order: i32, target: ChunkRef) -> RetrievalRelation {
        RetrievalRelation {
            query_id: 1,
            group_index,
            group_order,
            target,
        }
    }

    #[test]
    fn test_two_groups_accept_either_or_both() {
        let gt = RetrievalGroundTruth::from_relations(vec![
            relation(0, 0, ChunkRef::Text(1)),
            relation(1, 0, ChunkRef::Image(2)),
        ]);

        assert!(gt.is_satisfied_by(&[ChunkRef::Text(1)]));
        assert!(gt.is_satisfied_by(&[ChunkRef::Image(2)]));
        assert!(gt.is_satisfied_by(&[ChunkRef::Text(1), ChunkRef::Image(2)]));
        assert!(!gt.is_satisfied_by(&[ChunkRef::Text(3)]));
        let none: [ChunkRef; 0] = [];
        assert!(!gt.is_satisfied_by(&none));
    }

    #[test]
    fn test_group_requires_every_member() {
        let gt =
            RetrievalGroundTruth::and_all(vec![ChunkRef::Image(1), ChunkRef::Image(2)]).unwrap();

        assert!(!gt.is_satisfied_by(&[ChunkRef::Image(1)]));
        assert!(gt.is_satisfied_by(&[ChunkRef::Image(2), ChunkRef::Image(1), ChunkRef::Text(5)]));
        assert_eq!(gt.shape(), GroundTruthShape::MultiHop);
    }

    #[test]
    fn test_text_and_image_ids_do_not_collide() {
        let gt = RetrievalGroundTruth::single(ChunkRef::Text(4));
        assert!(!gt.is_satisfied_by(&[ChunkRef::Image(4)]));
    }

    #[test]
    fn test_from_relations_orders_within_groups() {
        let gt = RetrievalGroundTruth::from_relations(vec![
            relation(2, 1, ChunkRef::Text(20)),
            relation(0, 0, ChunkRef::Text(1)),
            relation(2, 0, ChunkRef::Text(10)),
        ]);

        assert_eq!(gt.groups().len(), 2);
        assert_eq!(gt.groups()[0].index, 0);
        assert_eq!(gt.groups()[1].index, 2);
        assert_eq!(gt.groups()[1].items, vec![ChunkRef::Text(10), ChunkRef::Text(20)]);
        assert_eq!(gt.matched_groups(&[ChunkRef::Text(10), ChunkRef::Text(20)]), vec![2]);
        assert_eq!(gt.shape(), GroundTruthShape::Mixed);
    }

    #[test]
    fn test_to_relations_assigns_slots() {
        let gt = RetrievalGroundTruth::new(vec![
            vec![ChunkRef::Image(1), ChunkRef::Image(2)],
            vec![ChunkRef::Text(3)],
        ])
        .unwrap();

        let slots: Vec<(i32, i32, ChunkRef)> = gt
            .to_relations(9)
            .into_iter()
            .map(|r| (r.group_index, r.group_order, r.target))
            .collect();

        assert_eq!(
            slots,
            vec![
                (0, 0, ChunkRef::Image(1)),
                (0, 1, ChunkRef::Image(2)),
                (1, 0, ChunkRef::Text(3)),
            ]
        );
        assert_eq!(RetrievalGroundTruth::from_relations(gt.to_relations(9)), gt);
    }

    #[test]
    fn test_selection_builders() {
        let targets = vec![ChunkRef::Image(1), ChunkRef::Image(2)];

        let or = RetrievalGroundTruth::from_selection(targets.clone(), RelationKind::Or).unwrap();
        assert_eq!(or.shape(), GroundTruthShape::Alternatives);

        let and = RetrievalGroundTruth::from_selection(targets, RelationKind::And).unwrap();
        assert_eq!(and.groups().len(), 1);

        let single =
            RetrievalGroundTruth::from_selection(vec![ChunkRef::Image(1)], RelationKind::And)
                .unwrap();
        assert_eq!(single.shape(), GroundTruthShape::Single);

        assert_eq!(
            RetrievalGroundTruth::from_selection(vec![], RelationKind::Or),
            Err(GroundTruthError::NoTargets)
        );
    }

    #[test]
    fn test_rejects_invalid_groups() {
        assert_eq!(
            RetrievalGroundTruth::new(vec![vec![ChunkRef::Text(1)], vec![]]),
            Err(GroundTruthError::EmptyGroup(1))
        );
        assert_eq!(
            RetrievalGroundTruth::and_all(vec![ChunkRef::Text(1), ChunkRef::Text(1)]),
            Err(GroundTruthError::DuplicateTarget(ChunkRef::Text(1)))
        );
        assert!("xor".parse::<RelationKind>().is_err());
    }
}
