use serde::Serialize;

use super::reference::ReferenceEntity;

/// Ids of a many-to-many relation of the entity under edit, in selection
/// order. This set, not the picker, is what gets saved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssociationSet {
    ids: Vec<i64>,
}

impl AssociationSet {
    pub fn from_ids<I: IntoIterator<Item = i64>>(ids: I) -> Self {
        let mut set = Self::default();
        for id in ids {
            set.insert(id);
        }
        set
    }

    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    pub fn contains(&self, id: i64) -> bool {
        self.ids.contains(&id)
    }

    pub fn insert(&mut self, id: i64) -> bool {
        if self.contains(id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    pub fn remove(&mut self, id: i64) -> bool {
        let before = self.ids.len();
        self.ids.retain(|x| *x != id);
        self.ids.len() != before
    }
}

/// The association set projected onto one visible option list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub selected_indices: Vec<usize>,
    pub selected_ids: Vec<i64>,
    /// Associated ids with no visible option; kept for save.
    pub hidden_selected_ids: Vec<i64>,
}

pub fn reconcile(set: &AssociationSet, visible: &[&ReferenceEntity]) -> Projection {
    let mut out = Projection::default();
    for (idx, e) in visible.iter().enumerate() {
        if set.contains(e.id) {
            out.selected_indices.push(idx);
            out.selected_ids.push(e.id);
        }
    }
    out.hidden_selected_ids = set
        .ids()
        .iter()
        .copied()
        .filter(|id| !visible.iter().any(|e| e.id == *id))
        .collect();
    out
}

/// Explicit user toggle of one visible option.
pub fn toggle(set: &mut AssociationSet, id: i64, selected: bool) -> bool {
    if selected {
        set.insert(id)
    } else {
        set.remove(id)
    }
}

/// Replaces the visible part of the set with `selected_ids`; hidden ids stay.
/// Returns whether the set changed.
pub fn apply_visible_selection(
    set: &mut AssociationSet,
    visible: &[&ReferenceEntity],
    selected_ids: &[i64],
) -> bool {
    let before = set.clone();
    for e in visible {
        if !selected_ids.contains(&e.id) {
            set.remove(e.id);
        }
    }
    for id in selected_ids {
        if visible.iter().any(|e| e.id == *id) {
            set.insert(*id);
        }
    }
    *set != before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::cascade::{visible_options, visible_options_any};
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn subjects() -> Vec<ReferenceEntity> {
        vec![
            ReferenceEntity::new(10, &["Algo"]).with_cascade_key(1),
            ReferenceEntity::new(11, &["Torts"]).with_cascade_key(2),
            ReferenceEntity::new(12, &["Compilers"]).with_cascade_key(1),
        ]
    }

    #[test]
    fn marks_exactly_the_visible_members() {
        let all = subjects();
        let set = AssociationSet::from_ids([12, 11]);
        let p = reconcile(&set, &visible_options(&all, Some(1)));
        assert_eq!(p.selected_indices, vec![1]);
        assert_eq!(p.selected_ids, vec![12]);
        assert_eq!(p.hidden_selected_ids, vec![11]);
    }

    #[test]
    fn refiltering_reproduces_full_selection_from_retained_set() {
        let all = subjects();
        let set = AssociationSet::from_ids([10, 11]);

        let only_cs = reconcile(&set, &visible_options(&all, Some(1)));
        assert_eq!(only_cs.selected_ids, vec![10]);
        let only_law = reconcile(&set, &visible_options(&all, Some(2)));
        assert_eq!(only_law.selected_ids, vec![11]);

        let both = reconcile(&set, &visible_options_any(&all, &[1, 2]));
        assert_eq!(both.selected_ids, vec![10, 11]);
        assert!(both.hidden_selected_ids.is_empty());
        assert_eq!(set.ids(), &[10, 11]);
    }

    #[test]
    fn toggle_mutates_the_set_before_projection() {
        let all = subjects();
        let mut set = AssociationSet::from_ids([11]);
        assert!(toggle(&mut set, 10, true));
        assert!(!toggle(&mut set, 10, true));
        let p = reconcile(&set, &visible_options(&all, Some(1)));
        assert_eq!(p.selected_ids, vec![10]);
        assert!(toggle(&mut set, 10, false));
        assert_eq!(set.ids(), &[11]);
    }

    #[test]
    fn visible_selection_replacement_keeps_hidden_ids() {
        let all = subjects();
        let mut set = AssociationSet::from_ids([10, 11]);
        let cs = visible_options(&all, Some(1));
        assert!(apply_visible_selection(&mut set, &cs, &[12]));
        assert_eq!(set.ids(), &[11, 12]);
        // ids outside the visible list are ignored
        assert!(!apply_visible_selection(&mut set, &cs, &[12, 99]));
        assert_eq!(set.ids(), &[11, 12]);
    }

    fn options(ids: &BTreeSet<i64>) -> Vec<ReferenceEntity> {
        ids.iter().map(|id| ReferenceEntity::new(*id, &["s"])).collect()
    }

    proptest! {
        #[test]
        fn projection_is_exactly_the_visible_part_of_the_set(
            a in prop::collection::vec(0i64..24, 0..16),
            v in prop::collection::btree_set(0i64..24, 0..16),
            v2 in prop::collection::btree_set(0i64..24, 0..16),
        ) {
            let set = AssociationSet::from_ids(a);
            let first = options(&v);
            let first_refs: Vec<&ReferenceEntity> = first.iter().collect();

            let p = reconcile(&set, &first_refs);
            let expected: Vec<i64> = v.iter().copied().filter(|id| set.contains(*id)).collect();
            prop_assert_eq!(&p.selected_ids, &expected);
            prop_assert_eq!(p.selected_indices.len(), p.selected_ids.len());
            for (idx, id) in p.selected_indices.iter().zip(&p.selected_ids) {
                prop_assert_eq!(first_refs[*idx].id, *id);
            }
            let hidden: Vec<i64> = set.ids().iter().copied().filter(|id| !v.contains(id)).collect();
            prop_assert_eq!(&p.hidden_selected_ids, &hidden);

            // refilter to V' and back: the retained set reproduces both projections
            let second = options(&v2);
            let second_refs: Vec<&ReferenceEntity> = second.iter().collect();
            let p2 = reconcile(&set, &second_refs);
            let expected2: Vec<i64> = v2.iter().copied().filter(|id| set.contains(*id)).collect();
            prop_assert_eq!(p2.selected_ids, expected2);
            prop_assert_eq!(reconcile(&set, &first_refs), p);
        }

        #[test]
        fn visible_selection_never_touches_hidden_ids(
            a in prop::collection::vec(0i64..24, 0..16),
            v in prop::collection::btree_set(0i64..24, 0..16),
            picked in prop::collection::vec(0i64..24, 0..16),
        ) {
            let mut set = AssociationSet::from_ids(a);
            let before = set.clone();
            let visible = options(&v);
            let refs: Vec<&ReferenceEntity> = visible.iter().collect();

            let changed = apply_visible_selection(&mut set, &refs, &picked);
            prop_assert_eq!(changed, set != before);
            for id in 0i64..24 {
                if v.contains(&id) {
                    prop_assert_eq!(set.contains(id), picked.contains(&id));
                } else {
                    prop_assert_eq!(set.contains(id), before.contains(id));
                }
            }
            let p = reconcile(&set, &refs);
            let expected: Vec<i64> = v.iter().copied().filter(|id| picked.contains(id)).collect();
            prop_assert_eq!(p.selected_ids, expected);
        }
    }
}
