use super::reference::ReferenceEntity;

/// Options of a dependent collection under one parent selection. No parent
/// means nothing is visible: the dependent picker stays blank until a parent
/// is chosen.
pub fn visible_options(
    collection: &[ReferenceEntity],
    parent: Option<i64>,
) -> Vec<&ReferenceEntity> {
    let Some(parent) = parent else {
        return Vec::new();
    };
    collection
        .iter()
        .filter(|e| e.cascade_key == Some(parent))
        .collect()
}

/// Multi-parent variant: options under any of the selected parents, in
/// collection order.
pub fn visible_options_any<'a>(
    collection: &'a [ReferenceEntity],
    parents: &[i64],
) -> Vec<&'a ReferenceEntity> {
    collection
        .iter()
        .filter(|e| e.cascade_key.is_some_and(|k| parents.contains(&k)))
        .collect()
}

/// Dependent single-select value after the visible set changed.
pub fn reselect(previous: Option<i64>, visible: &[&ReferenceEntity]) -> Option<i64> {
    match previous {
        Some(id) if visible.iter().any(|e| e.id == id) => Some(id),
        Some(_) => None,
        None => visible.first().map(|e| e.id),
    }
}
