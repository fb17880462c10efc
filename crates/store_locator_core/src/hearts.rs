//! Heart (favorite) toggling with set semantics.

use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartAction {
    Add,
    Remove,
}

/// Hearting an already-hearted store removes it; anything else adds it.
pub fn toggle_action(hearts: &[Uuid], store_id: Uuid) -> HeartAction {
    if hearts.contains(&store_id) {
        HeartAction::Remove
    } else {
        HeartAction::Add
    }
}

/// Applies `action` to an in-memory hearts set without ever duplicating an id.
pub fn apply(hearts: &mut Vec<Uuid>, store_id: Uuid, action: HeartAction) {
    match action {
        HeartAction::Add => {
            if !hearts.contains(&store_id) {
                hearts.push(store_id);
            }
        }
        HeartAction::Remove => hearts.retain(|id| *id != store_id),
    }
}
