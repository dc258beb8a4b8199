//! Presentation order for chat history.
//!
//! Adjacent (user, assistant) turns form a pair; anything else stands
//! alone. With more than one pair the groups are reversed so the latest
//! exchange comes first, while each pair keeps its user-then-assistant
//! order. A lone pair is returned as is.

use ldm_core::types::{ChatTurn, Role};

/// Reorder history for display, most recent exchange first.
pub fn order_history(turns: &[ChatTurn]) -> Vec<ChatTurn> {
    let mut groups: Vec<&[ChatTurn]> = Vec::with_capacity(turns.len() / 2 + 1);
    let mut pairs = 0usize;
    let mut rest = turns;

    while !rest.is_empty() {
        let is_pair = matches!(
            rest,
            [first, second, ..] if first.role == Role::User && second.role == Role::Assistant
        );
        let width = if is_pair { 2 } else { 1 };
        if is_pair {
            pairs += 1;
        }
        let (group, tail) = rest.split_at(width);
        groups.push(group);
        rest = tail;
    }

    if pairs > 1 {
        groups.reverse();
    }

    groups.into_iter().flatten().cloned().collect()
}
