use std::cmp::Ordering;

use crate::Conflict;

/// Priority rank descending, then time-to-conflict ascending.
fn urgency(a: &Conflict, b: &Conflict) -> Ordering {
    b.priority
        .rank()
        .cmp(&a.priority.rank())
        .then_with(|| a.time_to_conflict_minutes.total_cmp(&b.time_to_conflict_minutes))
}

/// Orders conflicts for presentation. The sort is stable, so remaining ties
/// keep detection order.
pub fn rank(mut conflicts: Vec<Conflict>) -> Vec<Conflict> {
    conflicts.sort_by(urgency);
    conflicts
}

/// The conflict to surface first, without reordering the input.
pub fn most_urgent(conflicts: &[Conflict]) -> Option<&Conflict> {
    conflicts.iter().reduce(|best, candidate| {
        if urgency(candidate, best) == Ordering::Less {
            candidate
        } else {
            best
        }
    })
}
