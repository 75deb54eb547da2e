//! Derived completion ratios over matrix state.
//!
//! Progress is never stored: every caller recomputes from a snapshot, so
//! the reported value always equals a fresh recomputation.

use crate::models::{ChecklistCell, Item};

/// Fraction of this item's active cells that are completed. Exactly 0.0
/// when the item has no active cells.
pub fn item_progress(item_id: i64, cells: &[ChecklistCell]) -> f64 {
    let mut active = 0u32;
    let mut completed = 0u32;
    for cell in cells.iter().filter(|c| c.item_id == item_id && c.active) {
        active += 1;
        if cell.completed {
            completed += 1;
        }
    }
    if active == 0 {
        return 0.0;
    }
    f64::from(completed) / f64::from(active)
}

/// Arithmetic mean of `item_progress` over all items. Exactly 0.0 for a
/// project with no items.
pub fn project_progress(items: &[Item], cells: &[ChecklistCell]) -> f64 {
    if items.is_empty() {
        return 0.0;
    }
    let sum: f64 = items.iter().map(|i| item_progress(i.id, cells)).sum();
    sum / items.len() as f64
}
