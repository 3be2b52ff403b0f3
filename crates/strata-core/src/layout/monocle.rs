//! Monocle layout.

use crate::geometry::Geometry;
use crate::layout::{Slot, Tileable};

/// Every client gets the whole workarea; which one shows is up to the stacking order.
pub fn arrange(wa: Geometry, clients: &[Tileable]) -> Vec<Slot> {
    clients
        .iter()
        .map(|client| Slot {
            id: client.id,
            outer: wa,
            unshade: client.shaded,
        })
        .collect()
}
