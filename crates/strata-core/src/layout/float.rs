//! Geometry of floating clients.
//!
//! Floating clients keep their restore geometry unless one of the computed states
//! (full, max, max-vert, max-horz, half, fill) applies. The same rules hold for
//! individually floating clients under tiled layouts.

use crate::client::{Client, ClientState};
use crate::geometry::{ClientGeometry, Geometry};

/// Frame geometry for a floating `client`.
///
/// `screen` is the monitor rectangle, `workarea` the monitor minus reservations and
/// `others` the outer extents of the other visible windows, used by fill.
pub fn geometry(client: &Client, screen: Geometry, workarea: Geometry, others: &[Geometry]) -> ClientGeometry {
    let restore = client.restore;
    let is = client.is;
    let framed = |outer: Geometry| ClientGeometry::from_outer(outer, restore.border, restore.title, restore.grip);

    if is.contains(ClientState::FULL) {
        return ClientGeometry::from_outer(screen, 0, 0, 0);
    }

    let mut g = if is.contains(ClientState::MAX) {
        framed(workarea)
    } else if is.intersects(ClientState::MAXV | ClientState::MAXH) {
        let mut outer = restore.outer();
        if is.contains(ClientState::MAXV) {
            outer.y = workarea.y;
            outer.height = workarea.height;
        }
        if is.contains(ClientState::MAXH) {
            outer.x = workarea.x;
            outer.width = workarea.width;
        }
        framed(outer)
    } else if is.contains(ClientState::LHALF) {
        framed(Geometry::new(workarea.x, workarea.y, workarea.width / 2, workarea.height))
    } else if is.contains(ClientState::RHALF) {
        let half = workarea.width / 2;
        framed(Geometry::new(
            workarea.x + half,
            workarea.y,
            workarea.width - half,
            workarea.height,
        ))
    } else if is.contains(ClientState::FILL) {
        framed(fill(restore.outer(), workarea, others))
    } else {
        restore
    };

    if is.contains(ClientState::SHADED) {
        g.height = client.shaded_height();
    }
    g
}

/// Grow `current` into the free space around it.
///
/// Horizontal extents grow first, up to the nearest window edge beside it or the
/// workarea edge; vertical extents then grow within the widened span. Windows that
/// already overlap `current` are ignored.
pub fn fill(current: Geometry, workarea: Geometry, others: &[Geometry]) -> Geometry {
    let obstacles: Vec<Geometry> = others
        .iter()
        .copied()
        .filter(|o| !o.intersects(current))
        .collect();

    let mut left = workarea.x.min(current.x);
    let mut right = workarea.right().max(current.right());
    for o in &obstacles {
        if o.y < current.bottom() && o.bottom() > current.y {
            if o.right() <= current.x {
                left = left.max(o.right());
            }
            if o.x >= current.right() {
                right = right.min(o.x);
            }
        }
    }

    let mut top = workarea.y.min(current.y);
    let mut bottom = workarea.bottom().max(current.bottom());
    for o in &obstacles {
        if o.x < right && o.right() > left {
            if o.bottom() <= current.y {
                top = top.max(o.bottom());
            }
            if o.y >= current.bottom() {
                bottom = bottom.min(o.y);
            }
        }
    }

    Geometry::new(left, top, right - left, bottom - top)
}
