//! Initial placement of new floating clients.

use serde::{Deserialize, Serialize};

use crate::geometry::{Geometry, Point};

/// Cascade step between successive windows.
const CASCADE_STEP: i32 = 24;

/// Policy for positioning a floating client that did not ask for a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Center,
    Cascade,
    UnderMouse,
    #[default]
    MinOverlap,
}

/// Pick the outer top-left corner for a window of outer size `width`×`height`.
///
/// `others` are the outer extents of the visible windows already on the monitor.
/// The result keeps the window inside `wa` whenever it fits.
pub fn place(
    policy: Placement,
    width: i32,
    height: i32,
    wa: Geometry,
    pointer: Point,
    others: &[Geometry],
) -> Point {
    let origin = match policy {
        Placement::Center => Point::new(
            wa.x + (wa.width - width) / 2,
            wa.y + (wa.height - height) / 2,
        ),
        Placement::UnderMouse => Point::new(pointer.x - width / 2, pointer.y - height / 2),
        Placement::Cascade => cascade(width, height, wa, others.len()),
        Placement::MinOverlap => min_overlap(width, height, wa, others),
    };
    clamp_into(origin, width, height, wa)
}

/// Shift a `width`×`height` frame at `p` so it lies inside `wa` where possible.
pub fn clamp_into(p: Point, width: i32, height: i32, wa: Geometry) -> Point {
    let x = p.x.min(wa.right() - width).max(wa.x);
    let y = p.y.min(wa.bottom() - height).max(wa.y);
    Point::new(x, y)
}

fn cascade(width: i32, height: i32, wa: Geometry, count: usize) -> Point {
    let room_x = ((wa.width - width) / CASCADE_STEP).max(1);
    let room_y = ((wa.height - height) / CASCADE_STEP).max(1);
    let steps = (count as i32) % room_x.min(room_y);
    Point::new(wa.x + steps * CASCADE_STEP, wa.y + steps * CASCADE_STEP)
}

/// Candidate corners are the workarea corner and the right/bottom edges of the other
/// windows; the one with the least total overlap wins, earliest candidate on ties.
fn min_overlap(width: i32, height: i32, wa: Geometry, others: &[Geometry]) -> Point {
    let mut xs = vec![wa.x];
    let mut ys = vec![wa.y];
    for o in others {
        xs.push(o.right());
        ys.push(o.bottom());
    }
    xs.retain(|&x| x + width <= wa.right());
    ys.retain(|&y| y + height <= wa.bottom());
    if xs.is_empty() {
        xs.push(wa.x);
    }
    if ys.is_empty() {
        ys.push(wa.y);
    }

    let mut best = Point::new(wa.x, wa.y);
    let mut best_overlap = i64::MAX;
    for &y in &ys {
        for &x in &xs {
            let candidate = Geometry::new(x, y, width, height);
            let overlap: i64 = others
                .iter()
                .filter_map(|o| o.intersection(candidate))
                .map(Geometry::area)
                .sum();
            if overlap < best_overlap {
                best_overlap = overlap;
                best = Point::new(x, y);
                if overlap == 0 {
                    return best;
                }
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    const WA: Geometry = Geometry::new(0, 0, 1000, 800);

    #[test]
    fn test_center() {
        let p = place(Placement::Center, 200, 100, WA, Point::default(), &[]);
        assert_eq!(p, Point::new(400, 350));
    }

    #[test]
    fn test_under_mouse_is_clamped() {
        let p = place(Placement::UnderMouse, 200, 100, WA, Point::new(990, 10), &[]);
        assert_eq!(p, Point::new(800, 0));
    }

    #[test]
    fn test_cascade_steps() {
        let others = [Geometry::new(0, 0, 10, 10); 2];
        let p = place(Placement::Cascade, 200, 100, WA, Point::default(), &others);
        assert_eq!(p, Point::new(48, 48));
    }

    #[test]
    fn test_min_overlap_finds_free_spot() {
        let others = [Geometry::new(0, 0, 600, 800)];
        let p = place(Placement::MinOverlap, 300, 300, WA, Point::default(), &others);
        assert_eq!(p, Point::new(600, 0));
    }
}
