//! Edge snapping for interactive moves and resizes.

use crate::drag::Anchor;
use crate::geometry::Geometry;

/// What dragged edges may snap to, in priority order.
#[derive(Debug, Clone, Default)]
pub struct SnapTargets {
    pub workarea: Geometry,
    /// Monitor rectangle.
    pub screen: Geometry,
    /// Outer extents of the other visible windows.
    pub windows: Vec<Geometry>,
}

impl SnapTargets {
    /// Vertical lines a left or right edge spanning `top..bottom` may snap to.
    fn vertical_lines(&self, top: i32, bottom: i32) -> Vec<i32> {
        let wa = self.workarea;
        let mut lines = vec![
            wa.x,
            wa.right(),
            self.screen.x,
            self.screen.right(),
            wa.x + wa.width / 2,
        ];
        for w in &self.windows {
            if w.y <= bottom && w.bottom() >= top {
                lines.push(w.x);
                lines.push(w.right());
            }
        }
        lines
    }

    /// Horizontal lines a top or bottom edge spanning `left..right` may snap to.
    fn horizontal_lines(&self, left: i32, right: i32) -> Vec<i32> {
        let wa = self.workarea;
        let mut lines = vec![
            wa.y,
            wa.bottom(),
            self.screen.y,
            self.screen.bottom(),
            wa.y + wa.height / 2,
        ];
        for w in &self.windows {
            if w.x <= right && w.right() >= left {
                lines.push(w.y);
                lines.push(w.bottom());
            }
        }
        lines
    }
}

/// Offset that brings one of `edges` onto the first line within `distance`.
///
/// Lines are tried in order; for each line the edges are tried in order.
fn first_match(edges: &[i32], lines: &[i32], distance: i32) -> Option<i32> {
    lines.iter().find_map(|&line| {
        edges
            .iter()
            .find(|&&edge| (line - edge).abs() <= distance)
            .map(|&edge| line - edge)
    })
}

/// Snap the outer extents of a dragged frame.
///
/// A move shifts the frame so that either vertical edge (and either horizontal
/// edge) lands on a target line; a resize snaps only the edges the anchor moves,
/// each on its own.
pub fn snap(candidate: Geometry, anchor: Anchor, targets: &SnapTargets, distance: i32) -> Geometry {
    if distance <= 0 {
        return candidate;
    }
    let c = candidate;
    let vertical = targets.vertical_lines(c.y, c.bottom());
    let horizontal = targets.horizontal_lines(c.x, c.right());
    let mut g = c;

    if anchor == Anchor::Center {
        if let Some(dx) = first_match(&[c.x, c.right()], &vertical, distance) {
            g.x += dx;
        }
        if let Some(dy) = first_match(&[c.y, c.bottom()], &horizontal, distance) {
            g.y += dy;
        }
        return g;
    }

    if anchor.moves_left() {
        if let Some(dx) = first_match(&[c.x], &vertical, distance) {
            g.x += dx;
            g.width -= dx;
        }
    } else if anchor.moves_right() {
        if let Some(dx) = first_match(&[c.right()], &vertical, distance) {
            g.width += dx;
        }
    }
    if anchor.moves_top() {
        if let Some(dy) = first_match(&[c.y], &horizontal, distance) {
            g.y += dy;
            g.height -= dy;
        }
    } else if anchor.moves_bottom() {
        if let Some(dy) = first_match(&[c.bottom()], &horizontal, distance) {
            g.height += dy;
        }
    }
    g
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn targets() -> SnapTargets {
        SnapTargets {
            workarea: Geometry::new(0, 20, 1000, 780),
            screen: Geometry::new(0, 0, 1000, 800),
            windows: vec![Geometry::new(600, 100, 200, 200)],
        }
    }

    #[test]
    fn test_move_snaps_to_workarea_edge() {
        let g = snap(Geometry::new(6, 27, 100, 100), Anchor::Center, &targets(), 10);
        assert_eq!(g, Geometry::new(0, 20, 100, 100));
    }

    #[test]
    fn test_move_snaps_right_edge_to_window() {
        // Right edge 595 is 5px from the neighbour's left edge at 600.
        let g = snap(Geometry::new(395, 150, 200, 100), Anchor::Center, &targets(), 10);
        assert_eq!(g, Geometry::new(400, 150, 200, 100));
    }

    #[test]
    fn test_window_edges_need_range_overlap() {
        // Same horizontal position as above but far below the neighbour.
        let g = snap(Geometry::new(395, 500, 200, 100), Anchor::Center, &targets(), 10);
        assert_eq!(g, Geometry::new(395, 500, 200, 100));
    }

    #[test]
    fn test_workarea_wins_over_screen() {
        // Top edge 14 is within reach of both the screen top (0) and workarea top (20).
        let g = snap(Geometry::new(300, 14, 100, 100), Anchor::Center, &targets(), 15);
        assert_eq!(g.y, 20);
    }

    #[test]
    fn test_resize_snaps_only_moving_edges() {
        let g = snap(Geometry::new(3, 400, 493, 100), Anchor::Right, &targets(), 10);
        // Right edge 496 reaches the centerline at 500; the left edge stays.
        assert_eq!(g, Geometry::new(3, 400, 497, 100));

        let g = snap(Geometry::new(3, 350, 200, 100), Anchor::TopLeft, &targets(), 10);
        assert_eq!(g, Geometry::new(0, 350, 203, 100));
    }

    #[test]
    fn test_resize_top_edge_snaps_to_centerline() {
        // Workarea centerline sits at 20 + 780 / 2 = 410; the bottom edge stays put.
        let g = snap(Geometry::new(3, 400, 200, 100), Anchor::TopLeft, &targets(), 10);
        assert_eq!(g, Geometry::new(0, 410, 203, 90));
    }

    #[test]
    fn test_zero_distance_disables() {
        let c = Geometry::new(1, 21, 10, 10);
        assert_eq!(snap(c, Anchor::Center, &targets(), 0), c);
    }
}
