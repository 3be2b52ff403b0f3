//! Grid layout: clients fill columns row by row.

use crate::geometry::Geometry;
use crate::layout::{Slot, Tileable};
use crate::view::View;

/// Arrange `clients` in `min(ncolumns, n)` columns, filling row-major.
///
/// Each column divides the height among its own windows; the last row of a column
/// absorbs the vertical remainder and the last column the horizontal one.
pub fn arrange(view: &View, wa: Geometry, clients: &[Tileable]) -> Vec<Slot> {
    let n = clients.len();
    if n == 0 {
        return Vec::new();
    }
    let cols = view.ncolumns.max(1).min(n);
    let col_width = wa.width / cols as i32;
    let width_remainder = wa.width % cols as i32;

    clients
        .iter()
        .enumerate()
        .map(|(i, client)| {
            let col = i % cols;
            let row = i / cols;
            let in_col = (n / cols + usize::from(col < n % cols)) as i32;
            let row_height = wa.height / in_col;
            let height = if row as i32 == in_col - 1 {
                row_height + wa.height % in_col
            } else {
                row_height
            };
            let width = if col == cols - 1 {
                col_width + width_remainder
            } else {
                col_width
            };
            Slot {
                id: client.id,
                outer: Geometry::new(
                    wa.x + col as i32 * col_width,
                    wa.y + row as i32 * row_height,
                    width,
                    height,
                ),
                unshade: client.shaded,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::layout::testutil::tileables;
    use pretty_assertions::assert_eq;

    fn view(ncolumns: usize) -> View {
        let mut view = View::new(0, &LayoutConfig::default());
        view.ncolumns = ncolumns;
        view
    }

    #[test]
    fn test_grid_five_in_two_columns() {
        let (_arena, clients) = tileables(5, 0);
        let wa = Geometry::new(0, 0, 1001, 900);
        let slots = arrange(&view(2), wa, &clients);
        let outers: Vec<Geometry> = slots.iter().map(|s| s.outer).collect();
        assert_eq!(
            outers,
            vec![
                Geometry::new(0, 0, 500, 300),
                Geometry::new(500, 0, 501, 450),
                Geometry::new(0, 300, 500, 300),
                Geometry::new(500, 450, 501, 450),
                Geometry::new(0, 600, 500, 300),
            ]
        );
    }

    #[test]
    fn test_grid_columns_capped_by_count() {
        let (_arena, clients) = tileables(2, 0);
        let wa = Geometry::new(10, 10, 800, 600);
        let slots = arrange(&view(4), wa, &clients);
        assert_eq!(slots[0].outer, Geometry::new(10, 10, 400, 600));
        assert_eq!(slots[1].outer, Geometry::new(410, 10, 400, 600));
    }

    #[test]
    fn test_grid_height_remainder_to_last_row() {
        let (_arena, clients) = tileables(3, 0);
        let wa = Geometry::new(0, 0, 300, 100);
        let slots = arrange(&view(1), wa, &clients);
        let heights: Vec<i32> = slots.iter().map(|s| s.outer.height).collect();
        assert_eq!(heights, vec![33, 33, 34]);
        assert_eq!(slots[2].outer.bottom(), 100);
    }
}
