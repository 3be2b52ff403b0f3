//! Master/slave tiling in four orientations.

use crate::geometry::Geometry;
use crate::layout::{Slot, Tileable};
use crate::view::{Side, View};

/// Tile `clients` into a master region on `view.major` and a slave region on the
/// opposite side.
///
/// The master region takes `mwfact` of the major extent. Master and slave regions
/// overlap by one border width, as do neighbouring windows within a region, so
/// adjacent borders are drawn once.
pub fn arrange(view: &View, wa: Geometry, clients: &[Tileable]) -> Vec<Slot> {
    let mut slots = Vec::with_capacity(clients.len());
    if clients.is_empty() {
        return slots;
    }

    let nmaster = view.nmaster.min(clients.len());
    let (masters, slaves) = clients.split_at(nmaster);
    let overlap = max_border(clients);
    let major_extent = if view.major.is_horizontal() {
        wa.width
    } else {
        wa.height
    };

    let (master_region, slave_region) = if masters.is_empty() {
        (None, Some(wa))
    } else if slaves.is_empty() {
        (Some(wa), None)
    } else {
        let master_extent = (f64::from(major_extent) * view.mwfact) as i32;
        let (m, s) = split_major(wa, view.major, master_extent, overlap);
        (Some(m), Some(s))
    };

    let reverse = matches!(view.minor, Side::Bottom | Side::Right);
    if let Some(region) = master_region {
        split_region(region, view.major.is_horizontal(), reverse, masters, &mut slots);
    }
    if let Some(region) = slave_region {
        split_region(region, view.major.is_horizontal(), reverse, slaves, &mut slots);
    }
    slots
}

fn max_border(clients: &[Tileable]) -> i32 {
    clients.iter().map(|c| c.border).max().unwrap_or(0)
}

/// Split `wa` into master and slave regions along the major axis.
fn split_major(wa: Geometry, side: Side, master: i32, overlap: i32) -> (Geometry, Geometry) {
    let master = master.clamp(0, if side.is_horizontal() { wa.width } else { wa.height });
    match side {
        Side::Left => (
            Geometry::new(wa.x, wa.y, master, wa.height),
            Geometry::new(wa.x + master - overlap, wa.y, wa.width - master + overlap, wa.height),
        ),
        Side::Right => (
            Geometry::new(wa.right() - master, wa.y, master, wa.height),
            Geometry::new(wa.x, wa.y, wa.width - master + overlap, wa.height),
        ),
        Side::Top => (
            Geometry::new(wa.x, wa.y, wa.width, master),
            Geometry::new(wa.x, wa.y + master - overlap, wa.width, wa.height - master + overlap),
        ),
        Side::Bottom => (
            Geometry::new(wa.x, wa.bottom() - master, wa.width, master),
            Geometry::new(wa.x, wa.y, wa.width, wa.height - master + overlap),
        ),
    }
}

/// Stack `clients` along the minor axis of `region`.
///
/// `vertical` stacks top to bottom (the major axis is horizontal). Shaded windows
/// get a fixed extent of their title plus borders; the unshaded ones share the rest
/// evenly with the remainder going to the last of them. If every window is shaded
/// the last one is unshaded.
fn split_region(
    region: Geometry,
    vertical: bool,
    reverse: bool,
    clients: &[Tileable],
    slots: &mut Vec<Slot>,
) {
    let count = clients.len();
    if count == 0 {
        return;
    }
    let overlap = max_border(clients);

    let mut shaded: Vec<bool> = clients.iter().map(|c| c.shaded).collect();
    let mut forced = None;
    if shaded.iter().all(|&s| s) {
        shaded[count - 1] = false;
        forced = Some(count - 1);
    }

    let extent = if vertical { region.height } else { region.width };
    let available = extent + (count as i32 - 1) * overlap;
    let fixed: i32 = clients
        .iter()
        .zip(&shaded)
        .filter(|(_, &s)| s)
        .map(|(c, _)| shaded_extent(c))
        .sum();
    let unshaded = shaded.iter().filter(|&&s| !s).count() as i32;
    let share = (available - fixed) / unshaded;
    let remainder = (available - fixed) % unshaded;
    let last_unshaded = shaded.iter().rposition(|&s| !s);

    let mut offset = 0;
    for (i, client) in clients.iter().enumerate() {
        let size = if shaded[i] {
            shaded_extent(client)
        } else if Some(i) == last_unshaded {
            share + remainder
        } else {
            share
        };
        let start = if reverse {
            extent - offset - size
        } else {
            offset
        };
        let outer = if vertical {
            Geometry::new(region.x, region.y + start, region.width, size)
        } else {
            Geometry::new(region.x + start, region.y, size, region.height)
        };
        slots.push(Slot {
            id: client.id,
            outer,
            unshade: forced == Some(i),
        });
        offset += size - overlap;
    }
}

const fn shaded_extent(client: &Tileable) -> i32 {
    client.title + 2 * client.border
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::layout::testutil::tileables;
    use crate::layout::Layout;
    use pretty_assertions::assert_eq;

    fn view(layout: Layout, nmaster: usize, mwfact: f64) -> View {
        let mut view = View::new(0, &LayoutConfig::default());
        view.set_layout(layout);
        view.nmaster = nmaster;
        view.mwfact = mwfact;
        view
    }

    #[test]
    fn test_master_takes_mwfact() {
        let (_arena, clients) = tileables(3, 0);
        let wa = Geometry::new(0, 0, 1000, 800);
        let slots = arrange(&view(Layout::TileLeft, 1, 0.6), wa, &clients);
        assert_eq!(slots[0].outer, Geometry::new(0, 0, 600, 800));
        assert_eq!(slots[1].outer, Geometry::new(600, 0, 400, 400));
        assert_eq!(slots[2].outer, Geometry::new(600, 400, 400, 400));
    }

    #[test]
    fn test_master_right_and_bottom() {
        let (_arena, clients) = tileables(2, 0);
        let wa = Geometry::new(0, 0, 1000, 800);
        let slots = arrange(&view(Layout::TileRight, 1, 0.5), wa, &clients);
        assert_eq!(slots[0].outer, Geometry::new(500, 0, 500, 800));
        assert_eq!(slots[1].outer, Geometry::new(0, 0, 500, 800));

        let slots = arrange(&view(Layout::TileBottom, 1, 0.25), wa, &clients);
        assert_eq!(slots[0].outer, Geometry::new(0, 600, 1000, 200));
        assert_eq!(slots[1].outer, Geometry::new(0, 0, 1000, 600));
    }

    #[test]
    fn test_regions_overlap_by_border() {
        let (_arena, clients) = tileables(3, 2);
        let wa = Geometry::new(0, 0, 1000, 800);
        let slots = arrange(&view(Layout::TileLeft, 1, 0.5), wa, &clients);
        assert_eq!(slots[0].outer.right(), 500);
        assert_eq!(slots[1].outer.x, 498);
        assert_eq!(slots[1].outer.right(), 1000);
        // Stacked slaves share their border row.
        assert_eq!(slots[1].outer.bottom() - 2, slots[2].outer.y);
        assert_eq!(slots[2].outer.bottom(), 800);
    }

    #[test]
    fn test_remainder_to_last() {
        let (_arena, clients) = tileables(4, 0);
        let wa = Geometry::new(0, 0, 1000, 800);
        let slots = arrange(&view(Layout::TileLeft, 1, 0.6), wa, &clients);
        let heights: Vec<i32> = slots[1..].iter().map(|s| s.outer.height).collect();
        assert_eq!(heights, vec![266, 266, 268]);
    }

    #[test]
    fn test_shaded_windows_get_title_extent() {
        let (_arena, mut clients) = tileables(3, 1);
        clients[1].shaded = true;
        let wa = Geometry::new(0, 0, 1000, 800);
        let slots = arrange(&view(Layout::TileLeft, 0, 0.6), wa, &clients);
        assert_eq!(slots[1].outer.height, 20);
        assert!(!slots[1].unshade);
        assert_eq!(slots[0].outer.height + slots[2].outer.height + 20 - 2, 800);
    }

    #[test]
    fn test_all_shaded_region_unshades_last() {
        let (_arena, mut clients) = tileables(2, 1);
        for c in &mut clients {
            c.shaded = true;
        }
        let wa = Geometry::new(0, 0, 1000, 800);
        let slots = arrange(&view(Layout::TileLeft, 0, 0.6), wa, &clients);
        assert!(!slots[0].unshade);
        assert!(slots[1].unshade);
        assert_eq!(slots[0].outer.height, 20);
        assert_eq!(slots[1].outer.height, 781);
    }

    #[test]
    fn test_reverse_minor_fills_from_bottom() {
        let (_arena, clients) = tileables(2, 0);
        let wa = Geometry::new(0, 0, 1000, 800);
        let mut v = view(Layout::TileLeft, 0, 0.6);
        v.minor = Side::Bottom;
        let slots = arrange(&v, wa, &clients);
        assert_eq!(slots[0].outer, Geometry::new(0, 400, 1000, 400));
        assert_eq!(slots[1].outer, Geometry::new(0, 0, 1000, 400));
    }
}
