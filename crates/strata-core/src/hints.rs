//! ICCCM size hints, the size constraint pass and gravity reference mapping.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::geometry::{ClientGeometry, Point};

/// Upper bound on constraint passes before giving up on a fixed point.
const MAX_CONSTRAIN_PASSES: usize = 4096;

/// An aspect ratio as `x:y` (width part : height part).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ratio {
    pub x: i32,
    pub y: i32,
}

impl Ratio {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    const fn is_valid(self) -> bool {
        self.x > 0 && self.y > 0
    }
}

/// ICCCM window gravity.
///
/// Values 0 (forget/unmap) and anything out of range behave as `NorthWest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gravity {
    #[default]
    NorthWest,
    North,
    NorthEast,
    West,
    Center,
    East,
    SouthWest,
    South,
    SouthEast,
    Static,
}

impl Gravity {
    pub const ALL: [Self; 10] = [
        Self::NorthWest,
        Self::North,
        Self::NorthEast,
        Self::West,
        Self::Center,
        Self::East,
        Self::SouthWest,
        Self::South,
        Self::SouthEast,
        Self::Static,
    ];

    /// Map the protocol's numeric `win_gravity` value.
    pub const fn from_icccm(value: u32) -> Self {
        match value {
            2 => Self::North,
            3 => Self::NorthEast,
            4 => Self::West,
            5 => Self::Center,
            6 => Self::East,
            7 => Self::SouthWest,
            8 => Self::South,
            9 => Self::SouthEast,
            10 => Self::Static,
            _ => Self::NorthWest,
        }
    }

    /// Reference point of `g` for this gravity.
    pub const fn reference(self, g: &ClientGeometry) -> Point {
        let left = g.x;
        let hcenter = g.x + g.border + g.width / 2;
        let right = g.x + g.outer_width();
        let top = g.y;
        let vcenter = g.y + g.border + g.height / 2;
        let bottom = g.y + g.outer_height();
        match self {
            Self::NorthWest => Point::new(left, top),
            Self::North => Point::new(hcenter, top),
            Self::NorthEast => Point::new(right, top),
            Self::West => Point::new(left, vcenter),
            Self::Center => Point::new(hcenter, vcenter),
            Self::East => Point::new(right, vcenter),
            Self::SouthWest => Point::new(left, bottom),
            Self::South => Point::new(hcenter, bottom),
            Self::SouthEast => Point::new(right, bottom),
            Self::Static => Point::new(g.x + g.border, g.y + g.border + g.title),
        }
    }

    /// Move `g` so that its reference point for this gravity lands on `reference`.
    ///
    /// Inverse of [`Gravity::reference`]; the size of `g` is left alone.
    pub fn place(self, g: &mut ClientGeometry, reference: Point) {
        let x_left = reference.x;
        let x_center = reference.x - g.border - g.width / 2;
        let x_right = reference.x - g.outer_width();
        let y_top = reference.y;
        let y_center = reference.y - g.border - g.height / 2;
        let y_bottom = reference.y - g.outer_height();
        let (x, y) = match self {
            Self::NorthWest => (x_left, y_top),
            Self::North => (x_center, y_top),
            Self::NorthEast => (x_right, y_top),
            Self::West => (x_left, y_center),
            Self::Center => (x_center, y_center),
            Self::East => (x_right, y_center),
            Self::SouthWest => (x_left, y_bottom),
            Self::South => (x_center, y_bottom),
            Self::SouthEast => (x_right, y_bottom),
            Self::Static => (reference.x - g.border, reference.y - g.border - g.title),
        };
        g.x = x;
        g.y = y;
    }

    /// Frame geometry for a client-initiated configure request.
    ///
    /// `request` is the client window rectangle in client terms (its own border,
    /// no decorations). The result keeps the decorations and border of `frame`, takes
    /// the requested size, and is positioned so that the gravity anchor of the request
    /// stays where the client asked for it.
    pub fn set_reference(self, frame: &ClientGeometry, request: &ClientGeometry) -> ClientGeometry {
        let anchor = self.reference(request);
        let mut result = ClientGeometry {
            width: request.width,
            height: request.client_height() + frame.title + frame.grip,
            ..*frame
        };
        self.place(&mut result, anchor);
        result
    }
}

/// Window size constraints as published by the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeHints {
    pub min_width: Option<i32>,
    pub min_height: Option<i32>,
    pub max_width: Option<i32>,
    pub max_height: Option<i32>,
    pub base_width: Option<i32>,
    pub base_height: Option<i32>,
    pub width_increment: Option<i32>,
    pub height_increment: Option<i32>,
    pub min_aspect: Option<Ratio>,
    pub max_aspect: Option<Ratio>,
    pub gravity: Gravity,
}

impl SizeHints {
    /// Base size; falls back to the minimum size.
    fn base(&self) -> (i32, i32) {
        (
            self.base_width.or(self.min_width).unwrap_or(0).max(0),
            self.base_height.or(self.min_height).unwrap_or(0).max(0),
        )
    }

    /// Minimum size; falls back to the base size, never below 1.
    fn min(&self) -> (i32, i32) {
        (
            self.min_width.or(self.base_width).unwrap_or(1).max(1),
            self.min_height.or(self.base_height).unwrap_or(1).max(1),
        )
    }

    /// Maximum size, never below the minimum.
    fn max(&self) -> (Option<i32>, Option<i32>) {
        let (min_w, min_h) = self.min();
        (
            self.max_width.filter(|&m| m > 0).map(|m| m.max(min_w)),
            self.max_height.filter(|&m| m > 0).map(|m| m.max(min_h)),
        )
    }

    /// Aspect bounds; a minimum wider than the maximum collapses onto the maximum.
    fn aspects(&self) -> (Option<Ratio>, Option<Ratio>) {
        let min = self.min_aspect.filter(|r| r.is_valid());
        let max = self.max_aspect.filter(|r| r.is_valid());
        match (min, max) {
            (Some(lo), Some(hi))
                if i64::from(lo.x) * i64::from(hi.y) > i64::from(hi.x) * i64::from(lo.y) =>
            {
                (Some(hi), Some(hi))
            }
            bounds => bounds,
        }
    }

    fn increments(&self) -> (i32, i32) {
        (
            self.width_increment.filter(|&i| i > 0).unwrap_or(1),
            self.height_increment.filter(|&i| i > 0).unwrap_or(1),
        )
    }

    /// True when the hints pin the width to a single value.
    pub fn is_fixed_width(&self) -> bool {
        matches!(self.max(), (Some(max), _) if max == self.min().0)
    }

    /// True when the hints pin the height to a single value.
    pub fn is_fixed_height(&self) -> bool {
        matches!(self.max(), (_, Some(max)) if max == self.min().1)
    }

    /// Constrain a client window size to these hints.
    ///
    /// The pass is repeated until it no longer changes the size, so the result is a
    /// fixed point and constraining it again is a no-op.
    pub fn constrain_size(&self, width: i32, height: i32) -> (i32, i32) {
        let mut current = (width.max(1), height.max(1));
        for _ in 0..MAX_CONSTRAIN_PASSES {
            let next = self.constrain_pass(current.0, current.1);
            if next == current {
                return current;
            }
            current = next;
        }
        warn!(hints = ?self, width, height, "size constraints did not settle");
        current
    }

    fn constrain_pass(&self, width: i32, height: i32) -> (i32, i32) {
        let (base_w, base_h) = self.base();
        let (min_w, min_h) = self.min();
        let (max_w, max_h) = self.max();
        let (inc_w, inc_h) = self.increments();

        let mut w = (width.max(1) - base_w).max(0);
        let mut h = (height.max(1) - base_h).max(0);
        if let Some(max) = max_w {
            w = w.min((max - base_w).max(0));
        }
        if let Some(max) = max_h {
            h = h.min((max - base_h).max(0));
        }

        let (min_aspect, max_aspect) = self.aspects();
        if w > 0 && h > 0 {
            if let Some(max) = max_aspect {
                if i64::from(w) * i64::from(max.y) > i64::from(h) * i64::from(max.x) {
                    w = (i64::from(h) * i64::from(max.x) / i64::from(max.y)) as i32;
                }
            }
            if let Some(min) = min_aspect {
                if i64::from(w) * i64::from(min.y) < i64::from(h) * i64::from(min.x) {
                    h = (i64::from(w) * i64::from(min.y) / i64::from(min.x)) as i32;
                }
            }
        }

        w -= w % inc_w;
        h -= h % inc_h;

        w = (w + base_w).max(min_w);
        h = (h + base_h).max(min_h);
        if let Some(max) = max_w {
            w = w.min(max);
        }
        if let Some(max) = max_h {
            h = h.min(max);
        }
        (w, h)
    }
}

/// Constrain a frame geometry to `hints`.
///
/// Decorations are taken out before the size hints apply and put back afterwards;
/// position and border are left alone. Returns the adjusted geometry and whether it
/// differs from the request.
pub fn constrain(hints: &SizeHints, requested: ClientGeometry) -> (ClientGeometry, bool) {
    let decorations = requested.title + requested.grip;
    let (width, height) = hints.constrain_size(requested.width, requested.height - decorations);
    let adjusted = ClientGeometry {
        width,
        height: height + decorations,
        ..requested
    };
    (adjusted, adjusted != requested)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_size_hints_min_max() {
        let hints = SizeHints {
            min_width: Some(100),
            min_height: Some(100),
            max_width: Some(500),
            max_height: Some(500),
            ..Default::default()
        };
        assert_eq!(hints.constrain_size(50, 50), (100, 100));
        assert_eq!(hints.constrain_size(1000, 1000), (500, 500));
        assert_eq!(hints.constrain_size(200, 300), (200, 300));
    }

    #[test]
    fn test_increments_keep_base() {
        // A terminal: 7x14 cells plus 4px padding.
        let hints = SizeHints {
            base_width: Some(4),
            base_height: Some(4),
            width_increment: Some(7),
            height_increment: Some(14),
            ..Default::default()
        };
        assert_eq!(hints.constrain_size(500, 300), (494, 298));
    }

    #[test]
    fn test_aspect_clamps_width_then_height() {
        let hints = SizeHints {
            min_aspect: Some(Ratio::new(1, 1)),
            max_aspect: Some(Ratio::new(2, 1)),
            ..Default::default()
        };
        // Too wide: width shrinks to 2x height.
        assert_eq!(hints.constrain_size(500, 100), (200, 100));
        // Too tall: height shrinks to the width.
        assert_eq!(hints.constrain_size(100, 500), (100, 100));
    }

    #[test]
    fn test_constrain_keeps_decorations() {
        let hints = SizeHints {
            height_increment: Some(10),
            ..Default::default()
        };
        let g = ClientGeometry::new(0, 0, 100, 125, 1).with_decorations(20, 0);
        let (adjusted, changed) = constrain(&hints, g);
        assert!(changed);
        assert_eq!(adjusted.height, 120);
        assert_eq!(adjusted.client_height(), 100);
        let (again, changed) = constrain(&hints, adjusted);
        assert!(!changed);
        assert_eq!(again, adjusted);
    }

    #[test]
    fn test_nonpositive_sizes_clamp_to_one() {
        let hints = SizeHints::default();
        assert_eq!(hints.constrain_size(0, -5), (1, 1));
    }

    #[test]
    fn test_gravity_from_icccm() {
        assert_eq!(Gravity::from_icccm(0), Gravity::NorthWest);
        assert_eq!(Gravity::from_icccm(5), Gravity::Center);
        assert_eq!(Gravity::from_icccm(10), Gravity::Static);
        assert_eq!(Gravity::from_icccm(42), Gravity::NorthWest);
    }

    #[test]
    fn test_place_inverts_reference() {
        let g = ClientGeometry::new(37, 91, 301, 203, 3).with_decorations(18, 6);
        for gravity in Gravity::ALL {
            let r = gravity.reference(&g);
            let mut moved = ClientGeometry { x: 0, y: 0, ..g };
            gravity.place(&mut moved, r);
            assert_eq!(moved, g, "{gravity:?}");
        }
    }

    #[test]
    fn test_center_gravity_keeps_center_on_resize() {
        let frame = ClientGeometry::new(100, 100, 400, 300, 2).with_decorations(20, 0);
        let before = Gravity::Center.reference(&frame);
        let mut resized = ClientGeometry {
            width: 250,
            height: 181,
            ..frame
        };
        Gravity::Center.place(&mut resized, before);
        let after = Gravity::Center.reference(&resized);
        assert!((after.x - before.x).abs() <= 1);
        assert!((after.y - before.y).abs() <= 1);
    }

    #[test]
    fn test_set_reference_south_east_keeps_corner() {
        let frame = ClientGeometry::new(0, 0, 200, 120, 2).with_decorations(20, 0);
        let request = ClientGeometry::new(500, 400, 300, 200, 0);
        let result = Gravity::SouthEast.set_reference(&frame, &request);
        assert_eq!(result.x + result.outer_width(), 800);
        assert_eq!(result.y + result.outer_height(), 600);
        assert_eq!(result.width, 300);
        assert_eq!(result.client_height(), 200);
    }

    #[test]
    fn test_set_reference_static_keeps_client_origin() {
        let frame = ClientGeometry::new(0, 0, 200, 120, 2).with_decorations(20, 0);
        let request = ClientGeometry::new(300, 200, 100, 100, 0);
        let result = Gravity::Static.set_reference(&frame, &request);
        assert_eq!(result.x + result.border, 300);
        assert_eq!(result.y + result.border + result.title, 200);
    }

    fn hints_strategy() -> impl Strategy<Value = SizeHints> {
        (
            (proptest::option::of(1..200i32), proptest::option::of(1..200i32)),
            (proptest::option::of(200..2000i32), proptest::option::of(200..2000i32)),
            (proptest::option::of(0..50i32), proptest::option::of(0..50i32)),
            (proptest::option::of(1..30i32), proptest::option::of(1..30i32)),
            proptest::option::of((1..16i32, 1..16i32)),
            proptest::option::of((1..16i32, 1..16i32)),
        )
            .prop_map(|(min, max, base, inc, min_aspect, max_aspect)| SizeHints {
                min_width: min.0,
                min_height: min.1,
                max_width: max.0,
                max_height: max.1,
                base_width: base.0,
                base_height: base.1,
                width_increment: inc.0,
                height_increment: inc.1,
                min_aspect: min_aspect.map(|(x, y)| Ratio::new(x, y)),
                max_aspect: max_aspect.map(|(x, y)| Ratio::new(x, y)),
                gravity: Gravity::NorthWest,
            })
    }

    proptest! {
        #[test]
        fn constrain_is_idempotent(
            hints in hints_strategy(),
            x in -500..2500i32,
            y in -500..2500i32,
            w in -10..3000i32,
            h in -10..3000i32,
            title in 0..30i32,
        ) {
            let requested = ClientGeometry::new(x, y, w, h, 1).with_decorations(title, 0);
            let (once, _) = constrain(&hints, requested);
            let (twice, changed) = constrain(&hints, once);
            prop_assert_eq!(once, twice);
            prop_assert!(!changed);
        }

        #[test]
        fn constrain_respects_bounds(hints in hints_strategy(), w in 1..3000i32, h in 1..3000i32) {
            let (cw, ch) = hints.constrain_size(w, h);
            let (min_w, min_h) = hints.min();
            prop_assert!(cw >= min_w && ch >= min_h);
            if let (Some(max_w), _) = hints.max() {
                prop_assert!(cw <= max_w);
            }
            if let (_, Some(max_h)) = hints.max() {
                prop_assert!(ch <= max_h);
            }
        }
    }
}
