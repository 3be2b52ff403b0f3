//! Rectangle arithmetic shared by the layouts, snapping and the constraint model.

use serde::{Deserialize, Serialize};

/// A point in root-window coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to `other`.
    pub const fn manhattan(self, other: Self) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

/// A plain rectangle in root coordinates.
///
/// Used for monitor, screen and workarea rectangles and for the outer extents of
/// frames. Width and height are signed so that degenerate requests can be detected
/// instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Geometry {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn right(self) -> i32 {
        self.x + self.width
    }

    pub const fn bottom(self) -> i32 {
        self.y + self.height
    }

    pub const fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub const fn contains(self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    pub fn intersection(self, other: Self) -> Option<Self> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        (right > x && bottom > y).then(|| Self::new(x, y, right - x, bottom - y))
    }

    pub fn area(self) -> i64 {
        i64::from(self.width.max(0)) * i64::from(self.height.max(0))
    }

    pub const fn center(self) -> Point {
        Point::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Smallest rectangle covering both.
    pub fn union(self, other: Self) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Self::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }

    /// Remove reserved margins from each edge.
    pub const fn shrink(self, struts: Struts) -> Self {
        Self::new(
            self.x + struts.left,
            self.y + struts.top,
            self.width - struts.left - struts.right,
            self.height - struts.top - struts.bottom,
        )
    }
}

/// Space reserved along each edge of a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Struts {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

impl Struts {
    pub const fn new(left: i32, right: i32, top: i32, bottom: i32) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    pub const fn is_empty(self) -> bool {
        self.left <= 0 && self.right <= 0 && self.top <= 0 && self.bottom <= 0
    }

    /// Edge-wise maximum.
    pub fn max(self, other: Self) -> Self {
        Self::new(
            self.left.max(other.left),
            self.right.max(other.right),
            self.top.max(other.top),
            self.bottom.max(other.bottom),
        )
    }
}

/// Frame geometry of a managed client.
///
/// `x`/`y` locate the outer corner of the frame, border included. `width` and
/// `height` measure the inside of the border, so title bar and grip count towards
/// `height`; the client window itself is `width` by `height - title - grip`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientGeometry {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub border: i32,
    pub title: i32,
    pub grip: i32,
}

impl ClientGeometry {
    pub const fn new(x: i32, y: i32, width: i32, height: i32, border: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            border,
            title: 0,
            grip: 0,
        }
    }

    pub const fn with_decorations(mut self, title: i32, grip: i32) -> Self {
        self.title = title;
        self.grip = grip;
        self
    }

    /// Frame that exactly covers `outer`, border included.
    pub const fn from_outer(outer: Geometry, border: i32, title: i32, grip: i32) -> Self {
        Self {
            x: outer.x,
            y: outer.y,
            width: outer.width - 2 * border,
            height: outer.height - 2 * border,
            border,
            title,
            grip,
        }
    }

    /// Outer extents, border included.
    pub const fn outer(self) -> Geometry {
        Geometry::new(
            self.x,
            self.y,
            self.width + 2 * self.border,
            self.height + 2 * self.border,
        )
    }

    pub const fn outer_width(self) -> i32 {
        self.width + 2 * self.border
    }

    pub const fn outer_height(self) -> i32 {
        self.height + 2 * self.border
    }

    /// Height left for the client window once decorations are taken out.
    pub const fn client_height(self) -> i32 {
        self.height - self.title - self.grip
    }

    pub const fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Reposition and resize so the outer extents match `outer`.
    pub fn set_outer(&mut self, outer: Geometry) {
        self.x = outer.x;
        self.y = outer.y;
        self.width = outer.width - 2 * self.border;
        self.height = outer.height - 2 * self.border;
    }

    pub const fn center(self) -> Point {
        Point::new(
            self.x + self.border + self.width / 2,
            self.y + self.border + self.height / 2,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersection() {
        let a = Geometry::new(0, 0, 100, 100);
        let b = Geometry::new(50, 50, 100, 100);
        assert_eq!(a.intersection(b), Some(Geometry::new(50, 50, 50, 50)));
        assert_eq!(a.intersection(Geometry::new(100, 0, 10, 10)), None);
        assert!(!a.intersects(Geometry::new(100, 0, 10, 10)));
    }

    #[test]
    fn test_shrink_by_struts() {
        let screen = Geometry::new(0, 0, 1920, 1080);
        let wa = screen.shrink(Struts::new(0, 64, 24, 0));
        assert_eq!(wa, Geometry::new(0, 24, 1856, 1056));
    }

    #[test]
    fn test_client_geometry_outer() {
        let g = ClientGeometry::new(10, 20, 100, 50, 2).with_decorations(16, 4);
        assert_eq!(g.outer(), Geometry::new(10, 20, 104, 54));
        assert_eq!(g.client_height(), 30);
        let back = ClientGeometry::from_outer(g.outer(), 2, 16, 4);
        assert_eq!(back, g);
    }
}
