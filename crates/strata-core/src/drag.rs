//! Interactive move/resize.
//!
//! A drag is a small state machine driven by pointer events:
//!
//! ```text
//! Idle --press--> Pending --motion > drag distance--> Dragging --release--> Committed
//!                    |                                    |
//!                    +--release--> Idle                   +--escape / cancel--> Cancelled
//! ```
//!
//! This module holds the pure parts: anchors, candidate geometry and tear-out. The
//! transitions themselves live on [`Core`](crate::Core), which owns the clients.

use serde::{Deserialize, Serialize};

use crate::client::{Capabilities, ClientState};
use crate::geometry::{ClientGeometry, Geometry, Point};
use crate::registry::ClientId;
use crate::state::ScreenId;

/// Identifies one drag towards the backend, so a late cancel for an earlier grab is
/// not applied to the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DragToken(pub u64);

impl std::fmt::Display for DragToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "drag:{}", self.0)
    }
}

/// What the grab binding asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrabAction {
    Move,
    Resize,
}

/// Handle of the frame being dragged. [`Anchor::Center`] moves the whole frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    TopLeft,
    Top,
    TopRight,
    Left,
    Center,
    Right,
    BottomLeft,
    Bottom,
    BottomRight,
}

impl Anchor {
    /// Pick the handle under `p`, splitting `frame` into thirds on each axis.
    pub fn from_point(p: Point, frame: Geometry) -> Self {
        let x = p.x - frame.x;
        let y = p.y - frame.y;

        let left = 3 * x < frame.width;
        let right = 3 * x > 2 * frame.width;
        let top = 3 * y < frame.height;
        let bottom = 3 * y > 2 * frame.height;

        match (left, right, top, bottom) {
            (true, _, true, _) => Self::TopLeft,
            (_, true, true, _) => Self::TopRight,
            (true, _, _, true) => Self::BottomLeft,
            (_, true, _, true) => Self::BottomRight,
            (true, _, _, _) => Self::Left,
            (_, true, _, _) => Self::Right,
            (_, _, true, _) => Self::Top,
            (_, _, _, true) => Self::Bottom,
            _ => Self::Center,
        }
    }

    /// Anchor for a grab of the given kind at `p`.
    ///
    /// Resizing from the middle third grabs the bottom-right corner.
    pub fn for_action(action: GrabAction, p: Point, frame: Geometry) -> Self {
        match action {
            GrabAction::Move => Self::Center,
            GrabAction::Resize => match Self::from_point(p, frame) {
                Self::Center => Self::BottomRight,
                anchor => anchor,
            },
        }
    }

    pub const fn moves_left(self) -> bool {
        matches!(self, Self::TopLeft | Self::Left | Self::BottomLeft)
    }

    pub const fn moves_right(self) -> bool {
        matches!(self, Self::TopRight | Self::Right | Self::BottomRight)
    }

    pub const fn moves_top(self) -> bool {
        matches!(self, Self::TopLeft | Self::Top | Self::TopRight)
    }

    pub const fn moves_bottom(self) -> bool {
        matches!(self, Self::BottomLeft | Self::Bottom | Self::BottomRight)
    }

    /// Capability a client needs for this handle to be dragged.
    pub const fn required(self) -> Capabilities {
        match self {
            Self::Center => Capabilities::MOVE,
            Self::Left | Self::Right => Capabilities::SIZEH,
            Self::Top | Self::Bottom => Capabilities::SIZEV,
            Self::TopLeft | Self::TopRight | Self::BottomLeft | Self::BottomRight => {
                Capabilities::SIZE
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    /// Button held, pointer has not yet travelled far enough.
    Pending,
    Dragging,
}

/// Client state captured when dragging starts, restored on cancel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Saved {
    pub geometry: ClientGeometry,
    pub restore: ClientGeometry,
    pub is: ClientState,
    /// List order of the screen, for undoing shuffles.
    pub list: Vec<ClientId>,
}

/// An interactive move or resize in progress.
#[derive(Debug, Clone)]
pub struct Drag {
    pub token: DragToken,
    pub client: ClientId,
    pub screen: ScreenId,
    pub action: GrabAction,
    pub anchor: Anchor,
    pub phase: DragPhase,
    /// Pointer position of the press.
    pub origin: Point,
    /// Outer extents the candidate is computed from.
    pub start: Geometry,
    /// Set once dragging has started.
    pub saved: Option<Saved>,
    /// Tiled client being reordered instead of moved.
    pub shuffle: bool,
}

impl Drag {
    pub fn new(
        token: DragToken,
        client: ClientId,
        screen: ScreenId,
        action: GrabAction,
        origin: Point,
        frame: Geometry,
    ) -> Self {
        Self {
            token,
            client,
            screen,
            action,
            anchor: Anchor::for_action(action, origin, frame),
            phase: DragPhase::Pending,
            origin,
            start: frame,
            saved: None,
            shuffle: false,
        }
    }

    /// Whether the pointer at `p` has left the dead zone around the press.
    pub const fn past_threshold(&self, p: Point, drag_distance: i32) -> bool {
        self.origin.manhattan(p) > drag_distance
    }

    pub fn is_dragging(&self) -> bool {
        self.phase == DragPhase::Dragging
    }
}

/// Outer extents for the pointer at `pointer`, before snapping and size hints.
///
/// The edges opposite to the anchor stay put; the frame never shrinks below
/// `min_width`×`min_height`.
pub fn candidate(
    anchor: Anchor,
    start: Geometry,
    origin: Point,
    pointer: Point,
    min_width: i32,
    min_height: i32,
) -> Geometry {
    let dx = pointer.x - origin.x;
    let dy = pointer.y - origin.y;
    if anchor == Anchor::Center {
        return Geometry::new(start.x + dx, start.y + dy, start.width, start.height);
    }

    let mut g = start;
    if anchor.moves_left() {
        g.width = (start.width - dx).max(min_width);
        g.x = start.right() - g.width;
    } else if anchor.moves_right() {
        g.width = (start.width + dx).max(min_width);
    }
    if anchor.moves_top() {
        g.height = (start.height - dy).max(min_height);
        g.y = start.bottom() - g.height;
    } else if anchor.moves_bottom() {
        g.height = (start.height + dy).max(min_height);
    }
    g
}

/// Outer extents of a tiled client torn out to floating by a move.
///
/// The floating size comes from `restore`; the pointer keeps the same relative
/// position inside the frame as it had inside the tiled slot `tiled`.
pub fn tear_out(restore: Geometry, tiled: Geometry, pointer: Point) -> Geometry {
    let fx = f64::from(pointer.x - tiled.x) / f64::from(tiled.width.max(1));
    let fy = f64::from(pointer.y - tiled.y) / f64::from(tiled.height.max(1));
    Geometry::new(
        pointer.x - (fx * f64::from(restore.width)) as i32,
        pointer.y - (fy * f64::from(restore.height)) as i32,
        restore.width,
        restore.height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FRAME: Geometry = Geometry::new(100, 100, 300, 300);

    #[test]
    fn test_anchor_thirds() {
        assert_eq!(Anchor::from_point(Point::new(110, 110), FRAME), Anchor::TopLeft);
        assert_eq!(Anchor::from_point(Point::new(250, 110), FRAME), Anchor::Top);
        assert_eq!(Anchor::from_point(Point::new(390, 110), FRAME), Anchor::TopRight);
        assert_eq!(Anchor::from_point(Point::new(110, 250), FRAME), Anchor::Left);
        assert_eq!(Anchor::from_point(Point::new(250, 250), FRAME), Anchor::Center);
        assert_eq!(Anchor::from_point(Point::new(390, 250), FRAME), Anchor::Right);
        assert_eq!(Anchor::from_point(Point::new(110, 390), FRAME), Anchor::BottomLeft);
        assert_eq!(Anchor::from_point(Point::new(250, 390), FRAME), Anchor::Bottom);
        assert_eq!(Anchor::from_point(Point::new(390, 390), FRAME), Anchor::BottomRight);
    }

    #[test]
    fn test_anchor_for_action() {
        let middle = Point::new(250, 250);
        assert_eq!(Anchor::for_action(GrabAction::Move, Point::new(110, 110), FRAME), Anchor::Center);
        assert_eq!(Anchor::for_action(GrabAction::Resize, middle, FRAME), Anchor::BottomRight);
        assert_eq!(Anchor::Left.required(), Capabilities::SIZEH);
        assert_eq!(Anchor::Center.required(), Capabilities::MOVE);
    }

    #[test]
    fn test_threshold_is_strict() {
        let (_arena, clients) = crate::layout::testutil::tileables(1, 0);
        let drag = Drag::new(
            DragToken(1),
            clients[0].id,
            ScreenId(0),
            GrabAction::Move,
            Point::new(200, 200),
            FRAME,
        );
        assert!(!drag.past_threshold(Point::new(203, 202), 5));
        assert!(drag.past_threshold(Point::new(203, 203), 5));
        assert_eq!(drag.phase, DragPhase::Pending);
    }

    #[test]
    fn test_candidate_move() {
        let g = candidate(Anchor::Center, FRAME, Point::new(200, 200), Point::new(150, 260), 1, 1);
        assert_eq!(g, Geometry::new(50, 160, 300, 300));
    }

    #[test]
    fn test_candidate_resize_keeps_opposite_edges() {
        let g = candidate(Anchor::TopLeft, FRAME, Point::new(110, 110), Point::new(60, 150), 1, 1);
        assert_eq!(g, Geometry::new(50, 140, 350, 260));
        assert_eq!(g.right(), FRAME.right());
        assert_eq!(g.bottom(), FRAME.bottom());

        let g = candidate(Anchor::Right, FRAME, Point::new(390, 250), Point::new(420, 900), 1, 1);
        assert_eq!(g, Geometry::new(100, 100, 330, 300));
    }

    #[test]
    fn test_candidate_minimum_size() {
        let g = candidate(Anchor::Left, FRAME, Point::new(110, 250), Point::new(900, 250), 20, 20);
        assert_eq!(g.width, 20);
        assert_eq!(g.right(), FRAME.right());
    }

    #[test]
    fn test_tear_out_keeps_pointer_proportion() {
        // Pointer at a quarter of the tiled slot width and half its height.
        let tiled = Geometry::new(0, 0, 800, 600);
        let restore = Geometry::new(500, 500, 400, 200);
        let g = tear_out(restore, tiled, Point::new(200, 300));
        assert_eq!(g, Geometry::new(100, 200, 400, 200));
    }
}
