//! Layout algorithms.
//!
//! Layouts are pure functions from a view, a workarea and the tileable clients of
//! the view (in list order) to frame geometries. Applying the result is the job of
//! the arrangement pass in [`Core`](crate::Core).

pub mod dock;
pub mod float;
pub mod grid;
pub mod monocle;
pub mod place;
pub mod tile;

use serde::{Deserialize, Serialize};

use crate::geometry::Geometry;
use crate::registry::ClientId;
use crate::view::{Side, View};

/// Layout of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// No tiling; every client keeps its own geometry.
    Float,
    /// Master area on the left.
    TileLeft,
    /// Master area on the right.
    #[default]
    TileRight,
    /// Master area at the top.
    TileTop,
    /// Master area at the bottom.
    TileBottom,
    Grid,
    Monocle,
}

impl Layout {
    pub const ALL: [Self; 7] = [
        Self::Float,
        Self::TileLeft,
        Self::TileRight,
        Self::TileTop,
        Self::TileBottom,
        Self::Grid,
        Self::Monocle,
    ];

    /// Whether tileable clients get their geometry from the layout.
    pub const fn is_tiled(self) -> bool {
        !matches!(self, Self::Float)
    }

    /// Whether dragging a tiled client over another swaps the two.
    pub const fn permits_shuffle(self) -> bool {
        matches!(
            self,
            Self::TileLeft | Self::TileRight | Self::TileTop | Self::TileBottom | Self::Grid
        )
    }

    /// Master side of the tiling variants.
    pub const fn master_side(self) -> Option<Side> {
        match self {
            Self::TileLeft => Some(Side::Left),
            Self::TileRight => Some(Side::Right),
            Self::TileTop => Some(Side::Top),
            Self::TileBottom => Some(Side::Bottom),
            Self::Float | Self::Grid | Self::Monocle => None,
        }
    }

    /// Set the view parameters this layout relies on.
    pub fn init(self, view: &mut View) {
        if let Some(side) = self.master_side() {
            view.major = side;
            view.minor = if side.is_horizontal() {
                Side::Top
            } else {
                Side::Left
            };
        }
        view.normalize_orientation();
        view.ncolumns = view.ncolumns.max(1);
    }

    /// Compute slots for the tileable clients of `view`.
    pub fn arrange(self, view: &View, workarea: Geometry, clients: &[Tileable]) -> Vec<Slot> {
        match self {
            Self::Float => Vec::new(),
            Self::TileLeft | Self::TileRight | Self::TileTop | Self::TileBottom => {
                tile::arrange(view, workarea, clients)
            }
            Self::Grid => grid::arrange(view, workarea, clients),
            Self::Monocle => monocle::arrange(workarea, clients),
        }
    }
}

/// A client as seen by the tiling layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tileable {
    pub id: ClientId,
    pub border: i32,
    pub title: i32,
    pub shaded: bool,
}

/// Outer geometry a layout assigns to one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub id: ClientId,
    /// Frame extents, border included.
    pub outer: Geometry,
    /// The layout needs the client unshaded to fill this slot.
    pub unshade: bool,
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::Tileable;
    use crate::client::{Client, ClientAttrs, WindowId};
    use crate::config::DecorationConfig;
    use crate::registry::{ClientArena, ClientId};
    use crate::state::ScreenId;

    /// Arena with `n` plain clients and their tiling descriptors.
    pub fn tileables(n: usize, border: i32) -> (ClientArena, Vec<Tileable>) {
        let mut arena = ClientArena::new();
        let ids: Vec<ClientId> = (0..n)
            .map(|i| {
                arena.insert(Client::new(
                    WindowId(i as u64 + 1),
                    ScreenId(0),
                    ClientAttrs::default(),
                    &DecorationConfig::default(),
                ))
            })
            .collect();
        let tiles = ids
            .into_iter()
            .map(|id| Tileable {
                id,
                border,
                title: 18,
                shaded: false,
            })
            .collect();
        (arena, tiles)
    }
}
