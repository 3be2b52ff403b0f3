//! Views: virtual desktops selected by tag bits.

use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;
use crate::layout::place::Placement;
use crate::layout::Layout;

/// A screen edge, used for the view's major and minor orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    #[default]
    Right,
    Top,
    Bottom,
}

impl Side {
    /// True for the sides bounding the horizontal axis.
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Top => Self::Bottom,
            Self::Bottom => Self::Top,
        }
    }
}

/// How edge reservations affect the workarea.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrutMode {
    /// Struts and the dock area are subtracted from the workarea.
    #[default]
    On,
    /// Struts are ignored; bars stay visible and may be covered.
    Off,
    /// Struts are ignored and bars are hidden.
    Hide,
}

/// One view (tag) of a screen.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub index: usize,
    pub layout: Layout,
    /// Side of the master area.
    pub major: Side,
    /// Side windows within a region fill from.
    pub minor: Side,
    pub nmaster: usize,
    pub ncolumns: usize,
    pub mwfact: f64,
    pub placement: Placement,
    pub struts: StrutMode,
    /// Monitor currently showing this view.
    pub curmon: Option<usize>,
    pub needs_arrange: bool,
}

impl View {
    pub fn new(index: usize, config: &LayoutConfig) -> Self {
        let mut view = Self {
            index,
            layout: config.default_layout,
            major: Side::Right,
            minor: Side::Top,
            nmaster: config.nmaster,
            ncolumns: config.ncolumns.max(1),
            mwfact: config.mwfact.clamp(0.0, 1.0),
            placement: config.placement,
            struts: config.struts,
            curmon: None,
            needs_arrange: true,
        };
        view.layout.init(&mut view);
        view
    }

    /// Tag bit selecting this view.
    pub const fn bit(&self) -> u64 {
        1 << self.index
    }

    pub fn set_layout(&mut self, layout: Layout) {
        self.layout = layout;
        layout.init(self);
        self.needs_arrange = true;
    }

    /// Adjust the master fraction, kept within `0.1..=0.9`.
    pub fn adjust_mwfact(&mut self, delta: f64) {
        self.mwfact = (self.mwfact + delta).clamp(0.1, 0.9);
        self.needs_arrange = true;
    }

    pub fn adjust_nmaster(&mut self, delta: i32) {
        let n = (self.nmaster as i64 + i64::from(delta)).max(0);
        self.nmaster = n as usize;
        self.needs_arrange = true;
    }

    pub fn adjust_ncolumns(&mut self, delta: i32) {
        let n = (self.ncolumns as i64 + i64::from(delta)).max(1);
        self.ncolumns = n as usize;
        self.needs_arrange = true;
    }

    /// Make `minor` agree with `major`: it must name a side of the other axis.
    pub fn normalize_orientation(&mut self) {
        if self.minor.is_horizontal() == self.major.is_horizontal() {
            self.minor = if self.major.is_horizontal() {
                Side::Top
            } else {
                Side::Left
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_creation() {
        let view = View::new(3, &LayoutConfig::default());
        assert_eq!(view.bit(), 0b1000);
        assert_eq!(view.layout, Layout::TileRight);
        assert_eq!(view.major, Side::Right);
        assert!(view.needs_arrange);
    }

    #[test]
    fn test_layout_init_sets_orientation() {
        let mut view = View::new(0, &LayoutConfig::default());
        view.set_layout(Layout::TileBottom);
        assert_eq!(view.major, Side::Bottom);
        assert_eq!(view.minor, Side::Left);
        view.set_layout(Layout::TileLeft);
        assert_eq!(view.major, Side::Left);
        assert_eq!(view.minor, Side::Top);
    }

    #[test]
    fn test_adjust_parameters() {
        let mut view = View::new(0, &LayoutConfig::default());
        view.adjust_mwfact(1.0);
        assert!((view.mwfact - 0.9).abs() < f64::EPSILON);
        view.adjust_nmaster(-5);
        assert_eq!(view.nmaster, 0);
        view.adjust_ncolumns(-5);
        assert_eq!(view.ncolumns, 1);
    }
}
