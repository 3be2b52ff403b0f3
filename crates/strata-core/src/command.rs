//! User commands.
//!
//! Commands come from key bindings, pagers or the scene runner and act on the
//! selected client or on views of one screen.

use serde::{Deserialize, Serialize};

use crate::client::WindowId;
use crate::layout::Layout;

/// Command to execute against one screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Set the layout of the view on a monitor.
    SetLayout { monitor: usize, layout: Layout },
    /// Change the master fraction of the view on a monitor.
    AdjustMwfact { monitor: usize, delta: f64 },
    AdjustNmaster { monitor: usize, delta: i32 },
    AdjustNcolumns { monitor: usize, delta: i32 },
    /// Show a view on a monitor.
    SelectView { monitor: usize, view: usize },
    SetViewCount { count: usize },
    /// Replace the tags of the selected client.
    SetTags { tags: u64 },
    /// Toggle tag bits of the selected client.
    ToggleTags { tags: u64 },
    /// Change a state flag of the selected client.
    SetState { state: StateToggle, toggle: Toggle },
    /// Select and focus a window.
    Focus { window: WindowId },
    FocusNext,
    FocusPrev,
    /// Move the selected client to the head of the tiling order.
    Zoom,
    /// Move the selected client to the top of the stacking order.
    Raise,
    /// Move the selected client to the bottom of the stacking order.
    Lower,
    /// Ask the selected client to close.
    Close,
    /// Re-arrange every view of the screen.
    Arrange,
}

/// State flags a user can switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateToggle {
    Floating,
    Max,
    MaxV,
    MaxH,
    LeftHalf,
    RightHalf,
    Fill,
    Full,
    Shade,
    Sticky,
    Above,
    Below,
    Iconic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Toggle {
    Enable,
    Disable,
    #[default]
    Switch,
}

impl Toggle {
    /// New value of a flag currently set to `current`.
    pub const fn apply(self, current: bool) -> bool {
        match self {
            Self::Enable => true,
            Self::Disable => false,
            Self::Switch => !current,
        }
    }
}
