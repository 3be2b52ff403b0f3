//! Protocol-agnostic events and actions.
//!
//! [`CoreEvent`] represents what the backend tells core.
//! [`CoreAction`] represents what core tells the backend to do.

use serde::Serialize;

use crate::client::{ClientAttrs, ClientState, WindowId};
use crate::drag::{DragToken, GrabAction};
use crate::geometry::{ClientGeometry, Geometry, Struts};
use crate::hints::SizeHints;
use crate::state::ScreenId;

/// Events that a backend sends to the core engine.
///
/// Backends translate protocol events (`MapRequest`, `ConfigureRequest`, button
/// presses, `BadWindow` errors, ...) into these variants.
#[derive(Debug, Clone)]
pub enum CoreEvent {
    /// A screen is ready to be managed, with its monitor layout.
    ScreenAdded {
        screen: ScreenId,
        monitors: Vec<Geometry>,
    },

    /// Monitors of a screen were added, removed or resized.
    MonitorsChanged {
        screen: ScreenId,
        monitors: Vec<Geometry>,
    },

    /// A window asked to be mapped and should be managed.
    WindowMapped {
        screen: ScreenId,
        window: WindowId,
        attrs: ClientAttrs,
    },

    /// A managed window was withdrawn or destroyed.
    WindowUnmapped { window: WindowId },

    /// A request failed because the window no longer exists.
    BadWindow { window: WindowId },

    /// The client asked for a new geometry, in client terms.
    ConfigureRequest {
        window: WindowId,
        geometry: ClientGeometry,
    },

    /// The client changed its size hints.
    HintsChanged { window: WindowId, hints: SizeHints },

    /// The client changed its strut reservation.
    StrutsChanged { window: WindowId, struts: Struts },

    /// A client or pager asked for a window to be activated.
    ActivateRequested { window: WindowId },

    /// A grab binding was pressed over a window frame.
    PointerPress {
        window: WindowId,
        x: i32,
        y: i32,
        action: GrabAction,
    },

    /// Pointer moved to absolute root position.
    PointerMotion { x: i32, y: i32 },

    /// The grab button was released.
    PointerRelease { x: i32, y: i32 },

    /// The backend lost or broke the pointer grab of a drag.
    DragCancelled { token: DragToken },

    /// Escape was pressed while the pointer was grabbed.
    EscapePressed,
}

/// Actions that core returns to the backend for execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CoreAction {
    /// Move and resize a frame. `notify` asks for a synthetic configure notify
    /// even when nothing changed.
    Configure {
        window: WindowId,
        geometry: ClientGeometry,
        notify: bool,
    },

    /// Restack frames; topmost first.
    Restack { windows: Vec<WindowId> },

    /// Publish the stacking order; bottommost first.
    ClientListStacking { windows: Vec<WindowId> },

    /// Give input focus to a window, or to nothing.
    SetFocus { window: Option<WindowId> },

    Show { window: WindowId },

    Hide { window: WindowId },

    /// Publish the changed state flags of a window.
    StateChanged { window: WindowId, state: ClientState },

    /// Redraw the decorations of a window.
    Redraw { window: WindowId },

    /// Grab the pointer for a drag.
    GrabPointer { window: WindowId, token: DragToken },

    /// Release the pointer grab of a drag.
    UngrabPointer { token: DragToken },

    /// Ask a client to close.
    RequestClose { window: WindowId },
}
