//! Error types of the engine.

use crate::client::WindowId;
use crate::registry::ClientId;
use crate::state::ScreenId;

/// Errors raised by core operations.
///
/// None of these are fatal: callers log them and drop the offending request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("invalid geometry {width}x{height} for {window}")]
    InvalidGeometry {
        window: WindowId,
        width: i32,
        height: i32,
    },

    #[error("unknown client {0}")]
    UnknownClient(ClientId),

    #[error("unknown window {0}")]
    UnknownWindow(WindowId),

    #[error("unknown screen {0}")]
    UnknownScreen(ScreenId),

    #[error("unknown monitor {monitor} on {screen}")]
    UnknownMonitor { screen: ScreenId, monitor: usize },

    #[error("a drag is already in progress")]
    DragInProgress,

    #[error("{window} does not permit {action}")]
    NotPermitted {
        window: WindowId,
        action: &'static str,
    },
}
