//! Managed client representation.
//!
//! Protocol-agnostic client record. No display-server handles leak here; the
//! backend owns the mapping from its window handles to [`WindowId`].

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::config::DecorationConfig;
use crate::geometry::{ClientGeometry, Struts};
use crate::hints::SizeHints;
use crate::state::ScreenId;

/// Opaque protocol window identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowId(pub u64);

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "win:{:#x}", self.0)
    }
}

bitflags! {
    /// Transient client state (`is.*`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ClientState: u32 {
        const MAX        = 1 << 0;
        const MAXV       = 1 << 1;
        const MAXH       = 1 << 2;
        const LHALF      = 1 << 3;
        const RHALF      = 1 << 4;
        const FILL       = 1 << 5;
        const FULL       = 1 << 6;
        const SHADED     = 1 << 7;
        const ICONIC     = 1 << 8;
        const FLOATING   = 1 << 9;
        const STICKY     = 1 << 10;
        const ABOVE      = 1 << 11;
        const BELOW      = 1 << 12;
        const HIDDEN     = 1 << 13;
        const PLACED     = 1 << 14;
        const MOVERESIZE = 1 << 15;
        const DOCKAPP    = 1 << 16;
        const URGENT     = 1 << 17;
        const BAR        = 1 << 18;
    }
}

impl ClientState {
    /// Mutually exclusive placement states; an interactive drag clears all of them.
    pub const PLACEMENT: Self = Self::MAX
        .union(Self::MAXV)
        .union(Self::MAXH)
        .union(Self::LHALF)
        .union(Self::RHALF)
        .union(Self::FILL)
        .union(Self::FULL)
        .union(Self::SHADED);

    /// States whose geometry is computed rather than taken from the restore geometry.
    pub const COMPUTED: Self = Self::MAX
        .union(Self::MAXV)
        .union(Self::MAXH)
        .union(Self::LHALF)
        .union(Self::RHALF)
        .union(Self::FILL)
        .union(Self::FULL);
}

bitflags! {
    /// Permissions derived from size hints and window type (`can.*`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Capabilities: u32 {
        const MOVE  = 1 << 0;
        const SIZE  = 1 << 1;
        const SIZEH = 1 << 2;
        const SIZEV = 1 << 3;
        const FLOAT = 1 << 4;
        const MAX   = 1 << 5;
        const FILL  = 1 << 6;
        const FULL  = 1 << 7;
        const SHADE = 1 << 8;
        const STICK = 1 << 9;
        const ABOVE = 1 << 10;
        const BELOW = 1 << 11;
        const MIN   = 1 << 12;
        const CLOSE = 1 << 13;
    }
}

impl Capabilities {
    /// Derive the permission set for a client.
    pub fn derive(hints: &SizeHints, window_type: WindowType, dockapp: bool) -> Self {
        let mut can = Self::all();
        match window_type {
            WindowType::Desktop | WindowType::Dock => {
                can = Self::CLOSE | Self::STICK;
            }
            WindowType::Splash
            | WindowType::Menu
            | WindowType::DropdownMenu
            | WindowType::PopupMenu
            | WindowType::Tooltip
            | WindowType::Notification => {
                can.remove(Self::MAX | Self::FILL | Self::FULL | Self::SHADE | Self::MIN);
            }
            WindowType::Normal | WindowType::Dialog | WindowType::Utility | WindowType::Toolbar => {}
        }
        if dockapp {
            can = Self::CLOSE;
        }
        if hints.is_fixed_width() {
            can.remove(Self::SIZEH);
        }
        if hints.is_fixed_height() {
            can.remove(Self::SIZEV);
        }
        if !can.intersects(Self::SIZEH | Self::SIZEV) {
            can.remove(Self::SIZE | Self::MAX | Self::FILL | Self::FULL);
        }
        can
    }
}

bitflags! {
    /// Frame decorations (`has.*` / `needs.*`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Decorations: u8 {
        const TITLE  = 1 << 0;
        const GRIP   = 1 << 1;
        const BORDER = 1 << 2;
    }
}

impl Default for Decorations {
    fn default() -> Self {
        Self::all()
    }
}

bitflags! {
    /// Exclusions from window lists and cycling (`skip.*`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Skip: u8 {
        const TASKBAR = 1 << 0;
        const PAGER   = 1 << 1;
        const WINLIST = 1 << 2;
        const CYCLE   = 1 << 3;
        const FOCUS   = 1 << 4;
        const ARRANGE = 1 << 5;
    }
}

/// Window type hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowType {
    #[default]
    Normal,
    Dialog,
    Utility,
    Toolbar,
    Splash,
    Menu,
    DropdownMenu,
    PopupMenu,
    Tooltip,
    Notification,
    Dock,
    Desktop,
}

/// How a window blocks input to others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    #[default]
    Modeless,
    /// Modal for the window it is transient for.
    Primary,
    /// Modal for its whole window group.
    Group,
    /// Modal for every window.
    System,
}

/// Transient and group relationships, as parsed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Relations {
    pub transient_for: Option<WindowId>,
    /// Transient for the whole group rather than one window.
    pub group_transient: bool,
    /// Group leader window.
    pub group: Option<WindowId>,
    pub modal: Modality,
}

/// Everything the backend knows about a window when it asks core to manage it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientAttrs {
    pub name: String,
    pub window_type: WindowType,
    /// Client window rectangle as requested, in client terms (own border, no frame).
    pub geometry: ClientGeometry,
    pub hints: SizeHints,
    pub relations: Relations,
    pub struts: Struts,
    pub needs: Decorations,
    pub skip: Skip,
    pub state: ClientState,
    pub tags: Option<u64>,
    /// Position came from the user (`USPosition`) and must not be overridden.
    pub user_position: bool,
}

/// A managed client (protocol-agnostic).
#[derive(Debug, Clone)]
pub struct Client {
    pub window: WindowId,
    pub screen: ScreenId,
    pub name: String,
    pub window_type: WindowType,
    /// Current frame geometry.
    pub geometry: ClientGeometry,
    /// Floating geometry to return to when computed states are left.
    pub restore: ClientGeometry,
    /// Geometry as last requested by the client, in client terms.
    pub static_geometry: ClientGeometry,
    /// Geometry as last requested by the user.
    pub user: ClientGeometry,
    pub is: ClientState,
    pub can: Capabilities,
    pub has: Decorations,
    pub needs: Decorations,
    pub skip: Skip,
    pub tags: u64,
    pub hints: SizeHints,
    pub relations: Relations,
    pub struts: Struts,
}

impl Client {
    /// Create a client record from backend attributes.
    pub fn new(window: WindowId, screen: ScreenId, attrs: ClientAttrs, decor: &DecorationConfig) -> Self {
        let dockapp = attrs.state.contains(ClientState::DOCKAPP);
        let can = Capabilities::derive(&attrs.hints, attrs.window_type, dockapp);
        let mut client = Self {
            window,
            screen,
            name: attrs.name,
            window_type: attrs.window_type,
            geometry: attrs.geometry,
            restore: attrs.geometry,
            static_geometry: attrs.geometry,
            user: attrs.geometry,
            is: attrs.state,
            can,
            has: attrs.needs,
            needs: attrs.needs,
            skip: attrs.skip,
            tags: attrs.tags.unwrap_or(0),
            hints: attrs.hints,
            relations: attrs.relations,
            struts: attrs.struts,
        };
        if client.window_type == WindowType::Dock && !client.struts.is_empty() {
            client.is.insert(ClientState::BAR);
        }
        if client.should_float() {
            client.is.insert(ClientState::FLOATING);
        }
        client.update_decorations(decor);
        // The frame keeps the client window where it asked to be.
        let frame = client.geometry;
        client.geometry = client.hints.gravity.set_reference(&frame, &client.static_geometry);
        client.restore = client.geometry;
        client.user = client.geometry;
        client
    }

    /// Check if the client should float by default.
    pub fn should_float(&self) -> bool {
        matches!(
            self.window_type,
            WindowType::Dialog
                | WindowType::Utility
                | WindowType::Toolbar
                | WindowType::Splash
                | WindowType::Menu
                | WindowType::DropdownMenu
                | WindowType::PopupMenu
                | WindowType::Tooltip
                | WindowType::Notification
        ) || self.relations.transient_for.is_some()
            || self.relations.modal != Modality::Modeless
            || !self.can.contains(Capabilities::SIZE)
    }

    /// Dock-type windows and dock apps.
    pub fn is_dockish(&self) -> bool {
        self.window_type == WindowType::Dock || self.is.contains(ClientState::DOCKAPP)
    }

    pub fn is_desktop(&self) -> bool {
        self.window_type == WindowType::Desktop
    }

    /// A panel: dock-type window reserving screen edges.
    pub const fn is_bar(&self) -> bool {
        self.is.contains(ClientState::BAR)
    }

    /// Whether the client takes part in tiling at all.
    pub fn is_tileable(&self) -> bool {
        !self.is_dockish()
            && !self.is_desktop()
            && !self.skip.contains(Skip::ARRANGE)
            && !self
                .is
                .intersects(ClientState::FLOATING | ClientState::COMPUTED | ClientState::ICONIC)
    }

    /// Recompute the decorations the frame actually has and apply their sizes to the
    /// current and restore geometries.
    pub fn update_decorations(&mut self, decor: &DecorationConfig) {
        let mut has = self.needs;
        if self.is_dockish() || self.is_desktop() || self.is.contains(ClientState::FULL) {
            has = Decorations::empty();
        }
        self.has = has;
        let border = if has.contains(Decorations::BORDER) {
            decor.border_width
        } else {
            0
        };
        let title = if has.contains(Decorations::TITLE) {
            decor.title_height
        } else {
            0
        };
        let grip = if has.contains(Decorations::GRIP) {
            decor.grip_height
        } else {
            0
        };
        for g in [&mut self.geometry, &mut self.restore] {
            let client_height = g.client_height();
            g.border = border;
            g.title = title;
            g.grip = grip;
            g.height = client_height + title + grip;
        }
    }

    /// Height of the frame when shaded.
    pub const fn shaded_height(&self) -> i32 {
        if self.geometry.title > 0 {
            self.geometry.title
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hints::Gravity;

    fn decor() -> DecorationConfig {
        DecorationConfig {
            border_width: 1,
            title_height: 18,
            grip_height: 4,
        }
    }

    #[test]
    fn test_client_state_flags() {
        let attrs = ClientAttrs {
            geometry: ClientGeometry::new(0, 0, 200, 100, 0),
            ..Default::default()
        };
        let mut client = Client::new(WindowId(1), ScreenId(0), attrs, &decor());
        assert!(client.is_tileable());
        client.is.insert(ClientState::FLOATING);
        assert!(!client.is_tileable());
    }

    #[test]
    fn test_decorations_applied_to_frame() {
        let attrs = ClientAttrs {
            geometry: ClientGeometry::new(10, 10, 200, 100, 0),
            ..Default::default()
        };
        let client = Client::new(WindowId(1), ScreenId(0), attrs, &decor());
        assert_eq!(client.geometry.border, 1);
        assert_eq!(client.geometry.title, 18);
        assert_eq!(client.geometry.client_height(), 100);
        assert_eq!(client.geometry.height, 122);
    }

    #[test]
    fn test_fixed_size_cannot_resize_and_floats() {
        let hints = SizeHints {
            min_width: Some(64),
            max_width: Some(64),
            min_height: Some(64),
            max_height: Some(64),
            ..Default::default()
        };
        let can = Capabilities::derive(&hints, WindowType::Normal, false);
        assert!(!can.contains(Capabilities::SIZE));
        assert!(!can.contains(Capabilities::MAX));
        assert!(can.contains(Capabilities::MOVE));

        let attrs = ClientAttrs {
            hints,
            geometry: ClientGeometry::new(0, 0, 64, 64, 0),
            ..Default::default()
        };
        let client = Client::new(WindowId(2), ScreenId(0), attrs, &decor());
        assert!(client.is.contains(ClientState::FLOATING));
    }

    #[test]
    fn test_dock_has_no_decorations() {
        let attrs = ClientAttrs {
            window_type: WindowType::Dock,
            geometry: ClientGeometry::new(0, 0, 1920, 24, 0),
            struts: Struts::new(0, 0, 24, 0),
            ..Default::default()
        };
        let client = Client::new(WindowId(3), ScreenId(0), attrs, &decor());
        assert!(client.is_dockish());
        assert!(client.is_bar());
        assert_eq!(client.geometry.border, 0);
        assert_eq!(client.geometry.height, 24);
        assert!(!client.can.contains(Capabilities::MOVE));
    }

    #[test]
    fn test_static_gravity_keeps_client_window_in_place() {
        let attrs = ClientAttrs {
            geometry: ClientGeometry::new(100, 100, 300, 200, 0),
            hints: SizeHints {
                gravity: Gravity::Static,
                ..Default::default()
            },
            ..Default::default()
        };
        let client = Client::new(WindowId(4), ScreenId(0), attrs, &decor());
        assert_eq!(client.geometry.x + client.geometry.border, 100);
        assert_eq!(
            client.geometry.y + client.geometry.border + client.geometry.title,
            100
        );
    }
}
