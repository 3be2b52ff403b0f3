//! Arrangement passes, restacking and reconfiguration.
//!
//! `need_arrange` only marks views dirty; the drain loop run at the end of every
//! entry point (and by `Core::tick`) arranges them one at a time. A request made
//! while a pass is running is picked up by the same loop.

use std::collections::HashSet;

use tracing::{debug, error, trace, warn};

use crate::client::ClientState;
use crate::event::CoreAction;
use crate::geometry::{ClientGeometry, Geometry, Struts};
use crate::layout::{dock, float, Layout, Tileable};
use crate::registry::{ClientId, Order};
use crate::snap::SnapTargets;
use crate::stack::{self, StackInput};
use crate::state::ScreenId;
use crate::view::StrutMode;
use crate::{Core, CoreError, WindowId};

/// Upper bound on views arranged by one drain.
const MAX_ARRANGE_PASSES: usize = 4096;

impl Core {
    /// Mark one view of a screen, or all of them, for arrangement.
    pub fn need_arrange(&mut self, screen: ScreenId, view: Option<usize>) {
        let Some(s) = self.screens.get_mut(&screen) else {
            return;
        };
        match view {
            Some(v) => {
                if let Some(view) = s.views.get_mut(v) {
                    view.needs_arrange = true;
                }
            }
            None => {
                for view in &mut s.views {
                    view.needs_arrange = true;
                }
            }
        }
    }

    /// Arrange one view of a screen, or all of them.
    ///
    /// Inside a running pass this only marks the views; the pass picks them up.
    pub fn arrange(&mut self, screen: ScreenId, view: Option<usize>) {
        self.need_arrange(screen, view);
        self.drain();
    }

    /// Mark every view a client is (or was) shown on.
    pub(crate) fn dirty_client_views(&mut self, id: ClientId) {
        let Some(client) = self.clients.get(id) else {
            return;
        };
        let sid = client.screen;
        let everywhere = client.is.intersects(ClientState::STICKY | ClientState::DOCKAPP)
            || client.is_bar();
        if everywhere {
            self.need_arrange(sid, None);
            return;
        }
        let tags = client.tags;
        if let Some(screen) = self.screens.get_mut(&sid) {
            for view in &mut screen.views {
                if tags & view.bit() != 0 {
                    view.needs_arrange = true;
                }
            }
        }
    }

    /// Arrange dirty views and restack every screen.
    pub(crate) fn flush(&mut self) {
        self.drain();
        let screens: Vec<ScreenId> = self.screens.keys().copied().collect();
        for sid in screens {
            self.restack(sid);
        }
    }

    fn next_dirty(&self) -> Option<(ScreenId, usize)> {
        self.screens.iter().find_map(|(&sid, s)| {
            s.views
                .iter()
                .position(|v| v.needs_arrange)
                .map(|v| (sid, v))
        })
    }

    fn drain(&mut self) {
        if self.arranging {
            return;
        }
        self.arranging = true;
        let mut passes = 0;
        while let Some((sid, v)) = self.next_dirty() {
            passes += 1;
            if passes > MAX_ARRANGE_PASSES {
                error!(screen = %sid, view = v, "arrangement does not settle, giving up");
                break;
            }
            if let Some(view) = self.screens.get_mut(&sid).and_then(|s| s.views.get_mut(v)) {
                view.needs_arrange = false;
            }
            self.sync_visibility(sid);
            self.arrange_view(sid, v);
        }
        self.arranging = false;
    }

    /// Show and hide clients of a screen to match their views.
    fn sync_visibility(&mut self, sid: ScreenId) {
        let Some(screen) = self.screens.get(&sid) else {
            return;
        };
        let ids = screen.lists.order(Order::List).to_vec();
        for id in ids {
            let visible = self.is_visible(id);
            let Some(client) = self.clients.get_mut(id) else {
                continue;
            };
            let hidden = client.is.contains(ClientState::HIDDEN);
            let window = client.window;
            if visible && hidden {
                client.is.remove(ClientState::HIDDEN);
                self.emit(CoreAction::Show { window });
            } else if !visible && !hidden {
                client.is.insert(ClientState::HIDDEN);
                self.emit(CoreAction::Hide { window });
            }
        }
    }

    fn arrange_view(&mut self, sid: ScreenId, v: usize) {
        let Some(screen) = self.screens.get(&sid) else {
            return;
        };
        let Some(view) = screen.views.get(v).cloned() else {
            return;
        };
        let Some(m) = view.curmon else {
            trace!(screen = %sid, view = v, "view not shown");
            return;
        };
        let Some(monitor) = screen.monitors.get(m).map(|mon| mon.geometry) else {
            return;
        };
        let root = screen.root();
        let spacing = self.config.decoration.border_width;
        let members: Vec<ClientId> = screen
            .lists
            .order(Order::List)
            .iter()
            .copied()
            .filter(|&id| self.client_view(id) == Some(v))
            .collect();

        // Workarea: monitor minus bar struts and the dock
        let mut reserve = Struts::default();
        if view.struts == StrutMode::On {
            for c in members.iter().filter_map(|&id| self.clients.get(id)) {
                if c.is_bar() && c.geometry.outer().intersects(monitor) {
                    reserve = reserve.max(monitor_struts(c.struts, root, monitor));
                }
            }
        }
        let docked = (screen.dock_monitor(&self.config.dock) == Some(m) && !screen.dock.is_empty())
            .then(|| dock::arrange(&screen.dock, monitor, &self.config.dock, spacing));
        if let Some(d) = &docked {
            if view.struts == StrutMode::On {
                reserve = reserve.max(d.struts);
            }
        }
        let mut workarea = monitor.shrink(reserve);
        if !workarea.is_valid() {
            warn!(screen = %sid, monitor = m, ?reserve, "reservations cover the monitor, ignoring them");
            workarea = monitor;
        }

        let mut placements: Vec<(ClientId, ClientGeometry, bool)> = Vec::new();
        if let Some(d) = &docked {
            for &(id, cell) in &d.slots {
                placements.push((id, ClientGeometry::from_outer(cell, 0, 0, 0), false));
            }
        }

        let mut tileables = Vec::new();
        for &id in &members {
            let Some(c) = self.clients.get(id) else {
                continue;
            };
            if c.is.contains(ClientState::DOCKAPP) {
                continue;
            }
            if c.is_desktop() {
                placements.push((id, ClientGeometry::from_outer(monitor, 0, 0, 0), false));
            } else if view.layout.is_tiled() && c.is_tileable() {
                tileables.push(Tileable {
                    id,
                    border: c.geometry.border,
                    title: c.geometry.title,
                    shaded: c.is.contains(ClientState::SHADED),
                });
            } else if !c.is.contains(ClientState::MOVERESIZE) {
                let others = self.visible_outers(sid, v, Some(id));
                placements.push((id, float::geometry(c, monitor, workarea, &others), false));
            }
        }

        for slot in view.layout.arrange(&view, workarea, &tileables) {
            let Some(c) = self.clients.get(slot.id) else {
                continue;
            };
            let mut g = c.geometry;
            g.set_outer(slot.outer);
            if c.is.contains(ClientState::SHADED) && !slot.unshade {
                g.height = c.shaded_height();
            }
            placements.push((slot.id, g, slot.unshade));
        }

        if let Some(mon) = self.screens.get_mut(&sid).and_then(|s| s.monitors.get_mut(m)) {
            mon.workarea = workarea;
        }

        for (id, g, unshade) in placements {
            let Some(c) = self.clients.get_mut(id) else {
                continue;
            };
            let before = c.is;
            if unshade {
                c.is.remove(ClientState::SHADED);
            }
            c.is.insert(ClientState::PLACED);
            if c.is != before {
                let (window, state) = (c.window, c.is);
                self.emit(CoreAction::StateChanged { window, state });
            }
            if let Err(e) = self.reconfigure(id, g, false) {
                warn!(error = %e, "layout produced an unusable geometry");
            }
        }

        debug!(
            screen = %sid,
            view = v,
            monitor = m,
            layout = ?view.layout,
            clients = members.len(),
            tiled = tileables.len(),
            ?workarea,
            "view arranged"
        );
    }

    /// Recompute the stacking order of a screen.
    ///
    /// Returns whether the result differs from what the backend last saw; only then
    /// are the restack and the stacking list published.
    pub fn restack(&mut self, screen: ScreenId) -> bool {
        let Some(s) = self.screens.get(&screen) else {
            return false;
        };
        let previous = s.lists.order(Order::Stack).to_vec();
        let visible: HashSet<ClientId> = previous
            .iter()
            .copied()
            .filter(|&id| self.is_visible(id))
            .collect();
        let floating: HashSet<ClientId> = previous
            .iter()
            .copied()
            .filter(|&id| !self.is_tiled(id))
            .collect();
        let order = stack::solve(StackInput {
            clients: &self.clients,
            previous: &previous,
            selected: self.focus.selected,
            focused: self.focus.focused,
            visible: &visible,
            floating: &floating,
        });
        let windows: Vec<WindowId> = order
            .iter()
            .filter_map(|&id| self.clients.get(id).map(|c| c.window))
            .collect();
        let Some(s) = self.screens.get_mut(&screen) else {
            return false;
        };
        if order != previous {
            s.lists.replace(Order::Stack, order);
        }
        if s.published == windows {
            return false;
        }
        s.published.clone_from(&windows);

        let bottom_first: Vec<WindowId> = windows.iter().rev().copied().collect();
        debug!(%screen, clients = windows.len(), "restacked");
        self.emit(CoreAction::Restack { windows });
        self.emit(CoreAction::ClientListStacking {
            windows: bottom_first,
        });
        true
    }

    /// Give a client a new frame geometry.
    ///
    /// A configure is sent when the geometry changes, or always with `notify`.
    /// Returns whether the geometry changed.
    pub fn reconfigure(&mut self, id: ClientId, geometry: ClientGeometry, notify: bool) -> Result<bool, CoreError> {
        let client = self.clients.get_mut(id).ok_or(CoreError::UnknownClient(id))?;
        let window = client.window;
        if !geometry.is_valid() {
            return Err(CoreError::InvalidGeometry {
                window,
                width: geometry.width,
                height: geometry.height,
            });
        }
        let changed = client.geometry != geometry;
        client.geometry = geometry;
        if changed || notify {
            trace!(%window, ?geometry, notify, "configure");
            self.emit(CoreAction::Configure {
                window,
                geometry,
                notify,
            });
        }
        Ok(changed)
    }

    /// Layout governing a client: that of its view, or of its first tag when hidden.
    pub(crate) fn layout_of(&self, id: ClientId) -> Layout {
        let Some(client) = self.clients.get(id) else {
            return Layout::Float;
        };
        let index = self
            .client_view(id)
            .unwrap_or(client.tags.trailing_zeros() as usize);
        self.screens
            .get(&client.screen)
            .and_then(|s| s.views.get(index))
            .map_or(Layout::Float, |v| v.layout)
    }

    /// Whether a client's geometry comes from a tiling layout.
    pub(crate) fn is_tiled(&self, id: ClientId) -> bool {
        self.clients.get(id).is_some_and(|c| c.is_tileable()) && self.layout_of(id).is_tiled()
    }

    /// Outer extents of the clients shown on a view, desktops left out.
    pub(crate) fn visible_outers(&self, sid: ScreenId, view: usize, exclude: Option<ClientId>) -> Vec<Geometry> {
        let Some(screen) = self.screens.get(&sid) else {
            return Vec::new();
        };
        screen
            .lists
            .order(Order::List)
            .iter()
            .copied()
            .filter(|&id| Some(id) != exclude && self.client_view(id) == Some(view))
            .filter_map(|id| self.clients.get(id))
            .filter(|c| !c.is_desktop() && !c.is.contains(ClientState::HIDDEN))
            .map(|c| c.geometry.outer())
            .collect()
    }

    /// Snap targets for a frame dragged to `candidate`.
    pub(crate) fn snap_targets(&self, sid: ScreenId, dragged: ClientId, candidate: Geometry) -> SnapTargets {
        let Some(screen) = self.screens.get(&sid) else {
            return SnapTargets::default();
        };
        let m = screen.monitor_for(candidate).unwrap_or(0);
        let Some(monitor) = screen.monitors.get(m) else {
            return SnapTargets::default();
        };
        let windows = screen
            .lists
            .order(Order::List)
            .iter()
            .copied()
            .filter(|&id| id != dragged && self.is_visible(id))
            .filter_map(|id| self.clients.get(id))
            .filter(|c| !c.is_desktop())
            .map(|c| c.geometry.outer())
            .collect();
        SnapTargets {
            workarea: monitor.workarea,
            screen: monitor.geometry,
            windows,
        }
    }
}

/// Part of root-relative `struts` that falls on `monitor`.
pub(crate) fn monitor_struts(struts: Struts, root: Geometry, monitor: Geometry) -> Struts {
    let clamp_w = |v: i32| v.clamp(0, monitor.width);
    let clamp_h = |v: i32| v.clamp(0, monitor.height);
    let mut s = Struts::default();
    if struts.left > 0 {
        s.left = clamp_w(root.x + struts.left - monitor.x);
    }
    if struts.right > 0 {
        s.right = clamp_w(monitor.right() - (root.right() - struts.right));
    }
    if struts.top > 0 {
        s.top = clamp_h(root.y + struts.top - monitor.y);
    }
    if struts.bottom > 0 {
        s.bottom = clamp_h(monitor.bottom() - (root.bottom() - struts.bottom));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_monitor_struts_single_head() {
        let root = Geometry::new(0, 0, 1920, 1080);
        assert_eq!(
            monitor_struts(Struts::new(0, 0, 24, 0), root, root),
            Struts::new(0, 0, 24, 0)
        );
    }

    #[test]
    fn test_monitor_struts_dual_head() {
        let left = Geometry::new(0, 0, 1920, 1080);
        let right = Geometry::new(1920, 0, 1280, 1024);
        let root = left.union(right);
        // A right-hand dock of 64px belongs to the right monitor only.
        let struts = Struts::new(0, 64, 0, 0);
        assert_eq!(monitor_struts(struts, root, right), Struts::new(0, 64, 0, 0));
        assert_eq!(monitor_struts(struts, root, left), Struts::default());
        // Bottom strut measured from the taller monitor's bottom edge.
        let struts = Struts::new(0, 0, 0, 30);
        assert_eq!(monitor_struts(struts, root, left), Struts::new(0, 0, 0, 30));
        assert_eq!(monitor_struts(struts, root, right), Struts::default());
    }
}
