//! Strata Core: protocol-agnostic arrangement and stacking engine
//!
//! This crate decides where managed windows go, in which order they are stacked and
//! how they follow interactive moves and resizes. It has no dependency on a display
//! protocol.
//!
//! Backends (X11 or a test harness) translate protocol events into [`CoreEvent`]s,
//! feed them to [`Core`], and apply the returned [`CoreAction`]s back to the display
//! server.
//!
//! # Quick Start
//! ```
//! use strata_core::{ClientAttrs, Command, Core, CoreEvent, Geometry, ScreenId, WindowId};
//! use strata_core::config::Config;
//!
//! let mut core = Core::new(Config::default());
//! let screen = ScreenId(0);
//!
//! // Backend reports the screen and its monitors
//! core.handle_event(CoreEvent::ScreenAdded {
//!     screen,
//!     monitors: vec![Geometry::new(0, 0, 1920, 1080)],
//! });
//!
//! // Backend tells core a window asked to be mapped
//! let actions = core.handle_event(CoreEvent::WindowMapped {
//!     screen,
//!     window: WindowId(0x40_0001),
//!     attrs: ClientAttrs::default(),
//! });
//! assert!(!actions.is_empty());
//!
//! // User presses a key binding resolved to a command
//! let actions = core.exec(screen, Command::FocusNext);
//! # let _ = actions;
//! ```

pub mod client;
pub mod command;
pub mod config;
pub mod drag;
pub mod error;
pub mod event;
pub mod geometry;
pub mod hints;
pub mod invariants;
pub mod layout;
pub mod registry;
pub mod snap;
pub mod stack;
pub mod state;
pub mod view;

mod arrange;

// Re-export primary API types at crate root
pub use client::{ClientAttrs, WindowId};
pub use command::Command;
pub use error::CoreError;
pub use event::{CoreAction, CoreEvent};
pub use geometry::{ClientGeometry, Geometry, Point};
pub use registry::ClientId;
pub use state::ScreenId;

use indexmap::IndexMap;
use tracing::{debug, info, trace, warn};

use client::{Capabilities, Client, ClientState, Skip};
use command::{StateToggle, Toggle};
use config::Config;
use drag::{Drag, DragToken, GrabAction, Saved};
use hints::constrain;
use layout::place;
use registry::{ClientArena, Order};
use state::{FocusState, Screen};

/// The protocol-agnostic arrangement engine.
///
/// Owns every managed client and screen. Backends drive it via
/// [`handle_event`](Core::handle_event) and [`exec`](Core::exec), then apply the
/// returned [`CoreAction`]s.
pub struct Core {
    pub config: Config,
    clients: ClientArena,
    screens: IndexMap<ScreenId, Screen>,
    focus: FocusState,
    /// Interactive move/resize in progress
    drag: Option<Drag>,
    next_token: u64,
    /// Last known pointer position, root coordinates
    pointer: Point,
    /// Set while an arrangement pass runs
    arranging: bool,
    /// Actions produced since the last call returned
    actions: Vec<CoreAction>,
}

impl Core {
    /// Create a new engine with the given configuration. Screens are added by
    /// [`CoreEvent::ScreenAdded`].
    pub fn new(config: Config) -> Self {
        Self {
            config,
            clients: ClientArena::new(),
            screens: IndexMap::new(),
            focus: FocusState::default(),
            drag: None,
            next_token: 0,
            pointer: Point::default(),
            arranging: false,
            actions: Vec::new(),
        }
    }

    // ── Entry points ─────────────────────────────────────────────────

    /// Process a backend event. Returns actions the backend must apply.
    pub fn handle_event(&mut self, event: CoreEvent) -> Vec<CoreAction> {
        trace!(?event, "handle_event");
        let result = match event {
            CoreEvent::ScreenAdded { screen, monitors } => {
                self.on_screen_added(screen, &monitors);
                Ok(())
            }
            CoreEvent::MonitorsChanged { screen, monitors } => {
                self.on_monitors_changed(screen, &monitors)
            }
            CoreEvent::WindowMapped {
                screen,
                window,
                attrs,
            } => self.manage(screen, window, attrs),
            CoreEvent::WindowUnmapped { window } => self.unmanage(window),
            CoreEvent::BadWindow { window } => {
                // The window is gone already; forget it without complaint.
                if self.clients.lookup(window).is_some() {
                    self.unmanage(window)
                } else {
                    Ok(())
                }
            }
            CoreEvent::ConfigureRequest { window, geometry } => {
                self.on_configure_request(window, geometry)
            }
            CoreEvent::HintsChanged { window, hints } => self.on_hints_changed(window, hints),
            CoreEvent::StrutsChanged { window, struts } => self.on_struts_changed(window, struts),
            CoreEvent::ActivateRequested { window } => self.on_activate_requested(window),
            CoreEvent::PointerPress {
                window,
                x,
                y,
                action,
            } => self.on_pointer_press(window, Point::new(x, y), action),
            CoreEvent::PointerMotion { x, y } => self.on_pointer_motion(Point::new(x, y)),
            CoreEvent::PointerRelease { x, y } => self.on_pointer_release(Point::new(x, y)),
            CoreEvent::DragCancelled { token } => self.on_drag_cancelled(token),
            CoreEvent::EscapePressed => self.cancel_drag(),
        };
        if let Err(e) = result {
            warn!(error = %e, "event dropped");
        }
        self.finish()
    }

    /// Execute a user command against one screen. Returns actions.
    pub fn exec(&mut self, screen: ScreenId, command: Command) -> Vec<CoreAction> {
        debug!(%screen, ?command, "exec");
        if let Err(e) = self.execute_command(screen, command) {
            warn!(error = %e, "command dropped");
        }
        self.finish()
    }

    /// Perform pending arrangements. Returns empty if nothing changed.
    pub fn tick(&mut self) -> Vec<CoreAction> {
        self.finish()
    }

    /// Actions queued by direct calls to [`arrange`](Core::arrange),
    /// [`restack`](Core::restack) or [`reconfigure`](Core::reconfigure).
    pub fn take_actions(&mut self) -> Vec<CoreAction> {
        std::mem::take(&mut self.actions)
    }

    fn finish(&mut self) -> Vec<CoreAction> {
        self.flush();

        #[cfg(debug_assertions)]
        if let Err(e) = invariants::validate(self) {
            tracing::error!(error = %e, "invariant violation");
        }

        self.take_actions()
    }

    pub(crate) fn emit(&mut self, action: CoreAction) {
        self.actions.push(action);
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn clients(&self) -> &ClientArena {
        &self.clients
    }

    pub fn client(&self, id: ClientId) -> Option<&Client> {
        self.clients.get(id)
    }

    pub fn lookup(&self, window: WindowId) -> Option<ClientId> {
        self.clients.lookup(window)
    }

    pub fn screens(&self) -> &IndexMap<ScreenId, Screen> {
        &self.screens
    }

    pub fn screen(&self, id: ScreenId) -> Option<&Screen> {
        self.screens.get(&id)
    }

    pub const fn focus(&self) -> &FocusState {
        &self.focus
    }

    pub fn selected_window(&self) -> Option<WindowId> {
        self.focus
            .selected
            .and_then(|id| self.clients.get(id))
            .map(|c| c.window)
    }

    pub fn focused_window(&self) -> Option<WindowId> {
        self.focus
            .focused
            .and_then(|id| self.clients.get(id))
            .map(|c| c.window)
    }

    pub const fn drag(&self) -> Option<&Drag> {
        self.drag.as_ref()
    }

    /// View a client is currently shown on, if any.
    ///
    /// Dock apps follow the dock monitor and sticky clients the monitor they sit
    /// on; other clients appear on the lowest shown view among their tags.
    pub fn client_view(&self, id: ClientId) -> Option<usize> {
        let client = self.clients.get(id)?;
        let screen = self.screens.get(&client.screen)?;
        if client.is.contains(ClientState::ICONIC) {
            return None;
        }
        if client.is.contains(ClientState::DOCKAPP) {
            let m = screen.dock_monitor(&self.config.dock)?;
            return screen.monitors.get(m).map(|mon| mon.view);
        }
        if client.is.contains(ClientState::STICKY) {
            let m = screen.monitor_for(client.geometry.outer()).unwrap_or(0);
            return screen.monitors.get(m).map(|mon| mon.view);
        }
        screen
            .monitors
            .iter()
            .map(|m| m.view)
            .filter(|&v| v < 64 && client.tags & (1 << v) != 0)
            .min()
    }

    /// Whether a client is shown on some monitor.
    pub fn is_visible(&self, id: ClientId) -> bool {
        let Some(index) = self.client_view(id) else {
            return false;
        };
        let Some(client) = self.clients.get(id) else {
            return false;
        };
        let hidden_bar = client.is_bar()
            && self
                .screens
                .get(&client.screen)
                .and_then(|s| s.views.get(index))
                .is_some_and(|v| v.struts == view::StrutMode::Hide);
        !hidden_bar
    }

    // ── Screens ──────────────────────────────────────────────────────

    fn on_screen_added(&mut self, id: ScreenId, monitors: &[Geometry]) {
        if let Some(screen) = self.screens.get_mut(&id) {
            warn!(screen = %id, "screen added twice, updating monitors");
            screen.set_monitors(monitors, &self.config);
        } else {
            self.screens
                .insert(id, Screen::new(id, monitors, &self.config));
        }
        self.need_arrange(id, None);
    }

    fn on_monitors_changed(&mut self, id: ScreenId, monitors: &[Geometry]) -> Result<(), CoreError> {
        let screen = self
            .screens
            .get_mut(&id)
            .ok_or(CoreError::UnknownScreen(id))?;
        screen.set_monitors(monitors, &self.config);
        info!(screen = %id, monitors = monitors.len(), "monitors changed");
        self.need_arrange(id, None);
        self.refocus(id);
        Ok(())
    }

    /// Monitor the user is working on: the one showing the selection, else the one
    /// under the pointer.
    fn current_monitor(&self, sid: ScreenId) -> usize {
        let Some(screen) = self.screens.get(&sid) else {
            return 0;
        };
        self.focus
            .selected
            .filter(|&id| self.clients.get(id).is_some_and(|c| c.screen == sid))
            .and_then(|id| self.client_view(id))
            .and_then(|v| screen.monitor_of_view(v))
            .or_else(|| screen.monitor_at(self.pointer))
            .unwrap_or(0)
    }

    // ── Client lifecycle ─────────────────────────────────────────────

    fn manage(&mut self, sid: ScreenId, window: WindowId, attrs: ClientAttrs) -> Result<(), CoreError> {
        if self.clients.lookup(window).is_some() {
            debug!(%window, "window already managed");
            return Ok(());
        }
        let monitor = self.current_monitor(sid);
        let screen = self.screens.get(&sid).ok_or(CoreError::UnknownScreen(sid))?;
        let requested_tags = attrs.tags;
        let user_position = attrs.user_position;
        let mut client = Client::new(window, sid, attrs, &self.config.decoration);

        let owner = client
            .relations
            .transient_for
            .and_then(|w| self.clients.lookup(w))
            .and_then(|id| self.clients.get(id));

        // Tags: as requested, else the owner's, else the current view
        let view_index = screen.monitors.get(monitor).map_or(0, |m| m.view);
        let all_views = view_mask(screen.views.len());
        client.tags = match requested_tags.map(|t| t & all_views) {
            Some(tags) if tags != 0 => tags,
            _ => owner.map_or(1 << view_index, |o| o.tags),
        };
        if client.is_dockish() || client.is_desktop() {
            client.is.insert(ClientState::STICKY);
        }
        client.is.insert(ClientState::HIDDEN);
        client.is.remove(ClientState::PLACED | ClientState::MOVERESIZE);

        let (g, _) = constrain(&client.hints, client.geometry);
        client.geometry = g;
        client.restore = g;

        // Initial placement of floating clients
        let floating = client.is.contains(ClientState::FLOATING)
            || screen
                .views
                .get(view_index)
                .is_some_and(|v| !v.layout.is_tiled());
        if floating && !user_position && !client.is_dockish() && !client.is_desktop() {
            if let (Some(view), Some(wa)) = (screen.views.get(view_index), screen.workarea(monitor)) {
                let outer = client.geometry.outer();
                let origin = if let Some(owner) = owner {
                    let center = owner.geometry.outer().center();
                    let p = Point::new(center.x - outer.width / 2, center.y - outer.height / 2);
                    place::clamp_into(p, outer.width, outer.height, wa)
                } else {
                    let others = self.visible_outers(sid, view_index, None);
                    place::place(view.placement, outer.width, outer.height, wa, self.pointer, &others)
                };
                client.geometry.x = origin.x;
                client.geometry.y = origin.y;
                client.restore = client.geometry;
                client.user = client.geometry;
            }
        }

        let dockapp = client.is.contains(ClientState::DOCKAPP);
        let wants_focus = self.config.general.focus_new && focusable(&client);
        let id = self.clients.insert(client);
        if let Some(screen) = self.screens.get_mut(&sid) {
            screen.lists.insert(id);
            if dockapp {
                screen.dock.add(id);
            }
        }
        info!(%window, %id, screen = %sid, "client managed");

        self.dirty_client_views(id);
        if wants_focus && self.is_visible(id) {
            self.activate(id);
        }
        Ok(())
    }

    fn unmanage(&mut self, window: WindowId) -> Result<(), CoreError> {
        let id = self
            .clients
            .lookup(window)
            .ok_or(CoreError::UnknownWindow(window))?;

        if self.drag.as_ref().is_some_and(|d| d.client == id) {
            if let Some(drag) = self.drag.take() {
                self.emit(CoreAction::UngrabPointer { token: drag.token });
            }
        }

        self.dirty_client_views(id);
        let client = self.clients.remove(id).ok_or(CoreError::UnknownClient(id))?;
        if let Some(screen) = self.screens.get_mut(&client.screen) {
            screen.lists.remove(id);
            screen.dock.remove(id);
        }

        let had_focus = self.focus.selected == Some(id) || self.focus.focused == Some(id);
        self.focus.forget(id);
        info!(%window, %id, "client unmanaged");

        if had_focus {
            self.focus_fallback(client.screen);
        }
        Ok(())
    }

    /// Move a client to another screen.
    ///
    /// It leaves all five orderings of its old screen and joins all five of the new
    /// one, tagged with the view of the new screen's current monitor.
    pub fn reparent(&mut self, id: ClientId, to: ScreenId) -> Result<(), CoreError> {
        let from = self
            .clients
            .get(id)
            .map(|c| c.screen)
            .ok_or(CoreError::UnknownClient(id))?;
        if from == to {
            return Ok(());
        }
        let monitor = self.current_monitor(to);
        let view = self
            .screens
            .get(&to)
            .ok_or(CoreError::UnknownScreen(to))?
            .monitors
            .get(monitor)
            .map_or(0, |m| m.view);

        self.dirty_client_views(id);
        if let Some(screen) = self.screens.get_mut(&from) {
            screen.lists.remove(id);
            screen.dock.remove(id);
        }
        let dockapp = if let Some(client) = self.clients.get_mut(id) {
            client.screen = to;
            client.tags = 1 << view;
            client.is.contains(ClientState::DOCKAPP)
        } else {
            false
        };
        if let Some(screen) = self.screens.get_mut(&to) {
            screen.lists.insert(id);
            if dockapp {
                screen.dock.add(id);
            }
        }
        self.dirty_client_views(id);
        info!(%id, %from, %to, "client reparented");
        Ok(())
    }

    // ── Client requests ──────────────────────────────────────────────

    fn on_configure_request(&mut self, window: WindowId, request: ClientGeometry) -> Result<(), CoreError> {
        let id = self
            .clients
            .lookup(window)
            .ok_or(CoreError::UnknownWindow(window))?;
        if !request.is_valid() {
            return Err(CoreError::InvalidGeometry {
                window,
                width: request.width,
                height: request.height,
            });
        }
        let tiled = self.is_tiled(id);
        let client = self.clients.get_mut(id).ok_or(CoreError::UnknownClient(id))?;
        client.static_geometry = request;

        let managed_geometry = tiled
            || client
                .is
                .intersects(ClientState::COMPUTED | ClientState::MOVERESIZE);
        if managed_geometry {
            // The client has to live with the geometry it has.
            let current = client.geometry;
            debug!(%window, "configure request refused, sending current geometry");
            self.reconfigure(id, current, true)?;
            return Ok(());
        }

        let g = client.hints.gravity.set_reference(&client.geometry, &request);
        let (g, _) = constrain(&client.hints, g);
        client.restore = g;
        client.user = g;
        let bar = client.is_bar();
        self.reconfigure(id, g, true)?;
        if bar {
            self.dirty_client_views(id);
        }
        Ok(())
    }

    fn on_hints_changed(&mut self, window: WindowId, hints: hints::SizeHints) -> Result<(), CoreError> {
        let id = self
            .clients
            .lookup(window)
            .ok_or(CoreError::UnknownWindow(window))?;
        let client = self.clients.get_mut(id).ok_or(CoreError::UnknownClient(id))?;
        client.hints = hints;
        client.can = Capabilities::derive(
            &hints,
            client.window_type,
            client.is.contains(ClientState::DOCKAPP),
        );
        client.restore = constrain(&hints, client.restore).0;
        let (g, changed) = constrain(&hints, client.geometry);
        if changed {
            self.reconfigure(id, g, false)?;
        }
        self.dirty_client_views(id);
        Ok(())
    }

    fn on_struts_changed(&mut self, window: WindowId, struts: geometry::Struts) -> Result<(), CoreError> {
        let id = self
            .clients
            .lookup(window)
            .ok_or(CoreError::UnknownWindow(window))?;
        let client = self.clients.get_mut(id).ok_or(CoreError::UnknownClient(id))?;
        client.struts = struts;
        let bar = client.window_type == client::WindowType::Dock && !struts.is_empty();
        client.is.set(ClientState::BAR, bar);
        let sid = client.screen;
        debug!(%window, ?struts, "struts changed");
        self.need_arrange(sid, None);
        Ok(())
    }

    fn on_activate_requested(&mut self, window: WindowId) -> Result<(), CoreError> {
        let id = self
            .clients
            .lookup(window)
            .ok_or(CoreError::UnknownWindow(window))?;
        let client = self.clients.get_mut(id).ok_or(CoreError::UnknownClient(id))?;
        let sid = client.screen;
        if client.is.contains(ClientState::ICONIC) {
            client.is.remove(ClientState::ICONIC);
            let state = client.is;
            self.emit(CoreAction::StateChanged { window, state });
            self.dirty_client_views(id);
        }
        if !self.is_visible(id) {
            // Bring one of its views to the current monitor.
            let monitor = self.current_monitor(sid);
            let tags = self.clients.get(id).map_or(0, |c| c.tags);
            if tags != 0 {
                let view = tags.trailing_zeros() as usize;
                if let Some(screen) = self.screens.get_mut(&sid) {
                    screen.select_view(monitor, view);
                }
            }
        }
        if self.is_visible(id) {
            self.activate(id);
        } else {
            debug!(%window, "activation of an invisible client ignored");
        }
        Ok(())
    }

    // ── Selection and focus ──────────────────────────────────────────

    /// Select and focus a client.
    pub fn activate(&mut self, id: ClientId) {
        self.select(Some(id));
        self.set_focus(Some(id));
    }

    fn select(&mut self, id: Option<ClientId>) {
        let previous = self.focus.selected;
        if previous == id {
            return;
        }
        let dockish = |id: Option<ClientId>| {
            id.and_then(|i| self.clients.get(i))
                .is_some_and(Client::is_dockish)
        };
        let crossing = dockish(previous) != dockish(id);
        self.focus.selected = id;

        for holder in [previous, id].into_iter().flatten() {
            if let Some(c) = self.clients.get(holder) {
                let window = c.window;
                self.emit(CoreAction::Redraw { window });
            }
        }
        if let Some(id) = id {
            let screen = self
                .clients
                .get(id)
                .and_then(|c| self.screens.get_mut(&c.screen));
            if let Some(screen) = screen {
                screen.lists.promote(Order::Focus, id);
            }
        }
        if crossing {
            let screens: Vec<ScreenId> = [previous, id]
                .into_iter()
                .flatten()
                .filter_map(|i| self.clients.get(i).map(|c| c.screen))
                .collect();
            for sid in screens {
                self.need_arrange(sid, None);
            }
        }
        debug!(selected = ?id, "selection changed");
    }

    fn set_focus(&mut self, id: Option<ClientId>) {
        if self.focus.focused == id {
            return;
        }
        self.focus.focused = id;
        let window = id.and_then(|i| self.clients.get(i)).map(|c| c.window);
        if let Some(id) = id {
            if let Some(screen) = self
                .clients
                .get(id)
                .and_then(|c| self.screens.get_mut(&c.screen))
            {
                screen.lists.promote(Order::Activation, id);
            }
        }
        self.emit(CoreAction::SetFocus { window });
    }

    /// Select the most recently selected client still visible, or nothing.
    fn focus_fallback(&mut self, sid: ScreenId) {
        let next = self.screens.get(&sid).and_then(|s| {
            s.lists.order(Order::Focus).iter().copied().find(|&id| {
                self.is_visible(id) && self.clients.get(id).is_some_and(focusable)
            })
        });
        match next {
            Some(id) => self.activate(id),
            None => {
                self.select(None);
                self.set_focus(None);
            }
        }
    }

    /// Fall back when the selection is no longer visible.
    fn refocus(&mut self, sid: ScreenId) {
        let stale = self.focus.selected.map_or(true, |id| !self.is_visible(id));
        if stale {
            self.focus_fallback(sid);
        }
    }

    fn cycle(&mut self, sid: ScreenId, forward: bool) {
        let Some(screen) = self.screens.get(&sid) else {
            return;
        };
        let candidates: Vec<ClientId> = screen
            .lists
            .order(Order::List)
            .iter()
            .copied()
            .filter(|&id| {
                self.is_visible(id)
                    && self.clients.get(id).is_some_and(|c| {
                        focusable(c) && !c.skip.contains(Skip::CYCLE)
                    })
            })
            .collect();
        if candidates.is_empty() {
            return;
        }
        let n = candidates.len();
        let next = match self
            .focus
            .selected
            .and_then(|s| candidates.iter().position(|&c| c == s))
        {
            Some(i) if forward => (i + 1) % n,
            Some(i) => (i + n - 1) % n,
            None => 0,
        };
        self.activate(candidates[next]);
    }

    // ── Interactive move/resize ──────────────────────────────────────

    fn on_pointer_press(&mut self, window: WindowId, p: Point, action: GrabAction) -> Result<(), CoreError> {
        self.pointer = p;
        if self.drag.is_some() {
            return Err(CoreError::DragInProgress);
        }
        let id = self
            .clients
            .lookup(window)
            .ok_or(CoreError::UnknownWindow(window))?;
        let client = self.clients.get(id).ok_or(CoreError::UnknownClient(id))?;

        self.next_token += 1;
        let token = DragToken(self.next_token);
        let drag = Drag::new(token, id, client.screen, action, p, client.geometry.outer());
        if !client.can.contains(drag.anchor.required()) {
            return Err(CoreError::NotPermitted {
                window,
                action: match action {
                    GrabAction::Move => "move",
                    GrabAction::Resize => "resize",
                },
            });
        }
        debug!(%window, %token, ?action, anchor = ?drag.anchor, "drag pending");
        self.drag = Some(drag);
        self.activate(id);
        self.emit(CoreAction::GrabPointer { window, token });
        Ok(())
    }

    fn on_pointer_motion(&mut self, p: Point) -> Result<(), CoreError> {
        self.pointer = p;
        let Some(drag) = self.drag.as_ref() else {
            return Ok(());
        };
        if !drag.is_dragging() {
            if !drag.past_threshold(p, self.config.general.drag_distance) {
                return Ok(());
            }
            self.start_drag()?;
        }
        self.drag_to(p)
    }

    fn on_pointer_release(&mut self, p: Point) -> Result<(), CoreError> {
        self.pointer = p;
        let Some(drag) = self.drag.take() else {
            return Ok(());
        };
        self.emit(CoreAction::UngrabPointer { token: drag.token });
        if drag.is_dragging() {
            self.commit_drag(&drag)
        } else {
            trace!(token = %drag.token, "released before the drag started");
            Ok(())
        }
    }

    fn on_drag_cancelled(&mut self, token: DragToken) -> Result<(), CoreError> {
        match self.drag.as_ref() {
            Some(drag) if drag.token == token => self.cancel_drag(),
            _ => {
                debug!(%token, "stale drag cancel ignored");
                Ok(())
            }
        }
    }

    /// Leave the pending phase: save what cancel restores and detach the client
    /// from whatever placed it.
    fn start_drag(&mut self) -> Result<(), CoreError> {
        let Some(drag) = self.drag.as_ref() else {
            return Ok(());
        };
        let (id, sid, action, origin) = (drag.client, drag.screen, drag.action, drag.origin);
        let tiled = self.is_tiled(id);
        let shuffle = tiled
            && action == GrabAction::Move
            && self.config.general.shuffle_by_drag
            && self.layout_of(id).permits_shuffle();
        let list = self
            .screens
            .get(&sid)
            .map(|s| s.lists.order(Order::List).to_vec())
            .unwrap_or_default();

        let client = self.clients.get_mut(id).ok_or(CoreError::UnknownClient(id))?;
        let saved = Saved {
            geometry: client.geometry,
            restore: client.restore,
            is: client.is,
            list,
        };
        let was_full = client.is.contains(ClientState::FULL);
        client.is.remove(ClientState::PLACEMENT);
        client.is.insert(ClientState::MOVERESIZE);
        if was_full {
            client.update_decorations(&self.config.decoration);
        }
        if !shuffle {
            if tiled {
                client.is.insert(ClientState::FLOATING);
                if action == GrabAction::Move {
                    let torn = drag::tear_out(client.restore.outer(), client.geometry.outer(), origin);
                    client.geometry = client.restore;
                    client.geometry.x = torn.x;
                    client.geometry.y = torn.y;
                }
            }
            client.restore = client.geometry;
        }
        let start = client.geometry.outer();
        let window = client.window;
        let state = client.is;

        if let Some(drag) = self.drag.as_mut() {
            drag.phase = drag::DragPhase::Dragging;
            drag.saved = Some(saved);
            drag.shuffle = shuffle;
            drag.start = start;
        }
        self.emit(CoreAction::StateChanged { window, state });
        self.dirty_client_views(id);
        info!(%window, ?action, shuffle, torn_out = tiled && !shuffle, "drag started");
        Ok(())
    }

    fn drag_to(&mut self, p: Point) -> Result<(), CoreError> {
        let Some(drag) = self.drag.as_ref() else {
            return Ok(());
        };
        let (id, sid, anchor, start, origin) = (drag.client, drag.screen, drag.anchor, drag.start, drag.origin);
        if drag.shuffle {
            self.shuffle_to(id, sid, p);
            return Ok(());
        }

        let client = self.clients.get(id).ok_or(CoreError::UnknownClient(id))?;
        let current = client.geometry;
        let min_width = 2 * current.border + 1;
        let min_height = 2 * current.border + current.title + current.grip + 1;
        let candidate = drag::candidate(anchor, start, origin, p, min_width, min_height);
        let targets = self.snap_targets(sid, id, candidate);
        let snapped = snap::snap(candidate, anchor, &targets, self.config.general.snap_distance);

        let mut next = current;
        next.set_outer(snapped);
        if anchor != drag::Anchor::Center {
            next = constrain(&client.hints, next).0;
            if anchor.moves_left() {
                next.x = snapped.right() - next.outer_width();
            }
            if anchor.moves_top() {
                next.y = snapped.bottom() - next.outer_height();
            }
        }
        trace!(window = %client.window, ?next, "drag motion");
        self.reconfigure(id, next, false)?;
        Ok(())
    }

    /// Swap a dragged tiled client with the tiled client under the pointer.
    fn shuffle_to(&mut self, id: ClientId, sid: ScreenId, p: Point) {
        let view = self.client_view(id);
        let target = self.screens.get(&sid).and_then(|s| {
            s.lists.order(Order::List).iter().copied().find(|&other| {
                other != id
                    && self.client_view(other) == view
                    && self.is_tiled(other)
                    && self
                        .clients
                        .get(other)
                        .is_some_and(|c| c.geometry.outer().contains(p.x, p.y))
            })
        });
        if let Some(target) = target {
            if let Some(screen) = self.screens.get_mut(&sid) {
                screen.lists.swap(Order::List, id, target);
            }
            debug!(%id, %target, "shuffled");
            self.dirty_client_views(id);
        }
    }

    fn commit_drag(&mut self, drag: &Drag) -> Result<(), CoreError> {
        let id = drag.client;
        let monitor_view = self.clients.get(id).and_then(|c| {
            let screen = self.screens.get(&c.screen)?;
            let m = screen.monitor_for(c.geometry.outer())?;
            screen.monitors.get(m).map(|mon| mon.view)
        });
        self.dirty_client_views(id);

        let client = self.clients.get_mut(id).ok_or(CoreError::UnknownClient(id))?;
        client.is.remove(ClientState::MOVERESIZE);
        if !drag.shuffle {
            client.restore = client.geometry;
            client.user = client.geometry;
            // Dropped on another monitor: follow the view shown there.
            if let Some(view) = monitor_view {
                let bit = 1 << view;
                if !client.is.contains(ClientState::STICKY) && client.tags & bit == 0 {
                    client.tags = bit;
                }
            }
        }
        let window = client.window;
        let state = client.is;
        self.emit(CoreAction::StateChanged { window, state });
        self.dirty_client_views(id);
        info!(%window, token = %drag.token, "drag committed");
        Ok(())
    }

    /// Abort the drag, putting geometry, flags and list position back.
    fn cancel_drag(&mut self) -> Result<(), CoreError> {
        let Some(drag) = self.drag.take() else {
            return Ok(());
        };
        self.emit(CoreAction::UngrabPointer { token: drag.token });
        let Some(saved) = drag.saved else {
            return Ok(());
        };
        let id = drag.client;
        self.dirty_client_views(id);

        let client = self.clients.get_mut(id).ok_or(CoreError::UnknownClient(id))?;
        client.is = saved.is;
        client.update_decorations(&self.config.decoration);
        client.restore = saved.restore;
        let window = client.window;
        let state = client.is;
        if let Some(screen) = self.screens.get_mut(&drag.screen) {
            screen.lists.restore_relative(Order::List, &saved.list);
        }
        self.reconfigure(id, saved.geometry, false)?;
        self.emit(CoreAction::StateChanged { window, state });
        self.dirty_client_views(id);
        info!(%window, token = %drag.token, "drag cancelled");
        Ok(())
    }

    // ── Command execution ────────────────────────────────────────────

    fn execute_command(&mut self, sid: ScreenId, command: Command) -> Result<(), CoreError> {
        if !self.screens.contains_key(&sid) {
            return Err(CoreError::UnknownScreen(sid));
        }
        match command {
            Command::SetLayout { monitor, layout } => {
                self.view_on(sid, monitor)?.set_layout(layout);
            }
            Command::AdjustMwfact { monitor, delta } => {
                self.view_on(sid, monitor)?.adjust_mwfact(delta);
            }
            Command::AdjustNmaster { monitor, delta } => {
                self.view_on(sid, monitor)?.adjust_nmaster(delta);
            }
            Command::AdjustNcolumns { monitor, delta } => {
                self.view_on(sid, monitor)?.adjust_ncolumns(delta);
            }
            Command::SelectView { monitor, view } => {
                let screen = self.screens.get_mut(&sid).ok_or(CoreError::UnknownScreen(sid))?;
                if monitor >= screen.monitors.len() {
                    return Err(CoreError::UnknownMonitor {
                        screen: sid,
                        monitor,
                    });
                }
                if screen.select_view(monitor, view) {
                    self.refocus(sid);
                }
            }
            Command::SetViewCount { count } => self.set_view_count(sid, count),
            Command::SetTags { tags } => self.retag(|_| tags)?,
            Command::ToggleTags { tags } => self.retag(|current| current ^ tags)?,
            Command::SetState { state, toggle } => self.set_state(state, toggle)?,
            Command::Focus { window } => {
                let id = self
                    .clients
                    .lookup(window)
                    .ok_or(CoreError::UnknownWindow(window))?;
                if self.is_visible(id) {
                    self.activate(id);
                }
            }
            Command::FocusNext => self.cycle(sid, true),
            Command::FocusPrev => self.cycle(sid, false),
            Command::Zoom => self.zoom(),
            Command::Raise => self.raise(true),
            Command::Lower => self.raise(false),
            Command::Close => {
                if let Some(client) = self.focus.selected.and_then(|id| self.clients.get(id)) {
                    let window = client.window;
                    if !client.can.contains(Capabilities::CLOSE) {
                        return Err(CoreError::NotPermitted {
                            window,
                            action: "close",
                        });
                    }
                    self.emit(CoreAction::RequestClose { window });
                }
            }
            Command::Arrange => self.need_arrange(sid, None),
        }
        Ok(())
    }

    fn view_on(&mut self, sid: ScreenId, monitor: usize) -> Result<&mut view::View, CoreError> {
        let screen = self.screens.get_mut(&sid).ok_or(CoreError::UnknownScreen(sid))?;
        let index = screen
            .monitors
            .get(monitor)
            .map(|m| m.view)
            .ok_or(CoreError::UnknownMonitor {
                screen: sid,
                monitor,
            })?;
        screen
            .views
            .get_mut(index)
            .ok_or(CoreError::UnknownMonitor {
                screen: sid,
                monitor,
            })
    }

    fn set_view_count(&mut self, sid: ScreenId, count: usize) {
        let Some(screen) = self.screens.get_mut(&sid) else {
            return;
        };
        let removed = screen.set_view_count(count, &self.config);
        if removed != 0 {
            let last = screen.last_view_bit();
            let ids = screen.lists.order(Order::List).to_vec();
            for id in ids {
                if let Some(client) = self.clients.get_mut(id) {
                    if client.tags & removed != 0 {
                        client.tags = (client.tags & !removed) | last;
                        debug!(window = %client.window, tags = client.tags, "client migrated");
                    }
                }
            }
        }
        self.need_arrange(sid, None);
        self.refocus(sid);
    }

    fn retag(&mut self, f: impl FnOnce(u64) -> u64) -> Result<(), CoreError> {
        let Some(id) = self.focus.selected else {
            return Ok(());
        };
        let client = self.clients.get(id).ok_or(CoreError::UnknownClient(id))?;
        let sid = client.screen;
        let mask = self
            .screens
            .get(&sid)
            .map_or(0, |s| view_mask(s.views.len()));
        let tags = f(client.tags) & mask;
        if tags == 0 {
            debug!(window = %client.window, "refusing to remove the last tag");
            return Ok(());
        }
        self.dirty_client_views(id);
        if let Some(client) = self.clients.get_mut(id) {
            client.tags = tags;
        }
        self.dirty_client_views(id);
        self.refocus(sid);
        Ok(())
    }

    fn set_state(&mut self, which: StateToggle, toggle: Toggle) -> Result<(), CoreError> {
        let Some(id) = self.focus.selected else {
            return Ok(());
        };
        let (flag, needed, action) = match which {
            StateToggle::Floating => (ClientState::FLOATING, Capabilities::FLOAT, "float"),
            StateToggle::Max => (ClientState::MAX, Capabilities::MAX, "maximize"),
            StateToggle::MaxV => (ClientState::MAXV, Capabilities::MAX, "maximize"),
            StateToggle::MaxH => (ClientState::MAXH, Capabilities::MAX, "maximize"),
            StateToggle::LeftHalf => (ClientState::LHALF, Capabilities::MAX, "maximize"),
            StateToggle::RightHalf => (ClientState::RHALF, Capabilities::MAX, "maximize"),
            StateToggle::Fill => (ClientState::FILL, Capabilities::FILL, "fill"),
            StateToggle::Full => (ClientState::FULL, Capabilities::FULL, "fullscreen"),
            StateToggle::Shade => (ClientState::SHADED, Capabilities::SHADE, "shade"),
            StateToggle::Sticky => (ClientState::STICKY, Capabilities::STICK, "stick"),
            StateToggle::Above => (ClientState::ABOVE, Capabilities::ABOVE, "raise"),
            StateToggle::Below => (ClientState::BELOW, Capabilities::BELOW, "lower"),
            StateToggle::Iconic => (ClientState::ICONIC, Capabilities::MIN, "minimize"),
        };

        self.dirty_client_views(id);
        let client = self.clients.get_mut(id).ok_or(CoreError::UnknownClient(id))?;
        let current = client.is.contains(flag);
        let wanted = toggle.apply(current);
        if wanted == current {
            return Ok(());
        }
        if !client.can.contains(needed) {
            return Err(CoreError::NotPermitted {
                window: client.window,
                action,
            });
        }
        client.is.set(flag, wanted);
        if wanted {
            let exclusive = match which {
                StateToggle::LeftHalf => ClientState::RHALF,
                StateToggle::RightHalf => ClientState::LHALF,
                StateToggle::Above => ClientState::BELOW,
                StateToggle::Below => ClientState::ABOVE,
                _ => ClientState::empty(),
            };
            client.is.remove(exclusive);
        }
        if flag == ClientState::FULL {
            client.update_decorations(&self.config.decoration);
        }
        let window = client.window;
        let state = client.is;
        let sid = client.screen;
        debug!(%window, ?which, wanted, "state changed");
        self.emit(CoreAction::StateChanged { window, state });
        self.dirty_client_views(id);
        if flag == ClientState::ICONIC {
            self.refocus(sid);
        }
        Ok(())
    }

    /// Move the selection to the top or bottom of the stacking order. The solver
    /// keeps it within its band.
    fn raise(&mut self, top: bool) {
        let Some(id) = self.focus.selected else {
            return;
        };
        let screen = self
            .clients
            .get(id)
            .and_then(|c| self.screens.get_mut(&c.screen));
        if let Some(screen) = screen {
            if top {
                screen.lists.promote(Order::Stack, id);
            } else {
                screen.lists.demote(Order::Stack, id);
            }
        }
    }

    /// Move the selected tiled client to the head of the tiling order; the head
    /// itself trades places with the next tiled client.
    fn zoom(&mut self) {
        let Some(id) = self.focus.selected else {
            return;
        };
        if !self.is_tiled(id) {
            return;
        }
        let view = self.client_view(id);
        let Some(sid) = self.clients.get(id).map(|c| c.screen) else {
            return;
        };
        let Some(screen) = self.screens.get(&sid) else {
            return;
        };
        let tiled: Vec<ClientId> = screen
            .lists
            .order(Order::List)
            .iter()
            .copied()
            .filter(|&c| self.client_view(c) == view && self.is_tiled(c))
            .collect();
        let (Some(&head), Some(head_pos)) = (
            tiled.first(),
            tiled
                .first()
                .and_then(|&h| screen.lists.position(Order::List, h)),
        ) else {
            return;
        };
        let target = if head == id { tiled.get(1).copied() } else { Some(id) };
        if let Some(target) = target {
            if let Some(screen) = self.screens.get_mut(&sid) {
                screen.lists.move_to(Order::List, target, head_pos);
            }
            self.dirty_client_views(id);
        }
    }
}

/// Tag bits of the first `views` views.
const fn view_mask(views: usize) -> u64 {
    if views >= 64 {
        u64::MAX
    } else {
        (1 << views) - 1
    }
}

/// Whether a client may take selection and input focus.
fn focusable(client: &Client) -> bool {
    !client.skip.contains(Skip::FOCUS) && !client.is_dockish() && !client.is_desktop()
}
