//! Screens, monitors and focus tracking.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::client::WindowId;
use crate::config::{Config, DockConfig, MAX_VIEWS};
use crate::geometry::{Geometry, Point};
use crate::layout::dock::{self, Dock};
use crate::registry::{ClientId, ClientLists};
use crate::view::View;

/// Identifies one screen (root window) managed by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ScreenId(pub u32);

impl std::fmt::Display for ScreenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "screen:{}", self.0)
    }
}

/// Monitor (output) information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Monitor {
    pub index: usize,
    /// Full monitor rectangle.
    pub geometry: Geometry,
    /// Monitor minus struts and the dock area.
    pub workarea: Geometry,
    /// View currently shown.
    pub view: usize,
}

/// Selection and input focus.
///
/// Both are weak: they name clients owned by the arena and are cleared when the
/// client goes away.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusState {
    /// Client the user is operating on.
    pub selected: Option<ClientId>,
    /// Client holding input focus.
    pub focused: Option<ClientId>,
}

impl FocusState {
    /// Forget `id` wherever it is referenced.
    pub fn forget(&mut self, id: ClientId) {
        if self.selected == Some(id) {
            self.selected = None;
        }
        if self.focused == Some(id) {
            self.focused = None;
        }
    }
}

/// One screen: its client orderings, views, monitors and dock.
#[derive(Debug, Clone)]
pub struct Screen {
    pub id: ScreenId,
    pub lists: ClientLists,
    pub views: Vec<View>,
    pub monitors: Vec<Monitor>,
    pub dock: Dock,
    /// Stacking order last sent to the backend, topmost first.
    pub published: Vec<WindowId>,
}

impl Screen {
    pub fn new(id: ScreenId, monitors: &[Geometry], config: &Config) -> Self {
        let count = config.general.views.max(monitors.len()).clamp(1, MAX_VIEWS);
        let views = (0..count)
            .map(|i| View::new(i, &config.view_layout(i)))
            .collect();
        let mut screen = Self {
            id,
            lists: ClientLists::new(),
            views,
            monitors: Vec::new(),
            dock: Dock::default(),
            published: Vec::new(),
        };
        screen.set_monitors(monitors, config);
        info!(screen = %id, monitors = screen.monitors.len(), views = count, "screen initialised");
        screen
    }

    /// Bounding box of all monitors.
    pub fn root(&self) -> Geometry {
        self.monitors
            .iter()
            .map(|m| m.geometry)
            .reduce(Geometry::union)
            .unwrap_or_default()
    }

    pub fn monitor_at(&self, p: Point) -> Option<usize> {
        self.monitors
            .iter()
            .position(|m| m.geometry.contains(p.x, p.y))
    }

    /// Monitor whose rectangle overlaps `g` the most.
    pub fn monitor_for(&self, g: Geometry) -> Option<usize> {
        let center = g.center();
        self.monitor_at(center).or_else(|| {
            self.monitors
                .iter()
                .enumerate()
                .filter_map(|(i, m)| m.geometry.intersection(g).map(|x| (i, x.area())))
                .max_by_key(|&(_, area)| area)
                .map(|(i, _)| i)
        })
    }

    pub fn monitor_of_view(&self, view: usize) -> Option<usize> {
        self.views.get(view).and_then(|v| v.curmon)
    }

    pub fn workarea(&self, monitor: usize) -> Option<Geometry> {
        self.monitors.get(monitor).map(|m| m.workarea)
    }

    /// Tag bit of the last view.
    pub fn last_view_bit(&self) -> u64 {
        self.views.last().map_or(1, View::bit)
    }

    /// Show `view` on `monitor`.
    ///
    /// A view already shown on another monitor swaps places with the one being
    /// replaced.
    pub fn select_view(&mut self, monitor: usize, view: usize) -> bool {
        if view >= self.views.len() || monitor >= self.monitors.len() {
            return false;
        }
        let old = self.monitors[monitor].view;
        if old == view {
            return false;
        }
        if let Some(other) = self.views[view].curmon {
            self.monitors[other].view = old;
            self.views[old].curmon = Some(other);
        } else {
            self.views[old].curmon = None;
        }
        self.monitors[monitor].view = view;
        self.views[view].curmon = Some(monitor);
        self.views[old].needs_arrange = true;
        self.views[view].needs_arrange = true;
        debug!(screen = %self.id, monitor, from = old, to = view, "view selected");
        true
    }

    /// Replace the monitor set, keeping the view shown on each surviving monitor.
    pub fn set_monitors(&mut self, geometries: &[Geometry], config: &Config) {
        let previous: Vec<usize> = self.monitors.iter().map(|m| m.view).collect();
        while self.views.len() < geometries.len().min(MAX_VIEWS) {
            let index = self.views.len();
            self.views.push(View::new(index, &config.view_layout(index)));
        }
        for view in &mut self.views {
            view.curmon = None;
            view.needs_arrange = true;
        }
        self.monitors.clear();
        for (index, &geometry) in geometries.iter().enumerate().take(self.views.len()) {
            let wanted = previous.get(index).copied().unwrap_or(index);
            let view = if wanted < self.views.len() && self.views[wanted].curmon.is_none() {
                wanted
            } else {
                self.views
                    .iter()
                    .position(|v| v.curmon.is_none())
                    .unwrap_or(0)
            };
            self.views[view].curmon = Some(index);
            self.monitors.push(Monitor {
                index,
                geometry,
                workarea: geometry,
                view,
            });
        }
        self.update_dock_capacity(config);
    }

    /// Monitor carrying the dock; the first one when the configured monitor is gone.
    pub fn dock_monitor(&self, config: &DockConfig) -> Option<usize> {
        if self.monitors.is_empty() {
            None
        } else if config.monitor < self.monitors.len() {
            Some(config.monitor)
        } else {
            Some(0)
        }
    }

    /// Resize the dock tree to what its monitor can hold.
    pub fn update_dock_capacity(&mut self, config: &Config) {
        let monitor = self.dock_monitor(&config.dock).and_then(|m| self.monitors.get(m));
        if let Some(monitor) = monitor {
            let capacity = dock::capacity(monitor.geometry, &config.dock, config.decoration.border_width);
            self.dock.set_capacity(capacity);
        }
    }

    /// Change the number of views. Returns the tag bits of the removed views.
    pub fn set_view_count(&mut self, count: usize, config: &Config) -> u64 {
        let count = count.max(self.monitors.len()).clamp(1, MAX_VIEWS);
        let mut removed = 0;
        if count > self.views.len() {
            for index in self.views.len()..count {
                self.views.push(View::new(index, &config.view_layout(index)));
            }
        } else {
            for view in self.views.drain(count..) {
                removed |= view.bit();
            }
            for m in 0..self.monitors.len() {
                if self.monitors[m].view >= count {
                    let free = (0..count).find(|&v| self.views[v].curmon.is_none()).unwrap_or(0);
                    self.monitors[m].view = free;
                    self.views[free].curmon = Some(m);
                    self.views[free].needs_arrange = true;
                }
            }
        }
        info!(screen = %self.id, count, removed, "view count changed");
        removed
    }
}
