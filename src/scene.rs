//! Scene runner
//!
//! A scene is a JSON document describing screens and a sequence of steps (mapped
//! windows, pointer input, user commands). The runner replays it against a
//! [`Core`] and reports the resulting geometry and stacking of every client.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use strata_core::client::{ClientAttrs, ClientState};
use strata_core::drag::GrabAction;
use strata_core::event::{CoreAction, CoreEvent};
use strata_core::geometry::{ClientGeometry, Geometry};
use strata_core::layout::Layout;
use strata_core::registry::{ClientId, Order};
use strata_core::{invariants, Command, Core, ScreenId, WindowId};

#[derive(Debug, Clone, Deserialize)]
pub struct Scene {
    pub screens: Vec<SceneScreen>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneScreen {
    pub id: ScreenId,
    pub monitors: Vec<Geometry>,
}

/// One input to the core.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    Map {
        screen: ScreenId,
        window: WindowId,
        #[serde(default)]
        attrs: ClientAttrs,
    },
    Unmap {
        window: WindowId,
    },
    Configure {
        window: WindowId,
        geometry: ClientGeometry,
    },
    Activate {
        window: WindowId,
    },
    Monitors {
        screen: ScreenId,
        monitors: Vec<Geometry>,
    },
    Press {
        window: WindowId,
        x: i32,
        y: i32,
        action: GrabAction,
    },
    Motion {
        x: i32,
        y: i32,
    },
    Release {
        x: i32,
        y: i32,
    },
    Escape,
    Exec {
        screen: ScreenId,
        command: Command,
    },
    Tick,
}

/// What a step turns into.
enum Input {
    Event(CoreEvent),
    Command(ScreenId, Command),
    Tick,
}

impl From<Step> for Input {
    fn from(step: Step) -> Self {
        let event = match step {
            Step::Map {
                screen,
                window,
                attrs,
            } => CoreEvent::WindowMapped {
                screen,
                window,
                attrs,
            },
            Step::Unmap { window } => CoreEvent::WindowUnmapped { window },
            Step::Configure { window, geometry } => CoreEvent::ConfigureRequest { window, geometry },
            Step::Activate { window } => CoreEvent::ActivateRequested { window },
            Step::Monitors { screen, monitors } => CoreEvent::MonitorsChanged { screen, monitors },
            Step::Press {
                window,
                x,
                y,
                action,
            } => CoreEvent::PointerPress {
                window,
                x,
                y,
                action,
            },
            Step::Motion { x, y } => CoreEvent::PointerMotion { x, y },
            Step::Release { x, y } => CoreEvent::PointerRelease { x, y },
            Step::Escape => CoreEvent::EscapePressed,
            Step::Exec { screen, command } => return Self::Command(screen, command),
            Step::Tick => return Self::Tick,
        };
        Self::Event(event)
    }
}

/// Final state of a replayed scene.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub screens: Vec<ScreenReport>,
    pub selected: Option<WindowId>,
    pub focused: Option<WindowId>,
    /// Every action the core emitted, in order; only filled when requested.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<CoreAction>,
    /// First invariant violation found after the last step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenReport {
    pub id: ScreenId,
    pub monitors: Vec<MonitorReport>,
    /// Topmost first.
    pub stacking: Vec<WindowId>,
    pub clients: Vec<ClientReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorReport {
    pub geometry: Geometry,
    pub workarea: Geometry,
    pub view: usize,
    pub layout: Layout,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientReport {
    pub window: WindowId,
    /// Outer extents, border included.
    pub frame: Geometry,
    pub tags: u64,
    pub state: ClientState,
    pub visible: bool,
}

impl Scene {
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read scene: {path:?}"))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse scene: {path:?}"))
    }

    /// Replay the scene on `core`. With `record`, the emitted actions go into the report.
    pub fn run(self, core: &mut Core, record: bool) -> Report {
        let mut log = Vec::new();
        for screen in self.screens {
            let actions = core.handle_event(CoreEvent::ScreenAdded {
                screen: screen.id,
                monitors: screen.monitors,
            });
            log.extend(actions);
        }

        for (i, step) in self.steps.into_iter().enumerate() {
            debug!(step = i, ?step, "replaying");
            let actions = match Input::from(step) {
                Input::Event(event) => core.handle_event(event),
                Input::Command(screen, command) => core.exec(screen, command),
                Input::Tick => core.tick(),
            };
            if record {
                log.extend(actions);
            }
        }
        log.extend(core.tick());
        if !record {
            log.clear();
        }
        info!(actions = log.len(), "scene replayed");

        Report {
            screens: core.screens().keys().map(|&id| screen_report(core, id)).collect(),
            selected: core.selected_window(),
            focused: core.focused_window(),
            actions: log,
            violation: invariants::validate(core).err().map(|e| e.to_string()),
        }
    }
}

fn screen_report(core: &Core, id: ScreenId) -> ScreenReport {
    let Some(screen) = core.screen(id) else {
        return ScreenReport {
            id,
            monitors: Vec::new(),
            stacking: Vec::new(),
            clients: Vec::new(),
        };
    };
    let window = |&cid: &ClientId| core.client(cid).map(|c| c.window);
    ScreenReport {
        id,
        monitors: screen
            .monitors
            .iter()
            .map(|m| MonitorReport {
                geometry: m.geometry,
                workarea: m.workarea,
                view: m.view,
                layout: screen.views.get(m.view).map_or(Layout::Float, |v| v.layout),
            })
            .collect(),
        stacking: screen.lists.order(Order::Stack).iter().filter_map(window).collect(),
        clients: screen
            .lists
            .order(Order::Creation)
            .iter()
            .filter_map(|&cid| {
                core.client(cid).map(|c| ClientReport {
                    window: c.window,
                    frame: c.geometry.outer(),
                    tags: c.tags,
                    state: c.is,
                    visible: core.is_visible(cid),
                })
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use strata_core::config::Config;

    const SCENE: &str = r#"{
        "screens": [
            { "id": 0, "monitors": [{ "x": 0, "y": 0, "width": 1000, "height": 800 }] }
        ],
        "steps": [
            { "step": "map", "screen": 0, "window": 1,
              "attrs": { "geometry": { "x": 0, "y": 0, "width": 300, "height": 200, "border": 0 } } },
            { "step": "map", "screen": 0, "window": 2 },
            { "step": "exec", "screen": 0,
              "command": { "command": "set_layout", "monitor": 0, "layout": "monocle" } },
            { "step": "tick" }
        ]
    }"#;

    fn bare() -> Config {
        let mut config = Config::default();
        config.decoration.border_width = 0;
        config.decoration.title_height = 0;
        config
    }

    #[test]
    fn test_scene_replay() {
        let scene: Scene = serde_json::from_str(SCENE).unwrap();
        let mut core = Core::new(bare());
        let report = scene.run(&mut core, false);

        assert_eq!(report.violation, None);
        assert!(report.actions.is_empty());
        assert_eq!(report.selected, Some(WindowId(2)));
        let screen = &report.screens[0];
        assert_eq!(screen.monitors[0].layout, Layout::Monocle);
        assert_eq!(screen.clients.len(), 2);
        for client in &screen.clients {
            assert_eq!(client.frame, Geometry::new(0, 0, 1000, 800));
        }
        assert_eq!(screen.stacking, vec![WindowId(2), WindowId(1)]);
    }

    #[test]
    fn test_scene_records_actions() {
        let scene: Scene = serde_json::from_str(SCENE).unwrap();
        let mut core = Core::new(bare());
        let report = scene.run(&mut core, true);
        assert!(report
            .actions
            .iter()
            .any(|a| matches!(a, CoreAction::SetFocus { window: Some(WindowId(2)) })));
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["actions"].is_array());
    }

    #[test]
    fn test_scene_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");
        fs::write(&path, SCENE).unwrap();
        let scene = Scene::load(&path).unwrap();
        assert_eq!(scene.steps.len(), 4);

        fs::write(&path, "{ not json").unwrap();
        assert!(Scene::load(&path).is_err());
    }
}
