//! Invariant validation for the core state.
//!
//! Called after every `handle_event` / `exec` in debug builds.

use crate::client::WindowId;
use crate::registry::ClientId;
use crate::state::ScreenId;
use crate::Core;

/// Error indicating which invariant was violated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantError {
    #[error("orderings of {0} disagree on their members")]
    InconsistentOrderings(ScreenId),

    #[error("{client} is listed on {screen} but not in the arena")]
    DanglingClient { screen: ScreenId, client: ClientId },

    #[error("{window} is listed on {listed} but belongs to {owner}")]
    WrongScreen {
        window: WindowId,
        listed: ScreenId,
        owner: ScreenId,
    },

    #[error("{0} is managed but not listed on its screen")]
    Unlisted(WindowId),

    #[error("selected client {0} does not exist")]
    SelectedMissing(ClientId),

    #[error("focused client {0} does not exist")]
    FocusedMissing(ClientId),

    #[error("view {view} and monitor {monitor} of {screen} disagree")]
    ViewMonitorMismatch {
        screen: ScreenId,
        view: usize,
        monitor: usize,
    },

    #[error("dock of {screen} holds unknown {client}")]
    DanglingDockApp { screen: ScreenId, client: ClientId },
}

/// Validate all core invariants. Returns the first violation found.
pub fn validate(core: &Core) -> Result<(), InvariantError> {
    let clients = core.clients();

    for (&sid, screen) in core.screens() {
        // 1. All five orderings hold the same members
        if !screen.lists.is_consistent() {
            return Err(InvariantError::InconsistentOrderings(sid));
        }

        // 2. Listed clients exist and belong here
        for &id in screen.lists.order(crate::registry::Order::List) {
            let client = clients
                .get(id)
                .ok_or(InvariantError::DanglingClient { screen: sid, client: id })?;
            if client.screen != sid {
                return Err(InvariantError::WrongScreen {
                    window: client.window,
                    listed: sid,
                    owner: client.screen,
                });
            }
        }

        // 3. Views and monitors point at each other
        for (m, monitor) in screen.monitors.iter().enumerate() {
            if screen.views.get(monitor.view).and_then(|v| v.curmon) != Some(m) {
                return Err(InvariantError::ViewMonitorMismatch {
                    screen: sid,
                    view: monitor.view,
                    monitor: m,
                });
            }
        }
        for (v, view) in screen.views.iter().enumerate() {
            if let Some(m) = view.curmon {
                if screen.monitors.get(m).map(|mon| mon.view) != Some(v) {
                    return Err(InvariantError::ViewMonitorMismatch {
                        screen: sid,
                        view: v,
                        monitor: m,
                    });
                }
            }
        }

        // 4. Docked apps are managed clients of this screen
        for id in screen.dock.rows().into_iter().flatten() {
            if !screen.lists.contains(id) {
                return Err(InvariantError::DanglingDockApp { screen: sid, client: id });
            }
        }
    }

    // 5. Every managed client is listed on its screen
    for (id, client) in clients.iter() {
        let listed = core
            .screens()
            .get(&client.screen)
            .is_some_and(|s| s.lists.contains(id));
        if !listed {
            return Err(InvariantError::Unlisted(client.window));
        }
    }

    // 6. Selection and focus name live clients
    let focus = core.focus();
    if let Some(id) = focus.selected {
        if !clients.contains(id) {
            return Err(InvariantError::SelectedMissing(id));
        }
    }
    if let Some(id) = focus.focused {
        if !clients.contains(id) {
            return Err(InvariantError::FocusedMissing(id));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientAttrs;
    use crate::config::Config;
    use crate::event::CoreEvent;
    use crate::geometry::Geometry;
    use pretty_assertions::assert_eq;

    fn core_with_window() -> (Core, ClientId) {
        let mut core = Core::new(Config::default());
        core.handle_event(CoreEvent::ScreenAdded {
            screen: ScreenId(0),
            monitors: vec![Geometry::new(0, 0, 800, 600)],
        });
        core.handle_event(CoreEvent::WindowMapped {
            screen: ScreenId(0),
            window: WindowId(1),
            attrs: ClientAttrs::default(),
        });
        let id = core.lookup(WindowId(1)).unwrap();
        (core, id)
    }

    #[test]
    fn test_fresh_state_is_valid() {
        let (core, _) = core_with_window();
        assert_eq!(validate(&core), Ok(()));
    }

    #[test]
    fn test_stale_selection_detected() {
        let (mut core, id) = core_with_window();
        core.clients.remove(id);
        core.focus.focused = None;
        core.screens[0].lists.remove(id);
        assert_eq!(validate(&core), Err(InvariantError::SelectedMissing(id)));
    }

    #[test]
    fn test_unlisted_client_detected() {
        let (mut core, id) = core_with_window();
        core.screens[0].lists.remove(id);
        assert_eq!(validate(&core), Err(InvariantError::Unlisted(WindowId(1))));
    }

    #[test]
    fn test_view_monitor_mismatch_detected() {
        let (mut core, _) = core_with_window();
        core.screens[0].views[0].curmon = None;
        assert!(matches!(
            validate(&core),
            Err(InvariantError::ViewMonitorMismatch { view: 0, monitor: 0, .. })
        ));
    }
}
