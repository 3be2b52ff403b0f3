//! Stacking-order solver.
//!
//! Partitions the clients of a screen into eight bands, topmost first, and within
//! a band keeps the previous stacking order. Before a client is placed, the modal
//! windows blocking it and the windows transient for it are placed right above
//! it, recursively.

use std::collections::HashSet;

use crate::client::{Client, ClientState, Modality};
use crate::registry::{ClientArena, ClientId};

/// Stacking bands, topmost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Band {
    SystemModal,
    Fullscreen,
    /// Dock windows while a dock window is selected.
    DockSelected,
    /// Dock-type and above windows.
    Above,
    Floating,
    Tiled,
    /// Below windows and bars not placed yet.
    Below,
    Desktop,
}

impl Band {
    pub const ALL: [Self; 8] = [
        Self::SystemModal,
        Self::Fullscreen,
        Self::DockSelected,
        Self::Above,
        Self::Floating,
        Self::Tiled,
        Self::Below,
        Self::Desktop,
    ];
}

/// Everything the solver looks at.
#[derive(Debug, Clone, Copy)]
pub struct StackInput<'a> {
    pub clients: &'a ClientArena,
    /// Current stacking order of the screen, topmost first.
    pub previous: &'a [ClientId],
    pub selected: Option<ClientId>,
    pub focused: Option<ClientId>,
    /// Clients shown on some monitor.
    pub visible: &'a HashSet<ClientId>,
    /// Clients that are floating in effect (own flag or a floating layout).
    pub floating: &'a HashSet<ClientId>,
}

impl<'a> StackInput<'a> {
    fn client(&self, id: ClientId) -> Option<&'a Client> {
        self.clients.get(id)
    }

    /// Band of a visible client; `None` for hidden or unknown clients.
    pub fn band(&self, id: ClientId) -> Option<Band> {
        if !self.visible.contains(&id) {
            return None;
        }
        let c = self.client(id)?;
        let is = c.is;
        let unplaced_bar = c.is_bar() && !is.contains(ClientState::PLACED);
        let selected_dockish = self
            .selected
            .and_then(|s| self.client(s))
            .is_some_and(Client::is_dockish);

        let band = if c.relations.modal == Modality::System {
            Band::SystemModal
        } else if is.contains(ClientState::FULL)
            && (self.selected == Some(id) || self.focused == Some(id))
            && !c.is_desktop()
        {
            Band::Fullscreen
        } else if c.is_desktop() {
            Band::Desktop
        } else if c.is_dockish() && selected_dockish {
            Band::DockSelected
        } else if (c.is_dockish() || is.contains(ClientState::ABOVE))
            && !is.contains(ClientState::BELOW)
            && !unplaced_bar
        {
            Band::Above
        } else if is.contains(ClientState::BELOW) || unplaced_bar {
            Band::Below
        } else if self.floating.contains(&id) {
            Band::Floating
        } else {
            Band::Tiled
        };
        Some(band)
    }

    /// Visible clients to place directly above `owner`: modal windows blocking it
    /// first, then its transients.
    fn dependents(&self, owner: ClientId) -> Vec<ClientId> {
        let Some(c) = self.client(owner) else {
            return Vec::new();
        };
        let in_group = |d: &Client| match d.relations.group {
            Some(group) => group == c.window || c.relations.group == Some(group),
            None => false,
        };

        let mut modal = Vec::new();
        let mut transient = Vec::new();
        for &id in self.previous {
            if id == owner || !self.visible.contains(&id) {
                continue;
            }
            let Some(d) = self.client(id) else {
                continue;
            };
            let for_owner = d.relations.transient_for == Some(c.window);
            let blocks = match d.relations.modal {
                Modality::Group => in_group(d) || for_owner,
                Modality::Primary => for_owner,
                Modality::Modeless | Modality::System => false,
            };
            if blocks {
                modal.push(id);
            } else if for_owner || (d.relations.group_transient && in_group(d)) {
                transient.push(id);
            }
        }
        modal.extend(transient);
        modal
    }
}

struct Solver<'a> {
    input: StackInput<'a>,
    placed: HashSet<ClientId>,
    order: Vec<ClientId>,
}

impl Solver<'_> {
    fn insert(&mut self, id: ClientId) {
        if !self.placed.insert(id) {
            return;
        }
        for dependent in self.input.dependents(id) {
            self.insert(dependent);
        }
        self.order.push(id);
    }
}

/// Compute the new stacking order, topmost first.
///
/// Clients not visible on any monitor follow the bands in their previous relative
/// order, so the result is always a permutation of `input.previous`.
pub fn solve(input: StackInput<'_>) -> Vec<ClientId> {
    let mut solver = Solver {
        input,
        placed: HashSet::with_capacity(input.previous.len()),
        order: Vec::with_capacity(input.previous.len()),
    };
    let bands: Vec<Option<Band>> = input.previous.iter().map(|&id| input.band(id)).collect();
    for band in Band::ALL {
        for (&id, &b) in input.previous.iter().zip(&bands) {
            if b == Some(band) {
                solver.insert(id);
            }
        }
    }
    for &id in input.previous {
        if !solver.placed.contains(&id) {
            solver.placed.insert(id);
            solver.order.push(id);
        }
    }
    solver.order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientAttrs, Relations, WindowId, WindowType};
    use crate::config::DecorationConfig;
    use crate::geometry::{ClientGeometry, Struts};
    use crate::state::ScreenId;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    struct Fixture {
        arena: ClientArena,
        ids: Vec<ClientId>,
        visible: HashSet<ClientId>,
        floating: HashSet<ClientId>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                arena: ClientArena::new(),
                ids: Vec::new(),
                visible: HashSet::new(),
                floating: HashSet::new(),
            }
        }

        fn add(&mut self, attrs: ClientAttrs) -> ClientId {
            let window = WindowId(self.ids.len() as u64 + 1);
            let attrs = ClientAttrs {
                geometry: ClientGeometry::new(0, 0, 100, 100, 0),
                ..attrs
            };
            let client = Client::new(window, ScreenId(0), attrs, &DecorationConfig::default());
            let floating = client.is.contains(ClientState::FLOATING);
            let id = self.arena.insert(client);
            self.ids.push(id);
            self.visible.insert(id);
            if floating {
                self.floating.insert(id);
            }
            id
        }

        fn solve(&self, previous: &[ClientId], selected: Option<ClientId>) -> Vec<ClientId> {
            solve(StackInput {
                clients: &self.arena,
                previous,
                selected,
                focused: selected,
                visible: &self.visible,
                floating: &self.floating,
            })
        }
    }

    fn with_state(state: ClientState) -> ClientAttrs {
        ClientAttrs {
            state,
            ..Default::default()
        }
    }

    #[test]
    fn test_bands_order() {
        let mut f = Fixture::new();
        let desktop = f.add(ClientAttrs {
            window_type: WindowType::Desktop,
            ..Default::default()
        });
        let below = f.add(with_state(ClientState::BELOW));
        let tiled = f.add(ClientAttrs::default());
        let floating = f.add(with_state(ClientState::FLOATING));
        let above = f.add(with_state(ClientState::ABOVE));
        let full = f.add(with_state(ClientState::FULL));
        let modal = f.add(ClientAttrs {
            relations: Relations {
                modal: Modality::System,
                ..Default::default()
            },
            ..Default::default()
        });

        let previous = vec![desktop, below, tiled, floating, above, full, modal];
        let order = f.solve(&previous, Some(full));
        assert_eq!(order, vec![modal, full, above, floating, tiled, below, desktop]);

        // Unselected fullscreen windows drop to their ordinary band.
        let order = f.solve(&previous, Some(tiled));
        assert_eq!(order, vec![modal, above, floating, tiled, full, below, desktop]);
    }

    #[test]
    fn test_previous_order_kept_within_band() {
        let mut f = Fixture::new();
        let a = f.add(ClientAttrs::default());
        let b = f.add(ClientAttrs::default());
        let c = f.add(ClientAttrs::default());
        assert_eq!(f.solve(&[b, c, a], None), vec![b, c, a]);
        assert_eq!(f.solve(&[c, a, b], None), vec![c, a, b]);
    }

    #[test]
    fn test_transient_sits_above_owner() {
        let mut f = Fixture::new();
        let owner = f.add(ClientAttrs::default());
        let other = f.add(ClientAttrs::default());
        let dialog = f.add(ClientAttrs {
            relations: Relations {
                transient_for: Some(WindowId(1)),
                ..Default::default()
            },
            state: ClientState::BELOW,
            ..Default::default()
        });
        let order = f.solve(&[other, owner, dialog], None);
        assert_eq!(order, vec![other, dialog, owner]);
    }

    #[test]
    fn test_group_modal_above_group() {
        let mut f = Fixture::new();
        let leader = f.add(ClientAttrs::default());
        let member = f.add(ClientAttrs {
            relations: Relations {
                group: Some(WindowId(1)),
                ..Default::default()
            },
            ..Default::default()
        });
        let modal = f.add(ClientAttrs {
            relations: Relations {
                group: Some(WindowId(1)),
                modal: Modality::Group,
                ..Default::default()
            },
            ..Default::default()
        });
        let order = f.solve(&[member, leader, modal], None);
        assert_eq!(order, vec![modal, member, leader]);
    }

    #[test]
    fn test_cyclic_transients_terminate() {
        let mut f = Fixture::new();
        let a = f.add(ClientAttrs {
            relations: Relations {
                transient_for: Some(WindowId(2)),
                ..Default::default()
            },
            ..Default::default()
        });
        let b = f.add(ClientAttrs {
            relations: Relations {
                transient_for: Some(WindowId(1)),
                ..Default::default()
            },
            ..Default::default()
        });
        let order = f.solve(&[a, b], None);
        assert_eq!(order.len(), 2);
    }

    #[test]
    fn test_hidden_clients_follow_bands() {
        let mut f = Fixture::new();
        let hidden = f.add(with_state(ClientState::ABOVE));
        let shown = f.add(ClientAttrs::default());
        f.visible.remove(&hidden);
        assert_eq!(f.solve(&[hidden, shown], None), vec![shown, hidden]);
    }

    #[test]
    fn test_unplaced_bar_sits_low() {
        let mut f = Fixture::new();
        let bar = f.add(ClientAttrs {
            window_type: WindowType::Dock,
            struts: Struts::new(0, 0, 24, 0),
            ..Default::default()
        });
        let tiled = f.add(ClientAttrs::default());
        assert_eq!(f.solve(&[bar, tiled], None), vec![tiled, bar]);
        if let Some(c) = f.arena.get_mut(bar) {
            c.is.insert(ClientState::PLACED);
        }
        assert_eq!(f.solve(&[tiled, bar], None), vec![bar, tiled]);
    }

    fn state_strategy() -> impl Strategy<Value = ClientState> {
        prop_oneof![
            Just(ClientState::empty()),
            Just(ClientState::FLOATING),
            Just(ClientState::ABOVE),
            Just(ClientState::BELOW),
            Just(ClientState::FULL),
        ]
    }

    proptest! {
        #[test]
        fn bands_are_totally_ordered(
            states in proptest::collection::vec(state_strategy(), 1..24),
            rotation in 0..24usize,
            selected in 0..24usize,
        ) {
            let mut f = Fixture::new();
            for state in &states {
                f.add(with_state(*state));
            }
            let mut previous = f.ids.clone();
            let n = previous.len();
            previous.rotate_left(rotation % n);
            let selected = Some(f.ids[selected % f.ids.len()]);
            let order = f.solve(&previous, selected);

            let mut sorted = order.clone();
            sorted.sort_unstable();
            let mut expected = previous.clone();
            expected.sort_unstable();
            prop_assert_eq!(sorted, expected);

            let input = StackInput {
                clients: &f.arena,
                previous: &previous,
                selected,
                focused: selected,
                visible: &f.visible,
                floating: &f.floating,
            };
            let bands: Vec<Band> = order.iter().filter_map(|&id| input.band(id)).collect();
            prop_assert!(bands.windows(2).all(|w| w[0] <= w[1]));
        }
    }
}
