//! Client arena and the per-screen client orderings.
//!
//! Clients live in one arena addressed by generation-checked [`ClientId`]s. Each
//! screen keeps five independent orderings of its clients in [`ClientLists`]; the
//! membership of all five is always the same set.

use std::collections::HashMap;

use tracing::{error, warn};

use crate::client::{Client, WindowId};

/// Stable handle to a managed client.
///
/// A handle outlives its client: once the slot is reused the generation no longer
/// matches and lookups fail instead of returning the wrong client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId {
    index: u32,
    generation: u32,
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "client:{}.{}", self.index, self.generation)
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    client: Option<Client>,
}

/// Arena owning every managed client.
#[derive(Debug, Default)]
pub struct ClientArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    by_window: HashMap<WindowId, ClientId>,
}

impl ClientArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, client: Client) -> ClientId {
        let window = client.window;
        let id = if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.client = Some(client);
            ClientId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                client: Some(client),
            });
            ClientId {
                index,
                generation: 0,
            }
        };
        if let Some(stale) = self.by_window.insert(window, id) {
            warn!(%window, %stale, "window was already managed, dropping stale mapping");
        }
        id
    }

    pub fn remove(&mut self, id: ClientId) -> Option<Client> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let client = slot.client.take()?;
        self.free.push(id.index);
        if self.by_window.get(&client.window) == Some(&id) {
            self.by_window.remove(&client.window);
        }
        Some(client)
    }

    pub fn get(&self, id: ClientId) -> Option<&Client> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.client.as_ref())
    }

    pub fn get_mut(&mut self, id: ClientId) -> Option<&mut Client> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.client.as_mut())
    }

    pub fn contains(&self, id: ClientId) -> bool {
        self.get(id).is_some()
    }

    /// Client managing `window`, if any.
    pub fn lookup(&self, window: WindowId) -> Option<ClientId> {
        self.by_window.get(&window).copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClientId, &Client)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.client.as_ref().map(|client| {
                (
                    ClientId {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    client,
                )
            })
        })
    }
}

/// The five orderings of a screen's clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Order {
    /// Order of management.
    Creation,
    /// Tiling/list order.
    List,
    /// Stacking order, topmost first.
    Stack,
    /// Selection history, most recent first.
    Focus,
    /// Input-focus history, most recent first.
    Activation,
}

impl Order {
    pub const ALL: [Self; 5] = [
        Self::Creation,
        Self::List,
        Self::Stack,
        Self::Focus,
        Self::Activation,
    ];

    const fn slot(self) -> usize {
        match self {
            Self::Creation => 0,
            Self::List => 1,
            Self::Stack => 2,
            Self::Focus => 3,
            Self::Activation => 4,
        }
    }
}

/// Per-screen client orderings.
///
/// Every mutation touches all five vectors together; an update that would leave them
/// with different members is refused and logged.
#[derive(Debug, Clone, Default)]
pub struct ClientLists {
    orders: [Vec<ClientId>; 5],
}

impl ClientLists {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a client: appended to creation, list, focus and activation order, placed on
    /// top of the stack.
    pub fn insert(&mut self, id: ClientId) -> bool {
        if self.contains(id) {
            warn!(%id, "client already listed on this screen");
            return false;
        }
        for order in Order::ALL {
            let list = &mut self.orders[order.slot()];
            if order == Order::Stack {
                list.insert(0, id);
            } else {
                list.push(id);
            }
        }
        true
    }

    /// Remove a client from all five orderings.
    pub fn remove(&mut self, id: ClientId) -> bool {
        let mut removed = 0;
        for list in &mut self.orders {
            let before = list.len();
            list.retain(|&c| c != id);
            if list.len() != before {
                removed += 1;
            }
        }
        if removed != 0 && removed != self.orders.len() {
            error!(%id, removed, "client was missing from some orderings");
        }
        removed != 0
    }

    pub fn order(&self, order: Order) -> &[ClientId] {
        &self.orders[order.slot()]
    }

    pub fn contains(&self, id: ClientId) -> bool {
        self.orders[Order::List.slot()].contains(&id)
    }

    pub fn len(&self) -> usize {
        self.orders[Order::List.slot()].len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders[Order::List.slot()].is_empty()
    }

    pub fn position(&self, order: Order, id: ClientId) -> Option<usize> {
        self.order(order).iter().position(|&c| c == id)
    }

    /// Move a client to the head of one ordering.
    pub fn promote(&mut self, order: Order, id: ClientId) -> bool {
        self.move_to(order, id, 0)
    }

    /// Move a client to the tail of one ordering.
    pub fn demote(&mut self, order: Order, id: ClientId) -> bool {
        let last = self.len().saturating_sub(1);
        self.move_to(order, id, last)
    }

    /// Move a client to `index` within one ordering (clamped to the tail).
    pub fn move_to(&mut self, order: Order, id: ClientId, index: usize) -> bool {
        let list = &mut self.orders[order.slot()];
        let Some(pos) = list.iter().position(|&c| c == id) else {
            warn!(%id, ?order, "cannot move unlisted client");
            return false;
        };
        list.remove(pos);
        let index = index.min(list.len());
        list.insert(index, id);
        true
    }

    /// Exchange the positions of two clients within one ordering.
    pub fn swap(&mut self, order: Order, a: ClientId, b: ClientId) -> bool {
        let list = &mut self.orders[order.slot()];
        match (
            list.iter().position(|&c| c == a),
            list.iter().position(|&c| c == b),
        ) {
            (Some(i), Some(j)) => {
                list.swap(i, j);
                true
            }
            _ => {
                warn!(%a, %b, ?order, "cannot swap unlisted clients");
                false
            }
        }
    }

    /// Replace one ordering wholesale. Refused unless `new` is a permutation of the
    /// current members.
    pub fn replace(&mut self, order: Order, new: Vec<ClientId>) -> bool {
        let current = &self.orders[order.slot()];
        let mut a = current.clone();
        let mut b = new.clone();
        a.sort_unstable();
        b.sort_unstable();
        if a != b {
            error!(?order, "refusing to replace ordering with a different member set");
            return false;
        }
        self.orders[order.slot()] = new;
        true
    }

    /// Put the members of `saved` that are still listed back into their saved
    /// relative order. They keep the slots they currently occupy between them, so
    /// clients added since `saved` was taken stay where they are.
    pub fn restore_relative(&mut self, order: Order, saved: &[ClientId]) {
        let list = &mut self.orders[order.slot()];
        let survivors: Vec<ClientId> = saved.iter().copied().filter(|c| list.contains(c)).collect();
        let mut survivors = survivors.into_iter();
        for slot in list.iter_mut() {
            if saved.contains(slot) {
                if let Some(id) = survivors.next() {
                    *slot = id;
                }
            }
        }
    }

    /// True when all five orderings hold the same members exactly once.
    pub fn is_consistent(&self) -> bool {
        let mut reference = self.orders[0].clone();
        reference.sort_unstable();
        if reference.windows(2).any(|w| w[0] == w[1]) {
            return false;
        }
        self.orders[1..].iter().all(|list| {
            let mut sorted = list.clone();
            sorted.sort_unstable();
            sorted == reference
        })
    }
}
