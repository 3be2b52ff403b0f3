//! Dock-app area.
//!
//! Dock apps live in a small index-based tree: the root holds terms (rows or
//! columns, depending on the orientation) and each term holds fixed-size leaves.
//! A term holds at most `capacity` leaves; adding or removing a leaf rebalances by
//! moving one leaf at a time between neighbouring terms.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::DockConfig;
use crate::geometry::{Geometry, Struts};
use crate::registry::ClientId;

/// Where the dock sits on its monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DockPosition {
    North,
    South,
    #[default]
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl DockPosition {
    const fn at_right(self) -> bool {
        matches!(self, Self::East | Self::NorthEast | Self::SouthEast)
    }

    const fn at_bottom(self) -> bool {
        matches!(self, Self::South | Self::SouthEast | Self::SouthWest)
    }
}

/// Direction in which a term fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DockOrient {
    Horizontal,
    #[default]
    Vertical,
}

/// Index of a node in the dock arena.
pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Root,
    Term,
    Leaf(ClientId),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    const fn new(kind: NodeKind, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            parent,
            children: Vec::new(),
        }
    }
}

/// The dock tree of one screen.
#[derive(Debug, Clone)]
pub struct Dock {
    nodes: Vec<Option<Node>>,
    free: Vec<NodeId>,
    root: NodeId,
    capacity: usize,
}

impl Default for Dock {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Dock {
    pub fn new(capacity: usize) -> Self {
        Self {
            nodes: vec![Some(Node::new(NodeKind::Root, None))],
            free: Vec::new(),
            root: 0,
            capacity: capacity.max(1),
        }
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.nodes[id] = Some(node);
            id
        } else {
            self.nodes.push(Some(node));
            self.nodes.len() - 1
        }
    }

    fn release(&mut self, id: NodeId) {
        if let Some(slot) = self.nodes.get_mut(id) {
            *slot = None;
            self.free.push(id);
        }
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id).and_then(Option::as_mut)
    }

    fn terms(&self) -> Vec<NodeId> {
        self.node(self.root)
            .map(|root| root.children.clone())
            .unwrap_or_default()
    }

    fn term_len(&self, term: NodeId) -> usize {
        self.node(term).map_or(0, |t| t.children.len())
    }

    fn new_term(&mut self) -> NodeId {
        let term = self.alloc(Node::new(NodeKind::Term, Some(self.root)));
        let root = self.root;
        if let Some(root) = self.node_mut(root) {
            root.children.push(term);
        }
        term
    }

    fn drop_term(&mut self, term: NodeId) {
        let root = self.root;
        if let Some(root) = self.node_mut(root) {
            root.children.retain(|&t| t != term);
        }
        self.release(term);
    }

    fn find_leaf(&self, client: ClientId) -> Option<NodeId> {
        self.nodes.iter().enumerate().find_map(|(id, node)| {
            node.as_ref()
                .filter(|n| n.kind == NodeKind::Leaf(client))
                .map(|_| id)
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn contains(&self, client: ClientId) -> bool {
        self.find_leaf(client).is_some()
    }

    pub fn len(&self) -> usize {
        self.terms().iter().map(|&t| self.term_len(t)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Leaves grouped by term, in order.
    pub fn rows(&self) -> Vec<Vec<ClientId>> {
        self.terms()
            .into_iter()
            .filter_map(|t| self.node(t))
            .map(|term| {
                term.children
                    .iter()
                    .filter_map(|&leaf| match self.node(leaf)?.kind {
                        NodeKind::Leaf(client) => Some(client),
                        NodeKind::Root | NodeKind::Term => None,
                    })
                    .collect()
            })
            .collect()
    }

    /// Append a dock app after the last leaf.
    pub fn add(&mut self, client: ClientId) -> bool {
        if self.contains(client) {
            warn!(%client, "dock app already docked");
            return false;
        }
        let terms = self.terms();
        let term = match terms.last() {
            Some(&t) => t,
            None => self.new_term(),
        };
        let leaf = self.alloc(Node::new(NodeKind::Leaf(client), Some(term)));
        if let Some(t) = self.node_mut(term) {
            t.children.push(leaf);
        }
        let pos = self.terms().len() - 1;
        self.push_leaf(pos);
        debug!(%client, rows = ?self.rows(), "docked");
        true
    }

    pub fn remove(&mut self, client: ClientId) -> bool {
        let Some(leaf) = self.find_leaf(client) else {
            return false;
        };
        let term = self.node(leaf).and_then(|n| n.parent);
        self.release(leaf);
        let Some(term) = term else {
            return true;
        };
        if let Some(t) = self.node_mut(term) {
            t.children.retain(|&l| l != leaf);
        }
        let pos = self.terms().iter().position(|&t| t == term).unwrap_or(0);
        if self.term_len(term) == 0 {
            self.drop_term(term);
        }
        self.pop_leaf(pos);
        debug!(%client, rows = ?self.rows(), "undocked");
        true
    }

    /// Change the per-term capacity and rebalance the whole tree.
    pub fn set_capacity(&mut self, capacity: usize) {
        let capacity = capacity.max(1);
        if capacity == self.capacity {
            return;
        }
        self.capacity = capacity;
        self.push_leaf(0);
        self.pop_leaf(0);
    }

    /// Move one leaf between two terms.
    fn move_leaf(&mut self, from: NodeId, to: NodeId, from_back: bool) {
        let leaf = match self.node_mut(from) {
            Some(t) if from_back => t.children.pop(),
            Some(t) if !t.children.is_empty() => Some(t.children.remove(0)),
            _ => None,
        };
        let Some(leaf) = leaf else {
            return;
        };
        if let Some(t) = self.node_mut(to) {
            if from_back {
                t.children.insert(0, leaf);
            } else {
                t.children.push(leaf);
            }
        }
        if let Some(l) = self.node_mut(leaf) {
            l.parent = Some(to);
        }
    }

    /// Push overflowing leaves from term `pos` onwards into the following terms.
    fn push_leaf(&mut self, mut pos: usize) {
        while let Some(&term) = self.terms().get(pos) {
            while self.term_len(term) > self.capacity {
                let next = match self.terms().get(pos + 1) {
                    Some(&t) => t,
                    None => self.new_term(),
                };
                self.move_leaf(term, next, true);
            }
            pos += 1;
        }
    }

    /// Pull leaves back from following terms into short terms from `pos` onwards.
    fn pop_leaf(&mut self, mut pos: usize) {
        while let Some(&term) = self.terms().get(pos) {
            while self.term_len(term) < self.capacity {
                let Some(&next) = self.terms().get(pos + 1) else {
                    return;
                };
                self.move_leaf(next, term, false);
                if self.term_len(next) == 0 {
                    self.drop_term(next);
                }
            }
            pos += 1;
        }
    }
}

/// Geometry of the dock on its monitor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DockLayout {
    /// Outer geometry for each dock app.
    pub slots: Vec<(ClientId, Geometry)>,
    /// Occupied area, if any app is docked.
    pub area: Option<Geometry>,
    /// Reservation the area makes against the monitor edges.
    pub struts: Struts,
}

/// Leaves a term of the dock can hold on `monitor`.
pub fn capacity(monitor: Geometry, config: &DockConfig, border: i32) -> usize {
    let pitch = (config.cell_size + border).max(1);
    let extent = match config.orient {
        DockOrient::Horizontal => monitor.width,
        DockOrient::Vertical => monitor.height,
    };
    ((extent - border).max(0) / pitch).max(1) as usize
}

/// Place the dock apps of `dock` on `monitor`.
///
/// Terms stack away from the anchored edge; within a term cells fill away from the
/// anchored corner. Edge positions along the fill direction are centred.
pub fn arrange(dock: &Dock, monitor: Geometry, config: &DockConfig, border: i32) -> DockLayout {
    let rows = dock.rows();
    let longest = rows.iter().map(Vec::len).max().unwrap_or(0) as i32;
    if longest == 0 {
        return DockLayout::default();
    }
    let cell = config.cell_size;
    let pitch = cell + border;
    let term_len = longest * pitch + border;
    let stack_len = rows.len() as i32 * pitch + border;
    let horizontal = config.orient == DockOrient::Horizontal;
    let (width, height) = if horizontal {
        (term_len, stack_len)
    } else {
        (stack_len, term_len)
    };

    let pos = config.position;
    let x = match pos {
        DockPosition::North | DockPosition::South => monitor.x + (monitor.width - width) / 2,
        _ if pos.at_right() => monitor.right() - width,
        _ => monitor.x,
    };
    let y = match pos {
        DockPosition::East | DockPosition::West => monitor.y + (monitor.height - height) / 2,
        _ if pos.at_bottom() => monitor.bottom() - height,
        _ => monitor.y,
    };
    let area = Geometry::new(x, y, width, height);

    let mut slots = Vec::with_capacity(dock.len());
    for (t, row) in rows.iter().enumerate() {
        for (i, &client) in row.iter().enumerate() {
            let (col, line) = if horizontal {
                (i as i32, t as i32)
            } else {
                (t as i32, i as i32)
            };
            let mut cx = border + col * pitch;
            let mut cy = border + line * pitch;
            if pos.at_right() {
                cx = width - cx - cell;
            }
            if pos.at_bottom() {
                cy = height - cy - cell;
            }
            slots.push((client, Geometry::new(x + cx, y + cy, cell, cell)));
        }
    }

    let struts = match pos {
        DockPosition::North => Struts::new(0, 0, height, 0),
        DockPosition::South => Struts::new(0, 0, 0, height),
        DockPosition::East => Struts::new(0, width, 0, 0),
        DockPosition::West => Struts::new(width, 0, 0, 0),
        _ if horizontal && pos.at_bottom() => Struts::new(0, 0, 0, height),
        _ if horizontal => Struts::new(0, 0, height, 0),
        _ if pos.at_right() => Struts::new(0, width, 0, 0),
        _ => Struts::new(width, 0, 0, 0),
    };

    DockLayout {
        slots,
        area: Some(area),
        struts,
    }
}
