//! The optional def-use (out-edge) index and its activation lifecycle.

use std::collections::HashMap;

use crate::node::NodeId;

/// Whether a node's operand was reached via its data/control input array or
/// its order-only dependency list. Out-edges need to remember which, so
/// `exchange`/`kill` can reroute both kinds coherently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// A real operand slot.
    Input(u32),
    /// An order-only dependency slot.
    Dep(u32),
}

/// One recorded use: `user` reads `def` through `kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Use {
    /// The node doing the reading.
    pub user: NodeId,
    /// Which of `user`'s slots reads the def.
    pub kind: EdgeKind,
}

/// The def-use index: for each node, every use of it. This mirrors the
/// in-edges (every node always knows its own operands); `OutEdges` is the
/// optional, activatable inverse.
#[derive(Debug, Default)]
pub struct OutEdges {
    active: bool,
    uses: HashMap<NodeId, Vec<Use>>,
}

impl OutEdges {
    /// A fresh, inactive out-edge index.
    pub fn new() -> Self {
        OutEdges {
            active: false,
            uses: HashMap::new(),
        }
    }

    /// True if the index is currently being maintained.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Turn on maintenance. A no-op if already active.
    pub fn activate(&mut self) {
        self.active = true;
    }

    /// Turn off maintenance and drop all recorded uses. A no-op if already
    /// inactive.
    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.uses.clear();
    }

    /// Record that `user` now reads `def` through `kind`. No-op while
    /// inactive.
    pub fn record_use(&mut self, def: NodeId, user: NodeId, kind: EdgeKind) {
        if !self.active {
            return;
        }
        self.uses.entry(def).or_default().push(Use { user, kind });
    }

    /// Remove a single previously recorded use. No-op while inactive.
    pub fn remove_use(&mut self, def: NodeId, user: NodeId, kind: EdgeKind) {
        if !self.active {
            return;
        }
        if let Some(list) = self.uses.get_mut(&def) {
            if let Some(pos) = list.iter().position(|u| u.user == user && u.kind == kind) {
                list.swap_remove(pos);
            }
        }
    }

    /// Every recorded use of `def`. Empty (not an error) if the index is
    /// inactive or `def` has no uses.
    pub fn uses_of(&self, def: NodeId) -> &[Use] {
        self.uses.get(&def).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Reroute every use of `old` onto `new`. Does not touch `old`'s or `new`'s operand
    /// arrays themselves; callers are expected to have already rewritten
    /// the users' `ins`/`deps` before or while calling this, as
    /// [`crate::graph_mod::exchange`] does.
    pub fn reroute(&mut self, old: NodeId, new: NodeId) {
        if !self.active {
            return;
        }
        if let Some(mut list) = self.uses.remove(&old) {
            let entry = self.uses.entry(new).or_default();
            entry.append(&mut list);
        }
    }

    /// Drop all recorded uses *of* `def` (called when `def` is killed).
    pub fn forget(&mut self, def: NodeId) {
        if !self.active {
            return;
        }
        self.uses.remove(&def);
    }

    /// Number of recorded users of `def`.
    pub fn count(&self, def: NodeId) -> usize {
        self.uses_of(def).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Idx;

    fn id(n: u32) -> NodeId {
        Idx::from_raw(n)
    }

    #[test]
    fn activation_is_idempotent() {
        let mut edges = OutEdges::new();
        edges.activate();
        edges.activate();
        assert!(edges.is_active());
        edges.record_use(id(0), id(1), EdgeKind::Input(0));
        edges.deactivate();
        edges.deactivate();
        assert!(!edges.is_active());
        assert_eq!(edges.uses_of(id(0)).len(), 0);
    }

    #[test]
    fn reroute_moves_uses_to_new_def() {
        let mut edges = OutEdges::new();
        edges.activate();
        edges.record_use(id(0), id(1), EdgeKind::Input(0));
        edges.record_use(id(0), id(2), EdgeKind::Input(1));
        edges.reroute(id(0), id(9));
        assert_eq!(edges.uses_of(id(0)).len(), 0);
        assert_eq!(edges.uses_of(id(9)).len(), 2);
    }

    #[test]
    fn recording_while_inactive_is_dropped() {
        let mut edges = OutEdges::new();
        edges.record_use(id(0), id(1), EdgeKind::Input(0));
        assert_eq!(edges.uses_of(id(0)).len(), 0);
    }
}
