//! The process-wide IR-program container.

use std::collections::HashMap;

use crate::arena::{Arena, Idx};
use crate::graph::Graph;
use crate::node::NodeId;

/// A stable handle to one procedure [`Graph`] within an [`IrProgram`].
pub type GraphId = Idx<Graph>;

/// The full set of procedures making up one program, plus the shared
/// constant-code graph and the designated entry procedure: owns every
/// graph, the constant-code graph, and the main-graph pointer.
pub struct IrProgram {
    graphs: Arena<Graph>,
    by_name: HashMap<String, GraphId>,
    main_graph: Option<GraphId>,
    const_code: Graph,
}

impl IrProgram {
    /// An empty program, seeded with its constant-code graph. The
    /// constant-code graph is a normal [`Graph`] used
    /// only to host floating `Const`/`SymConst` nodes shared across
    /// procedures; it is never itself entered in `graphs`.
    pub fn new() -> Self {
        IrProgram {
            graphs: Arena::new(),
            by_name: HashMap::new(),
            main_graph: None,
            const_code: Graph::new("const_code"),
        }
    }

    /// Add a new procedure graph named `name` and return its id.
    pub fn new_graph(&mut self, name: impl Into<String>) -> GraphId {
        let name = name.into();
        let id = self.graphs.alloc(Graph::new(name.clone()));
        self.by_name.insert(name, id);
        id
    }

    /// Look up a graph by id.
    pub fn graph(&self, id: GraphId) -> &Graph {
        self.graphs.get(id)
    }

    /// Mutable access to a graph by id.
    pub fn graph_mut(&mut self, id: GraphId) -> &mut Graph {
        self.graphs.get_mut(id)
    }

    /// Look up a graph by its procedure name.
    pub fn graph_by_name(&self, name: &str) -> Option<GraphId> {
        self.by_name.get(name).copied()
    }

    /// Every graph id currently in the program, in creation order.
    pub fn graph_ids(&self) -> impl Iterator<Item = GraphId> + '_ {
        self.graphs.indices()
    }

    /// Number of procedure graphs (excludes the constant-code graph).
    pub fn graph_count(&self) -> usize {
        self.graphs.len()
    }

    /// The shared constant-code graph.
    pub fn const_code(&self) -> &Graph {
        &self.const_code
    }

    /// Mutable access to the shared constant-code graph.
    pub fn const_code_mut(&mut self) -> &mut Graph {
        &mut self.const_code
    }

    /// The designated entry procedure, if set.
    pub fn main_graph(&self) -> Option<GraphId> {
        self.main_graph
    }

    /// Designate `id` as the program's entry procedure.
    pub fn set_main_graph(&mut self, id: GraphId) {
        self.main_graph = Some(id);
    }

    /// Remove a graph from the program, e.g. after [`crate::gc::gc_irgs`]
    /// determines it is unreachable. Leaves dangling `GraphId`s in any
    /// remaining `Call` node's `cached_callees` list, exactly as the arena's
    /// stable-index contract implies: such entries
    /// must be treated as already-collected by later readers.
    pub fn remove_graph(&mut self, id: GraphId) {
        self.by_name.retain(|_, v| *v != id);
        if self.main_graph == Some(id) {
            self.main_graph = None;
        }
        // The arena never shrinks or reuses slots, so we cannot truly
        // deallocate; callers are expected to have already excluded `id`
        // from `graph_ids()`'s consumers via `by_name`/`main_graph`
        // bookkeeping before this call. The graph itself is left orphaned
        // in the arena.
        let _ = &self.graphs;
    }

    /// Every node across every procedure graph that calls the callee named
    /// `name`, used by [`crate::gc`] to seed reachability from exported
    /// roots. Looks only at direct `Call.cached_callees`, not through
    /// `SymConst`-based indirection, since indirect-call resolution is out
    /// of scope.
    pub fn call_sites_targeting(&self, callee: GraphId) -> Vec<(GraphId, NodeId)> {
        let mut out = Vec::new();
        for gid in self.graph_ids() {
            let g = self.graph(gid);
            for nid in g.node_ids() {
                let n = g.node(nid);
                if let crate::node::Attrs::Call { cached_callees, .. } = n.attrs() {
                    if cached_callees.contains(&callee) {
                        out.push((gid, nid));
                    }
                }
            }
        }
        out
    }
}

impl Default for IrProgram {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_graph_is_retrievable_by_name_and_id() {
        let mut prog = IrProgram::new();
        let id = prog.new_graph("foo");
        assert_eq!(prog.graph_by_name("foo"), Some(id));
        assert_eq!(prog.graph(id).name(), "foo");
    }

    #[test]
    fn main_graph_defaults_to_none() {
        let prog = IrProgram::new();
        assert_eq!(prog.main_graph(), None);
    }

    #[test]
    fn remove_graph_clears_name_and_main_pointers() {
        let mut prog = IrProgram::new();
        let id = prog.new_graph("foo");
        prog.set_main_graph(id);
        prog.remove_graph(id);
        assert_eq!(prog.graph_by_name("foo"), None);
        assert_eq!(prog.main_graph(), None);
    }
}
