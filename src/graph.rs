//! The per-procedure graph object.

use crate::arena::Arena;
use crate::edges::OutEdges;
use crate::node::{Attrs, Node, NodeId};
use crate::mode::Mode;
use crate::opcode::PrimordialOp;

/// Construction/lowering phase a graph is in. Several verifier rules are
/// gated on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PhaseState {
    /// The SSA local-variable builder is still running; Phi arity may not
    /// yet match block arity.
    Building,
    /// Fully built, high-level (pre-lowering) form.
    High,
    /// Lowered form; some high-level opcodes no longer appear.
    Low,
    /// Backend (machine) form; several verifier rules relax.
    Backend,
}

/// Tri-state validity of a lazily recomputed derived analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    /// Never computed (or explicitly freed).
    None,
    /// Computed and still valid.
    Consistent,
    /// Computed once but invalidated by a subsequent mutation.
    Inconsistent,
}

bitflags::bitflags! {
    /// Scoped per-graph resource reservations.
    #[derive(Default)]
    pub struct ReservedResources: u32 {
        /// The node `link` scratch slot.
        const LINK        = 1 << 0;
        /// The `visited` epoch counter (reserved during a traversal that
        /// hand-manages it, distinct from the default `inc_visited` use).
        const VISITED     = 1 << 1;
        /// Each block's `phi_list`.
        const PHI_LIST    = 1 << 2;
        /// Ad hoc block marks (used by jump threading's single-predecessor
        /// scan).
        const BLOCK_MARK  = 1 << 3;
    }
}

/// The fixed set of per-graph root nodes (the anchor table).
#[derive(Debug, Clone, Copy)]
pub struct Anchors {
    /// The `Start` node.
    pub start: NodeId,
    /// The `End` node.
    pub end: NodeId,
    /// The block owning `Start`.
    pub start_block: NodeId,
    /// The block owning `End`.
    pub end_block: NodeId,
    /// `Proj(Start, frame)`, mode `Ref`.
    pub frame: NodeId,
    /// `Proj(Start, tls)`, mode `Ref`.
    pub tls: NodeId,
    /// `Proj(Start, initial_exec)`, mode `X`.
    pub initial_exec: NodeId,
    /// The `NoMem` anchor.
    pub no_mem: NodeId,
    /// The per-graph `Bad` anchor.
    pub bad: NodeId,
    /// `Proj(Start, args)`, mode `T`.
    pub args: NodeId,
    /// `Proj(Start, initial_memory)`, mode `M`, cached for convenience.
    pub initial_memory: NodeId,
}

/// A sea-of-nodes procedure graph.
#[derive(Debug)]
pub struct Graph {
    name: String,
    arena: Arena<Node>,
    anchors: Anchors,
    phase: PhaseState,
    outs_state: Validity,
    dom_state: Validity,
    loop_state: Validity,
    edges: OutEdges,
    visited_epoch: u32,
    last_node_number: u32,
    reserved: ReservedResources,
}

impl Graph {
    /// Build a new graph for a procedure named `name`, seeded with its
    /// anchors.
    pub fn new(name: impl Into<String>) -> Self {
        let mut arena = Arena::new();
        let mut next_number = 0u32;
        let mut alloc = |op: PrimordialOp, mode: Mode, block: Option<NodeId>, ins: Vec<NodeId>, attrs: Attrs| {
            let n = Node::new(next_number, op, mode, block, ins, attrs);
            next_number += 1;
            arena.alloc(n)
        };

        let bad = alloc(PrimordialOp::Bad, Mode::BadMode, None, vec![], Attrs::None);
        let start_block = alloc(PrimordialOp::Block, Mode::Control, None, vec![], Attrs::Block {
            backedges: vec![],
            phi_list: vec![],
        });
        let end_block = alloc(PrimordialOp::Block, Mode::Control, None, vec![], Attrs::Block {
            backedges: vec![],
            phi_list: vec![],
        });
        let start = alloc(
            PrimordialOp::Start,
            Mode::Tuple,
            Some(start_block),
            vec![],
            Attrs::None,
        );
        let end = alloc(PrimordialOp::End, Mode::Tuple, Some(end_block), vec![], Attrs::None);
        let no_mem = alloc(
            PrimordialOp::NoMem,
            Mode::Memory,
            Some(start_block),
            vec![],
            Attrs::None,
        );
        let initial_exec = alloc(
            PrimordialOp::Proj,
            Mode::Control,
            Some(start_block),
            vec![start],
            Attrs::Proj(0),
        );
        let initial_memory = alloc(
            PrimordialOp::Proj,
            Mode::Memory,
            Some(start_block),
            vec![start],
            Attrs::Proj(1),
        );
        let frame = alloc(
            PrimordialOp::Proj,
            Mode::Ref,
            Some(start_block),
            vec![start],
            Attrs::Proj(2),
        );
        let tls = alloc(
            PrimordialOp::Proj,
            Mode::Ref,
            Some(start_block),
            vec![start],
            Attrs::Proj(3),
        );
        let args = alloc(
            PrimordialOp::Proj,
            Mode::Tuple,
            Some(start_block),
            vec![start],
            Attrs::Proj(4),
        );

        Graph {
            name: name.into(),
            arena,
            anchors: Anchors {
                start,
                end,
                start_block,
                end_block,
                frame,
                tls,
                initial_exec,
                no_mem,
                bad,
                args,
                initial_memory,
            },
            phase: PhaseState::Building,
            outs_state: Validity::None,
            dom_state: Validity::None,
            loop_state: Validity::None,
            edges: OutEdges::new(),
            visited_epoch: 0,
            last_node_number: next_number,
            reserved: ReservedResources::empty(),
        }
    }

    /// The procedure's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The graph's anchor table.
    pub fn anchors(&self) -> &Anchors {
        &self.anchors
    }

    /// Current phase state.
    pub fn phase(&self) -> PhaseState {
        self.phase
    }

    /// Transition the phase state (e.g. `Building -> High` once the SSA
    /// builder is done, which is when Phi-arity-vs-block-arity checks
    /// start being enforced).
    pub fn set_phase(&mut self, phase: PhaseState) {
        self.phase = phase;
    }

    /// Current validity of the outs (def-use) analysis.
    pub fn outs_state(&self) -> Validity {
        self.outs_state
    }
    pub(crate) fn set_outs_state(&mut self, v: Validity) {
        self.outs_state = v;
    }

    /// Current validity of the dominance analysis.
    pub fn dom_state(&self) -> Validity {
        self.dom_state
    }
    pub(crate) fn set_dom_state(&mut self, v: Validity) {
        self.dom_state = v;
    }

    /// Current validity of the loop-info analysis.
    pub fn loop_state(&self) -> Validity {
        self.loop_state
    }
    pub(crate) fn set_loop_state(&mut self, v: Validity) {
        self.loop_state = v;
    }

    /// Invalidate every derived analysis whose consistency a mutation may
    /// have broken. Called by every graph-modification primitive.
    pub(crate) fn invalidate_derived(&mut self) {
        if self.outs_state == Validity::Consistent {
            self.outs_state = Validity::Inconsistent;
        }
        if self.dom_state == Validity::Consistent {
            self.dom_state = Validity::Inconsistent;
        }
        if self.loop_state == Validity::Consistent {
            self.loop_state = Validity::Inconsistent;
        }
    }

    /// The def-use out-edge index.
    pub fn out_edges(&self) -> &OutEdges {
        &self.edges
    }
    pub fn out_edges_mut(&mut self) -> &mut OutEdges {
        &mut self.edges
    }

    /// Reserve a per-graph scoped resource. Returns `false` if already
    /// reserved (the caller is nesting incorrectly; reservations are scoped,
    /// not re-entrant).
    pub fn reserve_resource(&mut self, which: ReservedResources) -> bool {
        if self.reserved.intersects(which) {
            return false;
        }
        self.reserved.insert(which);
        true
    }

    /// Release a previously reserved resource.
    pub fn release_resource(&mut self, which: ReservedResources) {
        self.reserved.remove(which);
    }

    /// True if `which` is currently reserved.
    pub fn is_reserved(&self, which: ReservedResources) -> bool {
        self.reserved.intersects(which)
    }

    /// Advance the visited epoch; all nodes compare as unvisited against
    /// the new epoch until touched. Monotone per graph, re-initialized at
    /// the start of each traversal via this method.
    pub fn inc_visited(&mut self) -> u32 {
        self.visited_epoch += 1;
        self.visited_epoch
    }

    /// The current visited epoch, without advancing it.
    pub fn current_visited(&self) -> u32 {
        self.visited_epoch
    }

    /// Mark `node` visited at the current epoch.
    pub fn mark_visited(&mut self, node: NodeId) {
        let epoch = self.visited_epoch;
        self.arena.get_mut(node).set_visited(epoch);
    }

    /// True if `node` was already marked at the current epoch.
    pub fn is_visited(&self, node: NodeId) -> bool {
        self.arena.get(node).is_visited(self.visited_epoch)
    }

    /// Allocate a fresh node in this graph's arena, assigning it the next
    /// stable node number. This is the
    /// low-level primitive; per-opcode convenience builders in
    /// [`crate::builder`] call this and additionally run each opcode's
    /// default attribute initializer.
    pub fn new_node(
        &mut self,
        op: PrimordialOp,
        mode: Mode,
        block: Option<NodeId>,
        ins: Vec<NodeId>,
        attrs: Attrs,
    ) -> NodeId {
        let number = self.last_node_number;
        self.last_node_number += 1;
        let node = Node::new(number, op, mode, block, ins, attrs);
        let id = self.arena.alloc(node);
        if self.edges.is_active() {
            for (i, &input) in self.arena.get(id).ins().to_vec().iter().enumerate() {
                self.edges
                    .record_use(input, id, crate::edges::EdgeKind::Input(i as u32));
            }
        }
        id
    }

    /// Immutable access to a node.
    pub fn node(&self, id: NodeId) -> &Node {
        self.arena.get(id)
    }

    /// Mutable access to a node. Crate-internal: external callers must go
    /// through the graph-modification primitives in
    /// [`crate::graph_mod`] so the edge index and derived-analysis
    /// invalidation stay coherent.
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.arena.get_mut(id)
    }

    /// Number of nodes ever allocated in this graph (including deleted
    /// ones; the arena never shrinks).
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Iterate over every node id allocated so far, in construction order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.arena.indices()
    }

    // -- convenience accessors for the standard node-inspection surface --

    /// `get_irn_op`
    pub fn get_irn_op(&self, id: NodeId) -> PrimordialOp {
        self.node(id).op()
    }
    /// `get_irn_mode`
    pub fn get_irn_mode(&self, id: NodeId) -> Mode {
        self.node(id).mode()
    }
    /// `get_nodes_block`
    pub fn get_nodes_block(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).block()
    }
    /// `get_irn_arity`
    pub fn get_irn_arity(&self, id: NodeId) -> usize {
        self.node(id).arity()
    }
    /// `get_irn_n`
    pub fn get_irn_n(&self, id: NodeId, i: usize) -> NodeId {
        self.node(id).in_at(i)
    }

    /// `set_irn_n`: replace operand `i` of `id`, keeping the out-edge index
    /// coherent if active.
    pub fn set_irn_n(&mut self, id: NodeId, i: usize, value: NodeId) {
        let old = self.node(id).in_at(i);
        if old == value {
            return;
        }
        self.node_mut(id).set_in_at(i, value);
        if self.edges.is_active() {
            self.edges
                .remove_use(old, id, crate::edges::EdgeKind::Input(i as u32));
            self.edges
                .record_use(value, id, crate::edges::EdgeKind::Input(i as u32));
        }
        self.invalidate_derived();
    }

    /// Append a new operand to a dynamic-arity node (`add_imm_block_pred`
    /// is a special case of this for `Block`s).
    pub fn add_irn_n(&mut self, id: NodeId, value: NodeId) -> usize {
        let slot = self.node(id).arity();
        self.node_mut(id).ins_mut().push(value);
        if self.edges.is_active() {
            self.edges
                .record_use(value, id, crate::edges::EdgeKind::Input(slot as u32));
        }
        self.invalidate_derived();
        slot
    }

    /// `add_immBlock_pred`: add a new CFG predecessor to an immature block.
    pub fn add_imm_block_pred(&mut self, block: NodeId, cfg_pred: NodeId) -> usize {
        debug_assert_eq!(self.get_irn_op(block), PrimordialOp::Block);
        self.add_irn_n(block, cfg_pred)
    }

    /// `mature_block`: a block is "mature" once all its CFG predecessors
    /// are known; outside the building phase this is implicit, but during
    /// construction it marks the point from which Phi arity is expected to
    /// match block arity.
    pub fn mature_block(&mut self, _block: NodeId) {
        // Maturity itself carries no extra state in this representation:
        // once the phase leaves `Building`, every block is considered
        // mature and the verifier starts enforcing the Phi/block arity rule.
    }

    /// A deterministic, minimal text dump of every live node
    /// (`"node# opcode mode (operands)"` per line), used for the
    /// fatal/verifier diagnostic path. Not a graphical dumper.
    pub fn dump_text(&self) -> String {
        let mut out = String::new();
        for id in self.node_ids() {
            let n = self.node(id);
            if n.is_deleted() {
                continue;
            }
            out.push_str(&format!(
                "{:>4} {:<10} {:<6} (",
                n.number(),
                n.op().name(),
                n.mode()
            ));
            for (i, input) in n.ins().iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&self.node(*input).number().to_string());
            }
            out.push_str(")\n");
        }
        out
    }
}
