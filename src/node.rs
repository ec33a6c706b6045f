//! Node records.

use crate::arena::Idx;
use crate::mode::Mode;
use crate::opcode::PrimordialOp;
use crate::tarval::{Relation, Tarval};

/// A stable index of a node within its owning [`crate::graph::Graph`]'s
/// arena.
pub type NodeId = Idx<Node>;

/// An opaque handle to a compile-time entity (a declared symbol: a
/// function, a field, a global). The full data model backing entities
/// (types, linkage, layout) is out of scope; this crate only needs enough
/// of an entity to let `Sel`/`Call`/`SymConst` carry a stable name and a
/// result mode, which is what the verifier and jump threading actually
/// inspect.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Entity {
    /// The entity's linkage name.
    pub name: String,
    /// The mode of the value the entity denotes (e.g. a field's stored
    /// mode, or `Ref` for a called function's address).
    pub mode: Mode,
}

/// One constraint of an inline-assembly operand.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AsmConstraint {
    /// Target-defined constraint string (e.g. `"r"`, `"=r"`).
    pub constraint: String,
    /// Mode the constrained operand must have.
    pub mode: Mode,
}

/// The per-opcode attribute blob. Modeled as a tagged enum rather than a
/// raw byte blob sized per opcode, since every variant's shape is known
/// statically in a closed-world opcode set.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Attrs {
    /// No attributes.
    None,
    /// `Const`'s value; its mode must equal the node's mode.
    Const(Tarval),
    /// `SymConst`'s referenced entity.
    SymConst(Entity),
    /// `Sel`'s field entity and static index list.
    Sel {
        /// The selected field/element entity.
        entity: Entity,
        /// Constant-folded index path, if statically known.
        indices: Vec<i64>,
    },
    /// `Call`'s static callee type signature (argument/result modes) and a
    /// cache of resolved callee graphs, populated by an out-of-scope
    /// points-to/class-hierarchy analysis and consumed by [`crate::gc`].
    Call {
        /// Parameter modes of the callee's signature.
        param_modes: Vec<Mode>,
        /// Cached resolved callee graph ids (cleared by
        /// [`crate::graph::Graph::new_node`]'s default attribute
        /// initializer).
        cached_callees: Vec<crate::program::GraphId>,
    },
    /// `Block`'s CFG-predecessor back-edge bitmap and the list of `Phi`s it
    /// owns.
    Block {
        /// One bit per predecessor slot; true marks a loop back-edge.
        backedges: Vec<bool>,
        /// Phis owned by this block, populated by
        /// [`crate::graph_mod::collect_phiprojs`].
        phi_list: Vec<NodeId>,
    },
    /// `Phi`'s per-operand back-edge bitmap.
    Phi {
        /// One bit per operand slot.
        backedges: Vec<bool>,
    },
    /// `Proj`'s projection number, fixing which tuple component it reads.
    Proj(u32),
    /// `Cmp`'s tested relation, producing mode `b` directly rather than a
    /// tuple, since this crate models `Cmp` as already selecting one
    /// relation rather than routing through a further `Proj`; see
    /// DESIGN.md for the Open Question this resolves.
    Cmp(Relation),
    /// `Confirm`'s asserted relation between its value and bound operands.
    Confirm(Relation),
    /// `ASM`'s constraint arrays, deep-copied on [`Node`] duplication.
    Asm(Vec<AsmConstraint>),
    /// `CopyB`'s compound/array element count, used by the verifier's
    /// type-shape check in place of a full type system.
    CopyB {
        /// Number of bytes copied, when statically known.
        size: Option<u64>,
    },
}

impl Attrs {
    /// The `Const` tarval, if this blob is a `Const` attribute.
    pub fn as_const(&self) -> Option<&Tarval> {
        match self {
            Attrs::Const(t) => Some(t),
            _ => None,
        }
    }

    /// The `Proj` projection number, if this blob is a `Proj` attribute.
    pub fn as_proj_num(&self) -> Option<u32> {
        match self {
            Attrs::Proj(n) => Some(*n),
            _ => None,
        }
    }

    /// The tested relation, if this blob is a `Cmp` or `Confirm` attribute.
    pub fn as_relation(&self) -> Option<Relation> {
        match self {
            Attrs::Cmp(r) | Attrs::Confirm(r) => Some(*r),
            _ => None,
        }
    }

    /// Mutable access to a `Block` attribute's phi list.
    pub fn block_phi_list_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match self {
            Attrs::Block { phi_list, .. } => Some(phi_list),
            _ => None,
        }
    }

    /// Mutable access to a `Block`/`Phi` back-edge bitmap.
    pub fn backedges_mut(&mut self) -> Option<&mut Vec<bool>> {
        match self {
            Attrs::Block { backedges, .. } | Attrs::Phi { backedges } => Some(backedges),
            _ => None,
        }
    }

    /// Read access to a `Block`/`Phi` back-edge bitmap.
    pub fn backedges(&self) -> Option<&[bool]> {
        match self {
            Attrs::Block { backedges, .. } | Attrs::Phi { backedges } => Some(backedges),
            _ => None,
        }
    }
}

/// A node in the sea-of-nodes graph.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    op: PrimordialOp,
    mode: Mode,
    /// The node's owning block, or `None` for `Block` nodes themselves and
    /// for the small set of anchors that predate any block existing.
    block: Option<NodeId>,
    /// Operand array. Slot 0 of a non-`Block` node's `ins` is never the
    /// block; the block is tracked separately in `block` rather than at a
    /// synthetic slot -1, which is friendlier to safe Rust indexing.
    ins: Vec<NodeId>,
    /// Order-only dependency edges (not dataflow).
    deps: Vec<NodeId>,
    /// Monotone per-graph visited counter, compared against the graph's
    /// current epoch by walkers.
    visited: u32,
    /// Scratch slot used by walkers and SSA reconstruction.
    link: Option<NodeId>,
    /// Stable node number, assigned in construction order.
    number: u32,
    /// Per-opcode attribute blob.
    attrs: Attrs,
}

impl Node {
    pub(crate) fn new(
        number: u32,
        op: PrimordialOp,
        mode: Mode,
        block: Option<NodeId>,
        ins: Vec<NodeId>,
        attrs: Attrs,
    ) -> Self {
        Node {
            op,
            mode,
            block,
            ins,
            deps: Vec::new(),
            visited: 0,
            link: None,
            number,
            attrs,
        }
    }

    /// The node's opcode.
    pub fn op(&self) -> PrimordialOp {
        self.op
    }

    /// Reassign the opcode. Used by [`crate::graph_mod::exchange`] (the
    /// node becomes `Deleted`) and by
    /// [`crate::graph_mod::turn_into_tuple`].
    pub(crate) fn set_op(&mut self, op: PrimordialOp) {
        self.op = op;
    }

    /// The node's result mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub(crate) fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// The block that owns this node, if any.
    pub fn block(&self) -> Option<NodeId> {
        self.block
    }

    pub(crate) fn set_block(&mut self, block: Option<NodeId>) {
        self.block = block;
    }

    /// The operand array.
    pub fn ins(&self) -> &[NodeId] {
        &self.ins
    }

    /// Mutable access to the operand array, used by graph-modification
    /// primitives that must stay consistent with the edge subsystem.
    pub(crate) fn ins_mut(&mut self) -> &mut Vec<NodeId> {
        &mut self.ins
    }

    /// Number of operands.
    pub fn arity(&self) -> usize {
        self.ins.len()
    }

    /// The `i`-th operand.
    pub fn in_at(&self, i: usize) -> NodeId {
        self.ins[i]
    }

    /// Replace the `i`-th operand in place.
    pub(crate) fn set_in_at(&mut self, i: usize, value: NodeId) {
        self.ins[i] = value;
    }

    /// Order-only dependency edges.
    pub fn deps(&self) -> &[NodeId] {
        &self.deps
    }

    pub(crate) fn deps_mut(&mut self) -> &mut Vec<NodeId> {
        &mut self.deps
    }

    /// The node's visited counter.
    pub fn visited(&self) -> u32 {
        self.visited
    }

    pub(crate) fn set_visited(&mut self, epoch: u32) {
        self.visited = epoch;
    }

    /// True if this node has already been visited in the current epoch.
    pub fn is_visited(&self, current_epoch: u32) -> bool {
        self.visited >= current_epoch
    }

    /// The scratch link slot.
    pub fn link(&self) -> Option<NodeId> {
        self.link
    }

    pub(crate) fn set_link(&mut self, link: Option<NodeId>) {
        self.link = link;
    }

    /// The stable node number assigned at construction.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// The attribute blob.
    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    /// Mutable access to the attribute blob.
    pub(crate) fn attrs_mut(&mut self) -> &mut Attrs {
        &mut self.attrs
    }

    pub(crate) fn set_attrs(&mut self, attrs: Attrs) {
        self.attrs = attrs;
    }

    /// True once this node has been killed or exchanged away.
    pub fn is_deleted(&self) -> bool {
        self.op == PrimordialOp::Deleted
    }
}
