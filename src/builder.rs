//! Per-opcode node-construction API. Each `new_*` function wraps
//! [`Graph::new_node`] with the opcode's default attribute initializer and
//! any fixed-arity assertions.

use crate::graph::Graph;
use crate::mode::Mode;
use crate::node::{AsmConstraint, Attrs, Entity, NodeId};
use crate::opcode::PrimordialOp;
use crate::tarval::{Relation, Tarval};

/// Create a new, initially unfinished (zero-predecessor) block. Callers
/// add predecessors with [`Graph::add_imm_block_pred`] and finish with
/// [`Graph::mature_block`] once all are known.
pub fn new_imm_block(g: &mut Graph) -> NodeId {
    g.new_node(
        PrimordialOp::Block,
        Mode::Control,
        None,
        vec![],
        Attrs::Block {
            backedges: vec![],
            phi_list: vec![],
        },
    )
}

/// A commutative or non-commutative binary arithmetic/logic node.
fn new_binop(g: &mut Graph, op: PrimordialOp, block: NodeId, mode: Mode, left: NodeId, right: NodeId) -> NodeId {
    g.new_node(op, mode, Some(block), vec![left, right], Attrs::None)
}

/// `Add`.
pub fn new_add(g: &mut Graph, block: NodeId, mode: Mode, left: NodeId, right: NodeId) -> NodeId {
    new_binop(g, PrimordialOp::Add, block, mode, left, right)
}
/// `Sub`.
pub fn new_sub(g: &mut Graph, block: NodeId, mode: Mode, left: NodeId, right: NodeId) -> NodeId {
    new_binop(g, PrimordialOp::Sub, block, mode, left, right)
}
/// `Mul`.
pub fn new_mul(g: &mut Graph, block: NodeId, mode: Mode, left: NodeId, right: NodeId) -> NodeId {
    new_binop(g, PrimordialOp::Mul, block, mode, left, right)
}
/// `And`.
pub fn new_and(g: &mut Graph, block: NodeId, mode: Mode, left: NodeId, right: NodeId) -> NodeId {
    new_binop(g, PrimordialOp::And, block, mode, left, right)
}
/// `Or`.
pub fn new_or(g: &mut Graph, block: NodeId, mode: Mode, left: NodeId, right: NodeId) -> NodeId {
    new_binop(g, PrimordialOp::Or, block, mode, left, right)
}
/// `Eor`.
pub fn new_eor(g: &mut Graph, block: NodeId, mode: Mode, left: NodeId, right: NodeId) -> NodeId {
    new_binop(g, PrimordialOp::Eor, block, mode, left, right)
}
/// `Shl`.
pub fn new_shl(g: &mut Graph, block: NodeId, mode: Mode, left: NodeId, right: NodeId) -> NodeId {
    new_binop(g, PrimordialOp::Shl, block, mode, left, right)
}
/// `Minus` (unary negation).
pub fn new_minus(g: &mut Graph, block: NodeId, mode: Mode, operand: NodeId) -> NodeId {
    g.new_node(PrimordialOp::Minus, mode, Some(block), vec![operand], Attrs::None)
}
/// `Not` (bitwise complement).
pub fn new_not(g: &mut Graph, block: NodeId, mode: Mode, operand: NodeId) -> NodeId {
    g.new_node(PrimordialOp::Not, mode, Some(block), vec![operand], Attrs::None)
}
/// `Conv` (mode conversion).
pub fn new_conv(g: &mut Graph, block: NodeId, to_mode: Mode, operand: NodeId) -> NodeId {
    g.new_node(PrimordialOp::Conv, to_mode, Some(block), vec![operand], Attrs::None)
}

/// `Cmp`, producing a mode-`b` result directly for the tested `relation`
/// rather than routing the outcome through a further `Proj` layer; see
/// DESIGN.md.
pub fn new_cmp(g: &mut Graph, block: NodeId, left: NodeId, right: NodeId, relation: Relation) -> NodeId {
    g.new_node(PrimordialOp::Cmp, Mode::Bool, Some(block), vec![left, right], Attrs::Cmp(relation))
}

/// `Confirm`: asserts `value relation bound` along the edge it's pinned
/// to, for consumption by jump threading's path-sensitive folding.
pub fn new_confirm(g: &mut Graph, block: NodeId, mode: Mode, value: NodeId, bound: NodeId, relation: Relation) -> NodeId {
    g.new_node(
        PrimordialOp::Confirm,
        mode,
        Some(block),
        vec![value, bound],
        Attrs::Confirm(relation),
    )
}

/// `Const`.
pub fn new_const(g: &mut Graph, block: NodeId, value: Tarval) -> NodeId {
    let mode = value.mode();
    g.new_node(PrimordialOp::Const, mode, Some(block), vec![], Attrs::Const(value))
}

/// `SymConst`, referencing a compile-time entity.
pub fn new_sym_const(g: &mut Graph, block: NodeId, entity: Entity) -> NodeId {
    let mode = entity.mode;
    g.new_node(PrimordialOp::SymConst, mode, Some(block), vec![], Attrs::SymConst(entity))
}

/// `Sel`: compute the address of a field/element of `base`.
pub fn new_sel(g: &mut Graph, block: NodeId, mem: NodeId, base: NodeId, indices: Vec<i64>, entity: Entity) -> NodeId {
    g.new_node(
        PrimordialOp::Sel,
        Mode::Ref,
        Some(block),
        vec![mem, base],
        Attrs::Sel { entity, indices },
    )
}

/// `Load`, returning the `Tuple(M, res, X_regular, X_except)` node; callers
/// project the piece they need.
pub fn new_load(g: &mut Graph, block: NodeId, mem: NodeId, ptr: NodeId) -> NodeId {
    g.new_node(PrimordialOp::Load, Mode::Tuple, Some(block), vec![mem, ptr], Attrs::None)
}

/// `Store`, returning the `Tuple(M, X_regular, X_except)` node.
pub fn new_store(g: &mut Graph, block: NodeId, mem: NodeId, ptr: NodeId, value: NodeId) -> NodeId {
    g.new_node(
        PrimordialOp::Store,
        Mode::Tuple,
        Some(block),
        vec![mem, ptr, value],
        Attrs::None,
    )
}

/// `Call`, returning the `Tuple(M, T_result, X_regular, X_except)` node.
/// `param_modes` fixes the callee's parameter shape for the verifier;
/// `cached_callees` starts empty, populated later by an out-of-scope
/// call-graph analysis.
pub fn new_call(g: &mut Graph, block: NodeId, mem: NodeId, callee: NodeId, args: Vec<NodeId>, param_modes: Vec<Mode>) -> NodeId {
    let mut ins = vec![mem, callee];
    ins.extend(args);
    g.new_node(
        PrimordialOp::Call,
        Mode::Tuple,
        Some(block),
        ins,
        Attrs::Call {
            param_modes,
            cached_callees: Vec::new(),
        },
    )
}

/// `Cond`, forking control flow on a mode-`b` selector.
pub fn new_cond(g: &mut Graph, block: NodeId, selector: NodeId) -> NodeId {
    g.new_node(PrimordialOp::Cond, Mode::Tuple, Some(block), vec![selector], Attrs::None)
}

/// `Jmp`: unconditional control-flow edge out of `block`.
pub fn new_jmp(g: &mut Graph, block: NodeId) -> NodeId {
    g.new_node(PrimordialOp::Jmp, Mode::Control, Some(block), vec![], Attrs::None)
}

/// `Return`.
pub fn new_return(g: &mut Graph, block: NodeId, mem: NodeId, results: Vec<NodeId>) -> NodeId {
    let mut ins = vec![mem];
    ins.extend(results);
    g.new_node(PrimordialOp::Return, Mode::Control, Some(block), ins, Attrs::None)
}

/// `Proj`: project component `num` out of a tuple-producing `pred`.
pub fn new_proj(g: &mut Graph, block: NodeId, pred: NodeId, mode: Mode, num: u32) -> NodeId {
    g.new_node(PrimordialOp::Proj, mode, Some(block), vec![pred], Attrs::Proj(num))
}

/// `Phi`, with one operand per predecessor of `block` (arity must match
/// block arity once the block is mature).
pub fn new_phi(g: &mut Graph, block: NodeId, mode: Mode, values: Vec<NodeId>) -> NodeId {
    let backedges = vec![false; values.len()];
    g.new_node(PrimordialOp::Phi, mode, Some(block), values, Attrs::Phi { backedges })
}

/// `Alloc`.
pub fn new_alloc(g: &mut Graph, block: NodeId, mem: NodeId, size: NodeId) -> NodeId {
    g.new_node(PrimordialOp::Alloc, Mode::Tuple, Some(block), vec![mem, size], Attrs::None)
}

/// `Free`.
pub fn new_free(g: &mut Graph, block: NodeId, mem: NodeId, ptr: NodeId) -> NodeId {
    g.new_node(PrimordialOp::Free, Mode::Memory, Some(block), vec![mem, ptr], Attrs::None)
}

/// `Sync`, merging several memory edges into one.
pub fn new_sync(g: &mut Graph, block: NodeId, mems: Vec<NodeId>) -> NodeId {
    g.new_node(PrimordialOp::Sync, Mode::Memory, Some(block), mems, Attrs::None)
}

/// `Mux`: selects between `if_true`/`if_false` on a mode-`b` `selector`.
pub fn new_mux(g: &mut Graph, block: NodeId, mode: Mode, selector: NodeId, if_false: NodeId, if_true: NodeId) -> NodeId {
    g.new_node(
        PrimordialOp::Mux,
        mode,
        Some(block),
        vec![selector, if_false, if_true],
        Attrs::None,
    )
}

/// `ASM`, deep-copying its constraint list per
/// [`PrimordialOp::deep_copies_attrs`].
pub fn new_asm(g: &mut Graph, block: NodeId, mem: NodeId, operands: Vec<NodeId>, constraints: Vec<AsmConstraint>) -> NodeId {
    let mut ins = vec![mem];
    ins.extend(operands);
    g.new_node(PrimordialOp::Asm, Mode::Tuple, Some(block), ins, Attrs::Asm(constraints))
}
