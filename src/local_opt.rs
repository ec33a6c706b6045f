//! Worklist-driven local optimization:
//! constant folding and algebraic identities applied to a fixpoint.

use std::collections::{HashSet, VecDeque};

use crate::builder::new_const;
use crate::flags::FlagRegistry;
use crate::graph::Graph;
use crate::graph_mod::exchange;
use crate::mode::Mode;
use crate::node::NodeId;
use crate::opcode::PrimordialOp;
use crate::stats::{record, StatEvent};
use crate::tarval::Tarval;

fn users_of(g: &Graph, node: NodeId) -> Vec<NodeId> {
    g.out_edges()
        .uses_of(node)
        .iter()
        .map(|u| u.user)
        .collect()
}

fn const_value(g: &Graph, node: NodeId) -> Option<Tarval> {
    if g.get_irn_op(node) != PrimordialOp::Const {
        return None;
    }
    g.node(node).attrs().as_const().copied()
}

/// Try to fold or canonicalize `node` to some other (possibly pre-existing)
/// node. Returns `None` if nothing applies.
fn try_optimize(g: &mut Graph, node: NodeId) -> Option<NodeId> {
    use PrimordialOp::*;
    let op = g.get_irn_op(node);
    let block = g.get_nodes_block(node)?;
    let mode = g.get_irn_mode(node);

    match op {
        Add | Sub | Mul | And | Or | Eor if g.get_irn_arity(node) == 2 => {
            let l = g.get_irn_n(node, 0);
            let r = g.get_irn_n(node, 1);
            if let (Some(lv), Some(rv)) = (const_value(g, l), const_value(g, r)) {
                let folded = match op {
                    Add => lv.add(&rv),
                    Sub => lv.sub(&rv),
                    Mul => lv.mul(&rv),
                    And => lv.and(&rv),
                    Or => lv.or(&rv),
                    Eor => lv.eor(&rv),
                    _ => unreachable!(),
                };
                return Some(new_const(g, block, folded));
            }
            algebraic_identity(g, op, mode, block, l, r)
        }
        Minus if g.get_irn_arity(node) == 1 => {
            let operand = g.get_irn_n(node, 0);
            if let Some(v) = const_value(g, operand) {
                return Some(new_const(g, block, v.neg()));
            }
            if g.get_irn_op(operand) == Minus {
                return Some(g.get_irn_n(operand, 0));
            }
            None
        }
        Not if g.get_irn_arity(node) == 1 => {
            let operand = g.get_irn_n(node, 0);
            if g.get_irn_op(operand) == Not {
                return Some(g.get_irn_n(operand, 0));
            }
            None
        }
        Cmp if g.get_irn_arity(node) == 2 => {
            let l = g.get_irn_n(node, 0);
            let r = g.get_irn_n(node, 1);
            let (lv, rv) = (const_value(g, l), const_value(g, r));
            if let (Some(lv), Some(rv)) = (lv, rv) {
                let outcome = lv.compare(&rv);
                let tested = g.node(node).attrs().as_relation().unwrap_or(crate::tarval::Relation::TRUE);
                let result = if tested.is_satisfied_by(outcome) {
                    Tarval::tarval_true()
                } else {
                    Tarval::tarval_false()
                };
                return Some(new_const(g, block, result));
            }
            None
        }
        Proj if g.get_irn_arity(node) == 1 => {
            let pred = g.get_irn_n(node, 0);
            if g.get_irn_op(pred) == Tuple {
                let num = g.node(node).attrs().as_proj_num()? as usize;
                if num < g.get_irn_arity(pred) {
                    return Some(g.get_irn_n(pred, num));
                }
                None
            } else {
                None
            }
        }
        Id => Some(g.get_irn_n(node, 0)),
        _ => None,
    }
}

fn algebraic_identity(
    g: &mut Graph,
    op: PrimordialOp,
    mode: Mode,
    block: NodeId,
    l: NodeId,
    r: NodeId,
) -> Option<NodeId> {
    use PrimordialOp::*;
    let lv = const_value(g, l);
    let rv = const_value(g, r);
    match op {
        Add => {
            if rv.map_or(false, |v| v.is_zero()) {
                return Some(l);
            }
            if lv.map_or(false, |v| v.is_zero()) {
                return Some(r);
            }
        }
        Sub => {
            if rv.map_or(false, |v| v.is_zero()) {
                return Some(l);
            }
            if l == r {
                return Some(new_const(g, block, zero(mode)));
            }
        }
        Mul => {
            if rv.map_or(false, |v| v.is_one()) {
                return Some(l);
            }
            if lv.map_or(false, |v| v.is_one()) {
                return Some(r);
            }
            if rv.map_or(false, |v| v.is_zero()) || lv.map_or(false, |v| v.is_zero()) {
                return Some(new_const(g, block, zero(mode)));
            }
        }
        And => {
            if l == r {
                return Some(l);
            }
        }
        Or => {
            if l == r {
                return Some(l);
            }
        }
        Eor => {
            if l == r {
                return Some(new_const(g, block, zero(mode)));
            }
        }
        _ => {}
    }
    None
}

fn zero(mode: Mode) -> Tarval {
    if mode.is_float() {
        Tarval::from_f64(mode, 0.0)
    } else {
        Tarval::from_i128(mode, 0)
    }
}

/// Run local optimization over every node in `g` to a fixpoint
///. Requires the out-edge
/// index to be active to requeue a rewritten node's users; if it isn't,
/// each node is still visited once but a rewrite's ripple effect on its
/// users is not automatically propagated.
pub fn do_local_opts(g: &mut Graph, flags: &FlagRegistry) {
    if !flags.get_bool("opt.local", true) {
        return;
    }
    let mut queue: VecDeque<NodeId> = g
        .node_ids()
        .filter(|&id| !g.node(id).is_deleted())
        .collect();
    let mut queued: HashSet<NodeId> = queue.iter().copied().collect();

    while let Some(node) = queue.pop_front() {
        queued.remove(&node);
        if g.node(node).is_deleted() {
            continue;
        }
        let Some(replacement) = try_optimize(g, node) else {
            continue;
        };
        if replacement == node {
            continue;
        }
        let users = users_of(g, node);
        exchange(g, node, replacement);
        record(StatEvent::LocalOptRewrite);
        for user in users {
            if queued.insert(user) {
                queue.push_back(user);
            }
        }
        if queued.insert(replacement) {
            queue.push_back(replacement);
        }
    }
}
