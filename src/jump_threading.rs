//! Jump threading: path-sensitive branch specialization.
//!
//! Two shapes are handled. A `Cond` whose selector's outcome is pinned down
//! *globally* — either because both its `Cmp` operands are constant, or
//! because one operand carries a `Confirm` fact against the same constant
//! — is rewritten into an unconditional jump down the known-live
//! successor, with the dead successor's `Proj` replaced by `Bad`
//! ([`thread_cond`]).
//!
//! A `Cond` whose selector only resolves *along some incoming paths* —
//! because it compares a constant against a `Phi` owned by the `Cond`'s own
//! block, and one or more of that `Phi`'s per-predecessor operands fold the
//! comparison — gets those specific predecessors rerouted directly into
//! the resolved successor, skipping the `Cond` (and the block that hosts
//! it) entirely along that path ([`thread_through_phi_fan`]). The
//! predecessor's existing CFG edge is reused in place (never duplicated),
//! so no critical edge is ever created by this rewrite. Any other value
//! defined in the threaded-through block that the new target block's Phis
//! still need is reconciled via [`crate::ssa_reconstruct::construct_ssa`].
//!
//! Convention: `Proj(Cond, 0)` is the false branch, `Proj(Cond, 1)` the
//! true branch.

use crate::analyses::outs::assure_outs;
use crate::builder::new_jmp;
use crate::flags::FlagRegistry;
use crate::graph::Graph;
use crate::graph_mod::exchange;
use crate::node::NodeId;
use crate::opcode::PrimordialOp;
use crate::ssa_reconstruct::construct_ssa;
use crate::stats::{record, StatEvent};
use crate::tarval::Relation;

/// Collect the chain of `Confirm` facts reached by walking a value's
/// `Confirm` wrappers. Each entry is `(relation, bound)`, innermost first.
pub fn confirm_chain(g: &Graph, mut value: NodeId) -> Vec<(Relation, NodeId)> {
    let mut chain = Vec::new();
    let mut steps = 0;
    while g.get_irn_op(value) == PrimordialOp::Confirm {
        let Some(relation) = g.node(value).attrs().as_relation() else {
            break;
        };
        let bound = g.get_irn_n(value, 1);
        chain.push((relation, bound));
        value = g.get_irn_n(value, 0);
        steps += 1;
        if steps > 64 {
            break;
        }
    }
    chain
}

fn const_eq(g: &Graph, a: NodeId, b: NodeId) -> bool {
    match (g.node(a).attrs().as_const(), g.node(b).attrs().as_const()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Determine the actual relation between two operands, if it can be pinned
/// down statically: either both are the same constant value (a direct
/// fold), or one is a `Confirm`-wrapped value whose bound is the other
/// (constant) operand and whose asserted relation is a single, unambiguous
/// outcome. Shared by [`computed_value_cmp`] (both operands as they stand
/// in the graph) and [`thread_through_phi_fan`] (one operand substituted by
/// a `Phi`'s per-predecessor value first).
fn resolve_cmp_operands(g: &Graph, l: NodeId, r: NodeId) -> Option<Relation> {
    if let (Some(lv), Some(rv)) = (g.node(l).attrs().as_const(), g.node(r).attrs().as_const()) {
        return Some(lv.compare(rv));
    }
    for (value, bound) in [(l, r), (r, l)] {
        for (relation, confirm_bound) in confirm_chain(g, value) {
            if const_eq(g, confirm_bound, bound) && relation.bits().count_ones() == 1 {
                return Some(relation);
            }
        }
    }
    None
}

/// Determine the actual relation between `cmp`'s two operands, if it can
/// be pinned down statically.
pub fn computed_value_cmp(g: &Graph, cmp: NodeId) -> Option<Relation> {
    if g.get_irn_op(cmp) != PrimordialOp::Cmp || g.get_irn_arity(cmp) != 2 {
        return None;
    }
    resolve_cmp_operands(g, g.get_irn_n(cmp, 0), g.get_irn_n(cmp, 1))
}

/// Run jump threading to a fixpoint over every `Cond` in `g`. Requires the
/// out-edge index active to find each `Cond`'s `Proj` successors and its
/// selector's users; a no-op otherwise.
pub fn opt_jumpthreading(g: &mut Graph, flags: &FlagRegistry) {
    if !flags.get_bool("opt.jumpthreading", true) {
        return;
    }
    assure_outs(g);

    let mut changed = true;
    let mut iterations = 0;
    while changed && iterations < 64 {
        changed = false;
        iterations += 1;

        let conds: Vec<NodeId> = g
            .node_ids()
            .filter(|&id| !g.node(id).is_deleted() && g.get_irn_op(id) == PrimordialOp::Cond)
            .collect();

        for cond in conds {
            if g.node(cond).is_deleted() || g.get_irn_arity(cond) != 1 {
                continue;
            }
            let selector = g.get_irn_n(cond, 0);
            if let Some(tested) = g.node(selector).attrs().as_relation() {
                if let Some(outcome) = computed_value_cmp(g, selector) {
                    thread_cond(g, cond, tested.is_satisfied_by(outcome));
                    changed = true;
                    continue;
                }
            }
            if thread_through_phi_fan(g, cond) {
                changed = true;
            }
        }
    }
}

fn thread_cond(g: &mut Graph, cond: NodeId, taken: bool) {
    let projs: Vec<NodeId> = g
        .out_edges()
        .uses_of(cond)
        .iter()
        .filter_map(|u| {
            let user = u.user;
            (g.get_irn_op(user) == PrimordialOp::Proj).then_some(user)
        })
        .collect();

    let Some(block) = g.get_nodes_block(cond) else {
        return;
    };
    let bad = g.anchors().bad;
    let jmp = new_jmp(g, block);

    for proj in projs {
        let Some(num) = g.node(proj).attrs().as_proj_num() else {
            continue;
        };
        let is_true_branch = num == 1;
        if is_true_branch == taken {
            exchange(g, proj, jmp);
        } else {
            exchange(g, proj, bad);
        }
    }
    record(StatEvent::JumpThreaded);
}

/// If `cond`'s selector is a `Cmp` with one side a constant and the other
/// side the `Phi` owned by `cond`'s own block, return `(phi, left, right,
/// tested_relation)`.
fn find_selector_phi(g: &Graph, cond: NodeId) -> Option<(NodeId, NodeId, NodeId, Relation)> {
    let selector = g.get_irn_n(cond, 0);
    if g.get_irn_op(selector) != PrimordialOp::Cmp || g.get_irn_arity(selector) != 2 {
        return None;
    }
    let tested = g.node(selector).attrs().as_relation()?;
    let l = g.get_irn_n(selector, 0);
    let r = g.get_irn_n(selector, 1);
    let phi = [l, r].into_iter().find(|&v| g.get_irn_op(v) == PrimordialOp::Phi)?;
    Some((phi, l, r, tested))
}

fn cond_successor_proj(g: &Graph, cond: NodeId, taken: bool) -> Option<NodeId> {
    g.out_edges().uses_of(cond).iter().find_map(|u| {
        let user = u.user;
        if g.get_irn_op(user) != PrimordialOp::Proj {
            return None;
        }
        let num = g.node(user).attrs().as_proj_num()?;
        ((num == 1) == taken).then_some(user)
    })
}

fn cond_successor_block(g: &Graph, cond: NodeId, taken: bool) -> Option<NodeId> {
    let proj = cond_successor_proj(g, cond, taken)?;
    g.out_edges()
        .uses_of(proj)
        .iter()
        .find_map(|u| (g.get_irn_op(u.user) == PrimordialOp::Block).then_some(u.user))
}

fn target_slot_for_cond(g: &Graph, target: NodeId, cond: NodeId, taken: bool) -> Option<usize> {
    let proj = cond_successor_proj(g, cond, taken)?;
    g.node(target).ins().iter().position(|&p| p == proj)
}

fn phis_of(g: &Graph, block: NodeId) -> Vec<NodeId> {
    g.node_ids()
        .filter(|&id| {
            !g.node(id).is_deleted() && g.get_irn_op(id) == PrimordialOp::Phi && g.get_nodes_block(id) == Some(block)
        })
        .collect()
}

/// Step 5: descend through a `Cond`'s `Phi`-fed selector, threading every
/// predecessor whose `Phi` operand resolves the comparison.
fn thread_through_phi_fan(g: &mut Graph, cond: NodeId) -> bool {
    let Some((phi, l, r, tested)) = find_selector_phi(g, cond) else {
        return false;
    };
    let Some(block) = g.get_nodes_block(cond) else {
        return false;
    };
    if g.get_nodes_block(phi) != Some(block) {
        return false;
    }
    let arity = g.get_irn_arity(block);
    if arity == 0 || arity != g.get_irn_arity(phi) {
        return false;
    }

    let mut threaded_any = false;
    for j in 0..arity {
        if g.get_irn_op(g.get_irn_n(block, j)) == PrimordialOp::Bad {
            continue;
        }
        let operand = g.get_irn_n(phi, j);
        let subst_l = if l == phi { operand } else { l };
        let subst_r = if r == phi { operand } else { r };
        let Some(outcome) = resolve_cmp_operands(g, subst_l, subst_r) else {
            continue;
        };
        let taken = tested.is_satisfied_by(outcome);
        if thread_predecessor(g, cond, block, phi, j, taken) {
            threaded_any = true;
        }
    }
    threaded_any
}

/// Reroute predecessor slot `j` of `block` directly into `cond`'s
/// known-live successor (computed from `taken`), reusing the existing CFG
/// edge node rather than creating a parallel one, so no critical edge is
/// ever introduced. Reconciles the selector `Phi`'s other users through
/// [`construct_ssa`] and retires the original edge into `block`.
fn thread_predecessor(g: &mut Graph, cond: NodeId, block: NodeId, phi: NodeId, j: usize, taken: bool) -> bool {
    let pred_edge = g.get_irn_n(block, j);
    let Some(pred_block) = g.get_nodes_block(pred_edge) else {
        return false;
    };
    let Some(target) = cond_successor_block(g, cond, taken) else {
        return false;
    };
    let old_slot = target_slot_for_cond(g, target, cond, taken);
    let operand_j = g.get_irn_n(phi, j);

    g.add_irn_n(target, pred_edge);
    if let Some(old_slot) = old_slot {
        for target_phi in phis_of(g, target) {
            let orig_operand = g.get_irn_n(target_phi, old_slot);
            let new_operand = if orig_operand == phi { operand_j } else { orig_operand };
            g.add_irn_n(target_phi, new_operand);
        }
    }

    construct_ssa(g, block, phi, pred_block, operand_j);

    let bad = g.anchors().bad;
    g.set_irn_n(block, j, bad);
    for owned_phi in phis_of(g, block) {
        g.set_irn_n(owned_phi, j, bad);
    }
    record(StatEvent::JumpThreaded);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{new_cmp, new_cond, new_const, new_phi, new_proj};
    use crate::mode::Mode;
    use crate::node::Attrs;
    use crate::tarval::Tarval;

    #[test]
    fn cond_on_two_equal_constants_threads_to_the_true_branch() {
        let mut g = Graph::new("t");
        g.out_edges_mut().activate();
        let block = g.anchors().start_block;
        let c1 = new_const(&mut g, block, Tarval::from_i128(Mode::IntS(32), 5));
        let c2 = new_const(&mut g, block, Tarval::from_i128(Mode::IntS(32), 5));
        let cmp = new_cmp(&mut g, block, c1, c2, Relation::EQUAL);
        let cond = new_cond(&mut g, block, cmp);
        let p_false = new_proj(&mut g, block, cond, Mode::Control, 0);
        let p_true = new_proj(&mut g, block, cond, Mode::Control, 1);
        let false_block = g.new_node(
            PrimordialOp::Block,
            Mode::Control,
            None,
            vec![p_false],
            Attrs::Block { backedges: vec![false], phi_list: vec![] },
        );
        let true_block = g.new_node(
            PrimordialOp::Block,
            Mode::Control,
            None,
            vec![p_true],
            Attrs::Block { backedges: vec![false], phi_list: vec![] },
        );
        opt_jumpthreading(&mut g, &FlagRegistry::with_defaults());
        assert_eq!(g.get_irn_n(false_block, 0), g.anchors().bad);
        assert_eq!(g.get_irn_op(g.get_irn_n(true_block, 0)), PrimordialOp::Jmp);
    }

    /// Block `B` has one CFG predecessor: the true-`Proj` of a `Cond`
    /// selecting on `Phi(0, 1) == 0`. The predecessor feeding the `Phi`'s
    /// `0` operand should get threaded straight into `B`, leaving only the
    /// `1`-operand predecessor still routed through the `Cond`.
    #[test]
    fn threads_through_a_phi_fed_comparison() {
        let mut g = Graph::new("phi_fan");
        g.out_edges_mut().activate();
        let entry = g.anchors().start_block;

        let jmp0 = new_jmp(&mut g, entry);
        let pred0 = g.new_node(
            PrimordialOp::Block,
            Mode::Control,
            None,
            vec![jmp0],
            Attrs::Block { backedges: vec![false], phi_list: vec![] },
        );
        let jmp1 = new_jmp(&mut g, entry);
        let pred1 = g.new_node(
            PrimordialOp::Block,
            Mode::Control,
            None,
            vec![jmp1],
            Attrs::Block { backedges: vec![false], phi_list: vec![] },
        );

        let jmp_to_c0 = new_jmp(&mut g, pred0);
        let jmp_to_c1 = new_jmp(&mut g, pred1);
        let c = g.new_node(
            PrimordialOp::Block,
            Mode::Control,
            None,
            vec![jmp_to_c0, jmp_to_c1],
            Attrs::Block { backedges: vec![false, false], phi_list: vec![] },
        );

        let v0 = new_const(&mut g, pred0, Tarval::from_i128(Mode::IntS(32), 0));
        let v1 = new_const(&mut g, pred1, Tarval::from_i128(Mode::IntS(32), 1));
        let phi = new_phi(&mut g, c, Mode::IntS(32), vec![v0, v1]);
        let zero = new_const(&mut g, c, Tarval::from_i128(Mode::IntS(32), 0));
        let cmp = new_cmp(&mut g, c, phi, zero, Relation::EQUAL);
        let cond = new_cond(&mut g, c, cmp);
        let p_false = new_proj(&mut g, c, cond, Mode::Control, 0);
        let p_true = new_proj(&mut g, c, cond, Mode::Control, 1);

        let false_block = g.new_node(
            PrimordialOp::Block,
            Mode::Control,
            None,
            vec![p_false],
            Attrs::Block { backedges: vec![false], phi_list: vec![] },
        );
        let true_block = g.new_node(
            PrimordialOp::Block,
            Mode::Control,
            None,
            vec![p_true],
            Attrs::Block { backedges: vec![false], phi_list: vec![] },
        );

        opt_jumpthreading(&mut g, &FlagRegistry::with_defaults());

        // pred0 (Phi operand 0) forced the comparison true: it now reaches
        // true_block directly.
        assert!(g.node(true_block).ins().contains(&jmp_to_c0));
        // c's 0-th predecessor slot (from pred0) was retired.
        assert_eq!(g.get_irn_n(c, 0), g.anchors().bad);
        assert_eq!(g.get_irn_n(phi, 0), g.anchors().bad);
        // pred1 (Phi operand 1) still resolves false and still goes
        // through c/cond.
        assert_eq!(g.get_irn_n(c, 1), jmp_to_c1);

        // Running again is a no-op: no further live predecessor resolves.
        let true_block_arity_before = g.get_irn_arity(true_block);
        opt_jumpthreading(&mut g, &FlagRegistry::with_defaults());
        assert_eq!(g.get_irn_arity(true_block), true_block_arity_before);
    }

    #[test]
    fn jump_threading_is_a_no_op_when_flag_is_off() {
        let mut g = Graph::new("flag_off");
        g.out_edges_mut().activate();
        let block = g.anchors().start_block;

        let c1 = new_const(&mut g, block, Tarval::from_i128(Mode::IntS(32), 1));
        let cmp = new_cmp(&mut g, block, c1, c1, Relation::EQUAL);
        let cond = new_cond(&mut g, block, cmp);
        let p_true = new_proj(&mut g, block, cond, Mode::Control, 1);

        let mut flags = FlagRegistry::with_defaults();
        flags.set("opt.jumpthreading", crate::flags::FlagValue::Bool(false));
        opt_jumpthreading(&mut g, &flags);

        assert_eq!(g.get_irn_op(p_true), PrimordialOp::Proj);
    }
}
