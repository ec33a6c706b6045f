//! SSA dominance checking: every use must be dominated by its definition.

use crate::analyses::dominance::compute_doms_readonly;
use crate::error::{VerifyError, VerifyReport};
use crate::graph::Graph;
use crate::node::NodeId;
use crate::opcode::PrimordialOp;

/// Check that every operand of every live node is dominated by its
/// definition. `Phi` operands are checked against the corresponding
/// predecessor block rather than the Phi's own block, since a Phi operand
/// is only live along that one incoming edge.
pub fn check_dominance(g: &Graph, report: &mut VerifyReport) {
    let doms = compute_doms_readonly(g);

    for id in g.node_ids() {
        if g.node(id).is_deleted() {
            continue;
        }
        let op = g.get_irn_op(id);
        if op == PrimordialOp::Block || op == PrimordialOp::Phi {
            // Phi operands are checked below, per-predecessor.
            if op == PrimordialOp::Phi {
                check_phi_operands(g, report, id, &doms);
            }
            continue;
        }
        let Some(user_block) = g.get_nodes_block(id) else {
            continue;
        };
        for i in 0..g.get_irn_arity(id) {
            let def = g.get_irn_n(id, i);
            if g.get_irn_op(def) == PrimordialOp::Bad {
                continue;
            }
            let Some(def_block) = g.get_nodes_block(def) else {
                continue;
            };
            if def_block == user_block {
                continue; // same-block ordering is not modeled explicitly.
            }
            if !doms.dominates(def_block, user_block) {
                report.push(VerifyError::DominanceViolation { user: id, def });
            }
        }
    }
}

fn check_phi_operands(
    g: &Graph,
    report: &mut VerifyReport,
    phi: NodeId,
    doms: &crate::analyses::dominance::DominanceInfo,
) {
    let Some(block) = g.get_nodes_block(phi) else {
        return;
    };
    for i in 0..g.get_irn_arity(phi) {
        let def = g.get_irn_n(phi, i);
        if g.get_irn_op(def) == PrimordialOp::Bad {
            continue;
        }
        let Some(def_block) = g.get_nodes_block(def) else {
            continue;
        };
        let Some(&cfg_pred) = g.node(block).ins().get(i) else {
            continue;
        };
        let Some(pred_block) = g.node(cfg_pred).block() else {
            continue;
        };
        if def_block != pred_block && !doms.dominates(def_block, pred_block) {
            report.push(VerifyError::DominanceViolation { user: phi, def });
        }
    }
}
