//! Bad-propagation audit: if any operand is `Bad`, the node should itself
//! either be skipped by later rules or itself be reachable-to-`Bad`. Catches
//! passes that fold away a `Bad` operand without following through (e.g. a
//! `Block` that drops a `Bad` predecessor without shrinking its Phis to
//! match).

use crate::error::{VerifyError, VerifyReport};
use crate::graph::Graph;
use crate::opcode::PrimordialOp;

/// Look for `Phi`s whose owning block still lists a `Bad` CFG predecessor
/// while the `Phi` itself has a non-`Bad` operand in that slot claiming to
/// be live.
pub fn check_bad_propagation(g: &Graph, report: &mut VerifyReport) {
    for id in g.node_ids() {
        if g.node(id).is_deleted() || g.get_irn_op(id) != PrimordialOp::Phi {
            continue;
        }
        let Some(block) = g.get_nodes_block(id) else {
            continue;
        };
        let block_preds = g.node(block).ins();
        for (i, &pred) in block_preds.iter().enumerate() {
            if g.get_irn_op(pred) != PrimordialOp::Bad {
                continue;
            }
            if i >= g.get_irn_arity(id) {
                continue;
            }
            let operand = g.get_irn_n(id, i);
            if g.get_irn_op(operand) != PrimordialOp::Bad {
                report.push(VerifyError::BadNotPropagated { node: id });
            }
        }
    }
}
