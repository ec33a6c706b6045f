//! Keep-alive reachability audit. Opcodes carrying [`OpcodeFlags::KEEP`]
//! (`Call`, `Store`, `Alloc`, `Free`, `Raise`: side-effecting ops with no
//! guaranteed data successor) must stay reachable from `End`, directly or
//! transitively through its operand list, or a later schedule/GC pass could
//! drop them silently.

use std::collections::HashSet;

use crate::error::{VerifyError, VerifyReport};
use crate::graph::Graph;
use crate::node::NodeId;
use crate::opcode::OpcodeFlags;

fn reachable_from_end(g: &Graph) -> HashSet<NodeId> {
    let mut seen = HashSet::new();
    let mut stack = vec![g.anchors().end];
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        for &pred in g.node(id).ins() {
            if !seen.contains(&pred) {
                stack.push(pred);
            }
        }
    }
    seen
}

/// Report every live `KEEP`-flagged node that `End` cannot reach.
pub fn check_keep_alive(g: &Graph, report: &mut VerifyReport) {
    let reachable = reachable_from_end(g);
    for id in g.node_ids() {
        if g.node(id).is_deleted() {
            continue;
        }
        let op = g.get_irn_op(id);
        if !op.flags().contains(OpcodeFlags::KEEP) {
            continue;
        }
        if !reachable.contains(&id) {
            report.push(VerifyError::MissingKeepAlive { node: id, op });
        }
    }
}
