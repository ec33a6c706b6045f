//! Outs (def-use) analysis lifecycle.

use crate::graph::{Graph, Validity};

/// Recompute the out-edge index for `g` from scratch: deactivate,
/// reactivate, and replay every node's operand array. Idempotent; a no-op
/// re-entry when already consistent.
pub fn assure_outs(g: &mut Graph) {
    if g.outs_state() == Validity::Consistent {
        return;
    }
    g.out_edges_mut().deactivate();
    g.out_edges_mut().activate();
    for id in g.node_ids() {
        let node = g.node(id);
        if node.is_deleted() {
            continue;
        }
        let ins: Vec<_> = node.ins().to_vec();
        let deps: Vec<_> = node.deps().to_vec();
        for (i, input) in ins.iter().enumerate() {
            g.out_edges_mut()
                .record_use(*input, id, crate::edges::EdgeKind::Input(i as u32));
        }
        for (i, dep) in deps.iter().enumerate() {
            g.out_edges_mut()
                .record_use(*dep, id, crate::edges::EdgeKind::Dep(i as u32));
        }
    }
    g.set_outs_state(Validity::Consistent);
}

/// Drop the out-edge index entirely.
pub fn free_outs(g: &mut Graph) {
    g.out_edges_mut().deactivate();
    g.set_outs_state(Validity::None);
}
