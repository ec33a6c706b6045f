//! The whole-graph transform driver: a
//! template for rewriting every node of a graph into a fresh one,
//! seeded from the anchors and walked via a work queue, with a loop-fixup
//! pass at the end to patch back-edges that were not yet available when
//! their users were first transformed.

use std::collections::HashMap;

use crate::graph::Graph;
use crate::graph_mod::collect_phiprojs;
use crate::node::NodeId;
use crate::opcode::PrimordialOp;

/// Per-call state threaded through one whole-graph transform: the old graph
/// being read from, and the old-to-new node map built up as nodes are
/// rewritten.
pub struct TransformCtx<'a> {
    old: &'a Graph,
    map: HashMap<NodeId, NodeId>,
}

impl<'a> TransformCtx<'a> {
    fn new(old: &'a Graph) -> Self {
        TransformCtx {
            old,
            map: HashMap::new(),
        }
    }

    /// Record that `old_id` has already been rewritten to `new_id`: later
    /// references to `old_id` reuse `new_id` instead of transforming it
    /// again.
    pub fn remember(&mut self, old_id: NodeId, new_id: NodeId) {
        self.map.insert(old_id, new_id);
    }

    /// The new-graph counterpart of `old_id`, if already transformed.
    pub fn lookup(&self, old_id: NodeId) -> Option<NodeId> {
        self.map.get(&old_id).copied()
    }

    /// The old graph being read from.
    pub fn old_graph(&self) -> &Graph {
        self.old
    }
}

/// Rewrite every reachable node of `old` into `new` via `transform_node`,
/// which is handed the context (for recursive operand lookups via
/// [`TransformCtx::lookup`]/[`TransformCtx::remember`]), the old node's id,
/// and the destination graph, and must return the new node's id. Nodes are
/// visited in an anchor-seeded work-queue order so operands are always
/// available (already transformed or queued ahead) by the time a user asks
/// for them; a node whose operand isn't transformed yet gets queued and
/// revisited, which is what the final loop-fixup pass (`fixup_backedges`)
/// resolves for true cycles (Phi/Block back-edges).
pub fn transform_graph<F>(old: &Graph, new: &mut Graph, mut transform_node: F) -> HashMap<NodeId, NodeId>
where
    F: FnMut(&mut TransformCtx, NodeId, &mut Graph) -> NodeId,
{
    let mut ctx = TransformCtx::new(old);

    let anchors = *old.anchors();
    ctx.remember(anchors.bad, new.anchors().bad);
    ctx.remember(anchors.start, new.anchors().start);
    ctx.remember(anchors.start_block, new.anchors().start_block);
    ctx.remember(anchors.end, new.anchors().end);
    ctx.remember(anchors.end_block, new.anchors().end_block);
    ctx.remember(anchors.no_mem, new.anchors().no_mem);
    ctx.remember(anchors.initial_exec, new.anchors().initial_exec);
    ctx.remember(anchors.initial_memory, new.anchors().initial_memory);
    ctx.remember(anchors.frame, new.anchors().frame);
    ctx.remember(anchors.tls, new.anchors().tls);
    ctx.remember(anchors.args, new.anchors().args);

    let mut queue: Vec<NodeId> = old
        .node_ids()
        .filter(|&id| !old.node(id).is_deleted() && ctx.lookup(id).is_none())
        .collect();

    let mut guard = 0usize;
    while let Some(id) = queue.pop() {
        if ctx.lookup(id).is_some() {
            continue;
        }
        let new_id = transform_node(&mut ctx, id, new);
        ctx.remember(id, new_id);
        guard += 1;
        if guard > old.node_count() * 4 + 16 {
            // A transform_node implementation that never terminates would
            // otherwise spin forever; this crate's own callers always
            // converge, but a misbehaving caller gets a loud panic instead
            // of a silent hang.
            panic!("transform_graph: work queue did not converge");
        }
    }

    fixup_backedges(old, new, &ctx.map);
    ctx.map
}

/// After every node has a new-graph counterpart, patch any `Phi`/`Block`
/// operand that was queued before its target existed: re-walk old
/// `Phi`/`Block` operand lists and rewrite the corresponding new node's
/// operands through the completed `map`.
fn fixup_backedges(old: &Graph, new: &mut Graph, map: &HashMap<NodeId, NodeId>) {
    for old_id in old.node_ids() {
        if old.node(old_id).is_deleted() {
            continue;
        }
        let op = old.get_irn_op(old_id);
        if !matches!(op, PrimordialOp::Phi | PrimordialOp::Block) {
            continue;
        }
        let Some(&new_id) = map.get(&old_id) else {
            continue;
        };
        for i in 0..old.get_irn_arity(old_id) {
            let old_operand = old.get_irn_n(old_id, i);
            let Some(&new_operand) = map.get(&old_operand) else {
                continue;
            };
            if new.get_irn_arity(new_id) > i && new.get_irn_n(new_id, i) != new_operand {
                new.set_irn_n(new_id, i, new_operand);
            }
        }
        if op == PrimordialOp::Block {
            collect_phiprojs(new, new_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::new_const;
    use crate::mode::Mode;
    use crate::tarval::Tarval;

    #[test]
    fn identity_transform_preserves_a_const() {
        let mut old = Graph::new("old");
        let block = old.anchors().start_block;
        let c = new_const(&mut old, block, Tarval::from_i128(Mode::IntS(32), 9));

        let mut new = Graph::new("new");
        let map = transform_graph(&old, &mut new, |ctx, id, new_g| {
            if old.get_irn_op(id) == PrimordialOp::Const {
                let v = *old.node(id).attrs().as_const().unwrap();
                let new_block = ctx.lookup(old.get_nodes_block(id).unwrap()).unwrap();
                new_const(new_g, new_block, v)
            } else {
                ctx.lookup(id).unwrap_or(new_g.anchors().bad)
            }
        });

        let new_c = map[&c];
        assert_eq!(
            new.node(new_c).attrs().as_const(),
            Some(&Tarval::from_i128(Mode::IntS(32), 9))
        );
    }
}
