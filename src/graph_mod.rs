//! Graph-modification primitives: the only sanctioned way to mutate a
//! graph after construction. They keep the out-edge index and
//! derived-analysis validity states coherent.

use crate::edges::EdgeKind;
use crate::graph::Graph;
use crate::mode::Mode;
use crate::node::{Attrs, NodeId};
use crate::opcode::PrimordialOp;

/// Follow a chain of `Id` redirects left behind by [`exchange`] when the
/// out-edge index was inactive at the time; readers must tolerate being
/// handed an `Id` and dereference it through this function.
pub fn resolve(g: &Graph, mut id: NodeId) -> NodeId {
    let mut steps = 0;
    while g.get_irn_op(id) == PrimordialOp::Id {
        id = g.get_irn_n(id, 0);
        steps += 1;
        debug_assert!(steps < 10_000, "Id chain looks cyclic");
    }
    id
}

/// Replace every use of `old` with `new`. If
/// the out-edge index is active, every known user is rewritten in place
/// and `old` is killed outright; otherwise `old` is turned into an `Id`
/// node pointing at `new`, and callers reading operands must route through
/// [`resolve`].
pub fn exchange(g: &mut Graph, old: NodeId, new: NodeId) {
    if old == new {
        return;
    }
    if g.out_edges().is_active() {
        let uses: Vec<_> = g.out_edges().uses_of(old).to_vec();
        for u in uses {
            match u.kind {
                EdgeKind::Input(i) => g.set_irn_n(u.user, i as usize, new),
                EdgeKind::Dep(i) => {
                    let slot = i as usize;
                    g.node_mut(u.user).deps_mut()[slot] = new;
                }
            }
        }
        kill(g, old);
    } else {
        g.node_mut(old).set_op(PrimordialOp::Id);
        g.node_mut(old).ins_mut().clear();
        g.node_mut(old).ins_mut().push(new);
        g.invalidate_derived();
    }
}

/// Remove `node` from the graph outright. The
/// caller is responsible for having already rerouted or exchanged away any
/// remaining users; `kill` only clears the node's own operand/dep arrays
/// and marks it `Deleted`.
pub fn kill(g: &mut Graph, node: NodeId) {
    if g.get_irn_op(node) == PrimordialOp::Deleted {
        return;
    }
    g.out_edges_mut().forget(node);
    let n = g.node_mut(node);
    n.ins_mut().clear();
    n.deps_mut().clear();
    n.set_attrs(Attrs::None);
    n.set_op(PrimordialOp::Deleted);
    g.invalidate_derived();
}

/// Turn `node` into a `Tuple` producing `components`: used when an
/// optimization discovers that a
/// multi-result node's outcome is statically known component-wise (e.g. a
/// `Div` by a constant whose memory and result are both foldable). Existing
/// `Proj(node, i)` reads keep working, now reading `components[i]`.
pub fn turn_into_tuple(g: &mut Graph, node: NodeId, components: Vec<NodeId>) {
    let block = g.get_nodes_block(node);
    g.node_mut(node).set_op(PrimordialOp::Tuple);
    g.node_mut(node).set_mode(Mode::Tuple);
    g.node_mut(node).set_attrs(Attrs::None);
    *g.node_mut(node).ins_mut() = components.clone();
    if g.out_edges().is_active() {
        for (i, c) in components.into_iter().enumerate() {
            g.out_edges_mut()
                .record_use(c, node, EdgeKind::Input(i as u32));
        }
    }
    let _ = block;
    g.invalidate_derived();
}

/// Collect every `Phi` owned by `block` into its `phi_list` attribute
///. Used after bulk node construction
/// (e.g. subgraph duplication in jump threading) to restore the invariant
/// that a block's `phi_list` names every `Phi` pinned to it.
pub fn collect_phiprojs(g: &mut Graph, block: NodeId) {
    let phis: Vec<NodeId> = g
        .node_ids()
        .filter(|&id| {
            !g.node(id).is_deleted()
                && g.get_irn_op(id) == PrimordialOp::Phi
                && g.get_nodes_block(id) == Some(block)
        })
        .collect();
    if let Some(list) = g.node_mut(block).attrs_mut().block_phi_list_mut() {
        *list = phis;
    }
}

/// Split `block` so that `tail`'s nodes (all currently owned by `block`)
/// move into a freshly created successor block reached by an
/// unconditional `Jmp`. Used to give a
/// fragile operation's exceptional continuation its own block. Returns the
/// new block's id.
pub fn part_block(g: &mut Graph, block: NodeId, tail: Vec<NodeId>) -> NodeId {
    let jmp = g.new_node(PrimordialOp::Jmp, Mode::Control, Some(block), vec![], Attrs::None);
    let new_block = g.new_node(
        PrimordialOp::Block,
        Mode::Control,
        None,
        vec![jmp],
        Attrs::Block {
            backedges: vec![false],
            phi_list: vec![],
        },
    );
    for node in tail {
        g.node_mut(node).set_block(Some(new_block));
    }
    g.invalidate_derived();
    new_block
}
