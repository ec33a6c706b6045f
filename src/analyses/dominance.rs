//! Dominance computation over a graph's blocks: every use must be
//! dominated by its definition, and this module is what later passes
//! (the verifier, loop analysis) consult to check or rely on that.

use std::collections::HashMap;

use crate::graph::{Graph, Validity};
use crate::node::NodeId;
use crate::opcode::PrimordialOp;

/// Computed dominator tree over one graph's blocks, queried via
/// [`DominanceInfo::idom`]/[`DominanceInfo::dominates`].
#[derive(Debug, Default)]
pub struct DominanceInfo {
    idom: HashMap<NodeId, NodeId>,
    rpo_number: HashMap<NodeId, usize>,
}

fn block_preds(g: &Graph, block: NodeId) -> Vec<NodeId> {
    g.node(block)
        .ins()
        .iter()
        .filter_map(|&pred| g.node(pred).block())
        .collect()
}

fn all_blocks(g: &Graph) -> Vec<NodeId> {
    g.node_ids()
        .filter(|&id| g.get_irn_op(id) == PrimordialOp::Block && !g.node(id).is_deleted())
        .collect()
}

fn reverse_postorder(g: &Graph, start: NodeId, succs: &HashMap<NodeId, Vec<NodeId>>) -> Vec<NodeId> {
    let mut visited = std::collections::HashSet::new();
    let mut postorder = Vec::new();
    let mut stack = vec![(start, false)];
    while let Some((block, processed)) = stack.pop() {
        if processed {
            postorder.push(block);
            continue;
        }
        if !visited.insert(block) {
            continue;
        }
        stack.push((block, true));
        if let Some(children) = succs.get(&block) {
            for &child in children {
                if !visited.contains(&child) {
                    stack.push((child, false));
                }
            }
        }
    }
    postorder.reverse();
    postorder
}

/// (Re)compute dominance for `g`, rooted at its start block. Unreachable blocks are left without an entry in
/// the resulting [`DominanceInfo`]. Stamps `g`'s dominance validity state
/// consistent; use [`compute_doms_readonly`] from a read-only context
/// (e.g. the verifier) where stamping validity is not wanted.
pub fn compute_doms(g: &mut Graph) -> DominanceInfo {
    let info = compute_doms_readonly(g);
    g.set_dom_state(Validity::Consistent);
    info
}

/// The pure core of [`compute_doms`]: computes dominance without touching
/// `g`'s cached validity state. Used by read-only callers like the
/// verifier, which must not claim the analysis is now "consistent" for
/// later mutators to rely on without recomputing.
pub fn compute_doms_readonly(g: &Graph) -> DominanceInfo {
    let start_block = g.anchors().start_block;
    let blocks = all_blocks(g);

    let mut succs: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    let mut preds: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for &b in &blocks {
        let p = block_preds(g, b);
        for &pred in &p {
            succs.entry(pred).or_default().push(b);
        }
        preds.insert(b, p);
    }

    let rpo = reverse_postorder(g, start_block, &succs);
    let mut rpo_number = HashMap::new();
    for (i, &b) in rpo.iter().enumerate() {
        rpo_number.insert(b, i);
    }

    let mut idom: HashMap<NodeId, NodeId> = HashMap::new();
    idom.insert(start_block, start_block);

    let intersect = |idom: &HashMap<NodeId, NodeId>, rpo_number: &HashMap<NodeId, usize>, mut a: NodeId, mut b: NodeId| -> NodeId {
        while a != b {
            while rpo_number[&a] > rpo_number[&b] {
                a = idom[&a];
            }
            while rpo_number[&b] > rpo_number[&a] {
                b = idom[&b];
            }
        }
        a
    };

    let mut changed = true;
    while changed {
        changed = false;
        for &b in rpo.iter().skip(1) {
            let ps: Vec<NodeId> = preds
                .get(&b)
                .into_iter()
                .flatten()
                .copied()
                .filter(|p| idom.contains_key(p))
                .collect();
            let Some((&first, rest)) = ps.split_first() else {
                continue;
            };
            let mut new_idom = first;
            for &p in rest {
                new_idom = intersect(&idom, &rpo_number, new_idom, p);
            }
            if idom.get(&b) != Some(&new_idom) {
                idom.insert(b, new_idom);
                changed = true;
            }
        }
    }
    DominanceInfo { idom, rpo_number }
}

impl DominanceInfo {
    /// The immediate dominator of `block`, or `None` if unreachable.
    pub fn idom(&self, block: NodeId) -> Option<NodeId> {
        self.idom.get(&block).copied()
    }

    /// True if `a` dominates `b` (reflexive: a block dominates itself).
    pub fn dominates(&self, a: NodeId, b: NodeId) -> bool {
        let (Some(_), Some(_)) = (self.rpo_number.get(&a), self.rpo_number.get(&b)) else {
            return false;
        };
        let mut cur = b;
        loop {
            if cur == a {
                return true;
            }
            match self.idom.get(&cur) {
                Some(&next) if next != cur => cur = next,
                _ => return cur == a,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Attrs;

    #[test]
    fn start_block_dominates_itself_and_every_successor() {
        let mut g = Graph::new("t");
        let start_block = g.anchors().start_block;
        let jmp = g.new_node(
            PrimordialOp::Jmp,
            crate::mode::Mode::Control,
            Some(start_block),
            vec![],
            Attrs::None,
        );
        let next_block = g.new_node(PrimordialOp::Block, crate::mode::Mode::Control, None, vec![jmp], Attrs::Block { backedges: vec![false], phi_list: vec![] });
        let doms = compute_doms(&mut g);
        assert!(doms.dominates(start_block, start_block));
        assert!(doms.dominates(start_block, next_block));
        assert!(!doms.dominates(next_block, start_block));
    }
}
