//! Loop-nesting analysis, derived from dominance
//! by finding back-edges (an edge into a block that dominates its source).

use std::collections::{HashMap, HashSet};

use crate::analyses::dominance::DominanceInfo;
use crate::graph::{Graph, Validity};
use crate::node::NodeId;
use crate::opcode::PrimordialOp;

/// One natural loop: its header block and the set of blocks in its body.
#[derive(Debug, Clone)]
pub struct Loop {
    /// The loop header (the dominating block the back-edge targets).
    pub header: NodeId,
    /// Every block in the loop body, including the header.
    pub body: HashSet<NodeId>,
}

/// Loop-nesting info for one graph.
#[derive(Debug, Default)]
pub struct LoopInfo {
    loops: Vec<Loop>,
    depth: HashMap<NodeId, u32>,
}

impl LoopInfo {
    /// Nesting depth of `block` (0 if outside every loop).
    pub fn depth(&self, block: NodeId) -> u32 {
        self.depth.get(&block).copied().unwrap_or(0)
    }

    /// Every discovered natural loop.
    pub fn loops(&self) -> &[Loop] {
        &self.loops
    }
}

/// Compute loop-nesting info for `g`, given already-computed `doms`.
pub fn compute_loop_info(g: &mut Graph, doms: &DominanceInfo) -> LoopInfo {
    let blocks: Vec<NodeId> = g
        .node_ids()
        .filter(|&id| g.get_irn_op(id) == PrimordialOp::Block && !g.node(id).is_deleted())
        .collect();

    let mut loops = Vec::new();
    for &b in &blocks {
        for &pred in g.node(b).ins() {
            let Some(pred_block) = g.node(pred).block() else {
                continue;
            };
            if doms.dominates(b, pred_block) {
                // Back-edge pred_block -> b; b is the loop header.
                let mut body = HashSet::new();
                body.insert(b);
                let mut stack = vec![pred_block];
                while let Some(cur) = stack.pop() {
                    if !body.insert(cur) {
                        continue;
                    }
                    for &p in g.node(cur).ins() {
                        if let Some(pb) = g.node(p).block() {
                            stack.push(pb);
                        }
                    }
                }
                loops.push(Loop { header: b, body });
            }
        }
    }

    let mut depth: HashMap<NodeId, u32> = HashMap::new();
    for block in &blocks {
        let d = loops.iter().filter(|l| l.body.contains(block)).count() as u32;
        depth.insert(*block, d);
    }

    g.set_loop_state(Validity::Consistent);
    LoopInfo { loops, depth }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyses::dominance::compute_doms;
    use crate::node::Attrs;

    #[test]
    fn acyclic_graph_has_zero_loop_depth_everywhere() {
        let mut g = Graph::new("t");
        let start_block = g.anchors().start_block;
        let jmp = g.new_node(PrimordialOp::Jmp, crate::mode::Mode::Control, Some(start_block), vec![], Attrs::None);
        let next = g.new_node(PrimordialOp::Block, crate::mode::Mode::Control, None, vec![jmp], Attrs::Block { backedges: vec![false], phi_list: vec![] });
        let doms = compute_doms(&mut g);
        let info = compute_loop_info(&mut g, &doms);
        assert_eq!(info.depth(start_block), 0);
        assert_eq!(info.depth(next), 0);
        assert!(info.loops().is_empty());
    }
}
