//! Unreachable-method garbage collection: mark-sweep reachability over
//! `Call.cached_callees` edges, seeded from a set of exported roots.

use std::collections::HashSet;

use itertools::Itertools;

use crate::node::Attrs;
use crate::program::{GraphId, IrProgram};
use crate::stats::{record, StatEvent};

/// Remove every graph not reachable from `roots` by following `Call`
/// edges. Takes a fast path when `roots`
/// already covers every graph in the program (nothing to collect).
pub fn gc_irgs(prog: &mut IrProgram, roots: &[GraphId]) {
    if roots.len() >= prog.graph_count() {
        let all: HashSet<GraphId> = prog.graph_ids().collect();
        let root_set: HashSet<GraphId> = roots.iter().copied().collect();
        if root_set.is_superset(&all) {
            return;
        }
    }

    let mut reachable: HashSet<GraphId> = HashSet::new();
    let mut worklist: Vec<GraphId> = roots.to_vec();
    while let Some(gid) = worklist.pop() {
        if !reachable.insert(gid) {
            continue;
        }
        let g = prog.graph(gid);
        for id in g.node_ids() {
            let n = g.node(id);
            if let Attrs::Call { cached_callees, .. } = n.attrs() {
                for &callee in cached_callees {
                    if !reachable.contains(&callee) {
                        worklist.push(callee);
                    }
                }
            }
        }
    }

    let unreachable: Vec<GraphId> = prog
        .graph_ids()
        .filter(|gid| !reachable.contains(gid))
        .unique()
        .collect();
    for gid in unreachable {
        prog.remove_graph(gid);
        record(StatEvent::GraphCollected);
    }
}
