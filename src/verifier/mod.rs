//! The structural/typing verifier. Collects every
//! violation it finds rather than stopping at the first, so a caller can
//! see the whole picture in one run.

pub mod bad_audit;
pub mod dominance;
pub mod keepalive;
pub mod proj_rules;
pub mod rules;

use crate::error::VerifyReport;
use crate::flags::FlagRegistry;
use crate::graph::Graph;

/// Run every verifier pass over `g` and return the accumulated report
///. An empty report means the graph is
/// well-formed.
pub fn verify_graph(g: &Graph, flags: &FlagRegistry) -> VerifyReport {
    let mut report = VerifyReport::default();

    tracing::debug!(graph = g.name(), "verifying graph");

    rules::check_all_nodes(g, &mut report);
    proj_rules::check_all_projs(g, &mut report);
    dominance::check_dominance(g, &mut report);
    if flags.get_bool("verify.bad_audit", true) {
        bad_audit::check_bad_propagation(g, &mut report);
    }
    keepalive::check_keep_alive(g, &mut report);

    if !report.is_ok() {
        tracing::warn!(graph = g.name(), violations = report.0.len(), "graph failed verification");
    }
    report
}
