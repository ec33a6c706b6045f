//! End-to-end scenarios combining construction, optimization, and
//! verification the way a front end actually would.

use graphir::analyses::outs::assure_outs;
use graphir::builder::{new_add, new_cmp, new_cond, new_const, new_proj, new_return};
use graphir::flags::FlagRegistry;
use graphir::gc::gc_irgs;
use graphir::graph::Graph;
use graphir::jump_threading::opt_jumpthreading;
use graphir::local_opt::do_local_opts;
use graphir::mode::Mode;
use graphir::node::Attrs;
use graphir::opcode::PrimordialOp;
use graphir::program::IrProgram;
use graphir::tarval::{Relation, Tarval};
use graphir::verifier::verify_graph;

#[test]
fn const_folding_then_verification_leaves_a_clean_graph() {
    let mut g = Graph::new("fold_then_verify");
    g.out_edges_mut().activate();
    let block = g.anchors().start_block;
    let mem = g.anchors().initial_memory;

    let a = new_const(&mut g, block, Tarval::from_i128(Mode::IntS(32), 7));
    let b = new_const(&mut g, block, Tarval::from_i128(Mode::IntS(32), 8));
    let sum = new_add(&mut g, block, Mode::IntS(32), a, b);
    new_return(&mut g, block, mem, vec![sum]);

    let flags = FlagRegistry::with_defaults();
    do_local_opts(&mut g, &flags);

    let report = verify_graph(&g, &flags);
    assert!(report.is_ok(), "unexpected violations: {:?}", report.0);
}

#[test]
fn dead_branch_folds_away_and_the_graph_still_verifies() {
    let mut g = Graph::new("dead_branch");
    g.out_edges_mut().activate();
    let block = g.anchors().start_block;

    let c1 = new_const(&mut g, block, Tarval::from_i128(Mode::IntS(32), 3));
    let c2 = new_const(&mut g, block, Tarval::from_i128(Mode::IntS(32), 3));
    let cmp = new_cmp(&mut g, block, c1, c2, Relation::EQUAL);
    let cond = new_cond(&mut g, block, cmp);
    let p_false = new_proj(&mut g, block, cond, Mode::Control, 0);
    let p_true = new_proj(&mut g, block, cond, Mode::Control, 1);
    let false_block = g.new_node(
        PrimordialOp::Block,
        Mode::Control,
        None,
        vec![p_false],
        Attrs::Block { backedges: vec![false], phi_list: vec![] },
    );
    let true_block = g.new_node(
        PrimordialOp::Block,
        Mode::Control,
        None,
        vec![p_true],
        Attrs::Block { backedges: vec![false], phi_list: vec![] },
    );

    let flags = FlagRegistry::with_defaults();
    opt_jumpthreading(&mut g, &flags);
    assure_outs(&mut g);

    assert_eq!(g.get_irn_n(false_block, 0), g.anchors().bad);
    assert_eq!(g.get_irn_op(g.get_irn_n(true_block, 0)), PrimordialOp::Jmp);

    // A block operand pointing at the shared per-graph `Bad` anchor is
    // expected and does not itself constitute a violation.
    let report = verify_graph(&g, &flags);
    assert!(report.is_ok(), "unexpected violations: {:?}", report.0);
}

#[test]
fn gc_collects_a_graph_unreachable_from_the_call_graph() {
    let mut prog = IrProgram::new();
    let entry = prog.new_graph("entry");
    let reachable = prog.new_graph("helper");
    let orphan = prog.new_graph("orphan");

    let block = prog.graph(entry).anchors().start_block;
    let mem = prog.graph(entry).anchors().initial_memory;
    prog.graph_mut(entry).new_node(
        PrimordialOp::Call,
        Mode::Tuple,
        Some(block),
        vec![mem],
        Attrs::Call {
            param_modes: vec![],
            cached_callees: vec![reachable],
        },
    );

    gc_irgs(&mut prog, &[entry]);

    assert!(prog.graph_by_name("entry").is_some());
    assert!(prog.graph_by_name("helper").is_some());
    assert!(prog.graph_by_name("orphan").is_none());
    let _ = orphan;
}
