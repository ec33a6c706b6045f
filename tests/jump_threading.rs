//! Integration tests for path-sensitive branch specialization.

use graphir::builder::{new_cmp, new_cond, new_confirm, new_const, new_proj};
use graphir::flags::FlagRegistry;
use graphir::graph::Graph;
use graphir::jump_threading::opt_jumpthreading;
use graphir::mode::Mode;
use graphir::node::Attrs;
use graphir::opcode::PrimordialOp;
use graphir::tarval::{Relation, Tarval};

fn block_with_pred(g: &mut Graph, pred: graphir::node::NodeId) -> graphir::node::NodeId {
    g.new_node(
        PrimordialOp::Block,
        Mode::Control,
        None,
        vec![pred],
        Attrs::Block {
            backedges: vec![false],
            phi_list: vec![],
        },
    )
}

#[test]
fn unequal_constants_thread_to_the_false_branch() {
    let mut g = Graph::new("const_neq");
    g.out_edges_mut().activate();
    let block = g.anchors().start_block;

    let c1 = new_const(&mut g, block, Tarval::from_i128(Mode::IntS(32), 5));
    let c2 = new_const(&mut g, block, Tarval::from_i128(Mode::IntS(32), 9));
    let cmp = new_cmp(&mut g, block, c1, c2, Relation::EQUAL);
    let cond = new_cond(&mut g, block, cmp);
    let p_false = new_proj(&mut g, block, cond, Mode::Control, 0);
    let p_true = new_proj(&mut g, block, cond, Mode::Control, 1);
    let false_block = block_with_pred(&mut g, p_false);
    let true_block = block_with_pred(&mut g, p_true);

    opt_jumpthreading(&mut g, &FlagRegistry::with_defaults());

    assert_eq!(g.get_irn_op(g.get_irn_n(false_block, 0)), PrimordialOp::Jmp);
    assert_eq!(g.get_irn_n(true_block, 0), g.anchors().bad);
}

#[test]
fn a_confirm_bounded_value_threads_its_comparison() {
    let mut g = Graph::new("confirm_thread");
    g.out_edges_mut().activate();
    let block = g.anchors().start_block;

    let bound = new_const(&mut g, block, Tarval::from_i128(Mode::IntS(32), 10));
    let x = g.new_node(PrimordialOp::Load, Mode::IntS(32), Some(block), vec![], Attrs::None);
    // Assert x < 10 along this edge, then compare the confirmed value
    // against the very same bound: the outcome is known without needing
    // x's concrete value.
    let confirmed_x = new_confirm(&mut g, block, Mode::IntS(32), x, bound, Relation::LESS);
    let cmp = new_cmp(&mut g, block, confirmed_x, bound, Relation::LESS);
    let cond = new_cond(&mut g, block, cmp);
    let p_false = new_proj(&mut g, block, cond, Mode::Control, 0);
    let p_true = new_proj(&mut g, block, cond, Mode::Control, 1);
    let false_block = block_with_pred(&mut g, p_false);
    let true_block = block_with_pred(&mut g, p_true);

    opt_jumpthreading(&mut g, &FlagRegistry::with_defaults());

    assert_eq!(g.get_irn_op(g.get_irn_n(true_block, 0)), PrimordialOp::Jmp);
    assert_eq!(g.get_irn_n(false_block, 0), g.anchors().bad);
}

#[test]
fn jump_threading_is_a_no_op_when_flag_is_off() {
    let mut g = Graph::new("flag_off");
    g.out_edges_mut().activate();
    let block = g.anchors().start_block;

    let c1 = new_const(&mut g, block, Tarval::from_i128(Mode::IntS(32), 1));
    let cmp = new_cmp(&mut g, block, c1, c1, Relation::EQUAL);
    let cond = new_cond(&mut g, block, cmp);
    let p_true = new_proj(&mut g, block, cond, Mode::Control, 1);

    let mut flags = FlagRegistry::with_defaults();
    flags.set("opt.jumpthreading", graphir::flags::FlagValue::Bool(false));
    opt_jumpthreading(&mut g, &flags);

    assert_eq!(g.get_irn_op(p_true), PrimordialOp::Proj);
}
