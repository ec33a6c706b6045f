//! Integration tests for worklist-driven local optimization.

use graphir::builder::{new_add, new_const, new_minus, new_mul, new_return, new_sub};
use graphir::flags::FlagRegistry;
use graphir::graph::Graph;
use graphir::local_opt::do_local_opts;
use graphir::mode::Mode;
use graphir::tarval::Tarval;

fn const_of(g: &Graph, id: graphir::node::NodeId) -> Option<i128> {
    g.node(id).attrs().as_const().and_then(Tarval::as_i128)
}

#[test]
fn a_chain_of_constant_arithmetic_folds_to_one_constant() {
    let mut g = Graph::new("fold_chain");
    g.out_edges_mut().activate();
    let block = g.anchors().start_block;
    let mem = g.anchors().initial_memory;

    let two = new_const(&mut g, block, Tarval::from_i128(Mode::IntS(32), 2));
    let three = new_const(&mut g, block, Tarval::from_i128(Mode::IntS(32), 3));
    let sum = new_add(&mut g, block, Mode::IntS(32), two, three);
    let four = new_const(&mut g, block, Tarval::from_i128(Mode::IntS(32), 4));
    let product = new_mul(&mut g, block, Mode::IntS(32), sum, four);
    let ret = new_return(&mut g, block, mem, vec![product]);

    do_local_opts(&mut g, &FlagRegistry::with_defaults());

    let folded = g.get_irn_n(ret, 1);
    assert_eq!(const_of(&g, folded), Some(20));
}

#[test]
fn subtracting_a_value_from_itself_folds_to_zero() {
    let mut g = Graph::new("self_sub");
    g.out_edges_mut().activate();
    let block = g.anchors().start_block;
    let mem = g.anchors().initial_memory;

    let x = g.new_node(
        graphir::opcode::PrimordialOp::Load,
        Mode::IntS(32),
        Some(block),
        vec![],
        graphir::node::Attrs::None,
    );
    let sub = new_sub(&mut g, block, Mode::IntS(32), x, x);
    let ret = new_return(&mut g, block, mem, vec![sub]);

    do_local_opts(&mut g, &FlagRegistry::with_defaults());

    let folded = g.get_irn_n(ret, 1);
    assert_eq!(const_of(&g, folded), Some(0));
}

#[test]
fn double_negation_collapses_to_the_original_value() {
    let mut g = Graph::new("double_neg");
    g.out_edges_mut().activate();
    let block = g.anchors().start_block;
    let mem = g.anchors().initial_memory;

    let x = g.new_node(
        graphir::opcode::PrimordialOp::Load,
        Mode::IntS(32),
        Some(block),
        vec![],
        graphir::node::Attrs::None,
    );
    let neg1 = new_minus(&mut g, block, Mode::IntS(32), x);
    let neg2 = new_minus(&mut g, block, Mode::IntS(32), neg1);
    let ret = new_return(&mut g, block, mem, vec![neg2]);

    do_local_opts(&mut g, &FlagRegistry::with_defaults());

    assert_eq!(g.get_irn_n(ret, 1), x);
}

#[test]
fn local_opt_is_a_no_op_when_flag_is_off() {
    let mut g = Graph::new("flag_off");
    g.out_edges_mut().activate();
    let block = g.anchors().start_block;
    let mem = g.anchors().initial_memory;

    let two = new_const(&mut g, block, Tarval::from_i128(Mode::IntS(32), 2));
    let three = new_const(&mut g, block, Tarval::from_i128(Mode::IntS(32), 3));
    let sum = new_add(&mut g, block, Mode::IntS(32), two, three);
    let ret = new_return(&mut g, block, mem, vec![sum]);

    let mut flags = FlagRegistry::with_defaults();
    flags.set("opt.local", graphir::flags::FlagValue::Bool(false));
    do_local_opts(&mut g, &flags);

    assert_eq!(g.get_irn_n(ret, 1), sum);
    assert_eq!(g.get_irn_op(sum), graphir::opcode::PrimordialOp::Add);
}
