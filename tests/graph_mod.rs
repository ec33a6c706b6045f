//! Integration tests for the graph-modification primitives.

use graphir::builder::new_const;
use graphir::graph::Graph;
use graphir::graph_mod::{collect_phiprojs, exchange, kill, part_block, resolve, turn_into_tuple};
use graphir::mode::Mode;
use graphir::node::Attrs;
use graphir::opcode::PrimordialOp;
use graphir::tarval::Tarval;

#[test]
fn exchange_reroutes_every_known_user_when_edges_are_active() {
    let mut g = Graph::new("t");
    g.out_edges_mut().activate();
    let block = g.anchors().start_block;
    let old = new_const(&mut g, block, Tarval::from_i128(Mode::IntS(32), 1));
    let new = new_const(&mut g, block, Tarval::from_i128(Mode::IntS(32), 2));
    let user_a = g.new_node(PrimordialOp::Minus, Mode::IntS(32), Some(block), vec![old], Attrs::None);
    let user_b = g.new_node(PrimordialOp::Not, Mode::IntS(32), Some(block), vec![old], Attrs::None);

    exchange(&mut g, old, new);

    assert_eq!(g.get_irn_n(user_a, 0), new);
    assert_eq!(g.get_irn_n(user_b, 0), new);
    assert!(g.node(old).is_deleted());
}

#[test]
fn exchange_with_edges_inactive_needs_resolve() {
    let mut g = Graph::new("t");
    let block = g.anchors().start_block;
    let old = new_const(&mut g, block, Tarval::from_i128(Mode::IntS(32), 1));
    let new = new_const(&mut g, block, Tarval::from_i128(Mode::IntS(32), 2));
    exchange(&mut g, old, new);

    assert_eq!(g.get_irn_op(old), PrimordialOp::Id);
    assert_eq!(resolve(&g, old), new);
}

#[test]
fn turn_into_tuple_redirects_existing_projections() {
    let mut g = Graph::new("t");
    g.out_edges_mut().activate();
    let block = g.anchors().start_block;
    let div = g.new_node(PrimordialOp::Div, Mode::Tuple, Some(block), vec![], Attrs::None);
    let p0 = g.new_node(PrimordialOp::Proj, Mode::Memory, Some(block), vec![div], Attrs::Proj(0));

    let mem = g.anchors().initial_memory;
    let result = new_const(&mut g, block, Tarval::from_i128(Mode::IntS(32), 42));
    turn_into_tuple(&mut g, div, vec![mem, result]);

    assert_eq!(g.get_irn_op(div), PrimordialOp::Tuple);
    assert_eq!(g.get_irn_n(p0, 0), div);
    assert_eq!(g.get_irn_n(div, 0), mem);
    assert_eq!(g.get_irn_n(div, 1), result);
}

#[test]
fn part_block_moves_the_tail_into_a_fresh_successor() {
    let mut g = Graph::new("t");
    let block = g.anchors().start_block;
    let keep = new_const(&mut g, block, Tarval::from_i128(Mode::IntS(32), 1));
    let moved = new_const(&mut g, block, Tarval::from_i128(Mode::IntS(32), 2));

    let new_block = part_block(&mut g, block, vec![moved]);

    assert_eq!(g.get_nodes_block(keep), Some(block));
    assert_eq!(g.get_nodes_block(moved), Some(new_block));
    assert_eq!(g.get_irn_op(g.get_irn_n(new_block, 0)), PrimordialOp::Jmp);
}

#[test]
fn collect_phiprojs_rebuilds_a_blocks_phi_list() {
    let mut g = Graph::new("t");
    let block = g.anchors().start_block;
    let c = new_const(&mut g, block, Tarval::from_i128(Mode::IntS(32), 1));
    let phi = g.new_node(
        PrimordialOp::Phi,
        Mode::IntS(32),
        Some(block),
        vec![c],
        Attrs::Phi { backedges: vec![false] },
    );

    collect_phiprojs(&mut g, block);

    match g.node(block).attrs() {
        Attrs::Block { phi_list, .. } => assert_eq!(phi_list, &vec![phi]),
        other => panic!("expected a Block attribute, got {other:?}"),
    }
}

#[test]
fn kill_is_idempotent() {
    let mut g = Graph::new("t");
    let block = g.anchors().start_block;
    let c = new_const(&mut g, block, Tarval::from_i128(Mode::IntS(32), 1));
    kill(&mut g, c);
    kill(&mut g, c);
    assert!(g.node(c).is_deleted());
}
