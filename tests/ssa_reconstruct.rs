//! Integration tests for incremental (Braun/Buchwald-style) SSA construction.

use graphir::builder::{new_const, new_jmp};
use graphir::graph::Graph;
use graphir::mode::Mode;
use graphir::node::Attrs;
use graphir::opcode::PrimordialOp;
use graphir::ssa_reconstruct::SsaBuilder;
use graphir::tarval::Tarval;

#[test]
fn a_diamond_merge_gets_a_phi_with_one_operand_per_incoming_path() {
    let mut g = Graph::new("diamond");
    let entry = g.anchors().start_block;
    let mut b = SsaBuilder::new();
    b.seal_block(&mut g, entry);

    let jmp_to_left = new_jmp(&mut g, entry);
    let left_block = g.new_node(
        PrimordialOp::Block,
        Mode::Control,
        None,
        vec![jmp_to_left],
        Attrs::Block { backedges: vec![false], phi_list: vec![] },
    );
    b.seal_block(&mut g, left_block);
    let left_val = new_const(&mut g, left_block, Tarval::from_i128(Mode::IntS(32), 10));
    b.set_value(left_block, 0, left_val);

    let jmp_to_right = new_jmp(&mut g, entry);
    let right_block = g.new_node(
        PrimordialOp::Block,
        Mode::Control,
        None,
        vec![jmp_to_right],
        Attrs::Block { backedges: vec![false], phi_list: vec![] },
    );
    b.seal_block(&mut g, right_block);
    let right_val = new_const(&mut g, right_block, Tarval::from_i128(Mode::IntS(32), 20));
    b.set_value(right_block, 0, right_val);

    let jmp_left = new_jmp(&mut g, left_block);
    let jmp_right = new_jmp(&mut g, right_block);
    let merge = g.new_node(
        PrimordialOp::Block,
        Mode::Control,
        None,
        vec![jmp_left, jmp_right],
        Attrs::Block { backedges: vec![false, false], phi_list: vec![] },
    );
    b.seal_block(&mut g, merge);

    let read = b.get_value(&mut g, merge, 0, Mode::IntS(32));
    assert_eq!(g.get_irn_op(read), PrimordialOp::Phi);
    assert_eq!(g.get_irn_arity(read), 2);
    assert_eq!(g.get_irn_n(read, 0), left_val);
    assert_eq!(g.get_irn_n(read, 1), right_val);
}

#[test]
fn reading_through_a_loop_back_edge_terminates_and_is_consistent() {
    // A single self-looping block: read before seal forces an incomplete
    // Phi, which `seal_block` must finish without looping forever.
    let mut g = Graph::new("loop");
    let entry = g.anchors().start_block;
    let mut b = SsaBuilder::new();
    b.seal_block(&mut g, entry);

    let initial = new_const(&mut g, entry, Tarval::from_i128(Mode::IntS(32), 0));
    let jmp_in = new_jmp(&mut g, entry);
    let header = g.new_node(
        PrimordialOp::Block,
        Mode::Control,
        None,
        vec![jmp_in],
        Attrs::Block { backedges: vec![false], phi_list: vec![] },
    );
    b.set_value(entry, 0, initial);

    // Read var 0 inside the unsealed header before its back-edge exists:
    // this must produce a placeholder Phi, not recurse forever.
    let inside_read = b.get_value(&mut g, header, 0, Mode::IntS(32));
    assert_eq!(g.get_irn_op(inside_read), PrimordialOp::Phi);

    let jmp_back = new_jmp(&mut g, header);
    g.add_imm_block_pred(header, jmp_back);
    b.set_value(header, 0, inside_read);
    b.seal_block(&mut g, header);

    // With only one live definition reaching the back-edge, the Phi should
    // have collapsed to the loop-carried value itself.
    let read_after_seal = b.get_value(&mut g, header, 0, Mode::IntS(32));
    assert_eq!(read_after_seal, initial);
}
