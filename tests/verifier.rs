//! Integration tests for the structural/typing verifier, exercised through
//! the public builder API rather than hand-assembled `Attrs`.

use graphir::builder::{new_add, new_cmp, new_const, new_cond, new_phi, new_proj, new_return};
use graphir::flags::FlagRegistry;
use graphir::graph::Graph;
use graphir::mode::Mode;
use graphir::tarval::{Relation, Tarval};
use graphir::verifier::verify_graph;

#[test]
fn a_well_formed_straight_line_graph_verifies_clean() {
    let mut g = Graph::new("straight_line");
    let block = g.anchors().start_block;
    let mem = g.anchors().initial_memory;
    let c1 = new_const(&mut g, block, Tarval::from_i128(Mode::IntS(32), 2));
    let c2 = new_const(&mut g, block, Tarval::from_i128(Mode::IntS(32), 3));
    let add = new_add(&mut g, block, Mode::IntS(32), c1, c2);
    new_return(&mut g, block, mem, vec![add]);

    let report = verify_graph(&g, &FlagRegistry::with_defaults());
    assert!(report.is_ok(), "unexpected violations: {:?}", report.0);
}

#[test]
fn mismatched_operand_modes_are_reported() {
    let mut g = Graph::new("bad_add");
    let block = g.anchors().start_block;
    let int_c = new_const(&mut g, block, Tarval::from_i128(Mode::IntS(32), 1));
    let float_c = new_const(&mut g, block, Tarval::from_f64(Mode::Float(64), 1.0));
    // Force a mismatched-mode Add: the node's own result mode is IntS(32)
    // but its second operand is a Float(64) constant.
    let add = g.new_node(
        graphir::opcode::PrimordialOp::Add,
        Mode::IntS(32),
        Some(block),
        vec![int_c, float_c],
        graphir::node::Attrs::None,
    );
    let _ = add;

    let report = verify_graph(&g, &FlagRegistry::with_defaults());
    assert!(!report.is_ok());
    assert!(report
        .0
        .iter()
        .any(|e| matches!(e, graphir::error::VerifyError::BadOperandMode { .. })));
}

#[test]
fn cond_selector_must_be_bool() {
    let mut g = Graph::new("bad_cond");
    let block = g.anchors().start_block;
    let not_bool = new_const(&mut g, block, Tarval::from_i128(Mode::IntS(32), 1));
    new_cond(&mut g, block, not_bool);

    let report = verify_graph(&g, &FlagRegistry::with_defaults());
    assert!(!report.is_ok());
    assert!(report
        .0
        .iter()
        .any(|e| matches!(e, graphir::error::VerifyError::BadOperandMode { .. })));
}

#[test]
fn phi_with_mismatched_operand_mode_is_reported() {
    let mut g = Graph::new("bad_phi");
    let block = g.anchors().start_block;
    let int_c = new_const(&mut g, block, Tarval::from_i128(Mode::IntS(32), 1));
    let float_c = new_const(&mut g, block, Tarval::from_f64(Mode::Float(64), 2.0));
    let phi = new_phi(&mut g, block, Mode::IntS(32), vec![int_c, float_c]);
    let _ = phi;

    let report = verify_graph(&g, &FlagRegistry::with_defaults());
    assert!(report
        .0
        .iter()
        .any(|e| matches!(e, graphir::error::VerifyError::BadOperandMode { .. })));
}

#[test]
fn proj_number_outside_the_fixed_table_is_reported() {
    let mut g = Graph::new("bad_proj");
    let block = g.anchors().start_block;
    let mem = g.anchors().initial_memory;
    let c1 = new_const(&mut g, block, Tarval::from_i128(Mode::IntS(32), 5));
    let cmp = new_cmp(&mut g, block, c1, c1, Relation::EQUAL);
    let cond = new_cond(&mut g, block, cmp);
    // Cond's fixed table only has Proj numbers 0 and 1.
    new_proj(&mut g, block, cond, Mode::Control, 7);
    let _ = mem;

    let report = verify_graph(&g, &FlagRegistry::with_defaults());
    assert!(report
        .0
        .iter()
        .any(|e| matches!(e, graphir::error::VerifyError::BadProjNumber { .. })));
}
