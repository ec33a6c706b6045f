//! Per-opcode structural/typing rules. Implements arity and operand/result
//! mode checks for the opcodes whose shape is fixed; opcodes not
//! special-cased here still get the generic arity-class check.

use crate::error::{VerifyError, VerifyReport};
use crate::graph::{Graph, PhaseState};
use crate::mode::Mode;
use crate::node::{Attrs, NodeId};
use crate::opcode::{ArityClass, PrimordialOp};

fn operand_is_bad(g: &Graph, node: NodeId, i: usize) -> bool {
    let op = g.get_irn_n(node, i);
    g.get_irn_op(op) == PrimordialOp::Bad
}

fn require_mode(
    g: &Graph,
    report: &mut VerifyReport,
    node: NodeId,
    i: usize,
    expected: Mode,
) {
    if operand_is_bad(g, node, i) {
        return;
    }
    let actual = g.get_irn_mode(g.get_irn_n(node, i));
    if actual != expected {
        report.push(VerifyError::BadOperandMode {
            node,
            op: g.get_irn_op(node),
            operand_index: i,
            actual,
            expected,
        });
    }
}

/// Like [`require_mode`] but against a predicate rather than one fixed
/// mode, for operands whose catalogue entry is "any int" or "any unsigned
/// int" rather than a single mode. `representative` is only used to fill
/// in `VerifyError::BadOperandMode::expected`, which wants a concrete mode.
fn require_mode_matching(
    g: &Graph,
    report: &mut VerifyReport,
    node: NodeId,
    i: usize,
    predicate: impl Fn(Mode) -> bool,
    representative: Mode,
) {
    if operand_is_bad(g, node, i) {
        return;
    }
    let actual = g.get_irn_mode(g.get_irn_n(node, i));
    if !predicate(actual) {
        report.push(VerifyError::BadOperandMode {
            node,
            op: g.get_irn_op(node),
            operand_index: i,
            actual,
            expected: representative,
        });
    }
}

fn check_arity(g: &Graph, report: &mut VerifyReport, node: NodeId) {
    let op = g.get_irn_op(node);
    let arity = g.get_irn_arity(node);
    let ok = match op.arity_class() {
        ArityClass::Zero => arity == 0,
        ArityClass::Unary => arity == 1,
        ArityClass::Binary => arity == 2,
        ArityClass::Trinary => arity == 3,
        ArityClass::Variable | ArityClass::Dynamic | ArityClass::Any => true,
    };
    if !ok {
        report.push(VerifyError::BadArity {
            node,
            op,
            actual: arity,
        });
    }
}

/// `Add`/`Sub` accept uniform-mode arithmetic plus the pointer-arithmetic
/// forms the catalogue carves out: `ref + int -> ref`, `int + ref -> ref`
/// for `Add`, and `ref - int -> ref`, `ref - ref -> int` for `Sub`.
fn add_sub_ok(is_add: bool, left: Mode, right: Mode, result: Mode) -> bool {
    if left == right && left == result {
        return result.is_num();
    }
    if is_add {
        (left.is_reference() && right.is_int() && result.is_reference())
            || (left.is_int() && right.is_reference() && result.is_reference())
    } else {
        (left.is_reference() && right.is_int() && result.is_reference())
            || (left.is_reference() && right.is_reference() && result.is_int())
    }
}

fn check_add_sub(g: &Graph, report: &mut VerifyReport, node: NodeId, is_add: bool) {
    if operand_is_bad(g, node, 0) || operand_is_bad(g, node, 1) {
        return;
    }
    let op = g.get_irn_op(node);
    let left = g.get_irn_mode(g.get_irn_n(node, 0));
    let right = g.get_irn_mode(g.get_irn_n(node, 1));
    let result = g.get_irn_mode(node);
    if !add_sub_ok(is_add, left, right, result) {
        report.push(VerifyError::BadOperandMode {
            node,
            op,
            operand_index: 1,
            actual: right,
            expected: left,
        });
    }
}

fn check_node(g: &Graph, report: &mut VerifyReport, node: NodeId) {
    use PrimordialOp::*;
    let op = g.get_irn_op(node);
    check_arity(g, report, node);

    match op {
        Add => {
            if g.get_irn_arity(node) == 2 {
                check_add_sub(g, report, node, true);
            }
        }
        Sub => {
            if g.get_irn_arity(node) == 2 {
                check_add_sub(g, report, node, false);
            }
        }
        Mul | And | Or | Eor | Rotl => {
            if g.get_irn_arity(node) == 2 {
                let mode = g.get_irn_mode(node);
                require_mode(g, report, node, 0, mode);
                require_mode(g, report, node, 1, mode);
                if !mode.is_num() && !matches!(op, And | Or | Eor | Rotl) {
                    report.push(VerifyError::BadResultMode { node, op, actual: mode });
                }
            }
        }
        Shl | Shr | Shrs => {
            if g.get_irn_arity(node) == 2 {
                let mode = g.get_irn_mode(node);
                require_mode(g, report, node, 0, mode);
                require_mode_matching(g, report, node, 1, Mode::is_unsigned_int, Mode::USIZE);
                if !mode.is_int() {
                    report.push(VerifyError::BadResultMode { node, op, actual: mode });
                }
            }
        }
        Minus | Not => {
            if g.get_irn_arity(node) == 1 {
                let mode = g.get_irn_mode(node);
                require_mode(g, report, node, 0, mode);
            }
        }
        Mulh => {
            if g.get_irn_arity(node) == 2 {
                let mode = g.get_irn_mode(node);
                require_mode(g, report, node, 0, mode);
                require_mode(g, report, node, 1, mode);
                if !mode.is_int() {
                    report.push(VerifyError::BadResultMode { node, op, actual: mode });
                }
            }
        }
        Cmp => {
            if g.get_irn_arity(node) == 2 {
                let left = g.get_irn_mode(g.get_irn_n(node, 0));
                require_mode(g, report, node, 1, left);
                if g.get_irn_mode(node) != Mode::Bool {
                    report.push(VerifyError::BadResultMode {
                        node,
                        op,
                        actual: g.get_irn_mode(node),
                    });
                }
            }
        }
        Cond => {
            if g.get_irn_arity(node) == 1 {
                require_mode(g, report, node, 0, Mode::Bool);
            }
        }
        Phi => {
            let block = g.get_nodes_block(node);
            if let Some(block) = block {
                let block_arity = g.get_irn_arity(block);
                let phi_arity = g.get_irn_arity(node);
                if phi_arity != block_arity && phi_arity != 0 {
                    report.push(VerifyError::PhiBlockArityMismatch {
                        node,
                        phi_arity,
                        block_arity,
                    });
                }
            }
            let mode = g.get_irn_mode(node);
            for i in 0..g.get_irn_arity(node) {
                require_mode(g, report, node, i, mode);
            }
        }
        Sel => {
            if g.get_irn_arity(node) == 2 {
                require_mode(g, report, node, 0, Mode::Memory);
                require_mode(g, report, node, 1, Mode::Ref);
                if g.get_irn_mode(node) != Mode::Ref {
                    report.push(VerifyError::BadResultMode { node, op, actual: g.get_irn_mode(node) });
                }
                if !matches!(g.node(node).attrs(), Attrs::Sel { .. }) {
                    report.push(VerifyError::BadResultMode { node, op, actual: g.get_irn_mode(node) });
                }
            }
        }
        Call => {
            let arity = g.get_irn_arity(node);
            if arity >= 2 {
                require_mode(g, report, node, 0, Mode::Memory);
                require_mode(g, report, node, 1, Mode::Ref);
                if let Attrs::Call { param_modes, .. } = g.node(node).attrs() {
                    for (i, &expected) in param_modes.iter().enumerate() {
                        let idx = 2 + i;
                        if idx >= arity {
                            break;
                        }
                        if operand_is_bad(g, node, idx) {
                            continue;
                        }
                        let actual = g.get_irn_mode(g.get_irn_n(node, idx));
                        if actual != expected {
                            report.push(VerifyError::BadOperandMode {
                                node,
                                op,
                                operand_index: idx,
                                actual,
                                expected,
                            });
                        }
                    }
                }
                if g.get_irn_mode(node) != Mode::Tuple {
                    report.push(VerifyError::BadResultMode { node, op, actual: g.get_irn_mode(node) });
                }
            }
        }
        Quot | Div | Mod | DivMod => {
            if g.get_irn_arity(node) == 3 {
                require_mode(g, report, node, 0, Mode::Memory);
                if !operand_is_bad(g, node, 1) {
                    let left_mode = g.get_irn_mode(g.get_irn_n(node, 1));
                    require_mode(g, report, node, 2, left_mode);
                }
                if g.get_irn_mode(node) != Mode::Tuple {
                    report.push(VerifyError::BadResultMode { node, op, actual: g.get_irn_mode(node) });
                }
            }
        }
        Alloc => {
            if g.get_irn_arity(node) == 2 {
                require_mode(g, report, node, 0, Mode::Memory);
                require_mode_matching(g, report, node, 1, Mode::is_unsigned_int, Mode::USIZE);
                if g.get_irn_mode(node) != Mode::Tuple {
                    report.push(VerifyError::BadResultMode { node, op, actual: g.get_irn_mode(node) });
                }
            }
        }
        Free => {
            if g.get_irn_arity(node) == 2 {
                require_mode(g, report, node, 0, Mode::Memory);
                require_mode(g, report, node, 1, Mode::Ref);
                if g.get_irn_mode(node) != Mode::Memory {
                    report.push(VerifyError::BadResultMode { node, op, actual: g.get_irn_mode(node) });
                }
            }
        }
        CopyB => {
            if g.get_irn_arity(node) == 3 {
                require_mode(g, report, node, 0, Mode::Memory);
                if g.phase() != PhaseState::Backend {
                    require_mode(g, report, node, 1, Mode::Ref);
                    require_mode(g, report, node, 2, Mode::Ref);
                }
                if g.get_irn_mode(node) != Mode::Tuple {
                    report.push(VerifyError::BadResultMode { node, op, actual: g.get_irn_mode(node) });
                }
            }
        }
        Bound => {
            if g.get_irn_arity(node) == 4 {
                require_mode(g, report, node, 0, Mode::Memory);
                require_mode_matching(g, report, node, 1, Mode::is_int, Mode::ISIZE);
                if !operand_is_bad(g, node, 1) {
                    let idx_mode = g.get_irn_mode(g.get_irn_n(node, 1));
                    require_mode(g, report, node, 2, idx_mode);
                    require_mode(g, report, node, 3, idx_mode);
                }
                if g.get_irn_mode(node) != Mode::Tuple {
                    report.push(VerifyError::BadResultMode { node, op, actual: g.get_irn_mode(node) });
                }
            }
        }
        Conv => {
            if g.get_irn_arity(node) == 1 {
                if !operand_is_bad(g, node, 0) {
                    let operand_mode = g.get_irn_mode(g.get_irn_n(node, 0));
                    if !operand_mode.is_datab() {
                        report.push(VerifyError::BadOperandMode {
                            node,
                            op,
                            operand_index: 0,
                            actual: operand_mode,
                            expected: g.get_irn_mode(node),
                        });
                    }
                }
                let result = g.get_irn_mode(node);
                let lowering_bool_widening_ok =
                    result.is_bool() && matches!(g.phase(), PhaseState::Low | PhaseState::Backend);
                if !result.is_data() && !lowering_bool_widening_ok {
                    report.push(VerifyError::BadResultMode { node, op, actual: result });
                }
            }
        }
        Cast => {
            if g.get_irn_arity(node) == 1 {
                let result = g.get_irn_mode(node);
                require_mode(g, report, node, 0, result);
                if !result.is_data() {
                    report.push(VerifyError::BadResultMode { node, op, actual: result });
                }
            }
        }
        Raise => {
            if g.get_irn_arity(node) == 2 {
                require_mode(g, report, node, 0, Mode::Memory);
                require_mode(g, report, node, 1, Mode::Ref);
                if g.get_irn_mode(node) != Mode::Tuple {
                    report.push(VerifyError::BadResultMode { node, op, actual: g.get_irn_mode(node) });
                }
            }
        }
        SymConst => {
            let mode = g.get_irn_mode(node);
            if !mode.is_int() && !mode.is_reference() {
                report.push(VerifyError::BadResultMode { node, op, actual: mode });
            }
        }
        IJmp => {
            if g.get_irn_arity(node) == 1 {
                require_mode(g, report, node, 0, Mode::Ref);
                if g.get_irn_mode(node) != Mode::Control {
                    report.push(VerifyError::BadResultMode { node, op, actual: g.get_irn_mode(node) });
                }
            }
        }
        Load => {
            if g.get_irn_arity(node) == 2 {
                require_mode(g, report, node, 0, Mode::Memory);
                require_mode(g, report, node, 1, Mode::Ref);
            }
        }
        Store => {
            if g.get_irn_arity(node) == 3 {
                require_mode(g, report, node, 0, Mode::Memory);
                require_mode(g, report, node, 1, Mode::Ref);
            }
        }
        Return => {
            if g.get_irn_arity(node) >= 1 {
                require_mode(g, report, node, 0, Mode::Memory);
            }
        }
        Sync => {
            for i in 0..g.get_irn_arity(node) {
                require_mode(g, report, node, i, Mode::Memory);
            }
        }
        Const => {
            if g.node(node).attrs().as_const().is_none() {
                report.push(VerifyError::BadResultMode {
                    node,
                    op,
                    actual: g.get_irn_mode(node),
                });
            }
        }
        Confirm => {
            if g.get_irn_arity(node) == 2 {
                let mode = g.get_irn_mode(node);
                require_mode(g, report, node, 0, mode);
            }
        }
        Mux => {
            if g.get_irn_arity(node) == 3 {
                require_mode(g, report, node, 0, Mode::Bool);
                let mode = g.get_irn_mode(node);
                require_mode(g, report, node, 1, mode);
                require_mode(g, report, node, 2, mode);
            }
        }
        _ => {}
    }
}

/// Run the opcode rule catalogue over every live node in `g`.
pub fn check_all_nodes(g: &Graph, report: &mut VerifyReport) {
    for id in g.node_ids() {
        if g.node(id).is_deleted() {
            continue;
        }
        check_node(g, report, id);
    }
}
