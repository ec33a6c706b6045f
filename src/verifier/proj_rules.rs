//! Proj-routing rules keyed by predecessor opcode, checking each `Proj`'s
//! number against the table its predecessor's opcode defines.

use crate::error::{VerifyError, VerifyReport};
use crate::graph::Graph;
use crate::mode::Mode;
use crate::node::NodeId;
use crate::opcode::PrimordialOp;

/// What a `Proj` slot is allowed to carry: either one fixed mode, or any
/// data mode (used for the result slot of a value-producing tuple node,
/// since this crate does not store that result mode as a separate
/// attribute distinct from the operand modes that produced it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProjExpect {
    Fixed(Mode),
    AnyData,
}

impl ProjExpect {
    fn accepts(self, actual: Mode) -> bool {
        match self {
            ProjExpect::Fixed(m) => actual == m,
            ProjExpect::AnyData => actual.is_data(),
        }
    }

    /// A mode to report in violations, for callers that need a single
    /// concrete value to put in `VerifyError::BadOperandMode::expected`.
    fn representative(self) -> Mode {
        match self {
            ProjExpect::Fixed(m) => m,
            ProjExpect::AnyData => Mode::ISIZE,
        }
    }
}

/// The fixed `(proj_num, expectation)` table for tuple-producing
/// predecessor opcodes. Predecessors not listed accept any Proj number
/// (their tuple shape is caller-defined, e.g. `Call`'s result tuple).
fn fixed_table(pred_op: PrimordialOp) -> Option<&'static [(u32, ProjExpect)]> {
    use PrimordialOp::*;
    use ProjExpect::{AnyData, Fixed};
    match pred_op {
        Start => Some(&[
            (0, Fixed(Mode::Control)),
            (1, Fixed(Mode::Memory)),
            (2, Fixed(Mode::Ref)),
            (3, Fixed(Mode::Ref)),
            (4, Fixed(Mode::Tuple)),
        ]),
        Load => Some(&[
            (0, Fixed(Mode::Memory)),
            (1, Fixed(Mode::Control)),
            (2, Fixed(Mode::Control)),
            (3, AnyData),
        ]),
        Store => Some(&[(0, Fixed(Mode::Memory)), (1, Fixed(Mode::Control)), (2, Fixed(Mode::Control))]),
        Div | Mod | Quot => Some(&[
            (0, Fixed(Mode::Memory)),
            (1, Fixed(Mode::Control)),
            (2, Fixed(Mode::Control)),
            (3, AnyData),
        ]),
        DivMod => Some(&[
            (0, Fixed(Mode::Memory)),
            (1, Fixed(Mode::Control)),
            (2, Fixed(Mode::Control)),
            (3, AnyData),
            (4, AnyData),
        ]),
        Alloc => Some(&[
            (0, Fixed(Mode::Memory)),
            (1, Fixed(Mode::Control)),
            (2, Fixed(Mode::Control)),
            (3, Fixed(Mode::Ref)),
        ]),
        Bound => Some(&[
            (0, Fixed(Mode::Memory)),
            (1, Fixed(Mode::Control)),
            (2, Fixed(Mode::Control)),
            (3, AnyData),
        ]),
        Cond => Some(&[(0, Fixed(Mode::Control)), (1, Fixed(Mode::Control))]),
        CopyB => Some(&[(0, Fixed(Mode::Memory)), (1, Fixed(Mode::Control)), (2, Fixed(Mode::Control))]),
        Raise => Some(&[(0, Fixed(Mode::Control)), (1, Fixed(Mode::Memory))]),
        _ => None,
    }
}

fn check_proj(g: &Graph, report: &mut VerifyReport, node: NodeId) {
    if g.get_irn_arity(node) != 1 {
        return;
    }
    let pred = g.get_irn_n(node, 0);
    let pred_op = g.get_irn_op(pred);
    if pred_op == PrimordialOp::Bad {
        return;
    }
    let Some(proj_num) = g.node(node).attrs().as_proj_num() else {
        return;
    };

    if let Some(table) = fixed_table(pred_op) {
        match table.iter().find(|(n, _)| *n == proj_num) {
            Some((_, expected)) => {
                let actual = g.get_irn_mode(node);
                if !expected.accepts(actual) {
                    report.push(VerifyError::BadOperandMode {
                        node,
                        op: PrimordialOp::Proj,
                        operand_index: 0,
                        actual,
                        expected: expected.representative(),
                    });
                }
            }
            None => {
                report.push(VerifyError::BadProjNumber {
                    node,
                    proj_num,
                    pred_op,
                });
            }
        }
    }
    // Call/Tuple/Builtin/Asm projections have caller-chosen shapes and are
    // only bounds-checked by the Variable/Any arity classes' callers; this
    // crate does not model callee signatures precisely enough to validate
    // them further.
}

/// Run the Proj-number table over every live `Proj` node in `g`.
pub fn check_all_projs(g: &Graph, report: &mut VerifyReport) {
    for id in g.node_ids() {
        if g.node(id).is_deleted() || g.get_irn_op(id) != PrimordialOp::Proj {
            continue;
        }
        check_proj(g, report, id);
    }
}
