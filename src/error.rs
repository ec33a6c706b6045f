//! Error types.

use thiserror::Error;

use crate::node::NodeId;
use crate::opcode::PrimordialOp;

/// One structural or typing violation found by the verifier.
#[derive(Debug, Clone, Error)]
pub enum VerifyError {
    /// An operand's mode did not match what its opcode requires.
    #[error("node #{node:?} ({op:?}): operand {operand_index} has mode {actual}, expected {expected}")]
    BadOperandMode {
        /// The offending node.
        node: NodeId,
        /// Its opcode.
        op: PrimordialOp,
        /// Which operand slot.
        operand_index: usize,
        /// The mode found.
        actual: crate::mode::Mode,
        /// The mode required.
        expected: crate::mode::Mode,
    },
    /// A node's own result mode was wrong for its opcode.
    #[error("node #{node:?} ({op:?}): result mode {actual} is invalid")]
    BadResultMode {
        /// The offending node.
        node: NodeId,
        /// Its opcode.
        op: PrimordialOp,
        /// The mode found.
        actual: crate::mode::Mode,
    },
    /// A node's arity didn't match its opcode's arity class.
    #[error("node #{node:?} ({op:?}): arity {actual} is invalid")]
    BadArity {
        /// The offending node.
        node: NodeId,
        /// Its opcode.
        op: PrimordialOp,
        /// Arity found.
        actual: usize,
    },
    /// A `Proj` number was out of range (or didn't match its predecessor's
    /// opcode-specific Proj table).
    #[error("node #{node:?}: Proj number {proj_num} invalid for predecessor {pred_op:?}")]
    BadProjNumber {
        /// The `Proj` node.
        node: NodeId,
        /// Its projection number.
        proj_num: u32,
        /// The predecessor's opcode.
        pred_op: PrimordialOp,
    },
    /// A `Phi`'s operand count didn't match its owning block's predecessor
    /// count.
    #[error("node #{node:?}: Phi arity {phi_arity} does not match block arity {block_arity}")]
    PhiBlockArityMismatch {
        /// The `Phi` node.
        node: NodeId,
        /// The `Phi`'s arity.
        phi_arity: usize,
        /// Its block's arity.
        block_arity: usize,
    },
    /// A use did not satisfy dominance.
    #[error("node #{user:?} uses #{def:?} which does not dominate it")]
    DominanceViolation {
        /// The use site.
        user: NodeId,
        /// The definition that fails to dominate it.
        def: NodeId,
    },
    /// A non-`Bad`-tolerant rule was violated by a live (non-`Bad`) operand
    /// where a `Bad` predecessor should have been propagated instead.
    #[error("node #{node:?}: expected Bad to be propagated but found a live successor")]
    BadNotPropagated {
        /// The offending node.
        node: NodeId,
    },
    /// A side-effecting node with no guaranteed data successor (`Call`,
    /// `Store`, `Alloc`, `Free`, `Raise`) was not reachable from `End`.
    #[error("node #{node:?} ({op:?}) must be reachable from End but is not")]
    MissingKeepAlive {
        /// The offending node.
        node: NodeId,
        /// Its opcode.
        op: PrimordialOp,
    },
}

/// All violations collected from a single [`crate::verifier::verify_graph`]
/// run. Every independent check contributes its own findings rather than
/// the run stopping at the first one.
#[derive(Debug, Clone, Default, Error)]
#[error("graph verification failed with {} violation(s)", .0.len())]
pub struct VerifyReport(pub Vec<VerifyError>);

impl VerifyReport {
    /// True if no violations were recorded.
    pub fn is_ok(&self) -> bool {
        self.0.is_empty()
    }

    /// Push one more violation onto the report.
    pub fn push(&mut self, err: VerifyError) {
        self.0.push(err);
    }

    /// Merge another report's violations into this one.
    pub fn extend(&mut self, other: VerifyReport) {
        self.0.extend(other.0);
    }
}

/// Errors raised by the construction/mutation API, as
/// opposed to the verifier's post-hoc diagnostics.
#[derive(Debug, Clone, Error)]
pub enum GraphError {
    /// Attempted to mutate a node that has already been deleted.
    #[error("node #{0:?} has already been deleted")]
    NodeDeleted(NodeId),
    /// Attempted an operand access out of range.
    #[error("node #{node:?} has arity {arity}, index {index} out of range")]
    OperandIndexOutOfRange {
        /// The node accessed.
        node: NodeId,
        /// Its arity.
        arity: usize,
        /// The offending index.
        index: usize,
    },
    /// Tried to reserve a per-graph scoped resource that is already
    /// reserved.
    #[error("resource already reserved")]
    ResourceAlreadyReserved,
}

/// Errors raised while reading or applying flag-registry configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// A flag name was not recognized. [`crate::flags::FlagRegistry`] treats
    /// this as a warning-level condition rather than a hard error; this
    /// variant exists for callers that want to treat it as one (e.g. a
    /// strict CLI front end).
    #[error("unknown flag {0:?}")]
    UnknownFlag(String),
    /// A flag's value could not be parsed as the type it's declared with.
    #[error("flag {name:?}: invalid value {value:?}")]
    InvalidValue {
        /// The flag name.
        name: String,
        /// The rejected raw value.
        value: String,
    },
}

/// An internal-consistency violation severe enough that continuing would
/// only produce garbage. Constructed
/// via the [`crate::fatal`] macro, which also runs the
/// [`crate::diagnostics`] dump-before-abort path.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct Fatal {
    /// Human-readable description of the broken invariant.
    pub message: String,
}

/// Build a [`Fatal`] and run the diagnostic dump-before-abort path. Mirrors
/// a panic-with-context idiom but returns a value instead of unwinding,
/// since this crate is a library and must let callers decide whether to
/// escalate.
#[macro_export]
macro_rules! fatal {
    ($($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::diagnostics::report_fatal(&message);
        $crate::error::Fatal { message }
    }};
}
