//! A sea-of-nodes SSA intermediate representation: graph kernel,
//! structural/typing verifier, and a local-optimization + jump-threading
//! optimizer.
//!
//! The kernel (`mode`, `tarval`, `opcode`, `arena`, `node`, `edges`,
//! `graph`, `program`) is deliberately independent of any particular
//! source language or target; front ends build graphs through
//! [`builder`] and [`ssa_reconstruct`], middle-end passes consult
//! [`analyses`] and mutate through [`graph_mod`], and [`verifier`] checks
//! the result is well-formed before [`local_opt`] and [`jump_threading`]
//! optimize it.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod analyses;
pub mod arena;
pub mod builder;
pub mod diagnostics;
pub mod edges;
pub mod error;
pub mod flags;
pub mod gc;
pub mod graph;
pub mod graph_mod;
pub mod jump_threading;
pub mod local_opt;
pub mod mode;
pub mod node;
pub mod opcode;
pub mod program;
pub mod ssa_reconstruct;
pub mod stats;
pub mod tarval;
pub mod transform;
pub mod verifier;

/// Commonly used types, re-exported for `use graphir::prelude::*;`.
pub mod prelude {
    pub use crate::edges::{EdgeKind, OutEdges};
    pub use crate::error::{Fatal, GraphError, VerifyError, VerifyReport};
    pub use crate::flags::FlagRegistry;
    pub use crate::graph::{Anchors, Graph, PhaseState, ReservedResources, Validity};
    pub use crate::mode::Mode;
    pub use crate::node::{Attrs, Node, NodeId};
    pub use crate::opcode::{OpcodeTable, PrimordialOp};
    pub use crate::program::{GraphId, IrProgram};
    pub use crate::tarval::{Relation, Tarval};
}
