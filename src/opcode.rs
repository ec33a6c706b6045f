//! The opcode registry: the process-wide table of operation kinds, their
//! arity/pin/flag metadata, and the per-opcode dispatch hooks.
//!
//! This crate's opcode set is closed: every node carries a [`PrimordialOp`]
//! variant directly rather than an opaque [`OpcodeId`] into an open plugin
//! table. [`OpcodeTable`] still exposes a `register_opcode`/`next_opcode_id`
//! contract so an open-world extension point (machine opcodes registered by
//! a backend this crate doesn't implement) has somewhere to land; this
//! crate itself only ever registers the primordial set.

use std::collections::HashMap;
use std::sync::OnceLock;

use strum::{EnumIter, IntoEnumIterator};

/// Stable numeric id of a registered opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OpcodeId(pub u16);

/// How free a node is to move relative to its block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PinPolicy {
    /// May float anywhere dominance allows.
    Floats,
    /// Must stay in its block.
    Pinned,
    /// Pinned if it may raise an exception; otherwise floats.
    ExcPinned,
    /// Pinned because it touches memory ordering.
    MemPinned,
}

/// The operand-count shape of an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArityClass {
    /// No operands (besides the implicit block).
    Zero,
    /// Exactly one operand.
    Unary,
    /// Exactly two operands.
    Binary,
    /// Exactly three operands.
    Trinary,
    /// A caller-chosen fixed count decided at construction (e.g. `Call`).
    Variable,
    /// Arity tracks an external structure (e.g. `Phi` tracks block arity).
    Dynamic,
    /// No constraint is enforced (used by `Sync`/`End`/`Anchor`-like nodes).
    Any,
}

bitflags::bitflags! {
    /// Per-opcode boolean properties.
    #[derive(Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct OpcodeFlags: u32 {
        /// Produces a control-flow value (mode `X` result or Proj thereof).
        const CFOPCODE    = 1 << 0;
        /// Operands are interchangeable for CSE/canonicalization purposes.
        const COMMUTATIVE = 1 << 1;
        /// May raise an exception (gives rise to `X_regular`/`X_except`).
        const FRAGILE     = 1 << 2;
        /// Produces more than one successor block (e.g. `Cond`).
        const FORKING     = 1 << 3;
        /// A high-level (pre-lowering) construct.
        const HIGHLEVEL   = 1 << 4;
        /// Behaves like a constant for hoisting/CSE purposes.
        const CONSTLIKE   = 1 << 5;
        /// Must be kept alive even with no real uses (anchored at `End`).
        const KEEP        = 1 << 6;
        /// Always lives in the start block (e.g. `Start`, `NoMem`).
        const START_BLOCK = 1 << 7;
        /// Consumes/produces a memory-mode value.
        const USES_MEMORY = 1 << 8;
        /// A target-specific (machine) opcode. Unused by this crate's
        /// closed primordial set; kept for the open-world extension point.
        const MACHINE     = 1 << 9;
        /// A target-specific machine *operation* (as opposed to e.g. a
        /// machine register-class marker).
        const MACHINE_OP  = 1 << 10;
        /// Not considered for CSE-neutral identity comparisons.
        const CSE_NEUTRAL = 1 << 11;
        /// Always worth optimizing even if the flag registry disables the
        /// owning pass.
        const ALWAYS_OPT  = 1 << 12;
        /// Dumpers should not print this node's block.
        const DUMP_NOBLOCK = 1 << 13;
        /// Dumpers should not print this node's inputs.
        const DUMP_NOINPUT = 1 << 14;
    }
}

/// The closed set of opcodes this kernel understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[allow(missing_docs)]
pub enum PrimordialOp {
    Block,
    Start,
    End,
    Jmp,
    IJmp,
    Cond,
    Return,
    Const,
    SymConst,
    Sel,
    Call,
    Builtin,
    Add,
    Sub,
    Minus,
    Mul,
    Mulh,
    Quot,
    Div,
    Mod,
    DivMod,
    Abs,
    And,
    Or,
    Eor,
    Not,
    Cmp,
    Shl,
    Shr,
    Shrs,
    Rotl,
    Conv,
    Cast,
    Carry,
    Borrow,
    Phi,
    Load,
    Store,
    Alloc,
    Free,
    Sync,
    Tuple,
    Proj,
    Id,
    Bad,
    Confirm,
    Unknown,
    Filter,
    Break,
    CallBegin,
    EndReg,
    EndExcept,
    NoMem,
    Mux,
    CopyB,
    InstOf,
    Raise,
    Bound,
    Pin,
    Asm,
    Anchor,
    Deleted,
}

impl PrimordialOp {
    /// Display name, matching this crate's canonical opcode spelling.
    pub const fn name(self) -> &'static str {
        use PrimordialOp::*;
        match self {
            Block => "Block",
            Start => "Start",
            End => "End",
            Jmp => "Jmp",
            IJmp => "IJmp",
            Cond => "Cond",
            Return => "Return",
            Const => "Const",
            SymConst => "SymConst",
            Sel => "Sel",
            Call => "Call",
            Builtin => "Builtin",
            Add => "Add",
            Sub => "Sub",
            Minus => "Minus",
            Mul => "Mul",
            Mulh => "Mulh",
            Quot => "Quot",
            Div => "Div",
            Mod => "Mod",
            DivMod => "DivMod",
            Abs => "Abs",
            And => "And",
            Or => "Or",
            Eor => "Eor",
            Not => "Not",
            Cmp => "Cmp",
            Shl => "Shl",
            Shr => "Shr",
            Shrs => "Shrs",
            Rotl => "Rotl",
            Conv => "Conv",
            Cast => "Cast",
            Carry => "Carry",
            Borrow => "Borrow",
            Phi => "Phi",
            Load => "Load",
            Store => "Store",
            Alloc => "Alloc",
            Free => "Free",
            Sync => "Sync",
            Tuple => "Tuple",
            Proj => "Proj",
            Id => "Id",
            Bad => "Bad",
            Confirm => "Confirm",
            Unknown => "Unknown",
            Filter => "Filter",
            Break => "Break",
            CallBegin => "CallBegin",
            EndReg => "EndReg",
            EndExcept => "EndExcept",
            NoMem => "NoMem",
            Mux => "Mux",
            CopyB => "CopyB",
            InstOf => "InstOf",
            Raise => "Raise",
            Bound => "Bound",
            Pin => "Pin",
            Asm => "ASM",
            Anchor => "Anchor",
            Deleted => "Deleted",
        }
    }

    /// Pin policy for this opcode.
    pub const fn pin_policy(self) -> PinPolicy {
        use PrimordialOp::*;
        match self {
            Load | Store | CopyB | Bound => PinPolicy::ExcPinned,
            Call | Quot | Div | Mod | DivMod | Alloc | Free | Raise | InstOf => {
                PinPolicy::MemPinned
            }
            Block | Start | End | Jmp | IJmp | Cond | Return | Sync | Tuple | Proj | Id
            | Bad | Unknown | Filter | Break | CallBegin | EndReg | EndExcept | NoMem
            | Anchor | Deleted | Phi => PinPolicy::Pinned,
            _ => PinPolicy::Floats,
        }
    }

    /// Arity class for this opcode.
    pub const fn arity_class(self) -> ArityClass {
        use PrimordialOp::*;
        match self {
            Start | Const | SymConst | Bad | Unknown | NoMem => ArityClass::Zero,
            Minus | Not | Conv | Cast | IJmp | Jmp => ArityClass::Unary,
            Add | Sub | Mul | Mulh | And | Or | Eor | Shl | Shr | Shrs | Rotl | Cmp | Proj
            | Confirm | Free => ArityClass::Binary,
            Quot | Div | Mod | Mux | CopyB | Store => ArityClass::Trinary,
            Call | Sel | Builtin | Alloc | Bound | Raise | Return | InstOf | DivMod | Load => {
                ArityClass::Variable
            }
            Phi | Block => ArityClass::Dynamic,
            Sync | End | Anchor | Asm | Cond | Tuple | Id | CallBegin | EndReg | EndExcept
            | Pin | Filter | Break | Carry | Borrow | Abs | Deleted => ArityClass::Any,
        }
    }

    /// Flag bitset for this opcode.
    pub fn flags(self) -> OpcodeFlags {
        use PrimordialOp::*;
        let mut f = OpcodeFlags::empty();
        match self {
            Jmp | IJmp | Cond | Raise | InstOf | Call | Quot | Div | Mod | DivMod | Load
            | Store | Alloc | CopyB | Bound | Start | End => f |= OpcodeFlags::CFOPCODE,
            _ => {}
        }
        if matches!(self, Add | Mul | And | Or | Eor | Cmp) {
            f |= OpcodeFlags::COMMUTATIVE;
        }
        if matches!(
            self,
            Call | Quot | Div | Mod | DivMod | Load | Store | Alloc | Free | CopyB | Bound
                | Raise | InstOf
        ) {
            f |= OpcodeFlags::FRAGILE;
        }
        if matches!(self, Cond) {
            f |= OpcodeFlags::FORKING;
        }
        if matches!(self, Const | SymConst) {
            f |= OpcodeFlags::CONSTLIKE;
        }
        if matches!(self, Call | Store | Raise | Alloc | Free) {
            f |= OpcodeFlags::KEEP;
        }
        if matches!(self, Start | NoMem | Bad) {
            f |= OpcodeFlags::START_BLOCK;
        }
        if matches!(
            self,
            Call | Load | Store | Alloc | Free | CopyB | Sync | Raise
        ) {
            f |= OpcodeFlags::USES_MEMORY;
        }
        if matches!(self, Proj | Id | Bad | Unknown | Deleted | Anchor) {
            f |= OpcodeFlags::CSE_NEUTRAL;
        }
        f
    }

    /// True if this opcode's node carries an interior attribute blob that
    /// must be deep-copied on [`crate::graph::Graph::exact_copy`].
    pub const fn deep_copies_attrs(self) -> bool {
        matches!(
            self,
            PrimordialOp::Block | PrimordialOp::Phi | PrimordialOp::Filter | PrimordialOp::Asm
        )
    }
}

/// Metadata record for one registered opcode.
#[derive(Debug, Clone)]
pub struct OpcodeDef {
    /// Stable id.
    pub id: OpcodeId,
    /// Display name.
    pub name: &'static str,
    /// Pin policy.
    pub pin: PinPolicy,
    /// Arity class.
    pub arity: ArityClass,
    /// Size, in bytes, of the opcode's attribute blob (informational in
    /// this implementation, since [`crate::node::Attrs`] is a tagged enum
    /// rather than a raw byte blob).
    pub attr_size: usize,
    /// Flag bitset.
    pub flags: OpcodeFlags,
    /// The primordial opcode this entry describes, for closed-world
    /// dispatch.
    pub primordial: Option<PrimordialOp>,
}

/// The process-wide opcode registry.
///
/// A process normally only ever touches [`OpcodeTable::global`], which is
/// seeded once with the primordial set and mutated only during
/// initialization/teardown.
#[derive(Debug, Default)]
pub struct OpcodeTable {
    defs: Vec<OpcodeDef>,
    by_name: HashMap<&'static str, OpcodeId>,
    by_primordial: HashMap<PrimordialOp, OpcodeId>,
}

impl OpcodeTable {
    /// An empty table with no opcodes registered.
    pub fn new_empty() -> Self {
        Self::default()
    }

    /// Seed a fresh table with the primordial opcode set.
    pub fn with_primordials() -> Self {
        let mut table = Self::new_empty();
        for op in PrimordialOp::iter() {
            table.register_opcode(
                op.name(),
                op.pin_policy(),
                op.flags(),
                op.arity_class(),
                0,
                Some(op),
            );
        }
        table
    }

    /// Register a new opcode and return its freshly issued id.
    pub fn register_opcode(
        &mut self,
        name: &'static str,
        pin: PinPolicy,
        flags: OpcodeFlags,
        arity: ArityClass,
        attr_size: usize,
        primordial: Option<PrimordialOp>,
    ) -> OpcodeId {
        let id = self.next_opcode_id();
        self.defs.push(OpcodeDef {
            id,
            name,
            pin,
            arity,
            attr_size,
            flags,
            primordial,
        });
        self.by_name.insert(name, id);
        if let Some(op) = primordial {
            self.by_primordial.insert(op, id);
        }
        id
    }

    /// The id that will be assigned to the next registered opcode.
    pub fn next_opcode_id(&self) -> OpcodeId {
        OpcodeId(self.defs.len() as u16)
    }

    /// Look up an opcode's metadata by id.
    pub fn get(&self, id: OpcodeId) -> &OpcodeDef {
        &self.defs[id.0 as usize]
    }

    /// Look up an opcode id by name.
    pub fn id_of(&self, name: &str) -> Option<OpcodeId> {
        self.by_name.get(name).copied()
    }

    /// Metadata for a primordial opcode.
    pub fn def(&self, op: PrimordialOp) -> &OpcodeDef {
        let id = self.by_primordial[&op];
        self.get(id)
    }

    /// The process-wide, lazily seeded opcode table.
    pub fn global() -> &'static OpcodeTable {
        static TABLE: OnceLock<OpcodeTable> = OnceLock::new();
        TABLE.get_or_init(OpcodeTable::with_primordials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_primordials_are_registered_exactly_once() {
        let table = OpcodeTable::global();
        let mut seen = std::collections::HashSet::new();
        for op in PrimordialOp::iter() {
            let def = table.def(op);
            assert_eq!(def.name, op.name());
            assert!(seen.insert(op), "duplicate registration for {op:?}");
        }
    }

    #[test]
    fn cond_is_forking_and_cfopcode() {
        let table = OpcodeTable::global();
        let def = table.def(PrimordialOp::Cond);
        assert!(def.flags.contains(OpcodeFlags::FORKING));
        assert!(def.flags.contains(OpcodeFlags::CFOPCODE));
    }
}
