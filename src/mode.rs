//! Value universes ("modes") for the IR kernel.
//!
//! Every node has a mode that fixes which universe its value lives in:
//! signed/unsigned integers of a given width, floats, references, the
//! boolean mode `b`, and the three structural modes `M` (memory), `X`
//! (control) and `T` (tuple).

use core::fmt;

/// A value universe.
///
/// `Mode` is `Copy` and small enough to pass by value everywhere; it never
/// needs arena allocation, unlike `Node` or `Tarval`'s payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    /// Signed integer of the given bit width (8, 16, 32, 64, or 128).
    IntS(u8),
    /// Unsigned integer of the given bit width.
    IntU(u8),
    /// IEEE-754-ish float of the given bit width (32 or 64).
    Float(u8),
    /// Reference (pointer) mode.
    Ref,
    /// Boolean mode `b`, the result of `Cmp`/`Proj`.
    Bool,
    /// Memory mode `M`.
    Memory,
    /// Control mode `X`.
    Control,
    /// Tuple mode `T`.
    Tuple,
    /// The bad/undefined mode, carried only by the `Bad` anchor.
    BadMode,
}

impl Mode {
    /// Canonical 64-bit signed integer mode, the default for `Word`-sized
    /// arithmetic in examples and tests.
    pub const ISIZE: Mode = Mode::IntS(64);
    /// Canonical 64-bit unsigned integer mode.
    pub const USIZE: Mode = Mode::IntU(64);
    /// Memory mode singleton `M`.
    pub const M: Mode = Mode::Memory;
    /// Control mode singleton `X`.
    pub const X: Mode = Mode::Control;
    /// Tuple mode singleton `T`.
    pub const T: Mode = Mode::Tuple;
    /// Boolean mode singleton `b`.
    pub const B: Mode = Mode::Bool;

    /// True for signed or unsigned integer modes.
    pub const fn is_int(self) -> bool {
        matches!(self, Mode::IntS(_) | Mode::IntU(_))
    }

    /// True for the float mode.
    pub const fn is_float(self) -> bool {
        matches!(self, Mode::Float(_))
    }

    /// True for the reference mode.
    pub const fn is_reference(self) -> bool {
        matches!(self, Mode::Ref)
    }

    /// True for modes that carry a data value usable as an operand of a
    /// data operation: int, float, or reference. Excludes `b`.
    pub const fn is_data(self) -> bool {
        self.is_int() || self.is_float() || self.is_reference()
    }

    /// True for "data or boolean": everything `is_data` accepts, plus `b`.
    /// Used by the `Return`/`Phi`/`Mux` operand-mode rules.
    pub const fn is_datab(self) -> bool {
        self.is_data() || matches!(self, Mode::Bool)
    }

    /// True for int or float modes (arithmetic-capable).
    pub const fn is_num(self) -> bool {
        self.is_int() || self.is_float()
    }

    /// True if this mode distinguishes `+0` from `-0` and thus must not be
    /// folded across sign-insensitive identities (used by local-opt
    /// algebraic-identity rules to skip unsafe float rewrites).
    pub const fn honors_signed_zeros(self) -> bool {
        self.is_float()
    }

    /// True for the boolean mode.
    pub const fn is_bool(self) -> bool {
        matches!(self, Mode::Bool)
    }

    /// True for the memory mode.
    pub const fn is_mem(self) -> bool {
        matches!(self, Mode::Memory)
    }

    /// True for the control mode.
    pub const fn is_control(self) -> bool {
        matches!(self, Mode::Control)
    }

    /// True for the tuple mode.
    pub const fn is_tuple(self) -> bool {
        matches!(self, Mode::Tuple)
    }

    /// Bit width for numeric modes, if any.
    pub const fn bits(self) -> Option<u8> {
        match self {
            Mode::IntS(w) | Mode::IntU(w) | Mode::Float(w) => Some(w),
            _ => None,
        }
    }

    /// True if this is an unsigned integer mode. The shift-amount operand
    /// of `Shl`/`Shr`/`Shrs` is required to carry this mode, independent of
    /// the shifted value's own (possibly signed) mode.
    pub const fn is_unsigned_int(self) -> bool {
        matches!(self, Mode::IntU(_))
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::IntS(w) => write!(f, "Is{w}"),
            Mode::IntU(w) => write!(f, "Iu{w}"),
            Mode::Float(w) => write!(f, "F{w}"),
            Mode::Ref => write!(f, "P"),
            Mode::Bool => write!(f, "b"),
            Mode::Memory => write!(f, "M"),
            Mode::Control => write!(f, "X"),
            Mode::Tuple => write!(f, "T"),
            Mode::BadMode => write!(f, "BAD"),
        }
    }
}
