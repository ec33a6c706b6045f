//! Target-independent constant values ("tarvals") and the comparison
//! relation lattice, consumed by constant folding's `computed_value_Cmp`.

use core::fmt;

use crate::mode::Mode;

bitflags::bitflags! {
    /// A set of possible outcomes of comparing two values, as returned by
    /// `Cmp` and consumed by its `Proj`s. Kept as a bitmask rather than a
    /// single enum so a comparison can express a disjunction of outcomes
    /// (e.g. `LESS_EQUAL`) as a single value.
    #[derive(Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Relation: u8 {
        /// Left operand is less than right.
        const LESS = 0b0001;
        /// Operands are equal.
        const EQUAL = 0b0010;
        /// Left operand is greater than right.
        const GREATER = 0b0100;
        /// Operands are unordered (NaN involved); valid only for float Cmp.
        const UNORDERED = 0b1000;
    }
}

impl Relation {
    /// `<=`
    pub const LESS_EQUAL: Relation = Relation::LESS.union(Relation::EQUAL);
    /// `>=`
    pub const GREATER_EQUAL: Relation = Relation::GREATER.union(Relation::EQUAL);
    /// `!=` for ordered operands (the `UNORDERED` bit is added separately
    /// for float `!=` semantics, since NaN makes every ordered relation
    /// false).
    pub const LESS_GREATER: Relation = Relation::LESS.union(Relation::GREATER);
    /// No relation holds; an always-false comparison.
    pub const FALSE: Relation = Relation::empty();
    /// Every relation holds; an always-true comparison.
    pub const TRUE: Relation = Relation::LESS
        .union(Relation::EQUAL)
        .union(Relation::GREATER)
        .union(Relation::UNORDERED);

    /// Complement within the full relation lattice: the set of outcomes
    /// that make this relation *not* hold.
    pub const fn negate(self) -> Relation {
        Self::TRUE.difference(self)
    }

    /// True if the relation bitmask includes `outcome`.
    pub const fn is_satisfied_by(self, outcome: Relation) -> bool {
        self.intersects(outcome)
    }

    /// True if this relation bitmask is only legal for a float `Cmp`
    /// (carries the `UNORDERED` bit).
    pub const fn requires_float(self) -> bool {
        self.contains(Relation::UNORDERED)
    }
}

/// The payload of a tarval once its mode has pinned down how to interpret
/// it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
enum Repr {
    /// Raw bit pattern for an integer mode, already wrapped to its width.
    Int(i128),
    /// IEEE float payload, stored widened to `f64`.
    Float(f64),
    /// The `true` boolean constant.
    True,
    /// The `false` boolean constant.
    False,
    /// The undefined/bad constant (absorbing for arithmetic and
    /// comparison).
    Bad,
}

/// A target-representable constant value: a `(mode, value)` pair.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tarval {
    mode: Mode,
    repr: Repr,
}

impl Tarval {
    /// The undefined constant in the given mode.
    pub const fn bad(mode: Mode) -> Self {
        Tarval {
            mode,
            repr: Repr::Bad,
        }
    }

    /// The boolean `true` constant.
    pub const fn tarval_true() -> Self {
        Tarval {
            mode: Mode::Bool,
            repr: Repr::True,
        }
    }

    /// The boolean `false` constant.
    pub const fn tarval_false() -> Self {
        Tarval {
            mode: Mode::Bool,
            repr: Repr::False,
        }
    }

    /// Build an integer constant, wrapping it to `mode`'s width first.
    ///
    /// # Panics
    /// Panics if `mode` is not an integer mode; callers are expected to
    /// have checked the mode already (constant folding only calls this
    /// with modes it just read off an existing node).
    pub fn from_i128(mode: Mode, value: i128) -> Self {
        assert!(mode.is_int(), "Tarval::from_i128 requires an integer mode");
        Tarval {
            mode,
            repr: Repr::Int(wrap_to_width(mode, value)),
        }
    }

    /// Build a float constant.
    pub fn from_f64(mode: Mode, value: f64) -> Self {
        assert!(mode.is_float(), "Tarval::from_f64 requires a float mode");
        Tarval {
            mode,
            repr: Repr::Float(value),
        }
    }

    /// The mode this tarval is tagged with.
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// True if this is the absorbing `bad` constant.
    pub const fn is_bad(&self) -> bool {
        matches!(self.repr, Repr::Bad)
    }

    /// True if this is the boolean `true` constant.
    pub const fn is_true(&self) -> bool {
        matches!(self.repr, Repr::True)
    }

    /// True if this is the boolean `false` constant.
    pub const fn is_false(&self) -> bool {
        matches!(self.repr, Repr::False)
    }

    /// The raw integer value, if this is a (non-bad) integer constant.
    pub const fn as_i128(&self) -> Option<i128> {
        match self.repr {
            Repr::Int(v) => Some(v),
            _ => None,
        }
    }

    /// The raw float value, if this is a (non-bad) float constant.
    pub const fn as_f64(&self) -> Option<f64> {
        match self.repr {
            Repr::Float(v) => Some(v),
            _ => None,
        }
    }

    /// True if this tarval is the additive identity (`0`) for its mode.
    pub fn is_zero(&self) -> bool {
        match self.repr {
            Repr::Int(v) => v == 0,
            Repr::Float(v) => v == 0.0,
            _ => false,
        }
    }

    /// True if this tarval is the multiplicative identity (`1`) for its
    /// mode.
    pub fn is_one(&self) -> bool {
        match self.repr {
            Repr::Int(v) => v == 1,
            Repr::Float(v) => v == 1.0,
            _ => false,
        }
    }

    /// Binary integer/float addition with width-correct wrapping. Returns
    /// `bad` if either operand is bad or the modes mismatch.
    pub fn add(&self, other: &Tarval) -> Tarval {
        self.binop(other, |a, b| a.wrapping_add(b), |a, b| a + b)
    }

    /// Binary subtraction, see [`Tarval::add`].
    pub fn sub(&self, other: &Tarval) -> Tarval {
        self.binop(other, |a, b| a.wrapping_sub(b), |a, b| a - b)
    }

    /// Binary multiplication, see [`Tarval::add`].
    pub fn mul(&self, other: &Tarval) -> Tarval {
        self.binop(other, |a, b| a.wrapping_mul(b), |a, b| a * b)
    }

    /// Bitwise AND (integer modes only).
    pub fn and(&self, other: &Tarval) -> Tarval {
        self.int_binop(other, |a, b| a & b)
    }

    /// Bitwise OR (integer modes only).
    pub fn or(&self, other: &Tarval) -> Tarval {
        self.int_binop(other, |a, b| a | b)
    }

    /// Bitwise XOR (integer modes only).
    pub fn eor(&self, other: &Tarval) -> Tarval {
        self.int_binop(other, |a, b| a ^ b)
    }

    /// Arithmetic negation.
    pub fn neg(&self) -> Tarval {
        match self.repr {
            Repr::Int(v) => Tarval::from_i128(self.mode, v.wrapping_neg()),
            Repr::Float(v) => Tarval::from_f64(self.mode, -v),
            _ => Tarval::bad(self.mode),
        }
    }

    fn binop(
        &self,
        other: &Tarval,
        int_op: impl Fn(i128, i128) -> i128,
        float_op: impl Fn(f64, f64) -> f64,
    ) -> Tarval {
        if self.mode != other.mode {
            return Tarval::bad(self.mode);
        }
        match (self.repr, other.repr) {
            (Repr::Int(a), Repr::Int(b)) => Tarval::from_i128(self.mode, int_op(a, b)),
            (Repr::Float(a), Repr::Float(b)) => Tarval::from_f64(self.mode, float_op(a, b)),
            _ => Tarval::bad(self.mode),
        }
    }

    fn int_binop(&self, other: &Tarval, op: impl Fn(i128, i128) -> i128) -> Tarval {
        if self.mode != other.mode || !self.mode.is_int() {
            return Tarval::bad(self.mode);
        }
        match (self.repr, other.repr) {
            (Repr::Int(a), Repr::Int(b)) => Tarval::from_i128(self.mode, op(a, b)),
            _ => Tarval::bad(self.mode),
        }
    }

    /// Compare two tarvals, producing a relation bitmask with exactly one
    /// of `LESS`/`EQUAL`/`GREATER`/`UNORDERED` set (unless one side is
    /// `bad`, in which case every bit is set: an undecidable comparison).
    pub fn compare(&self, other: &Tarval) -> Relation {
        if self.mode != other.mode || self.is_bad() || other.is_bad() {
            return Relation::TRUE;
        }
        match (self.repr, other.repr) {
            (Repr::Int(a), Repr::Int(b)) => match a.cmp(&b) {
                core::cmp::Ordering::Less => Relation::LESS,
                core::cmp::Ordering::Equal => Relation::EQUAL,
                core::cmp::Ordering::Greater => Relation::GREATER,
            },
            (Repr::Float(a), Repr::Float(b)) => {
                if a.is_nan() || b.is_nan() {
                    Relation::UNORDERED
                } else if a < b {
                    Relation::LESS
                } else if a > b {
                    Relation::GREATER
                } else {
                    Relation::EQUAL
                }
            }
            (Repr::True, Repr::True) | (Repr::False, Repr::False) => Relation::EQUAL,
            (Repr::True, Repr::False) => Relation::GREATER,
            (Repr::False, Repr::True) => Relation::LESS,
            _ => Relation::TRUE,
        }
    }
}

impl fmt::Display for Tarval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.repr {
            Repr::Int(v) => write!(f, "{v}:{}", self.mode),
            Repr::Float(v) => write!(f, "{v}:{}", self.mode),
            Repr::True => write!(f, "true"),
            Repr::False => write!(f, "false"),
            Repr::Bad => write!(f, "bad:{}", self.mode),
        }
    }
}

/// Wrap a 128-bit value down to `mode`'s bit width, respecting
/// signed/unsigned interpretation.
fn wrap_to_width(mode: Mode, value: i128) -> i128 {
    let bits = mode.bits().unwrap_or(64);
    if bits >= 128 {
        return value;
    }
    let mask: i128 = (1i128 << bits) - 1;
    let truncated = value & mask;
    match mode {
        Mode::IntS(_) => {
            let sign_bit = 1i128 << (bits - 1);
            if truncated & sign_bit != 0 {
                truncated - (1i128 << bits)
            } else {
                truncated
            }
        }
        _ => truncated,
    }
}
