//! Property-based tests for the tarval/relation lattice.

use graphir::mode::Mode;
use graphir::tarval::{Relation, Tarval};
use quickcheck_macros::quickcheck;

const MODE: Mode = Mode::IntS(32);

fn tv(v: i64) -> Tarval {
    Tarval::from_i128(MODE, v as i128)
}

#[quickcheck]
fn addition_of_same_mode_integers_is_commutative(a: i64, b: i64) -> bool {
    tv(a).add(&tv(b)) == tv(b).add(&tv(a))
}

#[quickcheck]
fn multiplication_of_same_mode_integers_is_commutative(a: i64, b: i64) -> bool {
    tv(a).mul(&tv(b)) == tv(b).mul(&tv(a))
}

#[quickcheck]
fn subtracting_a_value_from_itself_is_always_zero(a: i64) -> bool {
    tv(a).sub(&tv(a)) == tv(0)
}

#[quickcheck]
fn double_negation_is_the_identity(a: i64) -> bool {
    tv(a).neg().neg() == tv(a)
}

#[quickcheck]
fn relation_negate_is_an_involution(bits: u8) -> bool {
    let r = Relation::from_bits_truncate(bits);
    r.negate().negate() == r
}

#[quickcheck]
fn a_relation_and_its_negation_never_both_hold_for_the_same_outcome(bits: u8, outcome_bits: u8) -> bool {
    let r = Relation::from_bits_truncate(bits);
    let outcome = Relation::from_bits_truncate(outcome_bits & 0b1111);
    // `outcome` is a single observed comparison result, i.e. at most one bit
    // of the four; for such an outcome `r` and `r.negate()` are mutually
    // exclusive by construction (`negate` is `TRUE.difference(r)`).
    if outcome.bits().count_ones() > 1 {
        return true;
    }
    !(r.is_satisfied_by(outcome) && r.negate().is_satisfied_by(outcome))
}
