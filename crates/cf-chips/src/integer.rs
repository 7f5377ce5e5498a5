//! 64-bit integer arithmetic. Division by zero and overflow are faults.

use cf_core::{CircuitResult, ComputeFault};
use cf_engine::{Circuit, NodeRef};

use crate::template::{BinaryFunctor, NToOne, UnaryFunctor};

pub type IntUnary = UnaryFunctor<i64, i64>;
pub type IntBinary = BinaryFunctor<i64, i64, i64>;
pub type IntReduce = NToOne<i64>;

fn checked_sum(values: &[i64]) -> Result<i64, ComputeFault> {
    values
        .iter()
        .try_fold(0_i64, |acc, v| acc.checked_add(*v))
        .ok_or(ComputeFault::Overflow)
}

fn checked_product(values: &[i64]) -> Result<i64, ComputeFault> {
    values
        .iter()
        .try_fold(1_i64, |acc, v| acc.checked_mul(*v))
        .ok_or(ComputeFault::Overflow)
}

fn checked_div(a: i64, b: i64) -> Result<i64, ComputeFault> {
    if b == 0 {
        return Err(ComputeFault::DivideByZero);
    }
    a.checked_div(b).ok_or(ComputeFault::Overflow)
}

fn checked_rem(a: i64, b: i64) -> Result<i64, ComputeFault> {
    if b == 0 {
        return Err(ComputeFault::DivideByZero);
    }
    a.checked_rem(b).ok_or(ComputeFault::Overflow)
}

pub fn add(circuit: &mut Circuit, arity: usize) -> CircuitResult<NodeRef<IntReduce>> {
    NToOne::add(circuit, "IntAdd", arity, 2, checked_sum)
}

pub fn mul(circuit: &mut Circuit, arity: usize) -> CircuitResult<NodeRef<IntReduce>> {
    NToOne::add(circuit, "IntMul", arity, 2, checked_product)
}

pub fn sub(circuit: &mut Circuit) -> CircuitResult<NodeRef<IntBinary>> {
    BinaryFunctor::add(circuit, "IntSub", |a: i64, b: i64| {
        a.checked_sub(b).ok_or(ComputeFault::Overflow)
    })
}

pub fn div(circuit: &mut Circuit) -> CircuitResult<NodeRef<IntBinary>> {
    BinaryFunctor::add(circuit, "IntDiv", checked_div)
}

pub fn modulo(circuit: &mut Circuit) -> CircuitResult<NodeRef<IntBinary>> {
    BinaryFunctor::add(circuit, "IntMod", checked_rem)
}

pub fn min(circuit: &mut Circuit) -> CircuitResult<NodeRef<IntBinary>> {
    BinaryFunctor::add(circuit, "IntMin", |a: i64, b: i64| Ok(a.min(b)))
}

pub fn max(circuit: &mut Circuit) -> CircuitResult<NodeRef<IntBinary>> {
    BinaryFunctor::add(circuit, "IntMax", |a: i64, b: i64| Ok(a.max(b)))
}

pub fn abs(circuit: &mut Circuit) -> CircuitResult<NodeRef<IntUnary>> {
    UnaryFunctor::add(circuit, "IntAbs", |a: i64| {
        a.checked_abs().ok_or(ComputeFault::Overflow)
    })
}

pub fn neg(circuit: &mut Circuit) -> CircuitResult<NodeRef<IntUnary>> {
    UnaryFunctor::add(circuit, "IntNeg", |a: i64| {
        a.checked_neg().ok_or(ComputeFault::Overflow)
    })
}

pub fn sign(circuit: &mut Circuit) -> CircuitResult<NodeRef<IntUnary>> {
    UnaryFunctor::add(circuit, "IntSign", |a: i64| Ok(a.signum()))
}

/// Integer reciprocal `1 / a`, truncated.
pub fn inv(circuit: &mut Circuit) -> CircuitResult<NodeRef<IntUnary>> {
    UnaryFunctor::add(circuit, "IntInv", |a: i64| checked_div(1, a))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn division_faults() {
        assert_eq!(checked_div(1, 0), Err(ComputeFault::DivideByZero));
        assert_eq!(checked_div(i64::MIN, -1), Err(ComputeFault::Overflow));
        assert_eq!(checked_div(7, 2), Ok(3));
        assert_eq!(checked_rem(7, 0), Err(ComputeFault::DivideByZero));
        assert_eq!(checked_rem(-7, 2), Ok(-1));
    }

    #[test]
    fn folds_detect_overflow() {
        assert_eq!(checked_sum(&[1, 2, 3]), Ok(6));
        assert_eq!(checked_sum(&[i64::MAX, 1]), Err(ComputeFault::Overflow));
        assert_eq!(checked_product(&[2, 3, 4]), Ok(24));
        assert_eq!(checked_product(&[i64::MAX, 2]), Err(ComputeFault::Overflow));
    }
}
