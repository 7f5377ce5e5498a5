//! Floating-point arithmetic.
//!
//! Division by zero and results outside a function's real domain (square
//! root or logarithm of a negative number) are faults rather than NaN or
//! infinity.

use cf_core::{CircuitResult, ComputeFault};
use cf_engine::{Circuit, NodeRef};

use crate::template::{BinaryFunctor, NToOne, UnaryFunctor, UnaryFn};

pub type FltUnary = UnaryFunctor<f64, f64>;
pub type FltBinary = BinaryFunctor<f64, f64, f64>;
pub type FltReduce = NToOne<f64>;

fn finite(value: f64, what: &'static str) -> Result<f64, ComputeFault> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ComputeFault::Domain { what })
    }
}

fn checked_div(a: f64, b: f64) -> Result<f64, ComputeFault> {
    if b == 0.0 {
        return Err(ComputeFault::DivideByZero);
    }
    finite(a / b, "division result")
}

pub fn add(circuit: &mut Circuit, arity: usize) -> CircuitResult<NodeRef<FltReduce>> {
    NToOne::add(circuit, "FltAdd", arity, 2, |v| Ok(v.iter().sum()))
}

pub fn mul(circuit: &mut Circuit, arity: usize) -> CircuitResult<NodeRef<FltReduce>> {
    NToOne::add(circuit, "FltMul", arity, 2, |v| Ok(v.iter().product()))
}

pub fn sub(circuit: &mut Circuit) -> CircuitResult<NodeRef<FltBinary>> {
    BinaryFunctor::add(circuit, "FltSub", |a: f64, b: f64| Ok(a - b))
}

pub fn div(circuit: &mut Circuit) -> CircuitResult<NodeRef<FltBinary>> {
    BinaryFunctor::add(circuit, "FltDiv", checked_div)
}

pub fn modulo(circuit: &mut Circuit) -> CircuitResult<NodeRef<FltBinary>> {
    BinaryFunctor::add(circuit, "FltMod", |a: f64, b: f64| {
        if b == 0.0 {
            Err(ComputeFault::DivideByZero)
        } else {
            Ok(a % b)
        }
    })
}

pub fn pow(circuit: &mut Circuit) -> CircuitResult<NodeRef<FltBinary>> {
    BinaryFunctor::add(circuit, "FltPow", |a: f64, b: f64| finite(a.powf(b), "power"))
}

/// Logarithm of `a` in base `b`.
pub fn log_n(circuit: &mut Circuit) -> CircuitResult<NodeRef<FltBinary>> {
    BinaryFunctor::add(circuit, "FltLogN", |a: f64, b: f64| {
        if a <= 0.0 || b <= 0.0 || b == 1.0 {
            Err(ComputeFault::Domain { what: "logarithm" })
        } else {
            Ok(a.log(b))
        }
    })
}

pub fn min(circuit: &mut Circuit) -> CircuitResult<NodeRef<FltBinary>> {
    BinaryFunctor::add(circuit, "FltMin", |a: f64, b: f64| Ok(a.min(b)))
}

pub fn max(circuit: &mut Circuit) -> CircuitResult<NodeRef<FltBinary>> {
    BinaryFunctor::add(circuit, "FltMax", |a: f64, b: f64| Ok(a.max(b)))
}

/// Named single-argument functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FltFn {
    Abs,
    Neg,
    Sign,
    Inv,
    Sqrt,
    Exp,
    Log,
    Sin,
    Cos,
    Tan,
    Floor,
    Ceil,
    Round,
}

impl FltFn {
    fn kind(self) -> &'static str {
        match self {
            FltFn::Abs => "FltAbs",
            FltFn::Neg => "FltNeg",
            FltFn::Sign => "FltSign",
            FltFn::Inv => "FltInv",
            FltFn::Sqrt => "FltSqrt",
            FltFn::Exp => "FltExp",
            FltFn::Log => "FltLog",
            FltFn::Sin => "FltSin",
            FltFn::Cos => "FltCos",
            FltFn::Tan => "FltTan",
            FltFn::Floor => "FltFloor",
            FltFn::Ceil => "FltCeil",
            FltFn::Round => "FltRound",
        }
    }

    fn func(self) -> UnaryFn<f64, f64> {
        match self {
            FltFn::Abs => |a| Ok(a.abs()),
            FltFn::Neg => |a| Ok(-a),
            FltFn::Sign => |a| Ok(if a == 0.0 { 0.0 } else { a.signum() }),
            FltFn::Inv => |a| checked_div(1.0, a),
            FltFn::Sqrt => |a| {
                if a < 0.0 {
                    Err(ComputeFault::Domain { what: "square root" })
                } else {
                    Ok(a.sqrt())
                }
            },
            FltFn::Exp => |a| finite(a.exp(), "exponential"),
            FltFn::Log => |a| {
                if a <= 0.0 {
                    Err(ComputeFault::Domain { what: "logarithm" })
                } else {
                    Ok(a.ln())
                }
            },
            FltFn::Sin => |a| Ok(a.sin()),
            FltFn::Cos => |a| Ok(a.cos()),
            FltFn::Tan => |a| finite(a.tan(), "tangent"),
            FltFn::Floor => |a| Ok(a.floor()),
            FltFn::Ceil => |a| Ok(a.ceil()),
            FltFn::Round => |a| Ok(a.round()),
        }
    }
}

pub fn unary(circuit: &mut Circuit, op: FltFn) -> CircuitResult<NodeRef<FltUnary>> {
    UnaryFunctor::add(circuit, op.kind(), op.func())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_faults() {
        assert_eq!(
            (FltFn::Sqrt.func())(-1.0),
            Err(ComputeFault::Domain { what: "square root" })
        );
        assert_eq!((FltFn::Sqrt.func())(9.0), Ok(3.0));
        assert!((FltFn::Log.func())(0.0).is_err());
        assert_eq!((FltFn::Inv.func())(0.0), Err(ComputeFault::DivideByZero));
        assert_eq!((FltFn::Sign.func())(-2.5), Ok(-1.0));
    }

    #[test]
    fn division_by_zero_is_a_fault() {
        assert_eq!(checked_div(1.0, 0.0), Err(ComputeFault::DivideByZero));
        assert_eq!(checked_div(3.0, 2.0), Ok(1.5));
    }
}
