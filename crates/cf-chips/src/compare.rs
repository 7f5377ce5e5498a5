//! Comparators over any ordered port value.

use cf_core::{CircuitResult, PortValue};
use cf_engine::{Circuit, NodeRef};

use crate::template::{BinaryComparator, BinaryFunctor};

pub fn eq<T: PortValue>(circuit: &mut Circuit) -> CircuitResult<NodeRef<BinaryComparator<T>>> {
    BinaryFunctor::add(circuit, "EQ", |a: T, b: T| Ok(a == b))
}

pub fn ne<T: PortValue>(circuit: &mut Circuit) -> CircuitResult<NodeRef<BinaryComparator<T>>> {
    BinaryFunctor::add(circuit, "NEQ", |a: T, b: T| Ok(a != b))
}

pub fn lt<T: PortValue + PartialOrd>(
    circuit: &mut Circuit,
) -> CircuitResult<NodeRef<BinaryComparator<T>>> {
    BinaryFunctor::add(circuit, "LT", |a: T, b: T| Ok(a < b))
}

pub fn gt<T: PortValue + PartialOrd>(
    circuit: &mut Circuit,
) -> CircuitResult<NodeRef<BinaryComparator<T>>> {
    BinaryFunctor::add(circuit, "GT", |a: T, b: T| Ok(a > b))
}

pub fn le<T: PortValue + PartialOrd>(
    circuit: &mut Circuit,
) -> CircuitResult<NodeRef<BinaryComparator<T>>> {
    BinaryFunctor::add(circuit, "LTE", |a: T, b: T| Ok(a <= b))
}

pub fn ge<T: PortValue + PartialOrd>(
    circuit: &mut Circuit,
) -> CircuitResult<NodeRef<BinaryComparator<T>>> {
    BinaryFunctor::add(circuit, "GTE", |a: T, b: T| Ok(a >= b))
}
