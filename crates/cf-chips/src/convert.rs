//! Conversions between the primitive port types.

use std::fmt::Display;
use std::str::FromStr;

use cf_core::{CircuitResult, ComputeFault, PortValue};
use cf_engine::{Circuit, NodeRef};

use crate::template::UnaryFunctor;

/// `i64` to `f64`. Precision loss above 2^53 is accepted.
pub fn int_to_float(circuit: &mut Circuit) -> CircuitResult<NodeRef<UnaryFunctor<i64, f64>>> {
    UnaryFunctor::add(circuit, "IntToFlt", |a: i64| Ok(a as f64))
}

/// `f64` to `i64`, truncating toward zero.
pub fn float_to_int(circuit: &mut Circuit) -> CircuitResult<NodeRef<UnaryFunctor<f64, i64>>> {
    UnaryFunctor::add(circuit, "FltToInt", truncate)
}

fn truncate(a: f64) -> Result<i64, ComputeFault> {
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if a.is_nan() || a >= LIMIT || a < -LIMIT {
        return Err(ComputeFault::Domain {
            what: "float out of integer range",
        });
    }
    Ok(a.trunc() as i64)
}

pub fn bool_to_int(circuit: &mut Circuit) -> CircuitResult<NodeRef<UnaryFunctor<bool, i64>>> {
    UnaryFunctor::add(circuit, "BoolToInt", |a: bool| Ok(i64::from(a)))
}

/// Nonzero is true.
pub fn int_to_bool(circuit: &mut Circuit) -> CircuitResult<NodeRef<UnaryFunctor<i64, bool>>> {
    UnaryFunctor::add(circuit, "IntToBool", |a: i64| Ok(a != 0))
}

/// Formats any displayable value.
pub fn display<T: PortValue + Display>(
    circuit: &mut Circuit,
) -> CircuitResult<NodeRef<UnaryFunctor<T, String>>> {
    UnaryFunctor::add(circuit, "ToString", |a: T| Ok(a.to_string()))
}

/// Parses text into `T`. Surrounding whitespace is ignored.
pub fn parse<T: PortValue + FromStr>(
    circuit: &mut Circuit,
) -> CircuitResult<NodeRef<UnaryFunctor<String, T>>> {
    UnaryFunctor::add(circuit, "Parse", parse_text::<T>)
}

fn parse_text<T: FromStr>(text: String) -> Result<T, ComputeFault> {
    text.trim().parse::<T>().map_err(|_| ComputeFault::Parse {
        input: text,
        target: std::any::type_name::<T>(),
    })
}
