//! Generic node templates the operator families are built from.
//!
//! Every template holds its last successful result as state. When the
//! wrapped function faults the error flag is raised and the held value is
//! published again unchanged.

use cf_core::{CircuitError, CircuitResult, ComputeFault, PortValue};
use cf_engine::{Circuit, Component, EvalCtx, Input, NodeRef, Output, PortSet};

pub type UnaryFn<T, U> = fn(T) -> Result<U, ComputeFault>;
pub type BinaryFn<T, U, V> = fn(T, U) -> Result<V, ComputeFault>;
pub type ReduceFn<T> = fn(&[T]) -> Result<T, ComputeFault>;

/// Publish the value held in the component's state.
pub(crate) fn publish_held<T: PortValue>(ctx: &mut EvalCtx<'_>, out: Output<T>) -> CircuitResult<()> {
    let value = ctx.state::<T>()?.clone();
    ctx.publish(out, value)
}

/// Store `result` as the held value, or raise the error flag.
pub(crate) fn hold<T: PortValue>(
    ctx: &mut EvalCtx<'_>,
    result: Result<T, ComputeFault>,
) -> CircuitResult<()> {
    if let Some(value) = ctx.catch(result) {
        *ctx.state::<T>()? = value;
    }
    Ok(())
}

/// One input, one output: `out = f(a)`.
pub struct UnaryFunctor<T, U> {
    pub a: Input<T>,
    pub out: Output<U>,
    func: UnaryFn<T, U>,
}

/// A unary functor producing a boolean.
pub type Predicate<T> = UnaryFunctor<T, bool>;

impl<T: PortValue, U: PortValue> UnaryFunctor<T, U> {
    pub fn add(circuit: &mut Circuit, kind: &str, func: UnaryFn<T, U>) -> CircuitResult<NodeRef<Self>> {
        let name = circuit.unique_name(kind);
        circuit.add(name, |b| {
            b.state(U::default());
            Ok(Self {
                a: b.input("A"),
                out: b.output("Out"),
                func,
            })
        })
    }
}

impl<T: PortValue, U: PortValue> Component for UnaryFunctor<T, U> {
    fn compute(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        let a = ctx.read(self.a)?;
        hold(ctx, (self.func)(a))
    }

    fn set(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        publish_held(ctx, self.out)
    }
}

/// Two inputs, one output: `out = f(a, b)`.
pub struct BinaryFunctor<T, U, V> {
    pub a: Input<T>,
    pub b: Input<U>,
    pub out: Output<V>,
    func: BinaryFn<T, U, V>,
}

/// A binary functor comparing two values of one type.
pub type BinaryComparator<T> = BinaryFunctor<T, T, bool>;

impl<T: PortValue, U: PortValue, V: PortValue> BinaryFunctor<T, U, V> {
    pub fn add(
        circuit: &mut Circuit,
        kind: &str,
        func: BinaryFn<T, U, V>,
    ) -> CircuitResult<NodeRef<Self>> {
        let name = circuit.unique_name(kind);
        circuit.add(name, |b| {
            b.state(V::default());
            let (a, bb) = b.inputs(None)?;
            Ok(Self {
                a,
                b: bb,
                out: b.output("Out"),
                func,
            })
        })
    }
}

impl<T: PortValue, U: PortValue, V: PortValue> Component for BinaryFunctor<T, U, V> {
    fn compute(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        let a = ctx.read(self.a)?;
        let b = ctx.read(self.b)?;
        hold(ctx, (self.func)(a, b))
    }

    fn set(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        publish_held(ctx, self.out)
    }
}

/// N same-typed inputs folded into one output.
pub struct NToOne<T> {
    pub inputs: PortSet<Input<T>>,
    pub out: Output<T>,
    func: ReduceFn<T>,
}

impl<T: PortValue> NToOne<T> {
    /// Fails with `InvalidArity` when `arity` is below `min_arity`.
    pub fn add(
        circuit: &mut Circuit,
        kind: &str,
        arity: usize,
        min_arity: usize,
        func: ReduceFn<T>,
    ) -> CircuitResult<NodeRef<Self>> {
        if arity < min_arity {
            return Err(CircuitError::InvalidArity {
                what: kind.to_string(),
                expected: format!("at least {min_arity}"),
                found: arity,
            });
        }
        let name = circuit.unique_name(kind);
        circuit.add(name, |b| {
            b.state(T::default());
            Ok(Self {
                inputs: b.input_set("Input", arity),
                out: b.output("Out"),
                func,
            })
        })
    }
}

impl<T: PortValue> Component for NToOne<T> {
    fn compute(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        let values = self.inputs.read_all(ctx)?;
        hold(ctx, (self.func)(&values))
    }

    fn set(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        publish_held(ctx, self.out)
    }
}

/// Routes one of `2^k` data lines to the output.
///
/// Select line 0 is the least significant bit of the line index.
pub struct Multiplexer<T> {
    pub data: PortSet<Input<T>>,
    pub select: PortSet<Input<bool>>,
    pub out: Output<T>,
}

impl<T: PortValue> Multiplexer<T> {
    pub fn add(circuit: &mut Circuit, lines: usize) -> CircuitResult<NodeRef<Self>> {
        if !(2..=256).contains(&lines) {
            return Err(CircuitError::InvalidArg {
                what: format!("multiplexer needs between 2 and 256 data lines, got {lines}"),
            });
        }
        if !lines.is_power_of_two() {
            return Err(CircuitError::InvalidArg {
                what: format!("multiplexer data lines must be a power of two, got {lines}"),
            });
        }
        let select_lines = lines.trailing_zeros() as usize;
        let name = circuit.unique_name("Multiplexer");
        circuit.add(name, |b| {
            b.state(T::default());
            Ok(Self {
                data: b.input_set("Input", lines),
                select: b.input_set("Select", select_lines),
                out: b.output("Out"),
            })
        })
    }
}

impl<T: PortValue> Component for Multiplexer<T> {
    fn compute(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        let bits = self.select.read_all(ctx)?;
        let index = bits
            .iter()
            .enumerate()
            .fold(0_usize, |acc, (i, bit)| acc | (usize::from(*bit) << i));
        let line = self.data.get(index)?;
        let value = ctx.read(line)?;
        *ctx.state::<T>()? = value;
        Ok(())
    }

    fn set(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        publish_held(ctx, self.out)
    }
}

/// Copies its input to its output.
pub struct Buffer<T> {
    pub a: Input<T>,
    pub out: Output<T>,
}

impl<T: PortValue> Buffer<T> {
    pub fn add(circuit: &mut Circuit) -> CircuitResult<NodeRef<Self>> {
        let name = circuit.unique_name("Buffer");
        circuit.add(name, |b| {
            b.state(T::default());
            Ok(Self {
                a: b.input("A"),
                out: b.output("Out"),
            })
        })
    }
}

impl<T: PortValue> Component for Buffer<T> {
    fn compute(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        let value = ctx.read(self.a)?;
        *ctx.state::<T>()? = value;
        Ok(())
    }

    fn set(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        publish_held(ctx, self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::GenericInput;

    #[test]
    fn n_to_one_checks_minimum_arity() {
        let mut circuit = Circuit::new();
        let err = NToOne::<i64>::add(&mut circuit, "IntAdd", 1, 2, |v| Ok(v.iter().sum()))
            .unwrap_err();
        assert!(matches!(err, CircuitError::InvalidArity { found: 1, .. }));
    }

    #[test]
    fn multiplexer_rejects_bad_sizes() {
        let mut circuit = Circuit::new();
        assert!(Multiplexer::<i64>::add(&mut circuit, 1).is_err());
        assert!(Multiplexer::<i64>::add(&mut circuit, 6).is_err());
        assert!(Multiplexer::<i64>::add(&mut circuit, 512).is_err());
        let mux = Multiplexer::<i64>::add(&mut circuit, 8).unwrap();
        assert_eq!(mux.data.len(), 8);
        assert_eq!(mux.select.len(), 3);
    }

    #[test]
    fn multiplexer_select_zero_is_least_significant() {
        let mut circuit = Circuit::new();
        let mux = Multiplexer::<i64>::add(&mut circuit, 4).unwrap();
        let mut data = Vec::new();
        for value in [10, 11, 12, 13] {
            let input = GenericInput::<i64>::add(&mut circuit).unwrap();
            input.set(&mut circuit, value).unwrap();
            data.push(input);
        }
        let s0 = GenericInput::<bool>::add(&mut circuit).unwrap();
        let s1 = GenericInput::<bool>::add(&mut circuit).unwrap();
        let outs: Vec<_> = data.iter().map(|d| d.out).collect();
        mux.data.connect_all(&mut circuit, &outs).unwrap();
        circuit.connect(mux.select.get(0).unwrap(), s0.out).unwrap();
        circuit.connect(mux.select.get(1).unwrap(), s1.out).unwrap();

        s0.set(&mut circuit, true).unwrap();
        assert_eq!(circuit.value(mux.out).unwrap(), 11);
        s1.set(&mut circuit, true).unwrap();
        assert_eq!(circuit.value(mux.out).unwrap(), 13);
        s0.set(&mut circuit, false).unwrap();
        assert_eq!(circuit.value(mux.out).unwrap(), 12);
    }

    #[test]
    fn functor_holds_last_value_on_fault() {
        let mut circuit = Circuit::new();
        let input = GenericInput::<i64>::add(&mut circuit).unwrap();
        let inv = UnaryFunctor::<i64, i64>::add(&mut circuit, "IntInv", |a| {
            1_i64.checked_div(a).ok_or(ComputeFault::DivideByZero)
        })
        .unwrap();
        circuit.connect(inv.a, input.out).unwrap();

        input.set(&mut circuit, 1).unwrap();
        assert_eq!(circuit.value(inv.out).unwrap(), 1);
        input.set(&mut circuit, 0).unwrap();
        assert!(circuit.has_error(inv.id).unwrap());
        assert_eq!(circuit.value(inv.out).unwrap(), 1);
    }

    #[test]
    fn buffer_copies() {
        let mut circuit = Circuit::new();
        let input = GenericInput::<String>::add(&mut circuit).unwrap();
        let buffer = Buffer::<String>::add(&mut circuit).unwrap();
        circuit.connect(buffer.a, input.out).unwrap();
        input.set(&mut circuit, "hi".to_string()).unwrap();
        assert_eq!(circuit.value(buffer.out).unwrap(), "hi");
    }
}
