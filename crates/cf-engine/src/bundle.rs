//! Fixed-arity port bundles and variable-arity port sets.

use cf_core::{CircuitError, CircuitResult, PortValue};

use crate::builder::NodeBuilder;
use crate::circuit::Circuit;
use crate::component::EvalCtx;
use crate::port::{Input, Output};

const INPUT_LETTERS: [&str; 8] = ["A", "B", "C", "D", "E", "F", "G", "H"];

pub(crate) fn default_input_name(index: usize) -> String {
    INPUT_LETTERS
        .get(index)
        .map_or_else(|| format!("In{}", index + 1), |letter| letter.to_string())
}

pub(crate) fn default_output_name(index: usize) -> String {
    format!("Out{}", index + 1)
}

/// A tuple of input handles created together.
pub trait InputBundle: Sized {
    const ARITY: usize;

    /// `names` always has exactly `ARITY` entries.
    fn create(builder: &mut NodeBuilder<'_>, names: &[String]) -> Self;
}

/// A tuple of output handles created together.
pub trait OutputBundle: Sized {
    const ARITY: usize;

    fn create(builder: &mut NodeBuilder<'_>, names: &[String]) -> Self;
}

macro_rules! input_bundle {
    ($arity:literal; $($ty:ident $idx:tt),+) => {
        impl<$($ty: PortValue),+> InputBundle for ($(Input<$ty>,)+) {
            const ARITY: usize = $arity;

            fn create(builder: &mut NodeBuilder<'_>, names: &[String]) -> Self {
                ($(builder.input::<$ty>(names[$idx].as_str()),)+)
            }
        }
    };
}

input_bundle!(1; T0 0);
input_bundle!(2; T0 0, T1 1);
input_bundle!(3; T0 0, T1 1, T2 2);
input_bundle!(4; T0 0, T1 1, T2 2, T3 3);
input_bundle!(8; T0 0, T1 1, T2 2, T3 3, T4 4, T5 5, T6 6, T7 7);

macro_rules! output_bundle {
    ($arity:literal; $($ty:ident $idx:tt),+) => {
        impl<$($ty: PortValue),+> OutputBundle for ($(Output<$ty>,)+) {
            const ARITY: usize = $arity;

            fn create(builder: &mut NodeBuilder<'_>, names: &[String]) -> Self {
                ($(builder.output::<$ty>(names[$idx].as_str()),)+)
            }
        }
    };
}

output_bundle!(1; T0 0);
output_bundle!(2; T0 0, T1 1);

/// An ordered run of same-typed ports sized at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSet<P> {
    ports: Vec<P>,
}

impl<P: Copy> PortSet<P> {
    pub(crate) fn new(ports: Vec<P>) -> Self {
        Self { ports }
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn get(&self, index: usize) -> CircuitResult<P> {
        self.ports
            .get(index)
            .copied()
            .ok_or_else(|| CircuitError::InvalidArity {
                what: "port set index".into(),
                expected: format!("< {}", self.ports.len()),
                found: index,
            })
    }

    pub fn iter(&self) -> std::iter::Copied<std::slice::Iter<'_, P>> {
        self.ports.iter().copied()
    }

    pub fn as_slice(&self) -> &[P] {
        &self.ports
    }
}

impl<T: PortValue> PortSet<Input<T>> {
    /// Rewire slot `index` to `source`.
    ///
    /// The slot leaves the fan-out of whatever fed it before. The slot's port
    /// stays the same, so the owning component reads the new source on its
    /// next evaluation.
    pub fn replace(
        &self,
        circuit: &mut Circuit,
        index: usize,
        source: Output<T>,
    ) -> CircuitResult<()> {
        let slot = self.get(index)?;
        circuit.disconnect(slot)?;
        circuit.connect(slot, source)
    }

    /// Wire every slot to the matching output, in order.
    pub fn connect_all(&self, circuit: &mut Circuit, sources: &[Output<T>]) -> CircuitResult<()> {
        if sources.len() != self.ports.len() {
            return Err(CircuitError::InvalidArity {
                what: "port set sources".into(),
                expected: self.ports.len().to_string(),
                found: sources.len(),
            });
        }
        for (input, output) in self.ports.iter().zip(sources) {
            circuit.connect(*input, *output)?;
        }
        Ok(())
    }

    pub fn read_all(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<Vec<T>> {
        ctx.read_all(&self.ports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, NodeRef};

    #[test]
    fn default_names() {
        assert_eq!(default_input_name(0), "A");
        assert_eq!(default_input_name(7), "H");
        assert_eq!(default_output_name(1), "Out2");
    }

    struct Value {
        out: Output<i64>,
    }

    impl Component for Value {
        fn compute(&self, _ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
            Ok(())
        }

        fn set(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
            let value = *ctx.state::<i64>()?;
            ctx.publish(self.out, value)
        }
    }

    fn value(circuit: &mut Circuit, start: i64) -> NodeRef<Value> {
        let name = circuit.unique_name("Value");
        circuit
            .add(name, |b| {
                b.state(start);
                Ok(Value { out: b.output("Out") })
            })
            .unwrap()
    }

    /// Sums its lines.
    struct Total {
        lines: PortSet<Input<i64>>,
        out: Output<i64>,
    }

    impl Component for Total {
        fn compute(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
            let sum = self.lines.read_all(ctx)?.iter().sum();
            *ctx.state::<i64>()? = sum;
            Ok(())
        }

        fn set(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
            let sum = *ctx.state::<i64>()?;
            ctx.publish(self.out, sum)
        }
    }

    fn total(circuit: &mut Circuit, lines: usize) -> NodeRef<Total> {
        circuit
            .add("Total", |b| {
                b.state(0_i64);
                Ok(Total {
                    lines: b.input_set("D", lines),
                    out: b.output("Out"),
                })
            })
            .unwrap()
    }

    #[test]
    fn set_ports_are_named_by_position() {
        let mut circuit = Circuit::new();
        let node = total(&mut circuit, 2);
        assert_eq!(node.lines.len(), 2);
        assert_eq!(circuit.input_name(node.lines.get(1).unwrap()).unwrap(), "D1");
        assert!(node.lines.get(2).is_err());
        let positions: Vec<usize> = node.lines.iter().enumerate().rev().map(|(i, _)| i).collect();
        assert_eq!(positions, vec![1, 0]);
    }

    #[test]
    fn connect_all_checks_arity() {
        let mut circuit = Circuit::new();
        let x = value(&mut circuit, 1);
        let node = total(&mut circuit, 2);
        assert!(matches!(
            node.lines.connect_all(&mut circuit, &[x.out]),
            Err(CircuitError::InvalidArity { found: 1, .. })
        ));
    }

    #[test]
    fn replace_rewires_the_live_slot() {
        let mut circuit = Circuit::new();
        let x = value(&mut circuit, 1);
        let y = value(&mut circuit, 10);
        let node = total(&mut circuit, 2);
        node.lines.connect_all(&mut circuit, &[x.out, x.out]).unwrap();
        circuit.tick(x.id).unwrap();
        assert_eq!(circuit.value(node.out).unwrap(), 2);

        node.lines.replace(&mut circuit, 1, y.out).unwrap();
        let first = node.lines.get(0).unwrap();
        let second = node.lines.get(1).unwrap();
        assert_eq!(circuit.sinks(x.out).unwrap(), vec![first]);
        assert_eq!(circuit.sinks(y.out).unwrap(), vec![second]);

        // y has never published, so its output still holds the default
        circuit.tick(node.id).unwrap();
        assert_eq!(circuit.value(node.out).unwrap(), 1);
        circuit.tick(y.id).unwrap();
        assert_eq!(circuit.value(node.out).unwrap(), 11);

        assert!(node.lines.replace(&mut circuit, 2, y.out).is_err());
    }
}
