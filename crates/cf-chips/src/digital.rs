//! Boolean gates and signal conditioning.

use std::time::{Duration, Instant};

use cf_core::{CircuitResult, PortValue};
use cf_engine::{Circuit, Component, EvalCtx, Input, NodeRef, Output};

use crate::template::{NToOne, Predicate, ReduceFn, UnaryFunctor};

pub type Gate = NToOne<bool>;

/// How XOR treats more than two inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XorMode {
    /// True when an odd number of inputs are true.
    #[default]
    Parity,
    /// True when exactly one input is true.
    Strict,
}

pub fn and(circuit: &mut Circuit, arity: usize) -> CircuitResult<NodeRef<Gate>> {
    NToOne::add(circuit, "AND", arity, 2, |v| Ok(v.iter().all(|x| *x)))
}

pub fn or(circuit: &mut Circuit, arity: usize) -> CircuitResult<NodeRef<Gate>> {
    NToOne::add(circuit, "OR", arity, 2, |v| Ok(v.iter().any(|x| *x)))
}

pub fn nand(circuit: &mut Circuit, arity: usize) -> CircuitResult<NodeRef<Gate>> {
    NToOne::add(circuit, "NAND", arity, 2, |v| Ok(!v.iter().all(|x| *x)))
}

pub fn nor(circuit: &mut Circuit, arity: usize) -> CircuitResult<NodeRef<Gate>> {
    NToOne::add(circuit, "NOR", arity, 2, |v| Ok(!v.iter().any(|x| *x)))
}

pub fn xor(circuit: &mut Circuit, arity: usize, mode: XorMode) -> CircuitResult<NodeRef<Gate>> {
    let func: ReduceFn<bool> = match mode {
        XorMode::Parity => |v| Ok(v.iter().filter(|x| **x).count() % 2 == 1),
        XorMode::Strict => |v| Ok(v.iter().filter(|x| **x).count() == 1),
    };
    NToOne::add(circuit, "XOR", arity, 2, func)
}

pub fn not(circuit: &mut Circuit) -> CircuitResult<NodeRef<Predicate<bool>>> {
    UnaryFunctor::add(circuit, "NOT", |a: bool| Ok(!a))
}

#[derive(Default)]
struct EdgeState<T> {
    last: T,
    edge: bool,
}

/// Emits true for one evaluation when its input moves in one direction.
pub struct EdgeDetector<T> {
    pub a: Input<T>,
    pub out: Output<bool>,
    detect: fn(&T, &T) -> bool,
}

impl<T: PortValue + PartialOrd> EdgeDetector<T> {
    /// True when the input rose above its previous value.
    pub fn rising(circuit: &mut Circuit) -> CircuitResult<NodeRef<Self>> {
        Self::add(circuit, "RisingEdge", |last, current| current > last)
    }

    /// True when the input fell below its previous value.
    pub fn falling(circuit: &mut Circuit) -> CircuitResult<NodeRef<Self>> {
        Self::add(circuit, "FallingEdge", |last, current| current < last)
    }

    fn add(circuit: &mut Circuit, kind: &str, detect: fn(&T, &T) -> bool) -> CircuitResult<NodeRef<Self>> {
        let name = circuit.unique_name(kind);
        circuit.add(name, |b| {
            b.state(EdgeState::<T>::default());
            Ok(Self {
                a: b.input("A"),
                out: b.output("Out"),
                detect,
            })
        })
    }
}

impl<T: PortValue + PartialOrd> Component for EdgeDetector<T> {
    fn compute(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        let current = ctx.read(self.a)?;
        let state = ctx.state::<EdgeState<T>>()?;
        state.edge = (self.detect)(&state.last, &current);
        state.last = current;
        Ok(())
    }

    fn set(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        let edge = ctx.state::<EdgeState<T>>()?.edge;
        ctx.publish(self.out, edge)
    }
}

/// How long [`Hold`] keeps its output up after the input drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldFor {
    /// The output stays up for this many evaluations, starting with the
    /// one that saw the input true.
    Cycles(u64),
    /// Wall-clock time since the input was last true.
    Time(Duration),
}

struct HoldState {
    remaining: u64,
    until: Option<Instant>,
}

/// Stretches a true pulse.
pub struct Hold {
    pub a: Input<bool>,
    pub out: Output<bool>,
    span: HoldFor,
}

impl Hold {
    pub fn add(circuit: &mut Circuit, span: HoldFor) -> CircuitResult<NodeRef<Self>> {
        let name = circuit.unique_name("Hold");
        circuit.add(name, |b| {
            b.state(HoldState {
                remaining: 0,
                until: None,
            });
            Ok(Self {
                a: b.input("A"),
                out: b.output("Out"),
                span,
            })
        })
    }
}

impl Component for Hold {
    fn compute(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        let input = ctx.read(self.a)?;
        let state = ctx.state::<HoldState>()?;
        match self.span {
            HoldFor::Cycles(cycles) => {
                if input {
                    state.remaining = cycles;
                } else {
                    state.remaining = state.remaining.saturating_sub(1);
                }
            }
            HoldFor::Time(duration) => {
                let now = Instant::now();
                if input {
                    state.until = Some(now + duration);
                } else if state.until.is_some_and(|until| now >= until) {
                    state.until = None;
                }
            }
        }
        Ok(())
    }

    fn set(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        let state = ctx.state::<HoldState>()?;
        let held = match self.span {
            HoldFor::Cycles(_) => state.remaining > 0,
            HoldFor::Time(_) => state.until.is_some(),
        };
        ctx.publish(self.out, held)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::GenericInput;

    fn gate_truth(
        build: fn(&mut Circuit) -> CircuitResult<NodeRef<Gate>>,
        inputs: &[bool],
    ) -> bool {
        let mut circuit = Circuit::new();
        let gate = build(&mut circuit).unwrap();
        let sources: Vec<_> = gate
            .inputs
            .iter()
            .map(|input| {
                let src = GenericInput::<bool>::add(&mut circuit).unwrap();
                circuit.connect(input, src.out).unwrap();
                src
            })
            .collect();
        for (src, value) in sources.iter().zip(inputs) {
            src.set(&mut circuit, *value).unwrap();
        }
        circuit.tick(gate.id).unwrap();
        circuit.value(gate.out).unwrap()
    }

    #[test]
    fn two_input_truth_tables() {
        let cases = [[false, false], [false, true], [true, false], [true, true]];
        let expect_and = [false, false, false, true];
        let expect_or = [false, true, true, true];
        for (case, (a, o)) in cases.iter().zip(expect_and.iter().zip(expect_or)) {
            assert_eq!(gate_truth(|c| and(c, 2), case), *a);
            assert_eq!(gate_truth(|c| or(c, 2), case), o);
            assert_eq!(gate_truth(|c| nand(c, 2), case), !*a);
            assert_eq!(gate_truth(|c| nor(c, 2), case), !o);
        }
    }

    #[test]
    fn xor_modes_differ_on_three_inputs() {
        let all = [true, true, true];
        assert!(gate_truth(|c| xor(c, 3, XorMode::Parity), &all));
        assert!(!gate_truth(|c| xor(c, 3, XorMode::Strict), &all));
        let one = [false, true, false];
        assert!(gate_truth(|c| xor(c, 3, XorMode::Strict), &one));
    }

    #[test]
    fn gates_need_two_inputs() {
        let mut circuit = Circuit::new();
        assert!(and(&mut circuit, 1).is_err());
        assert!(nor(&mut circuit, 0).is_err());
    }

    #[test]
    fn not_inverts() {
        let mut circuit = Circuit::new();
        let src = GenericInput::<bool>::add(&mut circuit).unwrap();
        let inv = not(&mut circuit).unwrap();
        circuit.connect(inv.a, src.out).unwrap();
        src.set(&mut circuit, true).unwrap();
        assert!(!circuit.value(inv.out).unwrap());
    }

    #[test]
    fn rising_edge_fires_once_per_rise() {
        let mut circuit = Circuit::new();
        let src = GenericInput::<i64>::add(&mut circuit).unwrap();
        let edge = EdgeDetector::<i64>::rising(&mut circuit).unwrap();
        circuit.connect(edge.a, src.out).unwrap();

        src.set(&mut circuit, 1).unwrap();
        assert!(circuit.value(edge.out).unwrap());
        src.set(&mut circuit, 0).unwrap();
        assert!(!circuit.value(edge.out).unwrap());
        src.set(&mut circuit, 5).unwrap();
        assert!(circuit.value(edge.out).unwrap());
    }

    #[test]
    fn falling_edge_on_bool() {
        let mut circuit = Circuit::new();
        let src = GenericInput::<bool>::add(&mut circuit).unwrap();
        let edge = EdgeDetector::<bool>::falling(&mut circuit).unwrap();
        circuit.connect(edge.a, src.out).unwrap();

        src.set(&mut circuit, true).unwrap();
        assert!(!circuit.value(edge.out).unwrap());
        src.set(&mut circuit, false).unwrap();
        assert!(circuit.value(edge.out).unwrap());
    }

    #[test]
    fn hold_counts_cycles() {
        let mut circuit = Circuit::new();
        let src = GenericInput::<bool>::add(&mut circuit).unwrap();
        let hold = Hold::add(&mut circuit, HoldFor::Cycles(2)).unwrap();
        circuit.connect(hold.a, src.out).unwrap();
        circuit.set_always_notify(src.out, true).unwrap();

        src.set(&mut circuit, true).unwrap();
        assert!(circuit.value(hold.out).unwrap());
        src.set(&mut circuit, false).unwrap();
        assert!(circuit.value(hold.out).unwrap());
        src.set(&mut circuit, false).unwrap();
        assert!(!circuit.value(hold.out).unwrap());
    }

    #[test]
    fn hold_for_time_stays_up() {
        let mut circuit = Circuit::new();
        let src = GenericInput::<bool>::add(&mut circuit).unwrap();
        let hold = Hold::add(&mut circuit, HoldFor::Time(Duration::from_secs(60))).unwrap();
        circuit.connect(hold.a, src.out).unwrap();

        src.set(&mut circuit, true).unwrap();
        src.set(&mut circuit, false).unwrap();
        assert!(circuit.value(hold.out).unwrap());
    }
}
