//! Stateful integer accumulators.

use cf_core::{CircuitResult, CompId, ComputeFault};
use cf_engine::{Circuit, Component, EvalCtx, Input, NodeRef, Output};

#[derive(Debug, Default)]
struct CounterState {
    count: i64,
    pending: i64,
}

/// A count driven from outside by increment and decrement actions.
///
/// Each action ticks the counter, which publishes the new count. A step
/// that would overflow raises the error flag and leaves the count as is.
pub struct Counter {
    pub out: Output<i64>,
    id: CompId,
}

impl Counter {
    pub fn add(circuit: &mut Circuit, start: i64) -> CircuitResult<NodeRef<Self>> {
        let name = circuit.unique_name("Counter");
        circuit.add(name, |b| {
            b.state(CounterState {
                count: start,
                pending: 0,
            });
            Ok(Self {
                out: b.output("Out"),
                id: b.id(),
            })
        })
    }

    pub fn increment(&self, circuit: &mut Circuit) -> CircuitResult<()> {
        self.step(circuit, 1)
    }

    pub fn decrement(&self, circuit: &mut Circuit) -> CircuitResult<()> {
        self.step(circuit, -1)
    }

    pub fn step(&self, circuit: &mut Circuit, delta: i64) -> CircuitResult<()> {
        circuit.state_mut::<CounterState>(self.id)?.pending = delta;
        circuit.tick(self.id)
    }

    pub fn reset(&self, circuit: &mut Circuit, value: i64) -> CircuitResult<()> {
        *circuit.state_mut::<CounterState>(self.id)? = CounterState {
            count: value,
            pending: 0,
        };
        circuit.tick(self.id)
    }

    pub fn count(&self, circuit: &Circuit) -> CircuitResult<i64> {
        Ok(circuit.state::<CounterState>(self.id)?.count)
    }
}

impl Component for Counter {
    fn compute(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        let state = ctx.state::<CounterState>()?;
        let pending = std::mem::take(&mut state.pending);
        match state.count.checked_add(pending) {
            Some(count) => state.count = count,
            None => ctx.fault(ComputeFault::Overflow),
        }
        Ok(())
    }

    fn set(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        let count = ctx.state::<CounterState>()?.count;
        ctx.publish(self.out, count)
    }
}

/// Adds every value it is notified with to a running total.
///
/// Wire its input from an always-notify output if repeated equal values
/// must each be counted.
pub struct Accumulator {
    pub a: Input<i64>,
    pub out: Output<i64>,
    id: CompId,
}

impl Accumulator {
    pub fn add(circuit: &mut Circuit) -> CircuitResult<NodeRef<Self>> {
        let name = circuit.unique_name("Accumulator");
        circuit.add(name, |b| {
            b.state(0_i64);
            Ok(Self {
                a: b.input("A"),
                out: b.output("Out"),
                id: b.id(),
            })
        })
    }

    /// Zero the total without evaluating.
    pub fn clear(&self, circuit: &mut Circuit) -> CircuitResult<()> {
        *circuit.state_mut::<i64>(self.id)? = 0;
        Ok(())
    }
}

impl Component for Accumulator {
    fn compute(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        let value = ctx.read(self.a)?;
        let total = ctx.state::<i64>()?;
        match total.checked_add(value) {
            Some(sum) => *total = sum,
            None => ctx.fault(ComputeFault::Overflow),
        }
        Ok(())
    }

    fn set(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        let total = *ctx.state::<i64>()?;
        ctx.publish(self.out, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::GenericInput;

    #[test]
    fn counter_steps_and_resets() {
        let mut circuit = Circuit::new();
        let counter = Counter::add(&mut circuit, 10).unwrap();
        counter.increment(&mut circuit).unwrap();
        counter.increment(&mut circuit).unwrap();
        counter.decrement(&mut circuit).unwrap();
        assert_eq!(circuit.value(counter.out).unwrap(), 11);
        counter.reset(&mut circuit, 0).unwrap();
        assert_eq!(counter.count(&circuit).unwrap(), 0);
        assert_eq!(circuit.value(counter.out).unwrap(), 0);
    }

    #[test]
    fn counter_overflow_flags_and_holds() {
        let mut circuit = Circuit::new();
        let counter = Counter::add(&mut circuit, i64::MAX).unwrap();
        counter.increment(&mut circuit).unwrap();
        assert!(circuit.has_error(counter.id).unwrap());
        assert_eq!(counter.count(&circuit).unwrap(), i64::MAX);
        counter.decrement(&mut circuit).unwrap();
        assert!(!circuit.has_error(counter.id).unwrap());
        assert_eq!(counter.count(&circuit).unwrap(), i64::MAX - 1);
    }

    #[test]
    fn accumulator_counts_repeats_with_always_notify() {
        let mut circuit = Circuit::new();
        let input = GenericInput::<i64>::add(&mut circuit).unwrap();
        let acc = Accumulator::add(&mut circuit).unwrap();
        circuit.connect(acc.a, input.out).unwrap();
        circuit.set_always_notify(input.out, true).unwrap();

        for _ in 0..3 {
            input.set(&mut circuit, 5).unwrap();
        }
        assert_eq!(circuit.value(acc.out).unwrap(), 15);
        acc.clear(&mut circuit).unwrap();
        input.set(&mut circuit, 2).unwrap();
        assert_eq!(circuit.value(acc.out).unwrap(), 2);
    }
}
