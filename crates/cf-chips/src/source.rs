//! Externally driven sources.
//!
//! Each source stores its value as component state. Setting it from outside
//! updates that state and ticks the source, which publishes downstream.

use cf_core::{CircuitResult, CompId, PortValue};
use cf_engine::{Circuit, Component, EvalCtx, NodeRef, Output, PortSet};

use crate::template::publish_held;

/// A root value set by the caller.
pub struct GenericInput<T> {
    pub out: Output<T>,
    id: CompId,
}

impl<T: PortValue> GenericInput<T> {
    pub fn add(circuit: &mut Circuit) -> CircuitResult<NodeRef<Self>> {
        let name = circuit.unique_name("Input");
        circuit.add(name, |b| {
            b.state(T::default());
            Ok(Self {
                out: b.output("Out"),
                id: b.id(),
            })
        })
    }

    /// Store `value` and tick.
    pub fn set(&self, circuit: &mut Circuit, value: T) -> CircuitResult<()> {
        *circuit.state_mut::<T>(self.id)? = value;
        circuit.tick(self.id)
    }

    pub fn get(&self, circuit: &Circuit) -> CircuitResult<T> {
        circuit.state::<T>(self.id).cloned()
    }
}

impl<T: PortValue> Component for GenericInput<T> {
    fn compute(&self, _ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        Ok(())
    }

    fn set(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        publish_held(ctx, self.out)
    }
}

/// A boolean input with toggle.
pub struct Button {
    pub out: Output<bool>,
    id: CompId,
}

impl Button {
    pub fn add(circuit: &mut Circuit) -> CircuitResult<NodeRef<Self>> {
        let name = circuit.unique_name("Button");
        circuit.add(name, |b| {
            b.state(false);
            Ok(Self {
                out: b.output("Out"),
                id: b.id(),
            })
        })
    }

    pub fn set_state(&self, circuit: &mut Circuit, pressed: bool) -> CircuitResult<()> {
        *circuit.state_mut::<bool>(self.id)? = pressed;
        circuit.tick(self.id)
    }

    pub fn toggle(&self, circuit: &mut Circuit) -> CircuitResult<()> {
        let pressed = circuit.state_mut::<bool>(self.id)?;
        *pressed = !*pressed;
        circuit.tick(self.id)
    }

    pub fn state(&self, circuit: &Circuit) -> CircuitResult<bool> {
        circuit.state::<bool>(self.id).copied()
    }
}

impl Component for Button {
    fn compute(&self, _ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        Ok(())
    }

    fn set(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        publish_held(ctx, self.out)
    }
}

/// Fixed values, one output per value, named `Output0`, `Output1`, ...
pub struct Constant<T> {
    pub outputs: PortSet<Output<T>>,
    values: Vec<T>,
}

impl<T: PortValue> Constant<T> {
    /// Add the constant and publish its values once.
    pub fn add(circuit: &mut Circuit, values: Vec<T>) -> CircuitResult<NodeRef<Self>> {
        let name = circuit.unique_name("Constant");
        let node = circuit.add(name, |b| {
            Ok(Self {
                outputs: b.output_set("Output", values.len()),
                values,
            })
        })?;
        circuit.tick(node.id)?;
        Ok(node)
    }

    pub fn single(circuit: &mut Circuit, value: T) -> CircuitResult<NodeRef<Self>> {
        Self::add(circuit, vec![value])
    }

    pub fn out(&self, index: usize) -> CircuitResult<Output<T>> {
        self.outputs.get(index)
    }
}

impl<T: PortValue> Component for Constant<T> {
    fn compute(&self, _ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        Ok(())
    }

    fn set(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        for (output, value) in self.outputs.iter().zip(&self.values) {
            ctx.publish(output, value.clone())?;
        }
        Ok(())
    }
}

/// A byte split over eight boolean outputs `A` (bit 0) to `H` (bit 7).
pub struct ByteInput {
    pub bits: [Output<bool>; 8],
    id: CompId,
}

impl ByteInput {
    pub fn add(circuit: &mut Circuit) -> CircuitResult<NodeRef<Self>> {
        let name = circuit.unique_name("ByteInput");
        circuit.add(name, |b| {
            b.state(0_u8);
            Ok(Self {
                bits: ["A", "B", "C", "D", "E", "F", "G", "H"].map(|bit| b.output(bit)),
                id: b.id(),
            })
        })
    }

    pub fn set(&self, circuit: &mut Circuit, value: u8) -> CircuitResult<()> {
        *circuit.state_mut::<u8>(self.id)? = value;
        circuit.tick(self.id)
    }
}

impl Component for ByteInput {
    fn compute(&self, _ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        Ok(())
    }

    fn set(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        let value = *ctx.state::<u8>()?;
        for (i, bit) in self.bits.iter().enumerate() {
            ctx.publish(*bit, value & (1 << i) != 0)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_input_publishes_on_set() {
        let mut circuit = Circuit::new();
        let input = GenericInput::<i64>::add(&mut circuit).unwrap();
        input.set(&mut circuit, 42).unwrap();
        assert_eq!(circuit.value(input.out).unwrap(), 42);
        assert_eq!(input.get(&circuit).unwrap(), 42);
        assert_eq!(circuit.name(input.id).unwrap(), "Input0");
    }

    #[test]
    fn button_toggles() {
        let mut circuit = Circuit::new();
        let button = Button::add(&mut circuit).unwrap();
        button.toggle(&mut circuit).unwrap();
        assert!(circuit.value(button.out).unwrap());
        button.toggle(&mut circuit).unwrap();
        assert!(!button.state(&circuit).unwrap());
        button.set_state(&mut circuit, true).unwrap();
        assert!(circuit.value(button.out).unwrap());
    }

    #[test]
    fn constant_names_and_values() {
        let mut circuit = Circuit::new();
        let constant = Constant::add(&mut circuit, vec![3_i64, 4]).unwrap();
        let second = constant.out(1).unwrap();
        assert_eq!(circuit.output_name(second).unwrap(), "Output1");
        assert_eq!(circuit.value(second).unwrap(), 4);
        assert!(constant.out(2).is_err());
    }

    #[test]
    fn byte_input_bit_order() {
        let mut circuit = Circuit::new();
        let byte = ByteInput::add(&mut circuit).unwrap();
        byte.set(&mut circuit, 0b1000_0101).unwrap();
        let bits: Vec<bool> = byte
            .bits
            .iter()
            .map(|bit| circuit.value(*bit).unwrap())
            .collect();
        assert_eq!(
            bits,
            vec![true, false, true, false, false, false, false, true]
        );
        assert_eq!(circuit.output_name(byte.bits[7]).unwrap(), "H");
    }
}
