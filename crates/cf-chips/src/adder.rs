//! Binary adders assembled from gates.
//!
//! A composite copies its inputs onto private relay outputs that do not
//! propagate, then ticks its internal nodes in dependency order and reads
//! their outputs directly. Internal outputs have auto-propagate switched off
//! so nothing inside the composite evaluates twice.

use cf_core::{CircuitError, CircuitResult, CompId};
use cf_engine::{Circuit, Component, EvalCtx, Input, NodeBuilder, NodeRef, Output, PortSet};

use crate::digital::{self, Gate, XorMode};

fn relay(b: &mut NodeBuilder<'_>, name: &str) -> Output<bool> {
    let options = b.options().manual();
    b.output_with(name, options)
}

fn quiet(circuit: &mut Circuit, output: Output<bool>) -> CircuitResult<()> {
    circuit.set_auto_propagate(output, false)?;
    Ok(())
}

/// Tick internal nodes in order and raise the flag if any of them faulted.
fn run_internal(ctx: &mut EvalCtx<'_>, order: &[CompId]) -> CircuitResult<()> {
    let mut faulted = false;
    for id in order {
        ctx.tick(*id)?;
        faulted |= ctx.circuit().has_error(*id)?;
    }
    if faulted {
        ctx.flag_error();
    }
    Ok(())
}

fn detach_internal(ctx: &mut EvalCtx<'_>, internal: &[CompId]) -> CircuitResult<()> {
    ctx.detach_ports()?;
    for id in internal {
        ctx.circuit().detach(*id)?;
    }
    Ok(())
}

/// `Sum = A xor B`, `Carry = A and B`.
pub struct HalfAdder {
    pub a: Input<bool>,
    pub b: Input<bool>,
    pub sum: Output<bool>,
    pub carry: Output<bool>,
    relay_a: Output<bool>,
    relay_b: Output<bool>,
    xor: NodeRef<Gate>,
    and: NodeRef<Gate>,
}

impl HalfAdder {
    pub fn add(circuit: &mut Circuit) -> CircuitResult<NodeRef<Self>> {
        let name = circuit.unique_name("HalfAdder");
        circuit.add(name, |b| {
            b.state((false, false));
            let (a, bb) = b.inputs(None)?;
            let sum = b.output("Sum");
            let carry = b.output("Carry");
            let relay_a = relay(b, "RelayA");
            let relay_b = relay(b, "RelayB");

            let circuit = b.circuit();
            let xor = digital::xor(circuit, 2, XorMode::Parity)?;
            let and = digital::and(circuit, 2)?;
            for gate in [&xor, &and] {
                gate.inputs.connect_all(circuit, &[relay_a, relay_b])?;
                quiet(circuit, gate.out)?;
            }

            Ok(Self {
                a,
                b: bb,
                sum,
                carry,
                relay_a,
                relay_b,
                xor,
                and,
            })
        })
    }
}

impl Component for HalfAdder {
    fn compute(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        let a = ctx.read(self.a)?;
        let b = ctx.read(self.b)?;
        ctx.publish(self.relay_a, a)?;
        ctx.publish(self.relay_b, b)?;
        run_internal(ctx, &[self.xor.id, self.and.id])?;
        let sum = ctx.circuit().value(self.xor.out)?;
        let carry = ctx.circuit().value(self.and.out)?;
        *ctx.state::<(bool, bool)>()? = (sum, carry);
        Ok(())
    }

    fn set(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        let (sum, carry) = *ctx.state::<(bool, bool)>()?;
        ctx.publish(self.sum, sum)?;
        ctx.publish(self.carry, carry)
    }

    fn detach(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        detach_internal(ctx, &[self.xor.id, self.and.id])
    }
}

/// Two half adders and an OR gate.
pub struct FullAdder {
    pub a: Input<bool>,
    pub b: Input<bool>,
    pub cin: Input<bool>,
    pub sum: Output<bool>,
    pub cout: Output<bool>,
    relays: [Output<bool>; 3],
    first: NodeRef<HalfAdder>,
    second: NodeRef<HalfAdder>,
    carry: NodeRef<Gate>,
}

impl FullAdder {
    pub fn add(circuit: &mut Circuit) -> CircuitResult<NodeRef<Self>> {
        let name = circuit.unique_name("FullAdder");
        circuit.add(name, |b| {
            b.state((false, false));
            let (a, bb, cin) = b.inputs(Some(&["A", "B", "Cin"][..]))?;
            let sum = b.output("Sum");
            let cout = b.output("Cout");
            let relays = [relay(b, "RelayA"), relay(b, "RelayB"), relay(b, "RelayCin")];

            let circuit = b.circuit();
            let first = HalfAdder::add(circuit)?;
            let second = HalfAdder::add(circuit)?;
            let carry = digital::or(circuit, 2)?;
            circuit.connect(first.a, relays[0])?;
            circuit.connect(first.b, relays[1])?;
            circuit.connect(second.a, first.sum)?;
            circuit.connect(second.b, relays[2])?;
            carry
                .inputs
                .connect_all(circuit, &[first.carry, second.carry])?;
            for output in [first.sum, first.carry, second.sum, second.carry, carry.out] {
                quiet(circuit, output)?;
            }

            Ok(Self {
                a,
                b: bb,
                cin,
                sum,
                cout,
                relays,
                first,
                second,
                carry,
            })
        })
    }

    fn internal(&self) -> [CompId; 3] {
        [self.first.id, self.second.id, self.carry.id]
    }
}

impl Component for FullAdder {
    fn compute(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        let values = ctx.read_all(&[self.a, self.b, self.cin])?;
        for (relay, value) in self.relays.iter().zip(values) {
            ctx.publish(*relay, value)?;
        }
        run_internal(ctx, &self.internal())?;
        let sum = ctx.circuit().value(self.second.sum)?;
        let cout = ctx.circuit().value(self.carry.out)?;
        *ctx.state::<(bool, bool)>()? = (sum, cout);
        Ok(())
    }

    fn set(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        let (sum, cout) = *ctx.state::<(bool, bool)>()?;
        ctx.publish(self.sum, sum)?;
        ctx.publish(self.cout, cout)
    }

    fn detach(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        detach_internal(ctx, &self.internal())
    }
}

#[derive(Debug, Default)]
struct RippleState {
    sum: Vec<bool>,
    cout: bool,
}

/// An n-bit adder of chained full adders. Bit 0 is the least significant.
pub struct RippleAdder {
    pub a: PortSet<Input<bool>>,
    pub b: PortSet<Input<bool>>,
    pub cin: Input<bool>,
    pub sum: PortSet<Output<bool>>,
    pub cout: Output<bool>,
    relay_a: Vec<Output<bool>>,
    relay_b: Vec<Output<bool>>,
    relay_cin: Output<bool>,
    stages: Vec<NodeRef<FullAdder>>,
}

impl RippleAdder {
    pub fn add(circuit: &mut Circuit, bits: usize) -> CircuitResult<NodeRef<Self>> {
        if bits == 0 {
            return Err(CircuitError::InvalidArg {
                what: "ripple adder needs at least one bit".into(),
            });
        }
        let name = circuit.unique_name("RippleAdder");
        circuit.add(name, |b| {
            b.state(RippleState::default());
            let a = b.input_set("A", bits);
            let bb = b.input_set("B", bits);
            let cin = b.input("Cin");
            let sum = b.output_set("Sum", bits);
            let cout = b.output("Cout");
            let relay_a: Vec<_> = (0..bits).map(|i| relay(b, &format!("RelayA{i}"))).collect();
            let relay_b: Vec<_> = (0..bits).map(|i| relay(b, &format!("RelayB{i}"))).collect();
            let relay_cin = relay(b, "RelayCin");

            let circuit = b.circuit();
            let mut stages: Vec<NodeRef<FullAdder>> = Vec::with_capacity(bits);
            for i in 0..bits {
                let stage = FullAdder::add(circuit)?;
                circuit.connect(stage.a, relay_a[i])?;
                circuit.connect(stage.b, relay_b[i])?;
                let carry_in = stages.last().map_or(relay_cin, |prev| prev.cout);
                circuit.connect(stage.cin, carry_in)?;
                quiet(circuit, stage.sum)?;
                quiet(circuit, stage.cout)?;
                stages.push(stage);
            }

            Ok(Self {
                a,
                b: bb,
                cin,
                sum,
                cout,
                relay_a,
                relay_b,
                relay_cin,
                stages,
            })
        })
    }

    /// The 8-bit adder.
    pub fn byte(circuit: &mut Circuit) -> CircuitResult<NodeRef<Self>> {
        Self::add(circuit, 8)
    }

    pub fn bits(&self) -> usize {
        self.stages.len()
    }

    fn internal(&self) -> Vec<CompId> {
        self.stages.iter().map(|stage| stage.id).collect()
    }
}

impl Component for RippleAdder {
    fn compute(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        let a = self.a.read_all(ctx)?;
        let b = self.b.read_all(ctx)?;
        let cin = ctx.read(self.cin)?;
        for (relay, value) in self.relay_a.iter().zip(a) {
            ctx.publish(*relay, value)?;
        }
        for (relay, value) in self.relay_b.iter().zip(b) {
            ctx.publish(*relay, value)?;
        }
        ctx.publish(self.relay_cin, cin)?;
        run_internal(ctx, &self.internal())?;

        let mut sum = Vec::with_capacity(self.stages.len());
        for stage in &self.stages {
            sum.push(ctx.circuit().value(stage.sum)?);
        }
        let cout = match self.stages.last() {
            Some(last) => ctx.circuit().value(last.cout)?,
            None => cin,
        };
        *ctx.state::<RippleState>()? = RippleState { sum, cout };
        Ok(())
    }

    fn set(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        let state = ctx.state::<RippleState>()?;
        let (sum, cout) = (state.sum.clone(), state.cout);
        for (output, bit) in self.sum.iter().zip(sum) {
            ctx.publish(output, bit)?;
        }
        ctx.publish(self.cout, cout)
    }

    fn detach(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        detach_internal(ctx, &self.internal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::GenericInput;

    fn bool_inputs(circuit: &mut Circuit, n: usize) -> Vec<NodeRef<GenericInput<bool>>> {
        (0..n)
            .map(|_| GenericInput::<bool>::add(circuit).unwrap())
            .collect()
    }

    #[test]
    fn half_adder_truth_table() {
        let mut circuit = Circuit::new();
        let ha = HalfAdder::add(&mut circuit).unwrap();
        let ins = bool_inputs(&mut circuit, 2);
        circuit.connect(ha.a, ins[0].out).unwrap();
        circuit.connect(ha.b, ins[1].out).unwrap();

        for (a, b) in [(false, false), (false, true), (true, false), (true, true)] {
            ins[0].set(&mut circuit, a).unwrap();
            ins[1].set(&mut circuit, b).unwrap();
            assert_eq!(circuit.value(ha.sum).unwrap(), a ^ b);
            assert_eq!(circuit.value(ha.carry).unwrap(), a && b);
        }
    }

    #[test]
    fn full_adder_counts_ones() {
        let mut circuit = Circuit::new();
        let fa = FullAdder::add(&mut circuit).unwrap();
        let ins = bool_inputs(&mut circuit, 3);
        circuit.connect(fa.a, ins[0].out).unwrap();
        circuit.connect(fa.b, ins[1].out).unwrap();
        circuit.connect(fa.cin, ins[2].out).unwrap();
        assert_eq!(circuit.input_name(fa.cin).unwrap(), "Cin");

        for bits in 0_u8..8 {
            for (i, input) in ins.iter().enumerate() {
                input.set(&mut circuit, bits & (1 << i) != 0).unwrap();
            }
            let ones = bits.count_ones();
            assert_eq!(circuit.value(fa.sum).unwrap(), ones % 2 == 1);
            assert_eq!(circuit.value(fa.cout).unwrap(), ones >= 2);
        }
    }

    #[test]
    fn ripple_adder_rejects_zero_bits() {
        let mut circuit = Circuit::new();
        assert!(RippleAdder::add(&mut circuit, 0).is_err());
        assert_eq!(circuit.component_count(), 0);
    }

    #[test]
    fn ripple_adder_internal_nodes() {
        let mut circuit = Circuit::new();
        let adder = RippleAdder::add(&mut circuit, 4).unwrap();
        assert_eq!(adder.bits(), 4);
        // 1 ripple + 4 full adders, each 2 half adders (2 gates each) and an OR
        assert_eq!(circuit.component_count(), 1 + 4 * (1 + 2 * 3 + 1));
        assert_eq!(circuit.name(adder.id).unwrap(), "RippleAdder0");
        assert_eq!(circuit.input_name(adder.b.get(3).unwrap()).unwrap(), "B3");
    }

    #[test]
    fn detach_reaches_internal_nodes() {
        let mut circuit = Circuit::new();
        let fa = FullAdder::add(&mut circuit).unwrap();
        let src = GenericInput::<bool>::add(&mut circuit).unwrap();
        circuit.connect(fa.a, src.out).unwrap();
        circuit.detach(fa.id).unwrap();
        assert!(!circuit.is_connected(fa.a).unwrap());
        assert!(!circuit.is_connected(fa.first.a).unwrap());
        assert!(!circuit.is_connected(fa.carry.inputs.get(1).unwrap()).unwrap());
    }
}
