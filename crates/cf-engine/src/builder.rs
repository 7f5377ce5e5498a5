//! Port allocation for a component under construction.

use std::any::Any;

use cf_core::{CircuitError, CircuitResult, CompId, InputId, OutputId, PortValue};

use crate::bundle::{InputBundle, OutputBundle, PortSet, default_input_name, default_output_name};
use crate::circuit::Circuit;
use crate::port::{Input, InputSlot, Output, OutputSlot, PortOptions};

/// Allocates ports and state for one component while [`Circuit::add`] runs.
pub struct NodeBuilder<'a> {
    circuit: &'a mut Circuit,
    id: CompId,
}

impl<'a> NodeBuilder<'a> {
    pub(crate) fn new(circuit: &'a mut Circuit, id: CompId) -> Self {
        Self { circuit, id }
    }

    /// Id the component will have once added.
    pub fn id(&self) -> CompId {
        self.id
    }

    /// Options new outputs get unless overridden.
    pub fn options(&self) -> PortOptions {
        PortOptions::from(self.circuit.config())
    }

    pub fn input<T: PortValue>(&mut self, name: impl Into<String>) -> Input<T> {
        let id = InputId::for_slot(self.circuit.inputs.len());
        self.circuit.inputs.push(InputSlot {
            name: name.into(),
            owner: self.id,
            source: None,
        });
        if let Some(slot) = self.circuit.components.get_mut(self.id.slot()) {
            slot.inputs.push(id);
        }
        Input::from_id(id)
    }

    pub fn output<T: PortValue>(&mut self, name: impl Into<String>) -> Output<T> {
        let options = self.options();
        self.output_with(name, options)
    }

    pub fn output_with<T: PortValue>(
        &mut self,
        name: impl Into<String>,
        options: PortOptions,
    ) -> Output<T> {
        let id = OutputId::for_slot(self.circuit.outputs.len());
        self.circuit
            .outputs
            .push(OutputSlot::new::<T>(name.into(), self.id, options));
        if let Some(slot) = self.circuit.components.get_mut(self.id.slot()) {
            slot.outputs.push(id);
        }
        Output::from_id(id)
    }

    /// A fixed-arity tuple of inputs, named `A`, `B`, ... unless `names` is given.
    pub fn inputs<B: InputBundle>(&mut self, names: Option<&[&str]>) -> CircuitResult<B> {
        let names = bundle_names("input bundle", B::ARITY, names, default_input_name)?;
        Ok(B::create(self, &names))
    }

    /// A fixed-arity tuple of outputs, named `Out1`, `Out2`, ... unless `names` is given.
    pub fn outputs<B: OutputBundle>(&mut self, names: Option<&[&str]>) -> CircuitResult<B> {
        let names = bundle_names("output bundle", B::ARITY, names, default_output_name)?;
        Ok(B::create(self, &names))
    }

    /// `count` inputs named `<prefix>0`, `<prefix>1`, ...
    pub fn input_set<T: PortValue>(&mut self, prefix: &str, count: usize) -> PortSet<Input<T>> {
        PortSet::new(
            (0..count)
                .map(|i| self.input::<T>(format!("{prefix}{i}")))
                .collect(),
        )
    }

    /// `count` outputs named `<prefix>0`, `<prefix>1`, ...
    pub fn output_set<T: PortValue>(&mut self, prefix: &str, count: usize) -> PortSet<Output<T>> {
        PortSet::new(
            (0..count)
                .map(|i| self.output::<T>(format!("{prefix}{i}")))
                .collect(),
        )
    }

    /// Install the component's state, replacing any earlier one.
    pub fn state<S: Any + Send>(&mut self, state: S) {
        if let Some(slot) = self.circuit.components.get_mut(self.id.slot()) {
            slot.state = Some(Box::new(state));
        }
    }

    pub fn allow_recursion(&mut self, allow: bool) {
        if let Some(slot) = self.circuit.components.get_mut(self.id.slot()) {
            slot.allow_recursion = allow;
        }
    }

    /// The circuit being built into, for composites that add internal nodes.
    pub fn circuit(&mut self) -> &mut Circuit {
        &mut *self.circuit
    }
}

fn bundle_names(
    what: &str,
    arity: usize,
    names: Option<&[&str]>,
    default_name: fn(usize) -> String,
) -> CircuitResult<Vec<String>> {
    match names {
        Some(names) if names.len() != arity => Err(CircuitError::InvalidArity {
            what: format!("{what} names"),
            expected: arity.to_string(),
            found: names.len(),
        }),
        Some(names) => Ok(names.iter().map(|n| n.to_string()).collect()),
        None => Ok((0..arity).map(default_name).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, EvalCtx};

    struct Pair {
        ins: (Input<i64>, Input<bool>),
        outs: (Output<i64>, Output<String>),
    }

    impl Component for Pair {
        fn compute(&self, _ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
            Ok(())
        }

        fn set(&self, _ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
            Ok(())
        }
    }

    #[test]
    fn bundles_get_positional_names() {
        let mut circuit = Circuit::new();
        let node = circuit
            .add("Pair", |b| {
                Ok(Pair {
                    ins: b.inputs(None)?,
                    outs: b.outputs(None)?,
                })
            })
            .unwrap();
        assert_eq!(circuit.input_name(node.ins.0).unwrap(), "A");
        assert_eq!(circuit.input_name(node.ins.1).unwrap(), "B");
        assert_eq!(circuit.output_name(node.outs.0).unwrap(), "Out1");
        assert_eq!(circuit.output_name(node.outs.1).unwrap(), "Out2");
        assert_eq!(circuit.component_inputs(node.id).unwrap().len(), 2);
    }

    #[test]
    fn custom_names_must_match_arity() {
        let mut circuit = Circuit::new();
        let err = circuit
            .add("Pair", |b| {
                Ok(Pair {
                    ins: b.inputs(Some(&["X"][..]))?,
                    outs: b.outputs(None)?,
                })
            })
            .unwrap_err();
        assert!(matches!(err, CircuitError::InvalidArity { found: 1, .. }));
        assert_eq!(circuit.component_count(), 0);
    }

    #[test]
    fn manual_outputs_do_not_propagate() {
        let mut circuit = Circuit::new();
        let node = circuit
            .add("Pair", |b| {
                let options = b.options().manual();
                Ok(Pair {
                    ins: b.inputs(Some(&["X", "Y"][..]))?,
                    outs: (b.output_with("Sum", options), b.output("Text")),
                })
            })
            .unwrap();
        assert!(!circuit.auto_propagates(node.outs.0).unwrap());
        assert!(circuit.auto_propagates(node.outs.1).unwrap());
        assert_eq!(circuit.input_name(node.ins.1).unwrap(), "Y");
    }
}
