//! The circuit arena and the propagation engine.
//!
//! Components and ports live in flat vectors indexed by [`cf_core::Id`]. An
//! edge is the pair (input slot `source`, output slot `sinks` entry); the two
//! sides are only ever updated together, in [`Circuit::connect`] and the
//! detach helpers.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use cf_core::{
    CircuitError, CircuitResult, CompId, EngineConfig, ErasedValue, InputId, OutputId, PortValue,
};
use tracing::{debug, trace, warn};

use crate::builder::NodeBuilder;
use crate::component::{Component, EvalCtx, NodeRef};
use crate::port::{Input, InputSlot, Output, OutputSlot, PortKind};

pub(crate) struct ComponentSlot {
    pub name: String,
    /// `None` only while the component's builder is running.
    pub node: Option<Arc<dyn Component>>,
    pub state: Option<Box<dyn Any + Send>>,
    pub evaluating: bool,
    pub allow_recursion: bool,
    pub has_error: bool,
    pub inputs: Vec<InputId>,
    pub outputs: Vec<OutputId>,
}

/// Arena lengths recorded before a builder runs, used to undo a failed build.
#[derive(Clone, Copy)]
struct Mark {
    components: usize,
    inputs: usize,
    outputs: usize,
}

/// An output as it was before a publish inside the running chain.
struct Published {
    output: OutputId,
    value: ErasedValue,
    last: ErasedValue,
    first: bool,
}

/// A graph of components wired output-to-input.
///
/// Evaluation is synchronous: [`Circuit::tick`] runs a component's compute and
/// set steps, and every publish that passes change suppression ticks the
/// subscribed components before returning.
///
/// A chain is all-or-nothing for published values: when the outermost tick
/// fails with a fatal error, every output published since it started is put
/// back, so no output reflects the aborted trigger. Component state is not
/// part of this; it is recomputed on the next evaluation.
#[derive(Default)]
pub struct Circuit {
    pub(crate) components: Vec<ComponentSlot>,
    pub(crate) inputs: Vec<InputSlot>,
    pub(crate) outputs: Vec<OutputSlot>,
    name_counters: HashMap<String, u32>,
    config: EngineConfig,
    /// Nesting of ticks currently on the stack.
    depth: usize,
    journal: Vec<Published>,
}

impl Circuit {
    /// Create an empty circuit with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty circuit whose new ports take their flags from `config`.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of components ever added.
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Next positional name for a component kind: `"IntAdd0"`, `"IntAdd1"`, ...
    pub fn unique_name(&mut self, kind: &str) -> String {
        let counter = self.name_counters.entry(kind.to_string()).or_insert(0);
        let name = format!("{kind}{counter}");
        *counter += 1;
        name
    }

    /// Add a component.
    ///
    /// `build` creates the component's ports through the [`NodeBuilder`] and
    /// returns the component value. If it fails, every slot it allocated is
    /// released again and the circuit is left as it was.
    pub fn add<C, F>(&mut self, name: impl Into<String>, build: F) -> CircuitResult<NodeRef<C>>
    where
        C: Component,
        F: FnOnce(&mut NodeBuilder<'_>) -> CircuitResult<C>,
    {
        let mark = self.mark();
        let id = CompId::for_slot(self.components.len());
        self.components.push(ComponentSlot {
            name: name.into(),
            node: None,
            state: None,
            evaluating: false,
            allow_recursion: false,
            has_error: false,
            inputs: Vec::new(),
            outputs: Vec::new(),
        });

        let built = {
            let mut builder = NodeBuilder::new(self, id);
            build(&mut builder)
        };

        match built {
            Ok(component) => {
                let node = Arc::new(component);
                let erased: Arc<dyn Component> = node.clone();
                self.component_slot_mut(id)?.node = Some(erased);
                Ok(NodeRef::new(id, node))
            }
            Err(err) => {
                self.rollback(mark);
                Err(err)
            }
        }
    }

    fn mark(&self) -> Mark {
        Mark {
            components: self.components.len(),
            inputs: self.inputs.len(),
            outputs: self.outputs.len(),
        }
    }

    fn rollback(&mut self, mark: Mark) {
        self.components.truncate(mark.components);
        self.inputs.truncate(mark.inputs);
        self.outputs.truncate(mark.outputs);
        for output in &mut self.outputs {
            output.sinks.retain(|sink| sink.slot() < mark.inputs);
        }
        for input in &mut self.inputs {
            if input.source.is_some_and(|source| source.slot() >= mark.outputs) {
                input.source = None;
            }
        }
    }

    // ---------------------------------------------------------------------
    // Slot access
    // ---------------------------------------------------------------------

    pub(crate) fn component_slot(&self, id: CompId) -> CircuitResult<&ComponentSlot> {
        self.components
            .get(id.slot())
            .ok_or(CircuitError::UnknownComponent { id: id.index() })
    }

    pub(crate) fn component_slot_mut(&mut self, id: CompId) -> CircuitResult<&mut ComponentSlot> {
        self.components
            .get_mut(id.slot())
            .ok_or(CircuitError::UnknownComponent { id: id.index() })
    }

    pub(crate) fn input_slot(&self, id: InputId) -> CircuitResult<&InputSlot> {
        self.inputs.get(id.slot()).ok_or(CircuitError::UnknownPort {
            kind: PortKind::Input.as_str(),
            id: id.index(),
        })
    }

    pub(crate) fn input_slot_mut(&mut self, id: InputId) -> CircuitResult<&mut InputSlot> {
        self.inputs.get_mut(id.slot()).ok_or(CircuitError::UnknownPort {
            kind: PortKind::Input.as_str(),
            id: id.index(),
        })
    }

    pub(crate) fn output_slot(&self, id: OutputId) -> CircuitResult<&OutputSlot> {
        self.outputs.get(id.slot()).ok_or(CircuitError::UnknownPort {
            kind: PortKind::Output.as_str(),
            id: id.index(),
        })
    }

    pub(crate) fn output_slot_mut(&mut self, id: OutputId) -> CircuitResult<&mut OutputSlot> {
        self.outputs.get_mut(id.slot()).ok_or(CircuitError::UnknownPort {
            kind: PortKind::Output.as_str(),
            id: id.index(),
        })
    }

    // ---------------------------------------------------------------------
    // Component flags and state
    // ---------------------------------------------------------------------

    pub fn name(&self, id: CompId) -> CircuitResult<&str> {
        Ok(&self.component_slot(id)?.name)
    }

    pub fn has_error(&self, id: CompId) -> CircuitResult<bool> {
        Ok(self.component_slot(id)?.has_error)
    }

    pub(crate) fn set_error(&mut self, id: CompId) -> CircuitResult<()> {
        self.component_slot_mut(id)?.has_error = true;
        Ok(())
    }

    pub fn is_evaluating(&self, id: CompId) -> CircuitResult<bool> {
        Ok(self.component_slot(id)?.evaluating)
    }

    pub fn allows_recursion(&self, id: CompId) -> CircuitResult<bool> {
        Ok(self.component_slot(id)?.allow_recursion)
    }

    /// Set the recursion allowance of a component, returning the previous value.
    pub fn set_allow_recursion(&mut self, id: CompId, allow: bool) -> CircuitResult<bool> {
        let slot = self.component_slot_mut(id)?;
        Ok(std::mem::replace(&mut slot.allow_recursion, allow))
    }

    /// Shared view of a component's state.
    pub fn state<S: Any + Send>(&self, id: CompId) -> CircuitResult<&S> {
        let slot = self.component_slot(id)?;
        slot.state
            .as_ref()
            .and_then(|state| state.downcast_ref::<S>())
            .ok_or_else(|| CircuitError::StateMismatch {
                component: slot.name.clone(),
                expected: std::any::type_name::<S>(),
            })
    }

    /// Mutable view of a component's state.
    ///
    /// Changing state from outside does not tick the component; external
    /// drivers set their state and then call [`Circuit::tick`].
    pub fn state_mut<S: Any + Send>(&mut self, id: CompId) -> CircuitResult<&mut S> {
        let slot = self.component_slot_mut(id)?;
        match slot.state.as_mut().and_then(|state| state.downcast_mut::<S>()) {
            Some(state) => Ok(state),
            None => Err(CircuitError::StateMismatch {
                component: slot.name.clone(),
                expected: std::any::type_name::<S>(),
            }),
        }
    }

    // ---------------------------------------------------------------------
    // Ports and edges
    // ---------------------------------------------------------------------

    pub fn input_name<T>(&self, input: Input<T>) -> CircuitResult<&str> {
        Ok(&self.input_slot(input.id())?.name)
    }

    pub fn output_name<T>(&self, output: Output<T>) -> CircuitResult<&str> {
        Ok(&self.output_slot(output.id())?.name)
    }

    /// Component that owns an input port.
    pub fn input_owner<T>(&self, input: Input<T>) -> CircuitResult<CompId> {
        Ok(self.input_slot(input.id())?.owner)
    }

    /// Component that owns an output port.
    pub fn output_owner<T>(&self, output: Output<T>) -> CircuitResult<CompId> {
        Ok(self.output_slot(output.id())?.owner)
    }

    /// Inputs owned by a component, in creation order.
    pub fn component_inputs(&self, id: CompId) -> CircuitResult<&[InputId]> {
        Ok(&self.component_slot(id)?.inputs)
    }

    /// Outputs owned by a component, in creation order.
    pub fn component_outputs(&self, id: CompId) -> CircuitResult<&[OutputId]> {
        Ok(&self.component_slot(id)?.outputs)
    }

    /// Wire `input` to read from `output`.
    ///
    /// The input leaves the fan-out of its previous source first. Reassigning
    /// the current source is a no-op.
    pub fn connect<T: PortValue>(&mut self, input: Input<T>, output: Output<T>) -> CircuitResult<()> {
        self.output_slot(output.id())?;
        self.set_source(input.id(), Some(output.id()))
    }

    /// Clear the source of `input`.
    pub fn disconnect<T>(&mut self, input: Input<T>) -> CircuitResult<()> {
        self.set_source(input.id(), None)
    }

    pub(crate) fn set_source(&mut self, input: InputId, source: Option<OutputId>) -> CircuitResult<()> {
        let previous = self.input_slot(input)?.source;
        if previous == source {
            return Ok(());
        }
        if let Some(previous) = previous {
            self.output_slot_mut(previous)?
                .sinks
                .retain(|sink| *sink != input);
        }
        self.input_slot_mut(input)?.source = source;
        if let Some(source) = source {
            let sinks = &mut self.output_slot_mut(source)?.sinks;
            if !sinks.contains(&input) {
                sinks.push(input);
            }
        }
        Ok(())
    }

    /// Current source of `input`, if any.
    pub fn source<T>(&self, input: Input<T>) -> CircuitResult<Option<Output<T>>> {
        Ok(self.input_slot(input.id())?.source.map(Output::from_id))
    }

    pub fn is_connected<T>(&self, input: Input<T>) -> CircuitResult<bool> {
        Ok(self.input_slot(input.id())?.source.is_some())
    }

    /// Inputs subscribed to `output`, in subscription order.
    pub fn sinks<T>(&self, output: Output<T>) -> CircuitResult<Vec<Input<T>>> {
        Ok(self
            .output_slot(output.id())?
            .sinks
            .iter()
            .map(|sink| Input::from_id(*sink))
            .collect())
    }

    /// Detach every subscriber of `output`.
    pub fn detach_output<T>(&mut self, output: Output<T>) -> CircuitResult<()> {
        self.detach_output_id(output.id())
    }

    pub(crate) fn detach_output_id(&mut self, output: OutputId) -> CircuitResult<()> {
        let sinks = self.output_slot(output)?.sinks.clone();
        for sink in sinks {
            self.set_source(sink, None)?;
        }
        Ok(())
    }

    /// Sever every port owned by a component, without running its detach hook.
    pub fn detach_ports(&mut self, id: CompId) -> CircuitResult<()> {
        let slot = self.component_slot(id)?;
        let inputs = slot.inputs.clone();
        let outputs = slot.outputs.clone();
        for input in inputs {
            self.set_source(input, None)?;
        }
        for output in outputs {
            self.detach_output_id(output)?;
        }
        Ok(())
    }

    /// Tear a component out of the graph by running its detach hook.
    pub fn detach(&mut self, id: CompId) -> CircuitResult<()> {
        let node = self.node(id)?;
        debug!(component = %self.component_slot(id)?.name, "detach");
        let mut ctx = EvalCtx::new(self, id);
        node.detach(&mut ctx)
    }

    pub fn auto_propagates<T>(&self, output: Output<T>) -> CircuitResult<bool> {
        Ok(self.output_slot(output.id())?.auto_propagate)
    }

    /// Set the auto-propagate flag of an output, returning the previous value.
    pub fn set_auto_propagate<T>(&mut self, output: Output<T>, on: bool) -> CircuitResult<bool> {
        let slot = self.output_slot_mut(output.id())?;
        Ok(std::mem::replace(&mut slot.auto_propagate, on))
    }

    pub fn always_notifies<T>(&self, output: Output<T>) -> CircuitResult<bool> {
        Ok(self.output_slot(output.id())?.always_notify)
    }

    /// Set the always-notify flag of an output, returning the previous value.
    pub fn set_always_notify<T>(&mut self, output: Output<T>, on: bool) -> CircuitResult<bool> {
        let slot = self.output_slot_mut(output.id())?;
        Ok(std::mem::replace(&mut slot.always_notify, on))
    }

    /// Current value of an output.
    pub fn value<T: PortValue>(&self, output: Output<T>) -> CircuitResult<T> {
        self.output_slot(output.id())?.value.get::<T>().cloned()
    }

    // ---------------------------------------------------------------------
    // Evaluation
    // ---------------------------------------------------------------------

    fn node(&self, id: CompId) -> CircuitResult<Arc<dyn Component>> {
        self.component_slot(id)?
            .node
            .clone()
            .ok_or(CircuitError::UnknownComponent { id: id.index() })
    }

    /// Evaluate a component: clear its error flag, compute, then publish.
    ///
    /// Fails with [`CircuitError::RecursiveEvaluation`] when the component is
    /// already evaluating further up the stack and does not allow recursion.
    /// The evaluating marker is restored to its value on entry, so a nested
    /// re-entrant tick leaves the enclosing evaluation marked.
    pub fn tick(&mut self, id: CompId) -> CircuitResult<()> {
        let trace_ticks = self.config.trace_ticks;
        let node = self.node(id)?;
        let slot = self.component_slot_mut(id)?;
        slot.has_error = false;
        if slot.evaluating && !slot.allow_recursion {
            let component = slot.name.clone();
            warn!(%component, "recursive tick rejected");
            return Err(CircuitError::RecursiveEvaluation { component });
        }

        let enclosing = slot.evaluating;
        slot.evaluating = true;
        if trace_ticks {
            trace!(component = %slot.name, reentrant = enclosing, "tick enter");
        }

        self.depth += 1;
        let result = {
            let mut ctx = EvalCtx::new(self, id);
            node.compute(&mut ctx).and_then(|()| node.set(&mut ctx))
        };
        self.depth -= 1;
        if self.depth == 0 {
            let journal = std::mem::take(&mut self.journal);
            if result.is_err() {
                self.undo(journal);
            }
        }

        let slot = self.component_slot_mut(id)?;
        slot.evaluating = enclosing;
        if trace_ticks {
            trace!(component = %slot.name, error = slot.has_error, "tick leave");
        }
        result
    }

    /// Put outputs back as they were, newest publish first.
    fn undo(&mut self, journal: Vec<Published>) {
        debug!(publishes = journal.len(), "aborted chain undone");
        for entry in journal.into_iter().rev() {
            if let Some(slot) = self.outputs.get_mut(entry.output.slot()) {
                slot.value = entry.value;
                slot.last = entry.last;
                slot.first = entry.first;
            }
        }
    }

    /// Read an input on behalf of its owner.
    ///
    /// The owner inherits the error flag of the source's component.
    pub(crate) fn read<T: PortValue>(&mut self, input: Input<T>) -> CircuitResult<T> {
        let slot = self.input_slot(input.id())?;
        let owner = slot.owner;
        let Some(source) = slot.source else {
            return Err(CircuitError::Disconnected {
                port: slot.name.clone(),
                component: self.component_slot(owner)?.name.clone(),
            });
        };

        let output = self.output_slot(source)?;
        let value = output.value.get::<T>()?.clone();
        if self.component_slot(output.owner)?.has_error {
            self.set_error(owner)?;
        }
        Ok(value)
    }

    /// Store a new value on an output and notify subscribers.
    ///
    /// Subscribers are ticked when auto-propagate is on and this is the first
    /// publish, the value differs from the last published one, or the output
    /// always notifies. A fatal error from a subscriber skips the remaining
    /// notifications; the outermost tick then undoes the whole chain.
    pub(crate) fn publish<T: PortValue>(&mut self, output: Output<T>, value: T) -> CircuitResult<()> {
        let id = output.id();
        if self.depth > 0 {
            let slot = self.output_slot(id)?;
            let entry = Published {
                output: id,
                value: slot.value.clone(),
                last: slot.last.clone(),
                first: slot.first,
            };
            self.journal.push(entry);
        }
        let slot = self.output_slot_mut(id)?;
        slot.value.set(value.clone())?;
        let changed = slot.first || slot.always_notify || !slot.last.same_value(&slot.value);
        let fire = slot.auto_propagate && changed;

        if fire {
            let sinks = slot.sinks.clone();
            for sink in sinks {
                let input = self.input_slot(sink)?;
                // a sink detached by an earlier subscriber's evaluation is skipped
                if input.source != Some(id) {
                    continue;
                }
                let owner = input.owner;
                trace!(output = %id, input = %sink, "notify");
                self.tick(owner)?;
            }
        }

        let slot = self.output_slot_mut(id)?;
        if fire {
            slot.first = false;
        }
        slot.last.set(value)
    }
}
