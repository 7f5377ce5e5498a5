//! The node contract and the context a node evaluates in.

use std::any::Any;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use cf_core::{CircuitError, CircuitResult, CompId, ComputeFault, PortValue};
use tracing::debug;

use crate::circuit::Circuit;
use crate::port::{Input, Output};

/// A computation node.
///
/// `compute` derives pending state from the current inputs and stores it in
/// the node's state (see [`EvalCtx::state`]); `set` publishes that state.
/// Faults raised by the node's own function are recorded with
/// [`EvalCtx::fault`] or [`EvalCtx::catch`]. Only engine errors such as
/// [`CircuitError::Disconnected`] and [`CircuitError::RecursiveEvaluation`]
/// should be returned from either step.
///
/// Nodes are shared immutably; a node can be re-entered while one of its own
/// publishes is still notifying subscribers, so everything that changes
/// during evaluation lives in the circuit, not in `self`.
pub trait Component: Send + Sync + 'static {
    fn compute(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()>;

    fn set(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()>;

    /// Sever every owned port. Composite nodes extend this to their internals.
    fn detach(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        ctx.detach_ports()
    }
}

/// Evaluation context handed to a component.
///
/// Holds the whole circuit exclusively for the duration of the call, so a
/// publish that ticks subscribers runs on the same borrow.
pub struct EvalCtx<'a> {
    circuit: &'a mut Circuit,
    id: CompId,
}

impl<'a> EvalCtx<'a> {
    pub(crate) fn new(circuit: &'a mut Circuit, id: CompId) -> Self {
        Self { circuit, id }
    }

    /// The component being evaluated.
    pub fn id(&self) -> CompId {
        self.id
    }

    pub fn name(&self) -> CircuitResult<&str> {
        self.circuit.name(self.id)
    }

    /// Read an input's current value, inheriting its source's error flag.
    pub fn read<T: PortValue>(&mut self, input: Input<T>) -> CircuitResult<T> {
        self.circuit.read(input)
    }

    /// Read every input of a slice in order.
    pub fn read_all<T: PortValue>(&mut self, inputs: &[Input<T>]) -> CircuitResult<Vec<T>> {
        inputs.iter().map(|input| self.read(*input)).collect()
    }

    /// Publish a value; subscribers may be ticked before this returns.
    pub fn publish<T: PortValue>(&mut self, output: Output<T>, value: T) -> CircuitResult<()> {
        self.circuit.publish(output, value)
    }

    /// This component's state.
    pub fn state<S: Any + Send>(&mut self) -> CircuitResult<&mut S> {
        self.circuit.state_mut(self.id)
    }

    pub fn has_error(&self) -> bool {
        self.circuit.has_error(self.id).unwrap_or(false)
    }

    /// Record a fault as this component's error flag.
    pub fn fault(&mut self, fault: ComputeFault) {
        if let Some(slot) = self.circuit.components.get_mut(self.id.slot()) {
            debug!(component = %slot.name, %fault, "compute fault");
            slot.has_error = true;
        }
    }

    /// Raise the error flag without a specific fault.
    pub fn flag_error(&mut self) {
        if let Some(slot) = self.circuit.components.get_mut(self.id.slot()) {
            slot.has_error = true;
        }
    }

    /// Unwrap a fallible function result, recording a fault as the error flag.
    pub fn catch<T>(&mut self, result: Result<T, ComputeFault>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(fault) => {
                self.fault(fault);
                None
            }
        }
    }

    /// Tick another component from inside this evaluation.
    pub fn tick(&mut self, id: CompId) -> CircuitResult<()> {
        self.circuit.tick(id)
    }

    /// The output an input reads from, or `Disconnected`.
    pub fn source_of<T>(&self, input: Input<T>) -> CircuitResult<Output<T>> {
        match self.circuit.source(input)? {
            Some(output) => Ok(output),
            None => Err(CircuitError::Disconnected {
                port: self.circuit.input_name(input)?.to_string(),
                component: self.name()?.to_string(),
            }),
        }
    }

    /// Sever every port owned by this component.
    pub fn detach_ports(&mut self) -> CircuitResult<()> {
        self.circuit.detach_ports(self.id)
    }

    pub fn circuit(&mut self) -> &mut Circuit {
        &mut *self.circuit
    }
}

/// Handle to a component added to a circuit.
///
/// Dereferences to the component value, which is where its port handles are.
pub struct NodeRef<C> {
    pub id: CompId,
    node: Arc<C>,
}

impl<C> NodeRef<C> {
    pub(crate) fn new(id: CompId, node: Arc<C>) -> Self {
        Self { id, node }
    }
}

impl<C> Clone for NodeRef<C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            node: Arc::clone(&self.node),
        }
    }
}

impl<C> Deref for NodeRef<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.node
    }
}

impl<C> fmt::Debug for NodeRef<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef").field("id", &self.id).finish()
    }
}
