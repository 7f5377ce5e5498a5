//! List nodes that run a wired function over every element of a list.
//!
//! The function is an ordinary sub-graph: it reads the node's `element`
//! output and its result is wired back into the node's `func` input.
//!
//! [`Map`] and [`Filter`] are driven by re-entry. Publishing an element ticks
//! the function, the function's publish ticks this node again while it is
//! still evaluating, and that nested evaluation folds the result and
//! publishes the next element. The recursion unwinds once the list is
//! exhausted. For the duration of the loop the function's source component is
//! allowed to recurse and its output notifies even when a result repeats.
//! Only a single-node function can be re-entered this way.
//!
//! [`Reduce`] pulls instead: it switches auto-propagation off on the function
//! output, publishes each element and the running accumulator, then reads the
//! function's result directly. It never recurses.

use cf_core::{CircuitResult, ComputeFault, PortValue};
use tracing::debug;

use crate::circuit::Circuit;
use crate::component::{Component, EvalCtx, NodeRef};
use crate::port::{Input, Output};

/// Progress of one map or filter run.
#[derive(Debug, Clone, PartialEq)]
pub enum Iteration<T, R> {
    Idle,
    /// `items[index]` is the element currently published.
    Iterating {
        index: usize,
        items: Vec<T>,
        acc: Vec<R>,
        faulted: bool,
    },
    /// The last element has been folded; waiting for the outermost evaluation.
    Finished { acc: Vec<R>, faulted: bool },
}

impl<T, R> Default for Iteration<T, R> {
    fn default() -> Self {
        Iteration::Idle
    }
}

impl<T: Clone, R> Iteration<T, R> {
    /// Start over `items`, returning the first element. An empty list leaves
    /// the phase untouched and returns `None`.
    pub fn begin(&mut self, items: Vec<T>, faulted: bool) -> Option<T> {
        let first = items.first().cloned()?;
        *self = Iteration::Iterating {
            index: 0,
            items,
            acc: Vec::new(),
            faulted,
        };
        Some(first)
    }

    /// Fold the function's result for the current element and move on,
    /// returning the next element to publish.
    pub fn advance(&mut self, faulted: bool, fold: impl FnOnce(&T, &mut Vec<R>)) -> Option<T> {
        match std::mem::take(self) {
            Iteration::Iterating {
                index,
                items,
                mut acc,
                faulted: before,
            } => {
                if let Some(item) = items.get(index) {
                    fold(item, &mut acc);
                }
                let faulted = before || faulted;
                let next = index + 1;
                match items.get(next).cloned() {
                    Some(item) => {
                        *self = Iteration::Iterating {
                            index: next,
                            items,
                            acc,
                            faulted,
                        };
                        Some(item)
                    }
                    None => {
                        *self = Iteration::Finished { acc, faulted };
                        None
                    }
                }
            }
            other => {
                *self = other;
                None
            }
        }
    }

    /// Take the finished accumulator and whether any step faulted, resetting
    /// to idle. Any other phase is also reset and yields `None`.
    pub fn finish(&mut self) -> Option<(Vec<R>, bool)> {
        match std::mem::take(self) {
            Iteration::Finished { acc, faulted } => Some((acc, faulted)),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Iteration::Idle)
    }

    pub fn is_iterating(&self) -> bool {
        matches!(self, Iteration::Iterating { .. })
    }
}

struct ListState<T, R> {
    phase: Iteration<T, R>,
    result: Option<Vec<R>>,
}

impl<T, R> Default for ListState<T, R> {
    fn default() -> Self {
        Self {
            phase: Iteration::Idle,
            result: None,
        }
    }
}

/// Shared compute step of map and filter.
fn drive<T, F, R>(
    ctx: &mut EvalCtx<'_>,
    list: Input<Option<Vec<T>>>,
    func: Input<F>,
    element: Output<T>,
    fold: fn(&T, F, &mut Vec<R>),
) -> CircuitResult<()>
where
    T: PortValue,
    F: PortValue,
    R: PortValue,
{
    let (iterating, idle) = {
        let phase = &ctx.state::<ListState<T, R>>()?.phase;
        (phase.is_iterating(), phase.is_idle())
    };
    if iterating {
        let value = ctx.read(func)?;
        let faulted = ctx.has_error();
        let next = ctx
            .state::<ListState<T, R>>()?
            .phase
            .advance(faulted, |item, acc| fold(item, value, acc));
        return match next {
            Some(item) => ctx.publish(element, item),
            None => Ok(()),
        };
    }
    if !idle {
        return Ok(());
    }

    let items = match ctx.read(list)? {
        None => {
            ctx.state::<ListState<T, R>>()?.result = None;
            return Ok(());
        }
        Some(items) if items.is_empty() => {
            ctx.state::<ListState<T, R>>()?.result = Some(Vec::new());
            return Ok(());
        }
        Some(items) => items,
    };
    let len = items.len();
    let list_faulted = ctx.has_error();

    let source = ctx.source_of(func)?;
    let owner = ctx.circuit().output_owner(source)?;
    let saved_recursion = ctx.circuit().set_allow_recursion(owner, true)?;
    let saved_notify = ctx.circuit().set_always_notify(source, true)?;

    let first = ctx.state::<ListState<T, R>>()?.phase.begin(items, list_faulted);
    debug!(component = %ctx.name()?, len, "iteration start");
    let outcome = match first {
        Some(item) => ctx.publish(element, item),
        None => Ok(()),
    };

    ctx.circuit().set_allow_recursion(owner, saved_recursion)?;
    ctx.circuit().set_always_notify(source, saved_notify)?;
    let finished = ctx.state::<ListState<T, R>>()?.phase.finish();
    outcome?;

    match finished {
        Some((acc, faulted)) => {
            debug!(component = %ctx.name()?, len = acc.len(), faulted, "iteration finished");
            ctx.state::<ListState<T, R>>()?.result = Some(acc);
            if faulted {
                ctx.flag_error();
            }
        }
        None => ctx.fault(ComputeFault::Domain {
            what: "iteration function did not report back",
        }),
    }
    Ok(())
}

/// Shared set step: only the outermost evaluation publishes, so a partial
/// list never reaches downstream.
fn publish_result<T, R>(ctx: &mut EvalCtx<'_>, result: Output<Option<Vec<R>>>) -> CircuitResult<()>
where
    T: PortValue,
    R: PortValue,
{
    let state = ctx.state::<ListState<T, R>>()?;
    if !state.phase.is_idle() {
        return Ok(());
    }
    let value = state.result.clone();
    ctx.publish(result, value)
}

/// Applies the function to every element: `[f(x0), f(x1), ...]`.
pub struct Map<T, U> {
    pub list: Input<Option<Vec<T>>>,
    pub func: Input<U>,
    pub element: Output<T>,
    pub result: Output<Option<Vec<U>>>,
}

impl<T: PortValue, U: PortValue> Map<T, U> {
    pub fn add(circuit: &mut Circuit) -> CircuitResult<NodeRef<Self>> {
        let name = circuit.unique_name("Map");
        circuit.add(name, |b| {
            b.state(ListState::<T, U>::default());
            b.allow_recursion(true);
            let notify = b.options().always_notify();
            Ok(Map {
                list: b.input("List"),
                func: b.input("Func"),
                element: b.output_with("Element", notify),
                result: b.output("Result"),
            })
        })
    }
}

impl<T: PortValue, U: PortValue> Component for Map<T, U> {
    fn compute(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        drive::<T, U, U>(ctx, self.list, self.func, self.element, |_, mapped, acc| {
            acc.push(mapped)
        })
    }

    fn set(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        publish_result::<T, U>(ctx, self.result)
    }
}

/// Keeps the elements for which the predicate function is true.
pub struct Filter<T> {
    pub list: Input<Option<Vec<T>>>,
    pub func: Input<bool>,
    pub element: Output<T>,
    pub result: Output<Option<Vec<T>>>,
}

impl<T: PortValue> Filter<T> {
    pub fn add(circuit: &mut Circuit) -> CircuitResult<NodeRef<Self>> {
        let name = circuit.unique_name("Filter");
        circuit.add(name, |b| {
            b.state(ListState::<T, T>::default());
            b.allow_recursion(true);
            let notify = b.options().always_notify();
            Ok(Filter {
                list: b.input("List"),
                func: b.input("Func"),
                element: b.output_with("Element", notify),
                result: b.output("Result"),
            })
        })
    }
}

impl<T: PortValue> Component for Filter<T> {
    fn compute(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        drive::<T, bool, T>(ctx, self.list, self.func, self.element, |item, keep, acc| {
            if keep {
                acc.push(item.clone());
            }
        })
    }

    fn set(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        publish_result::<T, T>(ctx, self.result)
    }
}

/// Folds the list through the function, starting from `start`.
///
/// The function reads `element` and `current` and its result becomes the
/// next accumulator. An absent list reduces to the default value.
pub struct Reduce<T, U> {
    pub list: Input<Option<Vec<T>>>,
    pub start: Input<U>,
    pub func: Input<U>,
    pub element: Output<T>,
    pub current: Output<U>,
    pub result: Output<U>,
}

impl<T: PortValue, U: PortValue> Reduce<T, U> {
    pub fn add(circuit: &mut Circuit) -> CircuitResult<NodeRef<Self>> {
        let name = circuit.unique_name("Reduce");
        circuit.add(name, |b| {
            b.state(U::default());
            Ok(Reduce {
                list: b.input("List"),
                start: b.input("Start"),
                func: b.input("Func"),
                element: b.output("Element"),
                current: b.output("Current"),
                result: b.output("Result"),
            })
        })
    }

    fn fold(&self, ctx: &mut EvalCtx<'_>, items: Vec<T>, mut acc: U) -> CircuitResult<U> {
        for item in items {
            ctx.publish(self.element, item)?;
            ctx.publish(self.current, acc)?;
            acc = ctx.read(self.func)?;
        }
        Ok(acc)
    }
}

impl<T: PortValue, U: PortValue> Component for Reduce<T, U> {
    fn compute(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        let Some(items) = ctx.read(self.list)? else {
            *ctx.state::<U>()? = U::default();
            return Ok(());
        };
        let start = ctx.read(self.start)?;
        if items.is_empty() {
            *ctx.state::<U>()? = start;
            return Ok(());
        }

        let source = ctx.source_of(self.func)?;
        let saved = ctx.circuit().set_auto_propagate(source, false)?;
        debug!(component = %ctx.name()?, len = items.len(), "reduce start");
        let outcome = self.fold(ctx, items, start);
        ctx.circuit().set_auto_propagate(source, saved)?;

        *ctx.state::<U>()? = outcome?;
        Ok(())
    }

    fn set(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        let value = ctx.state::<U>()?.clone();
        ctx.publish(self.result, value)
    }
}
