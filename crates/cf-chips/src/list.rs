//! Element access on list values.
//!
//! Lists travel as `Option<Vec<T>>`; `None` is an absent list.

use cf_core::{CircuitResult, ComputeFault, PortValue};
use cf_engine::{Circuit, Component, EvalCtx, Input, NodeRef, Output};

use crate::template::{hold, publish_held, UnaryFunctor};

/// Picks the element at `Pos` from `List`.
///
/// With `wrap` set, positions are taken modulo the list length, so `-1` is
/// the last element. Without it a position past the end yields the default
/// value and a negative position is a fault. An absent or empty list yields
/// the default value.
pub struct GetPos<T> {
    pub list: Input<Option<Vec<T>>>,
    pub pos: Input<i64>,
    pub out: Output<T>,
    wrap: bool,
}

impl<T: PortValue> GetPos<T> {
    pub fn add(circuit: &mut Circuit, wrap: bool) -> CircuitResult<NodeRef<Self>> {
        let name = circuit.unique_name("GetPos");
        circuit.add(name, |b| {
            b.state(T::default());
            Ok(Self {
                list: b.input("List"),
                pos: b.input("Pos"),
                out: b.output("Out"),
                wrap,
            })
        })
    }
}

fn element_at<T: PortValue>(items: &[T], pos: i64, wrap: bool) -> Result<T, ComputeFault> {
    if items.is_empty() {
        return Ok(T::default());
    }
    let len = items.len();
    let index = if wrap {
        let len_i = i64::try_from(len).map_err(|_| ComputeFault::Overflow)?;
        usize::try_from(pos.rem_euclid(len_i)).map_err(|_| ComputeFault::Overflow)?
    } else {
        usize::try_from(pos).map_err(|_| ComputeFault::IndexOutOfRange { index: pos, len })?
    };
    Ok(items.get(index).cloned().unwrap_or_default())
}

impl<T: PortValue> Component for GetPos<T> {
    fn compute(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        let list = ctx.read(self.list)?;
        let pos = ctx.read(self.pos)?;
        let items = list.unwrap_or_default();
        hold(ctx, element_at(&items, pos, self.wrap))
    }

    fn set(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        publish_held(ctx, self.out)
    }
}

/// Number of elements; an absent list has length zero.
pub fn length<T: PortValue>(
    circuit: &mut Circuit,
) -> CircuitResult<NodeRef<UnaryFunctor<Option<Vec<T>>, i64>>> {
    UnaryFunctor::add(circuit, "ListLength", |list: Option<Vec<T>>| {
        let len = list.map_or(0, |items| items.len());
        i64::try_from(len).map_err(|_| ComputeFault::Overflow)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::GenericInput;

    #[test]
    fn indexing_rules() {
        let items = [10_i64, 20, 30];
        assert_eq!(element_at(&items, 1, false), Ok(20));
        assert_eq!(element_at(&items, 3, false), Ok(0));
        assert_eq!(
            element_at(&items, -1, false),
            Err(ComputeFault::IndexOutOfRange { index: -1, len: 3 })
        );
        assert_eq!(element_at(&items, -1, true), Ok(30));
        assert_eq!(element_at(&items, 7, true), Ok(20));
        assert_eq!(element_at::<i64>(&[], 0, true), Ok(0));
    }

    #[test]
    fn get_pos_on_absent_list_is_default() {
        let mut circuit = Circuit::new();
        let list = GenericInput::<Option<Vec<String>>>::add(&mut circuit).unwrap();
        let pos = GenericInput::<i64>::add(&mut circuit).unwrap();
        let get = GetPos::<String>::add(&mut circuit, false).unwrap();
        circuit.connect(get.list, list.out).unwrap();
        circuit.connect(get.pos, pos.out).unwrap();

        pos.set(&mut circuit, 0).unwrap();
        assert_eq!(circuit.value(get.out).unwrap(), "");
        list.set(&mut circuit, Some(vec!["a".into(), "b".into()])).unwrap();
        assert_eq!(circuit.value(get.out).unwrap(), "a");
        pos.set(&mut circuit, -2).unwrap();
        assert!(circuit.has_error(get.id).unwrap());
        assert_eq!(circuit.value(get.out).unwrap(), "a");
    }

    #[test]
    fn list_length() {
        let mut circuit = Circuit::new();
        let list = GenericInput::<Option<Vec<i64>>>::add(&mut circuit).unwrap();
        let len = length::<i64>(&mut circuit).unwrap();
        circuit.connect(len.a, list.out).unwrap();
        list.set(&mut circuit, None).unwrap();
        assert_eq!(circuit.value(len.out).unwrap(), 0);
        list.set(&mut circuit, Some(vec![4, 5, 6])).unwrap();
        assert_eq!(circuit.value(len.out).unwrap(), 3);
    }
}
