//! Port values and their type-erased storage.

use std::any::{Any, TypeId};
use std::fmt;

use crate::error::{CircuitError, CircuitResult};

/// Bound for anything that can travel along an edge.
///
/// `PartialEq` drives change suppression on outputs and `Default` is the value
/// an output holds before its first publish. Absent collections are modelled
/// as `Option<Vec<T>>`, whose default is `None`.
pub trait PortValue: Clone + PartialEq + Default + fmt::Debug + Send + Sync + 'static {}

impl<T> PortValue for T where T: Clone + PartialEq + Default + fmt::Debug + Send + Sync + 'static {}

/// Type-erased but type-checked container for a port value.
///
/// Output slots of every value type live in one arena, so the value is boxed
/// behind `Any` and the handful of operations the engine needs (clone,
/// equality, debug) are captured as function pointers at construction.
pub struct ErasedValue {
    data: Box<dyn Any + Send + Sync>,
    clone_fn: fn(&(dyn Any + Send + Sync)) -> Box<dyn Any + Send + Sync>,
    eq_fn: fn(&(dyn Any + Send + Sync), &(dyn Any + Send + Sync)) -> bool,
    debug_fn: fn(&(dyn Any + Send + Sync), &mut fmt::Formatter<'_>) -> fmt::Result,
    type_name: &'static str,
    type_id: TypeId,
}

impl ErasedValue {
    pub fn new<T: PortValue>(value: T) -> Self {
        Self {
            data: Box::new(value),
            clone_fn: |any| match any.downcast_ref::<T>() {
                Some(typed) => Box::new(typed.clone()),
                None => Box::new(T::default()),
            },
            eq_fn: |a, b| match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
            debug_fn: |any, f| match any.downcast_ref::<T>() {
                Some(typed) => fmt::Debug::fmt(typed, f),
                None => f.write_str("<mismatched>"),
            },
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
        }
    }

    /// The default value of `T`, boxed.
    pub fn default_of<T: PortValue>() -> Self {
        Self::new(T::default())
    }

    pub fn get<T: 'static>(&self) -> CircuitResult<&T> {
        self.data
            .downcast_ref::<T>()
            .ok_or_else(|| CircuitError::TypeMismatch {
                what: "port value".into(),
                expected: std::any::type_name::<T>(),
                found: self.type_name,
            })
    }

    /// Replace the held value, keeping the captured type operations.
    pub fn set<T: PortValue>(&mut self, value: T) -> CircuitResult<()> {
        if !self.is_type::<T>() {
            return Err(CircuitError::TypeMismatch {
                what: "port value".into(),
                expected: self.type_name,
                found: std::any::type_name::<T>(),
            });
        }
        self.data = Box::new(value);
        Ok(())
    }

    fn is_type<T: 'static>(&self) -> bool {
        TypeId::of::<T>() == self.type_id
    }

    /// Value equality; values of different types are never equal.
    pub fn same_value(&self, other: &ErasedValue) -> bool {
        self.type_id == other.type_id && (self.eq_fn)(self.data.as_ref(), other.data.as_ref())
    }
}

impl Clone for ErasedValue {
    fn clone(&self) -> Self {
        Self {
            data: (self.clone_fn)(self.data.as_ref()),
            clone_fn: self.clone_fn,
            eq_fn: self.eq_fn,
            debug_fn: self.debug_fn,
            type_name: self.type_name,
            type_id: self.type_id,
        }
    }
}

impl fmt::Debug for ErasedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self.debug_fn)(self.data.as_ref(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_checks_type() {
        let value = ErasedValue::new(42_i64);
        assert_eq!(value.get::<i64>().unwrap(), &42);
        assert!(matches!(
            value.get::<String>(),
            Err(CircuitError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn equality_is_by_value_and_type() {
        let a = ErasedValue::new(Some(vec![1_i64, 2]));
        let b = ErasedValue::new(Some(vec![1_i64, 2]));
        let c = ErasedValue::new(Some(vec![1_i64]));
        assert!(a.same_value(&b));
        assert!(!a.same_value(&c));
        assert!(!ErasedValue::new(1_i64).same_value(&ErasedValue::new(1_i32)));
    }

    #[test]
    fn set_keeps_type() {
        let mut value = ErasedValue::default_of::<String>();
        value.set(String::from("hi")).unwrap();
        assert_eq!(value.get::<String>().unwrap(), "hi");
        assert!(value.set(3_u8).is_err());
        assert_eq!(format!("{:?}", value.clone()), "\"hi\"");
    }
}
