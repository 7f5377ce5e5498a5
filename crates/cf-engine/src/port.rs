//! Typed port handles and the arena slots behind them.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use cf_core::{CompId, ErasedValue, InputId, OutputId, PortValue};

/// Direction of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortKind {
    /// Reads the value of one source output.
    Input,
    /// Publishes a value to every subscribed input.
    Output,
}

impl PortKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PortKind::Input => "input",
            PortKind::Output => "output",
        }
    }
}

/// Typed handle to an input port.
///
/// Handles are plain indices into the owning circuit, so they are `Copy` and
/// carry no borrow. The type parameter ties the handle to the value type the
/// port was created with; [`crate::Circuit::connect`] only accepts an output
/// of the same type.
pub struct Input<T> {
    id: InputId,
    _ty: PhantomData<fn() -> T>,
}

/// Typed handle to an output port.
pub struct Output<T> {
    id: OutputId,
    _ty: PhantomData<fn() -> T>,
}

macro_rules! handle_impls {
    ($handle:ident, $label:literal) => {
        impl<T> $handle<T> {
            pub(crate) fn from_id(id: cf_core::Id) -> Self {
                Self {
                    id,
                    _ty: PhantomData,
                }
            }

            /// Raw arena id of this port.
            pub fn id(self) -> cf_core::Id {
                self.id
            }
        }

        impl<T> Clone for $handle<T> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<T> Copy for $handle<T> {}

        impl<T> PartialEq for $handle<T> {
            fn eq(&self, other: &Self) -> bool {
                self.id == other.id
            }
        }

        impl<T> Eq for $handle<T> {}

        impl<T> Hash for $handle<T> {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.id.hash(state);
            }
        }

        impl<T> fmt::Debug for $handle<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "({})"), self.id)
            }
        }
    };
}

handle_impls!(Input, "Input");
handle_impls!(Output, "Output");

/// Per-port publishing options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortOptions {
    pub auto_propagate: bool,
    pub always_notify: bool,
}

impl PortOptions {
    pub fn always_notify(mut self) -> Self {
        self.always_notify = true;
        self
    }

    pub fn manual(mut self) -> Self {
        self.auto_propagate = false;
        self
    }
}

impl From<&cf_core::EngineConfig> for PortOptions {
    fn from(config: &cf_core::EngineConfig) -> Self {
        Self {
            auto_propagate: config.auto_propagate,
            always_notify: config.always_notify,
        }
    }
}

#[derive(Debug)]
pub(crate) struct InputSlot {
    pub name: String,
    pub owner: CompId,
    pub source: Option<OutputId>,
}

#[derive(Debug)]
pub(crate) struct OutputSlot {
    pub name: String,
    pub owner: CompId,
    pub value: ErasedValue,
    pub last: ErasedValue,
    pub first: bool,
    pub auto_propagate: bool,
    pub always_notify: bool,
    /// Subscribed inputs in subscription order; membership is unique.
    pub sinks: Vec<InputId>,
}

impl OutputSlot {
    pub fn new<T: PortValue>(name: String, owner: CompId, options: PortOptions) -> Self {
        Self {
            name,
            owner,
            value: ErasedValue::default_of::<T>(),
            last: ErasedValue::default_of::<T>(),
            first: true,
            auto_propagate: options.auto_propagate,
            always_notify: options.always_notify,
            sinks: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_core::Id;

    #[test]
    fn handles_compare_by_id() {
        let a: Input<i64> = Input::from_id(Id::for_slot(3));
        let b: Input<i64> = Input::from_id(Id::for_slot(3));
        assert_eq!(a, b);
        assert_eq!(format!("{a:?}"), "Input(3)");
    }

    #[test]
    fn options_from_config() {
        let options = PortOptions::from(&cf_core::EngineConfig::default());
        assert!(options.auto_propagate);
        assert!(!options.always_notify);
        assert!(options.always_notify().always_notify);
        assert!(!options.manual().auto_propagate);
    }
}
