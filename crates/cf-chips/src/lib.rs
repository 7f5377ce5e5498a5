//! Operator catalogue for circuitflow.
//!
//! Most chips are instances of a handful of generic templates (see
//! [`template`]): a unary or binary function, an N-ary fold, a multiplexer.
//! Each family module exposes constructors that add a configured node to a
//! [`Circuit`](cf_engine::Circuit) and return its [`NodeRef`](cf_engine::NodeRef).
//!
//! # Families
//!
//! - [`source`]: externally driven roots (inputs, buttons, constants, bytes)
//! - [`digital`]: gates, edge detectors, pulse hold
//! - [`integer`], [`float`]: arithmetic with faults for division by zero,
//!   overflow and domain errors
//! - [`compare`], [`convert`], [`string`]
//! - [`counter`], [`random`], [`io`], [`list`]
//! - [`adder`]: composite adders built from gates

pub mod adder;
pub mod compare;
pub mod convert;
pub mod counter;
pub mod digital;
pub mod float;
pub mod integer;
pub mod io;
pub mod list;
pub mod random;
pub mod source;
pub mod string;
pub mod template;

pub use adder::{FullAdder, HalfAdder, RippleAdder};
pub use counter::{Accumulator, Counter};
pub use digital::{EdgeDetector, Gate, Hold, HoldFor, XorMode};
pub use io::{Ticks, WriteLine};
pub use list::GetPos;
pub use random::RandomSource;
pub use source::{Button, ByteInput, Constant, GenericInput};
pub use template::{
    BinaryComparator, BinaryFunctor, Buffer, Multiplexer, NToOne, Predicate, UnaryFunctor,
};
