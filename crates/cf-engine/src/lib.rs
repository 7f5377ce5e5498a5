//! cf-engine: push-based propagation engine.
//!
//! A [`Circuit`] owns components and their ports in flat arenas. Components
//! implement [`Component`] and are evaluated with [`Circuit::tick`]; every
//! publish that passes change suppression ticks the subscribed components
//! synchronously, so one tick drives the whole reachable subgraph.

pub mod builder;
pub mod bundle;
pub mod circuit;
pub mod component;
pub mod iterate;
pub mod port;
pub mod shared;

pub use builder::NodeBuilder;
pub use bundle::{InputBundle, OutputBundle, PortSet};
pub use circuit::Circuit;
pub use component::{Component, EvalCtx, NodeRef};
pub use iterate::{Filter, Iteration, Map, Reduce};
pub use port::{Input, Output, PortKind, PortOptions};
pub use shared::SharedCircuit;

pub use cf_core::{
    CircuitError, CircuitResult, CompId, ComputeFault, EngineConfig, InputId, OutputId, PortValue,
};
