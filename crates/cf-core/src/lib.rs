//! cf-core: stable foundation for circuitflow.
//!
//! Contains:
//! - ids (compact arena handles for components and ports)
//! - error (fatal engine errors and non-fatal compute faults)
//! - value (the port value bound and its type-erased box)
//! - config (engine defaults, loadable from YAML)

pub mod config;
pub mod error;
pub mod ids;
pub mod value;

// Re-exports: nice ergonomics for downstream crates
pub use config::EngineConfig;
pub use error::{CircuitError, CircuitResult, ComputeFault};
pub use ids::*;
pub use value::{ErasedValue, PortValue};
