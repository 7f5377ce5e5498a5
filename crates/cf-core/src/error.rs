use thiserror::Error;

pub type CircuitResult<T> = Result<T, CircuitError>;

/// Fatal engine errors.
///
/// These abort the evaluation chain and propagate to whoever called `tick`.
/// Faults raised by a component's own function are [`ComputeFault`]s instead
/// and never leave the component that raised them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CircuitError {
    #[error("input {port} of component {component} is not connected to any output")]
    Disconnected { port: String, component: String },

    #[error("recursive tick detected on component {component}")]
    RecursiveEvaluation { component: String },

    #[error("Unknown component: {id}")]
    UnknownComponent { id: u32 },

    #[error("Unknown {kind} port: {id}")]
    UnknownPort { kind: &'static str, id: u32 },

    #[error("Type mismatch on {what}: expected {expected}, found {found}")]
    TypeMismatch {
        what: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Component {component} has no state of type {expected}")]
    StateMismatch {
        component: String,
        expected: &'static str,
    },

    #[error("Invalid arity for {what}: expected {expected}, found {found}")]
    InvalidArity {
        what: String,
        expected: String,
        found: usize,
    },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Non-fatal faults raised by a component's own function.
///
/// A fault is recorded as the component's error flag for the current
/// evaluation; downstream readers see the flag, not the fault.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComputeFault {
    #[error("division by zero")]
    DivideByZero,

    #[error("arithmetic overflow")]
    Overflow,

    #[error("cannot parse {input:?} as {target}")]
    Parse { input: String, target: &'static str },

    #[error("domain error: {what}")]
    Domain { what: &'static str },

    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("i/o error: {message}")]
    Io { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disconnected_names_port_and_component() {
        let err = CircuitError::Disconnected {
            port: "B".into(),
            component: "IntAdd0".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("input B"));
        assert!(msg.contains("IntAdd0"));
    }

    #[test]
    fn fault_display() {
        let fault = ComputeFault::Parse {
            input: "abc".into(),
            target: "i64",
        };
        assert_eq!(fault.to_string(), "cannot parse \"abc\" as i64");
    }
}
