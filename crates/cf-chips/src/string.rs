//! Text operators.

use cf_core::{CircuitResult, ComputeFault};
use cf_engine::{Circuit, NodeRef};

use crate::template::{BinaryFunctor, NToOne, UnaryFunctor};

pub type StrUnary = UnaryFunctor<String, String>;
pub type StrTest = BinaryFunctor<String, String, bool>;

pub fn concat(circuit: &mut Circuit, arity: usize) -> CircuitResult<NodeRef<NToOne<String>>> {
    NToOne::add(circuit, "StrConcat", arity, 2, |v| Ok(v.concat()))
}

/// `a` repeated `b` times. A negative count is a fault.
pub fn repeat(circuit: &mut Circuit) -> CircuitResult<NodeRef<BinaryFunctor<String, i64, String>>> {
    BinaryFunctor::add(circuit, "StrRepeat", repeat_text)
}

fn repeat_text(text: String, count: i64) -> Result<String, ComputeFault> {
    let count = usize::try_from(count).map_err(|_| ComputeFault::Domain {
        what: "negative repeat count",
    })?;
    text.len()
        .checked_mul(count)
        .ok_or(ComputeFault::Overflow)?;
    Ok(text.repeat(count))
}

/// Length in characters, not bytes.
pub fn length(circuit: &mut Circuit) -> CircuitResult<NodeRef<UnaryFunctor<String, i64>>> {
    UnaryFunctor::add(circuit, "StrLength", |a: String| {
        i64::try_from(a.chars().count()).map_err(|_| ComputeFault::Overflow)
    })
}

pub fn upper(circuit: &mut Circuit) -> CircuitResult<NodeRef<StrUnary>> {
    UnaryFunctor::add(circuit, "StrUpper", |a: String| Ok(a.to_uppercase()))
}

pub fn lower(circuit: &mut Circuit) -> CircuitResult<NodeRef<StrUnary>> {
    UnaryFunctor::add(circuit, "StrLower", |a: String| Ok(a.to_lowercase()))
}

pub fn trim(circuit: &mut Circuit) -> CircuitResult<NodeRef<StrUnary>> {
    UnaryFunctor::add(circuit, "StrTrim", |a: String| Ok(a.trim().to_string()))
}

pub fn starts_with(circuit: &mut Circuit) -> CircuitResult<NodeRef<StrTest>> {
    BinaryFunctor::add(circuit, "StrStartsWith", |a: String, b: String| {
        Ok(a.starts_with(&b))
    })
}

pub fn ends_with(circuit: &mut Circuit) -> CircuitResult<NodeRef<StrTest>> {
    BinaryFunctor::add(circuit, "StrEndsWith", |a: String, b: String| Ok(a.ends_with(&b)))
}

pub fn contains(circuit: &mut Circuit) -> CircuitResult<NodeRef<StrTest>> {
    BinaryFunctor::add(circuit, "StrContains", |a: String, b: String| Ok(a.contains(&b)))
}

pub fn equal_ignore_case(circuit: &mut Circuit) -> CircuitResult<NodeRef<StrTest>> {
    BinaryFunctor::add(circuit, "StrEqualIgnoreCase", |a: String, b: String| {
        Ok(a.to_lowercase() == b.to_lowercase())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Constant, GenericInput};

    #[test]
    fn repeat_rejects_negative_counts() {
        assert_eq!(repeat_text("ab".into(), 3), Ok("ababab".into()));
        assert_eq!(repeat_text("ab".into(), 0), Ok(String::new()));
        assert!(matches!(
            repeat_text("ab".into(), -1),
            Err(ComputeFault::Domain { .. })
        ));
    }

    #[test]
    fn concat_joins_in_port_order() {
        let mut circuit = Circuit::new();
        let words = Constant::add(
            &mut circuit,
            vec!["flow".to_string(), "-".to_string(), "chart".to_string()],
        )
        .unwrap();
        let cat = concat(&mut circuit, 3).unwrap();
        let outs: Vec<_> = words.outputs.iter().collect();
        cat.inputs.connect_all(&mut circuit, &outs).unwrap();
        circuit.tick(cat.id).unwrap();
        assert_eq!(circuit.value(cat.out).unwrap(), "flow-chart");
    }

    #[test]
    fn length_counts_characters() {
        let mut circuit = Circuit::new();
        let text = GenericInput::<String>::add(&mut circuit).unwrap();
        let len = length(&mut circuit).unwrap();
        circuit.connect(len.a, text.out).unwrap();
        text.set(&mut circuit, "naïve".into()).unwrap();
        assert_eq!(circuit.value(len.out).unwrap(), 5);
    }

    #[test]
    fn case_insensitive_equality() {
        let mut circuit = Circuit::new();
        let a = GenericInput::<String>::add(&mut circuit).unwrap();
        let b = GenericInput::<String>::add(&mut circuit).unwrap();
        let eq = equal_ignore_case(&mut circuit).unwrap();
        circuit.connect(eq.a, a.out).unwrap();
        circuit.connect(eq.b, b.out).unwrap();
        a.set(&mut circuit, "Rust".into()).unwrap();
        b.set(&mut circuit, "rUST".into()).unwrap();
        assert!(circuit.value(eq.out).unwrap());
    }
}
