//! Seedable random sources.
//!
//! A source draws a fresh value each time [`RandomSource::next`] is called
//! and publishes it. Passing a seed makes the sequence reproducible.

use std::ops::Range;

use cf_core::{CircuitError, CircuitResult, CompId, PortValue};
use cf_engine::{Circuit, Component, EvalCtx, NodeRef, Output};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

type Sampler<T> = Box<dyn Fn(&mut StdRng) -> T + Send + Sync>;

struct RandomState<T> {
    rng: StdRng,
    value: T,
}

pub struct RandomSource<T> {
    pub out: Output<T>,
    id: CompId,
    sample: Sampler<T>,
}

impl<T: PortValue> RandomSource<T> {
    fn add(
        circuit: &mut Circuit,
        kind: &str,
        seed: Option<u64>,
        sample: Sampler<T>,
    ) -> CircuitResult<NodeRef<Self>> {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let name = circuit.unique_name(kind);
        circuit.add(name, |b| {
            b.state(RandomState {
                rng,
                value: T::default(),
            });
            Ok(Self {
                out: b.output("Out"),
                id: b.id(),
                sample,
            })
        })
    }

    /// Draw a new value and publish it.
    pub fn next(&self, circuit: &mut Circuit) -> CircuitResult<()> {
        let state = circuit.state_mut::<RandomState<T>>(self.id)?;
        state.value = (self.sample)(&mut state.rng);
        circuit.tick(self.id)
    }

    pub fn value(&self, circuit: &Circuit) -> CircuitResult<T> {
        Ok(circuit.state::<RandomState<T>>(self.id)?.value.clone())
    }
}

impl RandomSource<bool> {
    /// True with probability `p`.
    pub fn digital(circuit: &mut Circuit, seed: Option<u64>, p: f64) -> CircuitResult<NodeRef<Self>> {
        if !(0.0..=1.0).contains(&p) {
            return Err(CircuitError::InvalidArg {
                what: format!("probability must be within [0, 1], got {p}"),
            });
        }
        Self::add(circuit, "DigitalRandom", seed, Box::new(move |rng| rng.gen_bool(p)))
    }
}

impl RandomSource<i64> {
    /// Uniform over the half-open `range`.
    pub fn int(circuit: &mut Circuit, seed: Option<u64>, range: Range<i64>) -> CircuitResult<NodeRef<Self>> {
        if range.is_empty() {
            return Err(CircuitError::InvalidArg {
                what: format!("empty random range {range:?}"),
            });
        }
        Self::add(
            circuit,
            "IntRandom",
            seed,
            Box::new(move |rng| rng.gen_range(range.clone())),
        )
    }
}

impl RandomSource<f64> {
    /// Uniform over the half-open `range`.
    pub fn float(circuit: &mut Circuit, seed: Option<u64>, range: Range<f64>) -> CircuitResult<NodeRef<Self>> {
        if range.is_empty() || !range.start.is_finite() || !range.end.is_finite() {
            return Err(CircuitError::InvalidArg {
                what: format!("invalid random range {range:?}"),
            });
        }
        Self::add(
            circuit,
            "FltRandom",
            seed,
            Box::new(move |rng| rng.gen_range(range.clone())),
        )
    }
}

impl<T: PortValue> Component for RandomSource<T> {
    fn compute(&self, _ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        Ok(())
    }

    fn set(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        let value = ctx.state::<RandomState<T>>()?.value.clone();
        ctx.publish(self.out, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draws(seed: u64) -> Vec<i64> {
        let mut circuit = Circuit::new();
        let source = RandomSource::int(&mut circuit, Some(seed), -5..5).unwrap();
        (0..16)
            .map(|_| {
                source.next(&mut circuit).unwrap();
                circuit.value(source.out).unwrap()
            })
            .collect()
    }

    #[test]
    fn seeded_sequences_repeat() {
        let first = draws(7);
        assert_eq!(first, draws(7));
        assert!(first.iter().all(|v| (-5..5).contains(v)));
    }

    #[test]
    fn float_stays_in_range() {
        let mut circuit = Circuit::new();
        let source = RandomSource::float(&mut circuit, Some(1), 0.5..1.5).unwrap();
        for _ in 0..32 {
            source.next(&mut circuit).unwrap();
            let v = source.value(&circuit).unwrap();
            assert!((0.5..1.5).contains(&v));
        }
    }

    #[test]
    fn rejects_bad_parameters() {
        let mut circuit = Circuit::new();
        assert!(RandomSource::digital(&mut circuit, None, 1.5).is_err());
        assert!(RandomSource::int(&mut circuit, None, 3..3).is_err());
        assert!(RandomSource::float(&mut circuit, None, 1.0..0.0).is_err());
    }

    #[test]
    fn certain_digital_source() {
        let mut circuit = Circuit::new();
        let source = RandomSource::digital(&mut circuit, Some(3), 1.0).unwrap();
        source.next(&mut circuit).unwrap();
        assert!(circuit.value(source.out).unwrap());
        assert_eq!(circuit.name(source.id).unwrap(), "DigitalRandom0");
    }
}
