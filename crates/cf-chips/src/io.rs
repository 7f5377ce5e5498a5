//! Nodes with effects outside the circuit.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use cf_core::{CircuitResult, ComputeFault};
use cf_engine::{Circuit, Component, EvalCtx, Input, NodeRef, Output};
use tracing::debug;

pub type SharedWriter = Arc<Mutex<dyn Write + Send>>;

/// Writes its text input as one line whenever the clock input is true.
///
/// The line is written during publish, once per evaluation. Wire the clock
/// from an always-notify output so that every pulse is seen, including
/// repeated true values. A failed write raises the error flag.
pub struct WriteLine {
    pub text: Input<String>,
    pub clock: Input<bool>,
    sink: SharedWriter,
}

impl WriteLine {
    pub fn add(circuit: &mut Circuit, sink: SharedWriter) -> CircuitResult<NodeRef<Self>> {
        let name = circuit.unique_name("WriteLine");
        circuit.add(name, |b| {
            b.state(None::<String>);
            Ok(Self {
                text: b.input("Text"),
                clock: b.input("Clock"),
                sink,
            })
        })
    }

    /// A writer on the process's standard output.
    pub fn stdout(circuit: &mut Circuit) -> CircuitResult<NodeRef<Self>> {
        Self::add(circuit, Arc::new(Mutex::new(io::stdout())))
    }
}

impl Component for WriteLine {
    fn compute(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        let clock = ctx.read(self.clock)?;
        let line = if clock { Some(ctx.read(self.text)?) } else { None };
        *ctx.state::<Option<String>>()? = line;
        Ok(())
    }

    fn set(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        let Some(line) = ctx.state::<Option<String>>()?.take() else {
            return Ok(());
        };
        let written = {
            let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
            writeln!(sink, "{line}").and_then(|()| sink.flush())
        };
        if let Err(err) = written {
            debug!(error = %err, "write failed");
            ctx.fault(ComputeFault::Io {
                message: err.to_string(),
            });
        }
        Ok(())
    }
}

/// Publishes the wall-clock time in milliseconds since the Unix epoch each
/// time it is ticked.
pub struct Ticks {
    pub out: Output<i64>,
}

impl Ticks {
    pub fn add(circuit: &mut Circuit) -> CircuitResult<NodeRef<Self>> {
        let name = circuit.unique_name("Ticks");
        circuit.add(name, |b| {
            b.state(0_i64);
            Ok(Self {
                out: b.output("Out"),
            })
        })
    }
}

impl Component for Ticks {
    fn compute(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        *ctx.state::<i64>()? = chrono::Utc::now().timestamp_millis();
        Ok(())
    }

    fn set(&self, ctx: &mut EvalCtx<'_>) -> CircuitResult<()> {
        let now = *ctx.state::<i64>()?;
        ctx.publish(self.out, now)
    }
}
