use std::path::PathBuf;

use cf_chips::{
    Accumulator, ByteInput, Constant, GenericInput, RippleAdder, WriteLine, compare, integer,
};
use cf_engine::{Circuit, CircuitResult, EngineConfig, Filter, Map, Reduce};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cf-cli")]
#[command(about = "circuitflow CLI - build and run demonstration circuits", long_about = None)]
struct Cli {
    /// Engine configuration YAML file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Notify subscribers on every publish, even if the value is unchanged
    #[arg(long, global = true)]
    always_notify: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add an offset to every element of a list
    Map {
        /// Comma-separated integers
        #[arg(value_delimiter = ',', allow_negative_numbers = true)]
        values: Vec<i64>,
        #[arg(long, default_value_t = 1)]
        offset: i64,
    },
    /// Keep the elements divisible by a modulus
    Filter {
        /// Comma-separated integers
        #[arg(value_delimiter = ',', allow_negative_numbers = true)]
        values: Vec<i64>,
        #[arg(long, default_value_t = 2)]
        modulus: i64,
    },
    /// Sum a list starting from a start value
    Reduce {
        /// Comma-separated integers
        #[arg(value_delimiter = ',', allow_negative_numbers = true)]
        values: Vec<i64>,
        #[arg(long, default_value_t = 0)]
        start: i64,
    },
    /// Add two bytes on an 8-bit ripple adder built from gates
    Adder { a: u8, b: u8 },
    /// Divide and show how a fault flags downstream nodes
    Fault {
        #[arg(allow_negative_numbers = true)]
        numerator: i64,
        #[arg(allow_negative_numbers = true)]
        denominator: i64,
    },
    /// Publish the same value repeatedly and count downstream evaluations
    Suppression {
        #[arg(long, default_value_t = 5)]
        repeats: u32,
    },
}

fn main() -> CircuitResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref(), cli.always_notify)?;
    info!(?config, "engine configuration");

    match cli.command {
        Commands::Map { values, offset } => cmd_map(config, values, offset),
        Commands::Filter { values, modulus } => cmd_filter(config, values, modulus),
        Commands::Reduce { values, start } => cmd_reduce(config, values, start),
        Commands::Adder { a, b } => cmd_adder(config, a, b),
        Commands::Fault {
            numerator,
            denominator,
        } => cmd_fault(config, numerator, denominator),
        Commands::Suppression { repeats } => cmd_suppression(config, repeats),
    }
}

fn load_config(path: Option<&PathBuf>, always_notify: bool) -> CircuitResult<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    Ok(if always_notify {
        config.with_always_notify(true)
    } else {
        config
    })
}

fn cmd_map(config: EngineConfig, values: Vec<i64>, offset: i64) -> CircuitResult<()> {
    let mut circuit = Circuit::with_config(config);
    let list = GenericInput::<Option<Vec<i64>>>::add(&mut circuit)?;
    let offset = Constant::single(&mut circuit, offset)?;
    let map = Map::<i64, i64>::add(&mut circuit)?;
    let add = integer::add(&mut circuit, 2)?;
    add.inputs
        .connect_all(&mut circuit, &[map.element, offset.out(0)?])?;
    circuit.connect(map.func, add.out)?;
    circuit.connect(map.list, list.out)?;

    // print each result through the circuit itself
    let render = GenericInput::<String>::add(&mut circuit)?;
    let clock = GenericInput::<bool>::add(&mut circuit)?;
    let writer = WriteLine::stdout(&mut circuit)?;
    circuit.connect(writer.text, render.out)?;
    circuit.connect(writer.clock, clock.out)?;
    circuit.set_always_notify(clock.out, true)?;

    list.set(&mut circuit, Some(values))?;
    let result = circuit.value(map.result)?;
    render.set(&mut circuit, format!("map: {result:?}"))?;
    clock.set(&mut circuit, true)?;
    Ok(())
}

fn cmd_filter(config: EngineConfig, values: Vec<i64>, modulus: i64) -> CircuitResult<()> {
    let mut circuit = Circuit::with_config(config);
    let list = GenericInput::<Option<Vec<i64>>>::add(&mut circuit)?;
    let constants = Constant::add(&mut circuit, vec![modulus, 0])?;
    let filter = Filter::<i64>::add(&mut circuit)?;
    let rem = integer::modulo(&mut circuit)?;
    let is_zero = compare::eq::<i64>(&mut circuit)?;
    circuit.connect(rem.a, filter.element)?;
    circuit.connect(rem.b, constants.out(0)?)?;
    circuit.connect(is_zero.a, rem.out)?;
    circuit.connect(is_zero.b, constants.out(1)?)?;
    circuit.connect(filter.func, is_zero.out)?;
    circuit.connect(filter.list, list.out)?;

    list.set(&mut circuit, Some(values))?;
    println!("filter: {:?}", circuit.value(filter.result)?);
    if circuit.has_error(filter.id)? {
        println!("  (an element faulted; modulus {modulus} is not usable)");
    }
    Ok(())
}

fn cmd_reduce(config: EngineConfig, values: Vec<i64>, start: i64) -> CircuitResult<()> {
    let mut circuit = Circuit::with_config(config);
    let list = GenericInput::<Option<Vec<i64>>>::add(&mut circuit)?;
    let start = Constant::single(&mut circuit, start)?;
    let reduce = Reduce::<i64, i64>::add(&mut circuit)?;
    let add = integer::add(&mut circuit, 2)?;
    add.inputs
        .connect_all(&mut circuit, &[reduce.element, reduce.current])?;
    circuit.connect(reduce.func, add.out)?;
    circuit.connect(reduce.start, start.out(0)?)?;
    circuit.connect(reduce.list, list.out)?;

    list.set(&mut circuit, Some(values))?;
    println!("reduce: {}", circuit.value(reduce.result)?);
    Ok(())
}

fn cmd_adder(config: EngineConfig, a: u8, b: u8) -> CircuitResult<()> {
    let mut circuit = Circuit::with_config(config);
    let left = ByteInput::add(&mut circuit)?;
    let right = ByteInput::add(&mut circuit)?;
    let carry_in = Constant::single(&mut circuit, false)?;
    let adder = RippleAdder::byte(&mut circuit)?;
    adder.a.connect_all(&mut circuit, &left.bits)?;
    adder.b.connect_all(&mut circuit, &right.bits)?;
    circuit.connect(adder.cin, carry_in.out(0)?)?;
    info!(components = circuit.component_count(), "adder assembled");

    left.set(&mut circuit, a)?;
    right.set(&mut circuit, b)?;

    let mut bits = String::new();
    let mut total = 0_u16;
    if circuit.value(adder.cout)? {
        bits.push('1');
        total |= 1 << 8;
    } else {
        bits.push('0');
    }
    for (i, bit) in adder.sum.iter().enumerate().rev() {
        let on = circuit.value(bit)?;
        bits.push(if on { '1' } else { '0' });
        if on {
            total |= 1 << i;
        }
    }
    println!("{a} + {b} = {total} (0b{bits})");
    Ok(())
}

fn cmd_fault(config: EngineConfig, numerator: i64, denominator: i64) -> CircuitResult<()> {
    let mut circuit = Circuit::with_config(config);
    let num = GenericInput::<i64>::add(&mut circuit)?;
    let den = GenericInput::<i64>::add(&mut circuit)?;
    let one = Constant::single(&mut circuit, 1_i64)?;
    let div = integer::div(&mut circuit)?;
    let inc = integer::add(&mut circuit, 2)?;
    circuit.connect(div.a, num.out)?;
    circuit.connect(div.b, den.out)?;
    inc.inputs.connect_all(&mut circuit, &[div.out, one.out(0)?])?;

    den.set(&mut circuit, denominator)?;
    num.set(&mut circuit, numerator)?;
    for (label, id) in [("div", div.id), ("div + 1", inc.id)] {
        println!(
            "{:<8} {} error={}",
            label,
            circuit.name(id)?,
            circuit.has_error(id)?
        );
    }
    println!("result: {}", circuit.value(inc.out)?);
    Ok(())
}

fn cmd_suppression(config: EngineConfig, repeats: u32) -> CircuitResult<()> {
    let mut circuit = Circuit::with_config(config);
    let source = GenericInput::<i64>::add(&mut circuit)?;
    let counter = Accumulator::add(&mut circuit)?;
    circuit.connect(counter.a, source.out)?;

    for _ in 0..repeats {
        source.set(&mut circuit, 1)?;
    }
    println!(
        "published 1 x{repeats}, downstream evaluated {} time(s) (always_notify={})",
        circuit.value(counter.out)?,
        circuit.always_notifies(source.out)?
    );
    Ok(())
}
