//! Garbles and evaluates an inner product over GF(2) with both parties in
//! this process, and reports executor timings.

use bitvec::vec::BitVec;
use clap::{Parser, ValueEnum};
use log::info;
use rand::Rng;
use std::{path::PathBuf, sync::Arc};
use yao_engine::{
    local_provider_pair, AccumulatedRunTimeStats, BitValues, CircuitBuilder, ExecutorError,
    GateExecutor, OutputRecipient, Role, RunTimeStats, YaoConfig, YaoError, YaoProvider,
};

#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
enum Mode {
    /// Setup sweep, barrier, online sweep.
    PhaseSeparated,
    /// Setup and online sweeps without a barrier.
    WoBroadcast,
    /// Setup and online pass per gate.
    Fused,
}

/// Cli.
#[derive(Parser)]
#[clap(name = "yao-local")]
#[clap(author = "swanky authors <swanky@galois.com>")]
#[clap(version = "0.1")]
struct Cli {
    /// Length of the input vectors
    #[clap(default_value_t = 128, short, long)]
    bits: usize,

    /// SIMD slots per wire
    #[clap(default_value_t = 64, short, long)]
    simd: usize,

    /// Worker threads per party, defaults to the number of cores
    #[clap(short, long)]
    threads: Option<usize>,

    /// Executor mode
    #[clap(value_enum, default_value_t = Mode::PhaseSeparated, short, long)]
    mode: Mode,

    /// Number of runs to time
    #[clap(default_value_t = 5, short, long)]
    repetitions: usize,

    /// JSON configuration, overridden by `--threads`
    #[clap(long)]
    config: Option<PathBuf>,

    /// Print statistics as JSON
    #[clap(long)]
    json: bool,

    /// Transfer input labels during setup instead of online
    #[clap(long)]
    inputs_in_setup: bool,
}

fn random_values(num_wires: usize, num_simd: usize) -> BitValues {
    let mut rng = rand::thread_rng();
    (0..num_wires)
        .map(|_| (0..num_simd).map(|_| rng.gen::<bool>()).collect())
        .collect()
}

fn inner_product(
    b: &mut CircuitBuilder,
    x: &BitValues,
    y: &BitValues,
    in_setup: bool,
) -> Result<Option<yao_primitives::BlockingFuture<BitValues>>, YaoError> {
    let simd = x[0].len();
    let xs = b.input(Role::Garbler, x.len(), simd, in_setup)?;
    let ys = b.input(Role::Evaluator, y.len(), simd, in_setup)?;
    let (xw, yw) = (xs.wires.clone(), ys.wires.clone());
    if xs.promise.is_some() {
        xs.provide(x.clone())?;
    }
    if ys.promise.is_some() {
        ys.provide(y.clone())?;
    }
    let products = b.and(&xw, &yw)?;
    let mut acc = vec![products[0]];
    for p in products.iter().skip(1) {
        acc = b.xor(&acc, &[*p])?;
    }
    b.output(&acc, OutputRecipient::Both)
}

fn run_party(
    provider: Arc<YaoProvider>,
    mode: Mode,
    x: &BitValues,
    y: &BitValues,
    in_setup: bool,
) -> Result<(RunTimeStats, Option<BitValues>), Box<dyn std::error::Error + Send + Sync>> {
    let mut builder = CircuitBuilder::new(provider.clone());
    let output = inner_product(&mut builder, x, y, in_setup)?;
    let register = builder.finish();
    let executor = GateExecutor::for_provider(&register, &provider);
    let mut stats = RunTimeStats::new();
    let result: Result<(), ExecutorError> = match mode {
        Mode::PhaseSeparated => executor.evaluate_setup_online(&mut stats),
        Mode::WoBroadcast => executor.evaluate_setup_online_wo_broadcast(&mut stats),
        Mode::Fused => executor.evaluate(&mut stats),
    };
    result?;
    let output = match output {
        Some(future) => Some(future.get()?),
        None => None,
    };
    Ok((stats, output))
}

fn expected(x: &BitValues, y: &BitValues) -> BitVec {
    let simd = x[0].len();
    (0..simd)
        .map(|j| {
            x.iter()
                .zip(y.iter())
                .fold(false, |acc, (a, b)| acc ^ (a[j] & b[j]))
        })
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    pretty_env_logger::init_timed();
    let cli = Cli::parse();
    if cli.bits == 0 || cli.simd == 0 {
        return Err("bits and simd must be positive".into());
    }
    let mut config = match &cli.config {
        Some(path) => YaoConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => YaoConfig {
            num_threads: num_cpus::get(),
            ..Default::default()
        },
    };
    if let Some(threads) = cli.threads {
        config.num_threads = threads;
    }
    info!("configuration: {:?}", config);
    info!(
        "inner product of {} bits over {} slots, {} AND gates per run",
        cli.bits,
        cli.simd,
        cli.bits * cli.simd
    );

    let mut garbler_stats = AccumulatedRunTimeStats::new();
    let mut evaluator_stats = AccumulatedRunTimeStats::new();
    for run in 0..cli.repetitions {
        let x = random_values(cli.bits, cli.simd);
        let y = random_values(cli.bits, cli.simd);
        let (garbler, evaluator) = local_provider_pair(&config)?;
        let (g, e) = std::thread::scope(|s| {
            let g = s.spawn(|| run_party(garbler, cli.mode, &x, &y, cli.inputs_in_setup));
            let e = s.spawn(|| run_party(evaluator, cli.mode, &x, &y, cli.inputs_in_setup));
            (g.join(), e.join())
        });
        let (g_stats, g_out) = g.map_err(|_| "garbler thread panicked")??;
        let (e_stats, e_out) = e.map_err(|_| "evaluator thread panicked")??;
        let want = Some(vec![expected(&x, &y)]);
        if g_out != want || e_out != want {
            return Err(format!("run {} produced a wrong inner product", run).into());
        }
        info!("run {} done", run);
        garbler_stats.add(&g_stats);
        evaluator_stats.add(&e_stats);
    }

    if cli.json {
        let json = serde_json::json!({
            "config": config,
            "garbler": garbler_stats.to_json(),
            "evaluator": evaluator_stats.to_json(),
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        println!("garbler");
        garbler_stats.print_human_readable();
        println!("evaluator");
        evaluator_stats.print_human_readable();
    }
    Ok(())
}
