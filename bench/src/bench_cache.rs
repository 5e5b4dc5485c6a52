use std::time::Instant;

use clap::Parser;
use intcache::{BenchConfig, BenchContext, Operation, SeedSource, Variant, ITERATIONS};
use log::info;

macro_rules! bench {
    ($name: expr, $ops: expr, $body: expr) => {{
        let now = Instant::now();
        let out = $body;
        let elapsed = now.elapsed();
        println!(
            "{} elapsed: {:.2?} ({:.2} ns/op)",
            $name,
            elapsed,
            elapsed.as_nanos() as f64 / $ops as f64
        );
        out
    }};
}

/// Compare integer cache strategies under single and multi-threaded load
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Store configurations to run (unshared, concurrent, lock, intmap,
    /// intmap2, shard, sharedintmap, channel). If not provided, all of them
    /// are run
    #[arg(short, long, value_name = "NAMES", num_args = 1.., value_delimiter = ',')]
    variants: Option<Vec<String>>,

    /// Operations to time (Rand, Get, Put, PutGet, MultiGet, MultiPut,
    /// MultiPutGet). If not provided, all of them are timed
    #[arg(short, long, value_name = "OPS", num_args = 1.., value_delimiter = ',')]
    ops: Option<Vec<String>>,

    /// Worker threads for the Multi operations
    #[arg(short, long, default_value_t = intcache::DEFAULT_THREADS)]
    threads: usize,

    /// Iterations per batch
    #[arg(short, long, default_value_t = ITERATIONS)]
    iterations: usize,

    /// Fixed generator seed; the clock is sampled per batch otherwise
    #[arg(short, long)]
    seed: Option<i32>,

    /// Measured batches per operation
    #[arg(short, long, default_value = "1")]
    rounds: usize,
}

fn parse_all<T>(names: Option<Vec<String>>, all: &[T]) -> intcache::Result<Vec<T>>
where
    T: Copy + std::str::FromStr<Err = intcache::Error>,
{
    match names {
        Some(names) => names.iter().map(|n| n.trim().parse()).collect(),
        None => Ok(all.to_vec()),
    }
}

fn bench_variant(config: BenchConfig, ops: &[Operation], rounds: usize) -> intcache::Result<()> {
    println!("bench {}", config.variant);

    let ctx = BenchContext::setup(config)?;
    for &op in ops {
        let name = format!("{}.{}", config.variant, op);
        let total_ops = if op.is_multi() {
            config.iterations * config.threads
        } else {
            config.iterations
        };
        for _ in 0..rounds {
            let sink = bench!(name, total_ops, ctx.run(op)?);
            info!("{} sink {}", name, sink);
        }
    }
    ctx.tear_down()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let variants = parse_all(args.variants, &Variant::ALL)?;
    let ops = parse_all(args.ops, &Operation::ALL)?;
    let seed = args.seed.map_or(SeedSource::Clock, SeedSource::Fixed);

    for variant in variants {
        let config = BenchConfig {
            variant,
            threads: args.threads,
            iterations: args.iterations,
            seed,
            ..Default::default()
        };
        bench_variant(config, &ops, args.rounds)?;
    }
    Ok(())
}
