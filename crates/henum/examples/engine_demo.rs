// Encrypted arithmetic through the asynchronous engine.
//
// Run with `RUST_LOG=info` to see the initialization of the schemes.

use clap::{Parser, Subcommand, ValueEnum};
use henum::benchmark::{SweepOperation, ValueGenerator};
use henum::runtime::AsyncEngine;
use henum::{EngineConfig, SchemeKind};
use std::{error::Error, path::PathBuf};

#[derive(Parser)]
#[command(about = "Encrypted arithmetic with the henum engine")]
struct Cli {
    /// JSON configuration of the engine; both schemes use their default
    /// parameters when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encrypt values, sum the ciphertexts, and decrypt the result.
    Sum {
        #[arg(long, default_value = "exact")]
        scheme: SchemeKind,
        #[arg(required = true, allow_negative_numbers = true)]
        values: Vec<f64>,
    },
    /// Average values under the approximate scheme.
    Average {
        #[arg(required = true, allow_negative_numbers = true)]
        values: Vec<f64>,
    },
    /// Sweep an operation and print the result as JSON.
    Benchmark {
        #[arg(long, default_value = "exact")]
        scheme: SchemeKind,
        #[arg(long, value_enum, default_value_t = Operation::Add)]
        operation: Operation,
        #[arg(long, default_value_t = 100.0)]
        max_value: f64,
        #[arg(long, default_value_t = 10.0)]
        step: f64,
        /// Draw this many random pairs instead of a linear sweep.
        #[arg(long)]
        count: Option<usize>,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Operation {
    Add,
    Sum,
    MultiplyPlain,
}

impl From<Operation> for SweepOperation {
    fn from(op: Operation) -> Self {
        match op {
            Operation::Add => SweepOperation::Add,
            Operation::Sum => SweepOperation::Sum,
            Operation::MultiplyPlain => SweepOperation::MultiplyPlain,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EngineConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => EngineConfig::default(),
    };

    let engine = AsyncEngine::new(config);
    engine.initialize().await?;

    match cli.command {
        Command::Sum { scheme, values } => {
            let sk = engine.secret_key_handle(scheme)?;
            let blobs = engine.encrypt_many(scheme, values.clone(), None).await?;
            println!(
                "{} ciphertexts of {} bytes",
                blobs.len(),
                blobs.first().map(String::len).unwrap_or_default()
            );
            let sum = engine.sum(scheme, blobs).await?;
            let result = engine.decrypt(scheme, sum, sk).await?;
            println!("sum of {values:?} = {result}");
        }
        Command::Average { values } => {
            let scheme = SchemeKind::ApproximateReal;
            let sk = engine.secret_key_handle(scheme)?;
            let blobs = engine.encrypt_many(scheme, values.clone(), None).await?;
            let average = engine.average(scheme, blobs).await?;
            let result = engine.decrypt(scheme, average, sk).await?;
            println!("average of {values:?} = {result}");
        }
        Command::Benchmark {
            scheme,
            operation,
            max_value,
            step,
            count,
            seed,
        } => {
            let generator = match count {
                Some(count) => ValueGenerator::Seeded {
                    count,
                    max_value,
                    seed,
                },
                None => ValueGenerator::Linear { max_value, step },
            };
            let result = engine
                .run_benchmark_with(scheme, generator, operation.into())
                .await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
