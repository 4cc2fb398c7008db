//! Fortuna reference vector CLI
//!
//! Prints the generator and accumulator reference vectors, optionally
//! followed by the accumulator metrics in Prometheus text format.

use clap::Parser;
use fortuna_vectors::{
    config::FileConfig,
    metrics::MetricsRegistry,
    vectors::{self, OutputFormat, ReferenceVector},
};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "fortuna-vectors", version, about = "Print Fortuna reference vectors")]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format, overrides the configuration file.
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Print Prometheus metrics after the vectors.
    #[arg(long)]
    metrics: bool,
}

fn main() {
    // Logs go to stderr so stdout stays pasteable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => FileConfig::default(),
    };
    let format = cli.format.unwrap_or(config.output.format);

    info!("Fortuna vectors v{}", fortuna_vectors::VERSION);

    let generator = match vectors::generator_vectors() {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Failed to compute generator vectors: {}", e);
            std::process::exit(1);
        }
    };
    print_section("Generator", &generator, format);

    let run = match vectors::accumulator_vectors(&config.accumulator) {
        Ok(run) => run,
        Err(e) => {
            eprintln!("Failed to compute accumulator vectors: {}", e);
            std::process::exit(1);
        }
    };
    print_section("Accumulator", &run.vectors, format);

    if cli.metrics || config.output.metrics {
        let registry = match MetricsRegistry::new() {
            Ok(r) => r,
            Err(e) => {
                eprintln!("Failed to create metrics registry: {}", e);
                std::process::exit(1);
            }
        };
        registry.update(&run.stats);
        match registry.encode() {
            Ok(text) => print!("{}", text),
            Err(e) => {
                eprintln!("Failed to encode metrics: {}", e);
                std::process::exit(1);
            }
        }
    }

    info!("Done. Accumulator reseed count: {}", run.stats.reseed_count);
}

fn print_section(title: &str, vectors: &[ReferenceVector], format: OutputFormat) {
    info!("{} vectors:", title);
    for vector in vectors {
        print!("{}", vector.render(format));
    }
}
