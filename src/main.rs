use clap::Parser;
use matbench::cli::{Cli, Precision, Transport};
use matbench::coordinator::{self, RunConfig};
use matbench::error::BenchError;
use matbench::group;
use matbench::partition::RemainderPolicy;
use matbench::reporter;
use matbench::types::{Element, RunReport};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

const DEFAULT_RANKS: usize = 2;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run_benchmark(&cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // RUST_LOG wins over -v
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_benchmark(cli: &Cli) -> anyhow::Result<()> {
    let log_path = if cli.no_log || cli.skip_serial {
        None
    } else {
        Some(PathBuf::from(&cli.log))
    };

    let config = RunConfig {
        n: cli.size,
        tolerance: cli.tolerance,
        seed: cli.seed,
        remainder: if cli.strict {
            RemainderPolicy::Reject
        } else {
            RemainderPolicy::Truncate
        },
        serial_baseline: !cli.skip_serial,
        log_path,
    };

    let report = match cli.precision {
        Precision::F32 => launch::<f32>(cli, &config)?,
        Precision::F64 => launch::<f64>(cli, &config)?,
    };

    // Only root has anything to say
    let Some(report) = report else {
        return Ok(());
    };

    if cli.json {
        reporter::print_json(&report)?;
    } else if !cli.quiet {
        reporter::print_summary(&report)?;
    }

    if let (Some(_), Some(path)) = (&report.record, &config.log_path) {
        if !cli.quiet && !cli.json {
            eprintln!("Performance record appended to: {}", path.display());
        }
    }

    Ok(())
}

fn launch<T: Element>(cli: &Cli, config: &RunConfig) -> Result<Option<RunReport>, BenchError> {
    match cli.transport {
        Transport::Local => {
            let ranks = cli.ranks.unwrap_or(DEFAULT_RANKS);
            group::run_local(ranks, |g| coordinator::run::<T>(g, config))
        }
        Transport::Mpi => launch_mpi::<T>(cli, config),
    }
}

#[cfg(feature = "mpi")]
fn launch_mpi<T: Element>(cli: &Cli, config: &RunConfig) -> Result<Option<RunReport>, BenchError> {
    use matbench::error::ConfigError;
    use matbench::group::ProcessGroup;

    group::run_mpi(|g| {
        if let Some(requested) = cli.ranks {
            if requested != g.size() {
                return Err(ConfigError::RankMismatch {
                    requested,
                    world: g.size(),
                }
                .into());
            }
        }
        coordinator::run::<T>(g, config)
    })
}

#[cfg(not(feature = "mpi"))]
fn launch_mpi<T: Element>(
    _cli: &Cli,
    _config: &RunConfig,
) -> Result<Option<RunReport>, BenchError> {
    Err(matbench::error::ConfigError::TransportUnavailable("mpi").into())
}
