use clap::{Parser, ValueEnum};

#[derive(Parser)]
#[command(name = "matbench")]
#[command(
    about = "Serial vs. distributed dense matrix multiplication benchmark",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Matrix dimension N (operands are N x N)
    #[arg(default_value = "200")]
    pub size: usize,

    /// Number of ranks in the process group [default: 2]
    ///
    /// With the MPI transport the group size comes from the launcher; if given,
    /// it must match the world size.
    #[arg(short, long, env = "MATBENCH_RANKS")]
    pub ranks: Option<usize>,

    /// Process group transport
    #[arg(short, long, value_enum, default_value = "local")]
    pub transport: Transport,

    /// Element type of the operands
    #[arg(short, long, value_enum, default_value = "f32")]
    pub precision: Precision,

    /// Absolute tolerance when comparing against the serial reference
    #[arg(long, default_value = "1e-4", value_parser = parse_tolerance)]
    pub tolerance: f64,

    /// Seed for operand generation (random when omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Append-only CSV performance log
    #[arg(long, default_value = "performance.log")]
    pub log: String,

    /// Do not append to the performance log
    #[arg(long)]
    pub no_log: bool,

    /// Skip the serial baseline (no validation, no log entry)
    #[arg(long)]
    pub skip_serial: bool,

    /// Reject sizes not divisible by the rank count instead of dropping rows
    #[arg(long)]
    pub strict: bool,

    /// Output JSON instead of human-readable text
    #[arg(long)]
    pub json: bool,

    /// Suppress human-readable output (useful with --json)
    #[arg(long)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    /// One thread per rank inside this process
    Local,
    /// MPI world communicator (requires the `mpi` feature)
    Mpi,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Precision {
    /// Single precision, half the memory of f64
    F32,
    /// Double precision
    F64,
}

fn parse_tolerance(s: &str) -> Result<f64, String> {
    let tolerance: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if tolerance.is_finite() && tolerance >= 0.0 {
        Ok(tolerance)
    } else {
        Err(format!("must be a finite value >= 0, got {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["matbench"]).unwrap();
        assert_eq!(cli.size, 200);
        assert_eq!(cli.transport, Transport::Local);
        assert_eq!(cli.precision, Precision::F32);
        assert_eq!(cli.tolerance, 1e-4);
        assert_eq!(cli.log, "performance.log");
        assert!(!cli.strict && !cli.skip_serial && !cli.no_log);
    }

    #[test]
    fn test_positional_size() {
        let cli = Cli::try_parse_from(["matbench", "150"]).unwrap();
        assert_eq!(cli.size, 150);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "matbench", "64", "--ranks", "4", "--precision", "f64", "--strict", "-vv",
        ])
        .unwrap();
        assert_eq!(cli.ranks, Some(4));
        assert_eq!(cli.precision, Precision::F64);
        assert!(cli.strict);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_tolerance_must_be_non_negative() {
        let cli = Cli::try_parse_from(["matbench", "--tolerance", "0"]).unwrap();
        assert_eq!(cli.tolerance, 0.0);
        for bad in ["-1e-4", "NaN", "inf", "tight"] {
            assert!(
                Cli::try_parse_from(["matbench", "--tolerance", bad]).is_err(),
                "accepted {bad}"
            );
        }
    }

    #[test]
    fn test_rejects_non_numeric_size() {
        assert!(Cli::try_parse_from(["matbench", "big"]).is_err());
    }
}
