use crate::compute;
use crate::csv_writer;
use crate::distribute::{self, Dims};
use crate::error::{BenchError, CommError};
use crate::group::ProcessGroup;
use crate::metrics;
use crate::partition::{Partition, RemainderPolicy};
use crate::types::{Element, Matrix, PerformanceRecord, PhaseTimings, Role, RunReport, Verdict};
use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Parameters shared by every rank
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub n: usize,
    pub tolerance: f64,
    pub seed: Option<u64>,
    pub remainder: RemainderPolicy,
    /// Time a single-process multiply for comparison and validation
    pub serial_baseline: bool,
    /// Performance log to append to; `None` disables logging
    pub log_path: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            n: 200,
            tolerance: 1e-4,
            seed: None,
            remainder: RemainderPolicy::Truncate,
            serial_baseline: true,
            log_path: None,
        }
    }
}

/// Root-local time spent in each step of the distributed path
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseSplit {
    pub distribute: Duration,
    pub compute: Duration,
    pub gather: Duration,
}

/// Run the benchmark on this rank. Root returns its report, workers `None`.
pub fn run<T: Element>(
    group: &dyn ProcessGroup,
    config: &RunConfig,
) -> Result<Option<RunReport>, BenchError> {
    // INIT: configuration is checked before anything touches the group
    let role = Role::of(group.rank());
    let partition = Partition::new(config.n, group.size(), config.remainder)?;
    debug!(?role, size = group.size(), rows_per_rank = partition.rows_per_rank, "joined group");

    match role {
        Role::Root => run_root::<T>(group, config, &partition).map(Some),
        Role::Worker => run_worker::<T>(group, &partition).map(|()| None),
    }
}

fn run_worker<T: Element>(
    group: &dyn ProcessGroup,
    partition: &Partition,
) -> Result<(), BenchError> {
    let (gathered, split) = distributed_multiply::<T>(group, None, partition)?;
    debug_assert!(gathered.is_none());
    debug!(compute_seconds = split.compute.as_secs_f64(), "worker finished");
    Ok(())
}

fn run_root<T: Element>(
    group: &dyn ProcessGroup,
    config: &RunConfig,
    partition: &Partition,
) -> Result<RunReport, BenchError> {
    let start_time = Utc::now();
    let n = partition.n;
    let ranks = partition.ranks;

    if partition.dropped_rows > 0 {
        warn!(
            n,
            ranks,
            dropped_rows = partition.dropped_rows,
            "matrix size is not divisible by the rank count; the last {} rows are left out of the distributed product",
            partition.dropped_rows
        );
    }

    // GENERATE
    let generate_start = Instant::now();
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let a = Matrix::<T>::random(n, n, &mut rng);
    let b = Matrix::<T>::random(n, n, &mut rng);
    let generate_seconds = generate_start.elapsed().as_secs_f64();
    info!(n, precision = T::NAME, "generated operands");

    let serial = if config.serial_baseline {
        let serial_start = Instant::now();
        let reference = compute::multiply(&a, &b)?;
        let elapsed = serial_start.elapsed().as_secs_f64();
        info!(seconds = elapsed, "serial baseline complete");
        Some((reference, elapsed))
    } else {
        None
    };

    // DISTRIBUTE, COMPUTE, GATHER
    let distributed_start = Instant::now();
    let (gathered, split) = distributed_multiply(group, Some((&a, &b)), partition)?;
    let distributed_seconds = distributed_start.elapsed().as_secs_f64();
    let gathered = gathered.ok_or(CommError::MissingRootBuffer {
        op: "gather",
        root: Role::ROOT_RANK,
    })?;
    info!(seconds = distributed_seconds, ranks, "distributed multiply complete");

    // VALIDATE
    let verdict = match &serial {
        Some((reference, _)) => Some(validate_rows(
            &gathered,
            reference,
            partition,
            config.tolerance,
        )?),
        None => None,
    };
    if let Some(v) = verdict.filter(|v| !v.correct) {
        warn!(
            max_abs_diff = v.max_abs_diff,
            tolerance = v.tolerance,
            "distributed result does not match the serial reference"
        );
    }

    // REPORT
    let record = serial.as_ref().map(|(_, serial_seconds)| {
        PerformanceRecord::new(n, ranks, *serial_seconds, distributed_seconds)
            .with_precision(T::NAME)
    });
    if let (Some(record), Some(path)) = (&record, &config.log_path) {
        csv_writer::append_record(path, record).map_err(BenchError::Log)?;
        info!(path = %path.display(), "appended performance record");
    }

    Ok(RunReport {
        n,
        ranks,
        precision: T::NAME.to_string(),
        rows_per_rank: partition.rows_per_rank,
        effective_rows: partition.effective_rows(),
        dropped_rows: partition.dropped_rows,
        timings: PhaseTimings {
            generate_seconds,
            serial_seconds: serial.as_ref().map(|(_, s)| *s),
            distribute_seconds: split.distribute.as_secs_f64(),
            compute_seconds: split.compute.as_secs_f64(),
            gather_seconds: split.gather.as_secs_f64(),
            distributed_seconds,
        },
        verdict,
        record,
        start_time,
        end_time: Utc::now(),
    })
}

/// Broadcast `b`, scatter row blocks of `a`, multiply locally and gather.
///
/// `operands` is `(a, b)` on root and ignored elsewhere. Root gets back the
/// `effective_rows x n` product; other ranks get `None`.
pub fn distributed_multiply<T: Element>(
    group: &dyn ProcessGroup,
    operands: Option<(&Matrix<T>, &Matrix<T>)>,
    partition: &Partition,
) -> Result<(Option<Matrix<T>>, PhaseSplit), BenchError> {
    let (a, b) = match operands {
        Some((a, b)) => (Some(a), Some(b)),
        None => (None, None),
    };

    let started = Instant::now();
    let dims = distribute::broadcast_dims(
        group,
        Dims {
            n: partition.n,
            rows_per_rank: partition.rows_per_rank,
        },
    )?;
    let operand = distribute::broadcast_operand(group, b, dims.n)?;
    let block = distribute::scatter_rows(group, a, dims)?;
    let distribute = started.elapsed();
    debug!(rows = block.rows(), cols = block.cols(), "holding row block and second operand");

    let started = Instant::now();
    let local = compute::multiply(&block, &operand)?;
    let compute = started.elapsed();

    let started = Instant::now();
    let gathered = distribute::gather_rows(group, &local, dims)?;
    let gather = started.elapsed();

    Ok((
        gathered,
        PhaseSplit {
            distribute,
            compute,
            gather,
        },
    ))
}

/// Compare the gathered rows with the same leading rows of the reference
fn validate_rows<T: Element>(
    gathered: &Matrix<T>,
    reference: &Matrix<T>,
    partition: &Partition,
    tolerance: f64,
) -> Result<Verdict, BenchError> {
    let expected = reference.row_block(0, partition.effective_rows())?;
    Ok(metrics::validate(gathered, &expected, tolerance))
}
