use crate::error::ShapeError;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use std::fmt::Debug;
use std::ops::{Add, AddAssign, Mul};

/// Scalar type a benchmark matrix can hold
pub trait Element:
    bytemuck::Pod
    + Default
    + Debug
    + PartialEq
    + Send
    + Sync
    + Add<Output = Self>
    + Mul<Output = Self>
    + AddAssign
    + 'static
{
    /// Short name used in reports ("f32", "f64")
    const NAME: &'static str;

    /// Uniform sample in [0, 1)
    fn sample<R: Rng>(rng: &mut R) -> Self;

    fn to_f64(self) -> f64;
}

impl Element for f32 {
    const NAME: &'static str = "f32";

    fn sample<R: Rng>(rng: &mut R) -> Self {
        rng.random::<f32>()
    }

    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Element for f64 {
    const NAME: &'static str = "f64";

    fn sample<R: Rng>(rng: &mut R) -> Self {
        rng.random::<f64>()
    }

    fn to_f64(self) -> f64 {
        self
    }
}

/// Dense row-major matrix
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Element> Matrix<T> {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![T::default(); rows * cols],
        }
    }

    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self, ShapeError> {
        if data.len() != rows * cols {
            return Err(ShapeError::Length {
                rows,
                cols,
                expected: rows * cols,
                actual: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Matrix of independent uniform [0, 1) entries
    pub fn random<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Self {
        let data = (0..rows * cols).map(|_| T::sample(&mut *rng)).collect();
        Self { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn row(&self, row: usize) -> &[T] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Elements of rows `start..start + count`, still row-major
    pub fn rows_slice(&self, start: usize, count: usize) -> Result<&[T], ShapeError> {
        let end = start + count;
        if end > self.rows {
            return Err(ShapeError::RowRange {
                start,
                end,
                rows: self.rows,
            });
        }
        Ok(&self.data[start * self.cols..end * self.cols])
    }

    /// Copy of rows `start..start + count`
    pub fn row_block(&self, start: usize, count: usize) -> Result<Self, ShapeError> {
        let data = self.rows_slice(start, count)?.to_vec();
        Ok(Self {
            rows: count,
            cols: self.cols,
            data,
        })
    }

    /// Raw element bytes as they travel over a process group
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Rebuild from bytes received over a process group
    pub fn from_bytes(bytes: &[u8], rows: usize, cols: usize) -> Result<Self, ShapeError> {
        let width = std::mem::size_of::<T>();
        if bytes.len() != rows * cols * width {
            return Err(ShapeError::Length {
                rows,
                cols,
                expected: rows * cols,
                actual: bytes.len() / width,
            });
        }
        // Copies, so the byte buffer needs no particular alignment
        let data = bytemuck::pod_collect_to_vec(bytes);
        Ok(Self { rows, cols, data })
    }
}

/// Which part a rank plays in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Rank 0: owns the full operands, validates, reports and logs
    Root,
    /// Every other rank: holds one row block and the second operand
    Worker,
}

impl Role {
    pub const ROOT_RANK: usize = 0;

    pub fn of(rank: usize) -> Self {
        if rank == Self::ROOT_RANK {
            Role::Root
        } else {
            Role::Worker
        }
    }

    pub fn is_root(self) -> bool {
        self == Role::Root
    }
}

/// One benchmark result, as appended to the performance log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceRecord {
    pub n: usize,
    pub ranks: usize,
    pub serial_seconds: f64,
    pub distributed_seconds: f64,
    pub speedup: f64,
    pub efficiency_percent: f64,
    /// Not part of the CSV line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<String>,
}

/// Outcome of comparing the distributed result to the serial reference
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Verdict {
    pub correct: bool,
    pub max_abs_diff: f64,
    pub tolerance: f64,
}

/// Wall-clock time spent in each phase, measured on root
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PhaseTimings {
    pub generate_seconds: f64,
    pub serial_seconds: Option<f64>,
    pub distribute_seconds: f64,
    pub compute_seconds: f64,
    pub gather_seconds: f64,
    /// Distribution through gather, as one interval
    pub distributed_seconds: f64,
}

/// Everything root knows after a run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub n: usize,
    pub ranks: usize,
    pub precision: String,
    pub rows_per_rank: usize,
    pub effective_rows: usize,
    pub dropped_rows: usize,
    pub timings: PhaseTimings,
    pub verdict: Option<Verdict>,
    pub record: Option<PerformanceRecord>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}
