use thiserror::Error;

/// Invalid run parameters, detected before the group issues any collective
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("matrix size must be at least 1")]
    ZeroSize,

    #[error("process group must have at least 1 rank")]
    ZeroRanks,

    #[error("{ranks} ranks cannot share a {n}x{n} matrix: every rank needs at least one row")]
    TooManyRanks { n: usize, ranks: usize },

    #[error("matrix size {n} is not divisible by {ranks} ranks ({remainder} rows would be dropped)")]
    Indivisible {
        n: usize,
        ranks: usize,
        remainder: usize,
    },

    #[error("--ranks {requested} does not match the MPI world size {world}")]
    RankMismatch { requested: usize, world: usize },

    #[error("the {0} transport is not available in this build")]
    TransportUnavailable(&'static str),
}

/// Failure of a collective operation; always fatal to the whole group
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommError {
    #[error("rank {peer} left the group during {op}")]
    Disconnected { op: &'static str, peer: usize },

    #[error("{op}: expected {expected} bytes, received {actual}")]
    SizeMismatch {
        op: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{op}: root rank {root} has no send buffer")]
    MissingRootBuffer { op: &'static str, root: usize },

    #[error("root rank {root} is outside a group of {size}")]
    InvalidRoot { root: usize, size: usize },

    #[error("rank {0} panicked")]
    Panicked(usize),

    #[error("failed to initialize MPI")]
    InitFailed,
}

/// Matrix dimensions that do not fit together
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("{rows}x{cols} matrix needs {expected} elements, got {actual}")]
    Length {
        rows: usize,
        cols: usize,
        expected: usize,
        actual: usize,
    },

    #[error("cannot multiply {lhs_rows}x{lhs_cols} by {rhs_rows}x{rhs_cols}")]
    Incompatible {
        lhs_rows: usize,
        lhs_cols: usize,
        rhs_rows: usize,
        rhs_cols: usize,
    },

    #[error("rows {start}..{end} are outside a matrix with {rows} rows")]
    RowRange {
        start: usize,
        end: usize,
        rows: usize,
    },
}

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("communication error: {0}")]
    Comm(#[from] CommError),

    #[error("shape error: {0}")]
    Shape(#[from] ShapeError),

    #[error("performance log: {0:#}")]
    Log(anyhow::Error),
}

impl BenchError {
    /// True when this rank only failed because another rank went away first
    pub fn is_disconnect(&self) -> bool {
        matches!(self, BenchError::Comm(CommError::Disconnected { .. }))
    }
}
