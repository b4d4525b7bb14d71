use crate::error::ConfigError;

/// What to do with the `n % ranks` rows that do not fill an equal block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemainderPolicy {
    /// Drop the trailing rows from the distributed computation and warn
    #[default]
    Truncate,
    /// Refuse to run
    Reject,
}

/// Contiguous rows of the first operand owned by one rank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowBlock {
    pub rank: usize,
    pub start: usize,
    pub rows: usize,
}

impl RowBlock {
    pub fn end(&self) -> usize {
        self.start + self.rows
    }
}

/// Equal row blocks of an `n x n` matrix, one per rank in rank order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub n: usize,
    pub ranks: usize,
    pub rows_per_rank: usize,
    pub blocks: Vec<RowBlock>,
    pub dropped_rows: usize,
}

impl Partition {
    pub fn new(n: usize, ranks: usize, policy: RemainderPolicy) -> Result<Self, ConfigError> {
        if n == 0 {
            return Err(ConfigError::ZeroSize);
        }
        if ranks == 0 {
            return Err(ConfigError::ZeroRanks);
        }
        if ranks > n {
            return Err(ConfigError::TooManyRanks { n, ranks });
        }

        let rows_per_rank = n / ranks;
        let dropped_rows = n % ranks;

        if dropped_rows > 0 && policy == RemainderPolicy::Reject {
            return Err(ConfigError::Indivisible {
                n,
                ranks,
                remainder: dropped_rows,
            });
        }

        let blocks = (0..ranks)
            .map(|rank| RowBlock {
                rank,
                start: rank * rows_per_rank,
                rows: rows_per_rank,
            })
            .collect();

        Ok(Self {
            n,
            ranks,
            rows_per_rank,
            blocks,
            dropped_rows,
        })
    }

    /// Rows that take part in the distributed product
    pub fn effective_rows(&self) -> usize {
        self.rows_per_rank * self.ranks
    }
}
