use crate::error::{BenchError, CommError};
use crate::group::ProcessGroup;
use crate::types::{Element, Matrix, Role};
use tracing::debug;

const ROOT: usize = Role::ROOT_RANK;

/// Block shape every rank must agree on before any data moves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dims {
    pub n: usize,
    pub rows_per_rank: usize,
}

/// Broadcast root's `dims`; every rank returns root's values
pub fn broadcast_dims(group: &dyn ProcessGroup, dims: Dims) -> Result<Dims, BenchError> {
    let header = [dims.n as u64, dims.rows_per_rank as u64];
    let mut buf: Vec<u8> = bytemuck::cast_slice(&header).to_vec();
    group.broadcast(&mut buf, ROOT)?;

    let agreed: Vec<u64> = checked_collect(&buf, 2, "broadcast")?;
    Ok(Dims {
        n: agreed[0] as usize,
        rows_per_rank: agreed[1] as usize,
    })
}

/// Replicate the second operand on every rank.
///
/// `operand` must be `Some` on root and is ignored elsewhere.
pub fn broadcast_operand<T: Element>(
    group: &dyn ProcessGroup,
    operand: Option<&Matrix<T>>,
    n: usize,
) -> Result<Matrix<T>, BenchError> {
    let mut buf = match operand {
        Some(m) if group.rank() == ROOT => m.as_bytes().to_vec(),
        None if group.rank() == ROOT => {
            return Err(CommError::MissingRootBuffer {
                op: "broadcast",
                root: ROOT,
            }
            .into());
        }
        _ => Vec::new(),
    };
    group.broadcast(&mut buf, ROOT)?;
    debug!(bytes = buf.len(), "received second operand");
    Ok(Matrix::from_bytes(&buf, n, n)?)
}

/// Hand each rank its `rows_per_rank x n` block of the first operand.
///
/// Only the leading `size() * rows_per_rank` rows of `operand` are sent.
pub fn scatter_rows<T: Element>(
    group: &dyn ProcessGroup,
    operand: Option<&Matrix<T>>,
    dims: Dims,
) -> Result<Matrix<T>, BenchError> {
    let chunk_len = dims.rows_per_rank * dims.n * std::mem::size_of::<T>();
    let send = match operand {
        Some(m) if group.rank() == ROOT => {
            let distributed = m.rows_slice(0, dims.rows_per_rank * group.size())?;
            Some(bytemuck::cast_slice::<T, u8>(distributed))
        }
        _ => None,
    };
    let chunk = group.scatter(send, chunk_len, ROOT)?;
    Ok(Matrix::from_bytes(&chunk, dims.rows_per_rank, dims.n)?)
}

/// Reassemble every rank's result block on root, in rank order
pub fn gather_rows<T: Element>(
    group: &dyn ProcessGroup,
    block: &Matrix<T>,
    dims: Dims,
) -> Result<Option<Matrix<T>>, BenchError> {
    match group.gather(block.as_bytes(), ROOT)? {
        Some(bytes) => {
            let rows = dims.rows_per_rank * group.size();
            Ok(Some(Matrix::from_bytes(&bytes, rows, dims.n)?))
        }
        None => Ok(None),
    }
}

fn checked_collect<T: bytemuck::Pod>(
    bytes: &[u8],
    expected: usize,
    op: &'static str,
) -> Result<Vec<T>, CommError> {
    let width = std::mem::size_of::<T>();
    if bytes.len() != expected * width {
        return Err(CommError::SizeMismatch {
            op,
            expected: expected * width,
            actual: bytes.len(),
        });
    }
    Ok(bytemuck::pod_collect_to_vec(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::run_local;

    #[test]
    fn test_dims_follow_root() {
        let dims = run_local(3, |group| {
            let local = if group.rank() == 0 {
                Dims { n: 12, rows_per_rank: 4 }
            } else {
                Dims { n: 0, rows_per_rank: 0 }
            };
            let agreed = broadcast_dims(group, local)?;
            assert_eq!(agreed, Dims { n: 12, rows_per_rank: 4 });
            Ok(agreed)
        })
        .unwrap();
        assert_eq!(dims.n, 12);
    }

    #[test]
    fn test_scatter_and_gather_rows() {
        let a = Matrix::<f64>::from_vec((0..16).map(|x| x as f64).collect(), 4, 4).unwrap();
        let dims = Dims { n: 4, rows_per_rank: 2 };

        let gathered = run_local(2, |group| {
            let operand = (group.rank() == 0).then_some(&a);
            let block = scatter_rows(group, operand, dims)?;
            assert_eq!(block.row(0)[0], (group.rank() * 8) as f64);
            gather_rows(group, &block, dims)
        })
        .unwrap();

        assert_eq!(gathered, Some(a));
    }

    #[test]
    fn test_broadcast_operand_requires_root_matrix() {
        let err = run_local(2, |group| broadcast_operand::<f32>(group, None, 2)).unwrap_err();
        assert!(matches!(
            err,
            BenchError::Comm(CommError::MissingRootBuffer { op: "broadcast", .. })
        ));
    }
}
