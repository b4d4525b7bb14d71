use crate::error::ShapeError;
use crate::types::{Element, Matrix};

/// Dense product of `lhs` (m x k) and `rhs` (k x n).
///
/// Each output row depends only on the matching `lhs` row and all of `rhs`,
/// and is accumulated in the same order however the rows were split up, so a
/// row block multiplied on its own is bit-identical to the same rows of the
/// full product.
pub fn multiply<T: Element>(lhs: &Matrix<T>, rhs: &Matrix<T>) -> Result<Matrix<T>, ShapeError> {
    if lhs.cols() != rhs.rows() {
        return Err(ShapeError::Incompatible {
            lhs_rows: lhs.rows(),
            lhs_cols: lhs.cols(),
            rhs_rows: rhs.rows(),
            rhs_cols: rhs.cols(),
        });
    }

    let mut out = vec![T::default(); lhs.rows() * rhs.cols()];
    gemm_rows(lhs.data(), rhs.data(), lhs.cols(), rhs.cols(), &mut out);
    Matrix::from_vec(out, lhs.rows(), rhs.cols())
}

/// `out[i][j] += sum_k lhs[i][k] * rhs[k][j]` over row-major slices.
///
/// i-k-j order keeps both the `rhs` row and the output row sequential in memory.
fn gemm_rows<T: Element>(lhs: &[T], rhs: &[T], k: usize, n: usize, out: &mut [T]) {
    if k == 0 || n == 0 {
        return;
    }
    for (lhs_row, out_row) in lhs.chunks_exact(k).zip(out.chunks_exact_mut(n)) {
        for (&a, rhs_row) in lhs_row.iter().zip(rhs.chunks_exact(n)) {
            for (o, &b) in out_row.iter_mut().zip(rhs_row) {
                *o += a * b;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_multiply_simple() {
        let a = Matrix::from_vec(vec![1.0, 2.0, 3.0, 4.0], 2, 2).unwrap();
        let b = Matrix::from_vec(vec![5.0, 6.0, 7.0, 8.0], 2, 2).unwrap();
        // [1*5+2*7, 1*6+2*8] = [19, 22]
        // [3*5+4*7, 3*6+4*8] = [43, 50]
        let c = multiply::<f64>(&a, &b).unwrap();
        assert_eq!(c.data(), &[19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn test_multiply_rectangular_block() {
        // A 2x3 row block against a 3x3 operand
        let block = Matrix::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3).unwrap();
        let b = Matrix::from_vec(vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 2.0], 3, 3).unwrap();
        let c = multiply::<f32>(&block, &b).unwrap();
        assert_eq!(c.rows(), 2);
        assert_eq!(c.cols(), 3);
        assert_eq!(c.data(), &[1.0, 2.0, 6.0, 4.0, 5.0, 12.0]);
    }

    #[test]
    fn test_multiply_shape_mismatch() {
        let a = Matrix::<f32>::zeros(2, 3);
        let b = Matrix::<f32>::zeros(2, 2);
        assert!(matches!(
            multiply(&a, &b),
            Err(ShapeError::Incompatible { lhs_cols: 3, rhs_rows: 2, .. })
        ));
    }

    #[test]
    fn test_multiply_is_repeatable() {
        let mut rng = StdRng::seed_from_u64(11);
        let a = Matrix::<f32>::random(17, 17, &mut rng);
        let b = Matrix::<f32>::random(17, 17, &mut rng);

        let first = multiply(&a, &b).unwrap();
        for _ in 0..3 {
            let again = multiply(&a, &b).unwrap();
            let same_bits = first
                .data()
                .iter()
                .zip(again.data())
                .all(|(x, y)| x.to_bits() == y.to_bits());
            assert!(same_bits);
        }
    }

    #[test]
    fn test_row_block_matches_full_product() {
        let mut rng = StdRng::seed_from_u64(3);
        let a = Matrix::<f32>::random(12, 12, &mut rng);
        let b = Matrix::<f32>::random(12, 12, &mut rng);
        let full = multiply(&a, &b).unwrap();

        let block = a.row_block(4, 4).unwrap();
        let partial = multiply(&block, &b).unwrap();
        assert_eq!(partial.data(), full.rows_slice(4, 4).unwrap());
    }
}
