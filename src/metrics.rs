use crate::types::{Element, Matrix, PerformanceRecord, Verdict};
use chrono::Utc;

/// Serial time over distributed time. A zero distributed time gives infinity.
pub fn speedup(serial_seconds: f64, distributed_seconds: f64) -> f64 {
    serial_seconds / distributed_seconds
}

/// Speedup as a percentage of ideal linear scaling over `ranks`
pub fn efficiency(speedup: f64, ranks: usize) -> f64 {
    100.0 * speedup / ranks as f64
}

/// Largest element-wise absolute difference, or `None` when the shapes differ.
///
/// A NaN on either side makes the result NaN.
pub fn max_abs_diff<T: Element>(lhs: &Matrix<T>, rhs: &Matrix<T>) -> Option<f64> {
    if lhs.rows() != rhs.rows() || lhs.cols() != rhs.cols() {
        return None;
    }
    Some(
        lhs.data()
            .iter()
            .zip(rhs.data())
            .map(|(&a, &b)| (a.to_f64() - b.to_f64()).abs())
            .fold(0.0, |acc, d| if d.is_nan() || d > acc { d } else { acc }),
    )
}

/// Compare two equally shaped matrices within an absolute tolerance.
///
/// Mismatched shapes, and NaN anywhere, count as incorrect.
pub fn validate<T: Element>(actual: &Matrix<T>, expected: &Matrix<T>, tolerance: f64) -> Verdict {
    match max_abs_diff(actual, expected) {
        Some(max_abs_diff) => Verdict {
            // NaN compares false against any tolerance
            correct: max_abs_diff <= tolerance,
            max_abs_diff,
            tolerance,
        },
        None => Verdict {
            correct: false,
            max_abs_diff: f64::INFINITY,
            tolerance,
        },
    }
}

pub fn approx_eq<T: Element>(lhs: &Matrix<T>, rhs: &Matrix<T>, tolerance: f64) -> bool {
    validate(lhs, rhs, tolerance).correct
}

impl PerformanceRecord {
    pub fn new(n: usize, ranks: usize, serial_seconds: f64, distributed_seconds: f64) -> Self {
        let speedup = speedup(serial_seconds, distributed_seconds);
        Self {
            n,
            ranks,
            serial_seconds,
            distributed_seconds,
            speedup,
            efficiency_percent: efficiency(speedup, ranks),
            timestamp: Some(Utc::now()),
            precision: None,
        }
    }

    pub fn with_precision(mut self, precision: &str) -> Self {
        self.precision = Some(precision.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_speedup_and_efficiency() {
        let s = speedup(0.40, 0.22);
        assert_relative_eq!(s, 0.40 / 0.22);
        assert_relative_eq!(s, 1.818_181_818, epsilon = 1e-9);
        let e = efficiency(s, 2);
        assert_relative_eq!(e, 100.0 * (0.40 / 0.22) / 2.0);
        assert_relative_eq!(e, 90.909_090_909, epsilon = 1e-8);
    }

    #[test]
    fn test_record_derives_ratios() {
        let record = PerformanceRecord::new(200, 2, 0.40, 0.22);
        assert_eq!(record.n, 200);
        assert_eq!(record.ranks, 2);
        assert_relative_eq!(record.speedup, 0.40 / 0.22);
        assert_relative_eq!(record.efficiency_percent, 50.0 * 0.40 / 0.22);
        assert!(record.timestamp.is_some());
    }

    #[test]
    fn test_zero_distributed_time() {
        assert!(speedup(0.1, 0.0).is_infinite());
    }

    #[test]
    fn test_validate_within_tolerance() {
        let a = Matrix::<f32>::from_vec(vec![1.0, 2.0, 3.0, 4.0], 2, 2).unwrap();
        let b = Matrix::<f32>::from_vec(vec![1.0, 2.0, 3.0, 4.00005], 2, 2).unwrap();
        let verdict = validate(&a, &b, 1e-4);
        assert!(verdict.correct);
        assert!(verdict.max_abs_diff > 0.0);
        assert!(!approx_eq(&a, &b, 0.0));
    }

    #[test]
    fn test_validate_reports_mismatch() {
        let a = Matrix::<f64>::from_vec(vec![1.0, 2.0], 1, 2).unwrap();
        let b = Matrix::<f64>::from_vec(vec![1.0, 2.5], 1, 2).unwrap();
        let verdict = validate(&a, &b, 1e-4);
        assert!(!verdict.correct);
        assert_relative_eq!(verdict.max_abs_diff, 0.5);
    }

    #[test]
    fn test_validate_shape_mismatch() {
        let a = Matrix::<f64>::zeros(2, 2);
        let b = Matrix::<f64>::zeros(1, 4);
        assert_eq!(max_abs_diff(&a, &b), None);
        assert!(!validate(&a, &b, 1.0).correct);
    }

    #[test]
    fn test_validate_rejects_nan() {
        let a = Matrix::<f64>::from_vec(vec![f64::NAN], 1, 1).unwrap();
        let b = Matrix::<f64>::from_vec(vec![0.0], 1, 1).unwrap();
        assert!(!validate(&a, &b, 1.0).correct);
    }

    #[test]
    fn test_validate_rejects_nan_in_reference() {
        let a = Matrix::<f64>::from_vec(vec![1.0, 2.0], 1, 2).unwrap();
        let b = Matrix::<f64>::from_vec(vec![1.0, f64::NAN], 1, 2).unwrap();
        let verdict = validate(&a, &b, 1e-4);
        assert!(!verdict.correct);
        assert!(verdict.max_abs_diff.is_nan());
        assert!(!approx_eq(&b, &b, 1.0));
    }
}
