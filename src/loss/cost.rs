use log::debug;
use serde::{Serialize, Deserialize};

use crate::data::data_point::DataPoint;
use crate::error::{NetworkError, Result};
use crate::loss::{cross_entropy::CrossEntropyCost, mse::MseCost};
use crate::math::{matrix::Matrix, scalar::Scalar};

/// Selects which cost function a network trains against.
///
/// - `Mse`          — squared error summed over outputs; pair with Sigmoid or ReLU output.
/// - `CrossEntropy` — element-wise binary cross-entropy; pair with Sigmoid output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cost {
    #[default]
    Mse,
    CrossEntropy,
}

impl Cost {
    pub fn calculate<T: Scalar>(&self, predicted: T, expected: T) -> T {
        match self {
            Cost::Mse => MseCost::cost(predicted, expected),
            Cost::CrossEntropy => CrossEntropyCost::cost(predicted, expected),
        }
    }

    pub fn derivative<T: Scalar>(&self, predicted: T, expected: T) -> T {
        match self {
            Cost::Mse => MseCost::derivative(predicted, expected),
            Cost::CrossEntropy => CrossEntropyCost::derivative(predicted, expected),
        }
    }

    /// Sum of the element cost over a point's `output` / `expected` pair.
    pub fn point_cost<T: Scalar>(&self, point: &DataPoint<T>) -> Result<T> {
        check_output_shape(point)?;
        let mut sum = T::ZERO;
        for (&p, &e) in point.output.iter().zip(point.expected.iter()) {
            sum += self.calculate(p, e);
        }
        Ok(sum)
    }

    /// Mean point cost over a batch.
    pub fn batch_cost<T: Scalar>(&self, batch: &[DataPoint<T>]) -> Result<T> {
        if batch.is_empty() {
            return Err(NetworkError::EmptyInput("batch"));
        }
        let mut sum = T::ZERO;
        for point in batch {
            sum += self.point_cost(point)?;
        }
        Ok(sum / T::from_usize(batch.len()))
    }

    /// Mean point cost over a whole dataset of batches.
    ///
    /// The divisor is `batches.len() * batches[0].len()`, which only equals
    /// the point count when every batch has the size of the first one.
    pub fn dataset_cost<T: Scalar>(&self, batches: &[Vec<DataPoint<T>>]) -> Result<T> {
        let first_len = match batches.first() {
            Some(first) if !first.is_empty() => first.len(),
            _ => return Err(NetworkError::EmptyInput("dataset")),
        };

        let mut sum = T::ZERO;
        let mut points = 0;
        for batch in batches {
            for point in batch {
                sum += self.point_cost(point)?;
                points += 1;
            }
        }

        let divisor = batches.len() * first_len;
        if divisor != points {
            debug!("dataset cost divides by {divisor} but the dataset holds {points} points");
        }
        Ok(sum / T::from_usize(divisor))
    }

    /// Per-element derivative, shaped like `point.expected`.
    pub fn point_derivative<T: Scalar>(&self, point: &DataPoint<T>) -> Result<Matrix<T>> {
        check_output_shape(point)?;
        let values = point.output.iter()
            .zip(point.expected.iter())
            .map(|(&p, &e)| self.derivative(p, e))
            .collect();
        Matrix::from_vec(point.expected.rows(), point.expected.cols(), values)
    }
}

fn check_output_shape<T: Scalar>(point: &DataPoint<T>) -> Result<()> {
    if point.output.shape() != point.expected.shape() {
        return Err(NetworkError::ShapeMismatch {
            op: "cost",
            left: point.output.shape(),
            right: point.expected.shape(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(output: &[f64], expected: &[f64]) -> DataPoint {
        let mut p = DataPoint::from_values(vec![0.0], expected.to_vec());
        p.output = Matrix::row(output.to_vec());
        p
    }

    #[test]
    fn mse_scalar_cost_and_derivative() {
        assert_eq!(Cost::Mse.calculate(3.0, 1.0), 4.0);
        assert_eq!(Cost::Mse.derivative(3.0, 1.0), 4.0);
    }

    #[test]
    fn cross_entropy_boundaries() {
        let ce = Cost::CrossEntropy;
        assert_eq!(ce.calculate(1.0, 1.0), 0.0);
        assert_eq!(ce.calculate(0.0, 1.0), 0.0);
        assert_eq!(ce.calculate(1.0, 0.0), 0.0);
        assert!((ce.calculate(0.5, 0.0) - 2f64.ln()).abs() < 1e-12);
        assert_eq!(ce.derivative(0.0, 1.0), 0.0);
        assert_eq!(ce.derivative(1.0, 0.0), 0.0);
        // (1 - 0.25) / (0.25 * -0.75)
        assert!((ce.derivative(0.25f64, 1.0) - (-4.0)).abs() < 1e-12);
    }

    #[test]
    fn generic_over_f32() {
        assert_eq!(Cost::Mse.calculate(3.0f32, 1.0f32), 4.0f32);
        let p: DataPoint<f32> = DataPoint {
            output: Matrix::row(vec![0.5, 2.0]),
            ..DataPoint::from_values(vec![0.0], vec![0.0, 1.0])
        };
        assert_eq!(Cost::Mse.point_cost(&p).unwrap(), 1.25f32);
    }

    #[test]
    fn point_and_batch_aggregation() {
        let a = point(&[1.0, 0.0], &[0.0, 0.0]);
        let b = point(&[2.0, 1.0], &[0.0, 0.0]);
        assert_eq!(Cost::Mse.point_cost(&a).unwrap(), 1.0);
        assert_eq!(Cost::Mse.point_cost(&b).unwrap(), 5.0);
        assert_eq!(Cost::Mse.batch_cost(&[a, b]).unwrap(), 3.0);
        assert!(matches!(Cost::Mse.batch_cost::<f64>(&[]), Err(NetworkError::EmptyInput(_))));
    }

    #[test]
    fn dataset_cost_divides_by_first_batch_size() {
        let one = point(&[1.0], &[0.0]);
        let even = vec![vec![one.clone(), one.clone()], vec![one.clone(), one.clone()]];
        assert_eq!(Cost::Mse.dataset_cost(&even).unwrap(), 1.0);

        // 3 points, divisor 2 * 2 = 4
        let uneven = vec![vec![one.clone(), one.clone()], vec![one]];
        assert_eq!(Cost::Mse.dataset_cost(&uneven).unwrap(), 0.75);
        assert!(Cost::Mse.dataset_cost::<f64>(&[]).is_err());
    }

    #[test]
    fn dataset_cost_on_trainer_shaped_batches() {
        // batch size 3 over 10 points: 4, 3, 3; divisor 3 * 4 = 12
        let one = point(&[1.0], &[0.0]);
        let batches = vec![vec![one.clone(); 4], vec![one.clone(); 3], vec![one; 3]];
        let cost = Cost::Mse.dataset_cost(&batches).unwrap();
        assert!((cost - 10.0 / 12.0).abs() < 1e-12);
    }

    #[test]
    fn derivative_matrix_matches_expected_shape() {
        let p = point(&[3.0, 0.5], &[1.0, 0.5]);
        let d = Cost::Mse.point_derivative(&p).unwrap();
        assert_eq!(d.shape(), (1, 2));
        assert_eq!(d.as_slice(), &[4.0, 0.0]);
    }

    #[test]
    fn stale_output_is_a_shape_mismatch() {
        let p = DataPoint::from_values(vec![1.0], vec![0.0, 1.0]);
        assert!(matches!(Cost::Mse.point_cost(&p), Err(NetworkError::ShapeMismatch { .. })));
        assert!(Cost::CrossEntropy.point_derivative(&p).is_err());
    }
}
