use crate::math::scalar::Scalar;

pub struct MseCost;

impl MseCost {
    /// Per-element cost: (p - e)²
    pub fn cost<T: Scalar>(predicted: T, expected: T) -> T {
        let diff = predicted - expected;
        diff * diff
    }

    /// Per-element gradient: 2(p - e)
    pub fn derivative<T: Scalar>(predicted: T, expected: T) -> T {
        T::from_f64(2.0) * (predicted - expected)
    }
}
