use crate::math::scalar::Scalar;

/// Element-wise binary cross-entropy without epsilon smoothing.
pub struct CrossEntropyCost;

impl CrossEntropyCost {
    /// `-ln(p)` when the target is 1, `-ln(1 - p)` otherwise.
    ///
    /// A non-finite result (log of zero, or of a negative value) is reported
    /// as 0. This is the only place a cost value gets clamped.
    pub fn cost<T: Scalar>(predicted: T, expected: T) -> T {
        let v = if expected == T::ONE {
            -predicted.ln()
        } else {
            -(T::ONE - predicted).ln()
        };
        if v.is_finite() { v } else { T::ZERO }
    }

    /// `(e - p) / (p(p - 1))`, or 0 at p == 0 and p == 1.
    pub fn derivative<T: Scalar>(predicted: T, expected: T) -> T {
        if predicted == T::ZERO || predicted == T::ONE {
            return T::ZERO;
        }
        (expected - predicted) / (predicted * (predicted - T::ONE))
    }
}
