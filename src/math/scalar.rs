use std::fmt::{Debug, Display};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

/// Floating-point element type a `Matrix` (and the cost functions) can hold.
pub trait Scalar:
    Copy
    + Debug
    + Display
    + Default
    + PartialEq
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + 'static
{
    const ZERO: Self;
    const ONE: Self;

    fn from_f64(v: f64) -> Self;
    fn from_usize(n: usize) -> Self;
    fn exp(self) -> Self;
    fn ln(self) -> Self;
    fn is_finite(self) -> bool;
}

macro_rules! impl_scalar {
    ($($t:ty),*) => {
        $(
            impl Scalar for $t {
                const ZERO: Self = 0.0;
                const ONE: Self = 1.0;

                fn from_f64(v: f64) -> Self { v as $t }
                fn from_usize(n: usize) -> Self { n as $t }
                fn exp(self) -> Self { <$t>::exp(self) }
                fn ln(self) -> Self { <$t>::ln(self) }
                fn is_finite(self) -> bool { <$t>::is_finite(self) }
            }
        )*
    };
}

impl_scalar!(f32, f64);
