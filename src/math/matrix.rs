use rand::Rng;
use serde::{Serialize, Deserialize};
use std::ops::{Index, IndexMut};

use crate::error::{NetworkError, Result};
use crate::math::scalar::Scalar;

/// Dense row-major matrix. `data.len() == rows * cols` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMatrix<T>", bound(deserialize = "T: Scalar + Deserialize<'de>"))]
pub struct Matrix<T = f64> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

/// Unchecked wire form; deserialized matrices go through `Matrix::from_vec`.
#[derive(Deserialize)]
struct RawMatrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Scalar> TryFrom<RawMatrix<T>> for Matrix<T> {
    type Error = NetworkError;

    fn try_from(raw: RawMatrix<T>) -> Result<Matrix<T>> {
        Matrix::from_vec(raw.rows, raw.cols, raw.data)
    }
}

/// `rows * cols`.
///
/// # Panics
///
/// When the product overflows `usize`, the same way `Vec` panics on a
/// capacity overflow.
fn element_count(rows: usize, cols: usize) -> usize {
    match rows.checked_mul(cols) {
        Some(count) => count,
        None => panic!("a {rows}x{cols} matrix overflows usize"),
    }
}

impl<T> Default for Matrix<T> {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}

impl<T: Scalar> Matrix<T> {
    pub fn zeros(rows: usize, cols: usize) -> Matrix<T> {
        Matrix::filled(rows, cols, T::ZERO)
    }

    pub fn filled(rows: usize, cols: usize, value: T) -> Matrix<T> {
        Matrix {
            rows,
            cols,
            data: vec![value; element_count(rows, cols)]
        }
    }

    /// Builds a matrix from a flat row-major buffer.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Result<Matrix<T>> {
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(NetworkError::ShapeMismatch {
                op: "from_vec",
                left: (rows, cols),
                right: (1, data.len()),
            });
        }
        Ok(Matrix { rows, cols, data })
    }

    /// A 1×n matrix holding `values`.
    pub fn row(values: Vec<T>) -> Matrix<T> {
        Matrix {
            rows: if values.is_empty() { 0 } else { 1 },
            cols: values.len(),
            data: values
        }
    }

    /// Samples every element from U[low, high).
    pub fn random_uniform<R: Rng>(rows: usize, cols: usize, low: f64, high: f64, rng: &mut R) -> Matrix<T> {
        let data = (0..element_count(rows, cols))
            .map(|_| T::from_f64(rng.gen_range(low..high)))
            .collect();
        Matrix { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        let idx = self.offset(row, col)?;
        Ok(self.data[idx])
    }

    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        let idx = self.offset(row, col)?;
        self.data[idx] = value;
        Ok(())
    }

    pub fn get_flat(&self, index: usize) -> Result<T> {
        self.data.get(index).copied().ok_or(NetworkError::IndexOutOfRange {
            what: "flat",
            index,
            len: self.data.len(),
        })
    }

    pub fn set_flat(&mut self, index: usize, value: T) -> Result<()> {
        let len = self.data.len();
        let slot = self.data.get_mut(index).ok_or(NetworkError::IndexOutOfRange {
            what: "flat",
            index,
            len,
        })?;
        *slot = value;
        Ok(())
    }

    fn offset(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.rows {
            return Err(NetworkError::IndexOutOfRange { what: "row", index: row, len: self.rows });
        }
        if col >= self.cols {
            return Err(NetworkError::IndexOutOfRange { what: "column", index: col, len: self.cols });
        }
        Ok(row * self.cols + col)
    }

    fn check_same_shape(&self, rhs: &Matrix<T>, op: &'static str) -> Result<()> {
        if self.shape() != rhs.shape() {
            return Err(NetworkError::ShapeMismatch {
                op,
                left: self.shape(),
                right: rhs.shape(),
            });
        }
        Ok(())
    }

    /// Matrix product `self × rhs`; requires `self.cols == rhs.rows`.
    pub fn multiply(&self, rhs: &Matrix<T>) -> Result<Matrix<T>> {
        if self.cols != rhs.rows {
            return Err(NetworkError::ShapeMismatch {
                op: "multiply",
                left: self.shape(),
                right: rhs.shape(),
            });
        }

        let mut res = Matrix::zeros(self.rows, rhs.cols);

        for i in 0..res.rows {
            for j in 0..res.cols {
                let mut sum = T::ZERO;

                for k in 0..self.cols {
                    sum += self.data[i * self.cols + k] * rhs.data[k * rhs.cols + j];
                }

                res.data[i * res.cols + j] = sum;
            }
        }

        Ok(res)
    }

    pub fn scale(&self, factor: T) -> Matrix<T> {
        self.map(|x| x * factor)
    }

    pub fn add(&self, rhs: &Matrix<T>) -> Result<Matrix<T>> {
        self.zip_with(rhs, "add", |a, b| a + b)
    }

    pub fn sub(&self, rhs: &Matrix<T>) -> Result<Matrix<T>> {
        self.zip_with(rhs, "subtract", |a, b| a - b)
    }

    /// Element-wise product of two same-shape matrices.
    pub fn hadamard(&self, rhs: &Matrix<T>) -> Result<Matrix<T>> {
        self.zip_with(rhs, "hadamard", |a, b| a * b)
    }

    /// In-place `self += rhs`, used for gradient accumulation.
    pub fn add_assign(&mut self, rhs: &Matrix<T>) -> Result<()> {
        self.check_same_shape(rhs, "add_assign")?;
        for (a, b) in self.data.iter_mut().zip(rhs.data.iter()) {
            *a += *b;
        }
        Ok(())
    }

    pub fn transpose(&self) -> Matrix<T> {
        let mut res = Matrix::zeros(self.cols, self.rows);

        for i in 0..res.rows {
            for j in 0..res.cols {
                res.data[i * res.cols + j] = self.data[j * self.cols + i];
            }
        }

        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix<T>
    where
        F: Fn(T) -> T,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&x| functor(x)).collect()
        }
    }

    /// Index of the largest element (first one on ties); `None` when empty.
    pub fn argmax(&self) -> Option<usize> {
        let mut best: Option<(usize, T)> = None;
        for (i, &v) in self.data.iter().enumerate() {
            match best {
                Some((_, b)) if v <= b => {}
                _ => best = Some((i, v)),
            }
        }
        best.map(|(i, _)| i)
    }

    fn zip_with<F>(&self, rhs: &Matrix<T>, op: &'static str, f: F) -> Result<Matrix<T>>
    where
        F: Fn(T, T) -> T,
    {
        self.check_same_shape(rhs, op)?;
        Ok(Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().zip(rhs.data.iter()).map(|(&a, &b)| f(a, b)).collect()
        })
    }
}

impl<T> Index<usize> for Matrix<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.data[index]
    }
}

impl<T> IndexMut<usize> for Matrix<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.data[index]
    }
}

impl<T> Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    fn index(&self, (row, col): (usize, usize)) -> &T {
        assert!(row < self.rows && col < self.cols, "matrix index ({row}, {col}) out of range");
        &self.data[row * self.cols + col]
    }
}

impl<T> IndexMut<(usize, usize)> for Matrix<T> {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        assert!(row < self.rows && col < self.cols, "matrix index ({row}, {col}) out of range");
        &mut self.data[row * self.cols + col]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn m(rows: usize, cols: usize, data: &[f64]) -> Matrix {
        Matrix::from_vec(rows, cols, data.to_vec()).unwrap()
    }

    #[test]
    fn multiply_2x3_by_3x2() {
        let a = m(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let b = m(3, 2, &[7.0, 8.0, 9.0, 10.0, 11.0, 12.0]);
        let c = a.multiply(&b).unwrap();
        assert_eq!(c.shape(), (2, 2));
        assert_eq!(c.as_slice(), &[58.0, 64.0, 139.0, 154.0]);
    }

    #[test]
    fn multiply_rejects_incompatible_shapes() {
        let a = m(2, 3, &[0.0; 6]);
        let err = a.multiply(&a.clone()).unwrap_err();
        assert!(matches!(err, NetworkError::ShapeMismatch { op: "multiply", left: (2, 3), right: (2, 3) }));
    }

    #[test]
    fn elementwise_ops_require_equal_shapes() {
        let a = m(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let b = m(1, 4, &[1.0, 2.0, 3.0, 4.0]);
        assert!(a.add(&b).is_err());
        assert!(a.sub(&b).is_err());
        assert!(a.hadamard(&b).is_err());
        assert!(a.clone().add_assign(&b).is_err());

        assert_eq!(a.add(&a).unwrap().as_slice(), &[2.0, 4.0, 6.0, 8.0]);
        assert_eq!(a.sub(&a).unwrap(), Matrix::zeros(2, 2));
        assert_eq!(a.hadamard(&a).unwrap().as_slice(), &[1.0, 4.0, 9.0, 16.0]);
        assert_eq!(a.scale(0.5).as_slice(), &[0.5, 1.0, 1.5, 2.0]);
    }

    #[test]
    fn transpose_twice_is_identity() {
        let mut rng = StdRng::seed_from_u64(7);
        for (r, c) in [(1, 1), (1, 5), (3, 2), (4, 7)] {
            let a: Matrix = Matrix::random_uniform(r, c, -3.0, 3.0, &mut rng);
            let t = a.transpose();
            assert_eq!(t.shape(), (c, r));
            assert_eq!(t.transpose(), a);
        }
    }

    #[test]
    fn checked_access_reports_out_of_range() {
        let mut a = m(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(a.get(1, 2).unwrap(), 6.0);
        assert_eq!(a[(1, 0)], 4.0);
        assert!(matches!(a.get(2, 0), Err(NetworkError::IndexOutOfRange { what: "row", .. })));
        assert!(matches!(a.get(0, 3), Err(NetworkError::IndexOutOfRange { what: "column", .. })));
        assert!(a.get_flat(6).is_err());
        a.set_flat(0, 9.0).unwrap();
        a.set(0, 1, 8.0).unwrap();
        assert_eq!(&a.as_slice()[..2], &[9.0, 8.0]);
    }

    #[test]
    fn from_vec_checks_length_and_equality_checks_shape() {
        assert!(Matrix::from_vec(2, 2, vec![1.0f64; 3]).is_err());
        let a = m(1, 4, &[1.0, 2.0, 3.0, 4.0]);
        let b = m(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        assert_ne!(a, b);
    }

    #[test]
    fn from_vec_rejects_overflowing_dimensions() {
        let err = Matrix::from_vec(usize::MAX / 2 + 1, 2, Vec::<f64>::new()).unwrap_err();
        assert!(matches!(err, NetworkError::ShapeMismatch { op: "from_vec", right: (1, 0), .. }));
    }

    #[test]
    #[should_panic(expected = "overflows usize")]
    fn zeros_panics_instead_of_wrapping() {
        let _ = Matrix::<f64>::zeros(usize::MAX, 2);
    }

    #[test]
    fn deserialize_checks_length() {
        let bad = serde_json::from_str::<Matrix>(r#"{"rows":2,"cols":2,"data":[1.0]}"#);
        assert!(bad.is_err());

        let good: Matrix = serde_json::from_str(r#"{"rows":1,"cols":2,"data":[1.0,2.0]}"#).unwrap();
        assert_eq!(good, m(1, 2, &[1.0, 2.0]));
        let back: Matrix = serde_json::from_str(&serde_json::to_string(&good).unwrap()).unwrap();
        assert_eq!(back, good);
    }

    #[test]
    fn argmax_picks_first_largest() {
        assert_eq!(m(1, 4, &[0.1, 0.7, 0.7, 0.2]).argmax(), Some(1));
        assert_eq!(Matrix::<f64>::default().argmax(), None);
    }
}
