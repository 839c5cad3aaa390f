//! Dense real matrices.

use std::fmt;

use crate::error::{MathError, MathResult};
use crate::scalar::RealValue;
use crate::vector::Vector;

/// Row-major matrix of real values.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    items: Vec<RealValue>,
}

impl Matrix {
    /// Build from rows; every row must have the same length.
    pub fn from_rows(rows: Vec<Vec<RealValue>>) -> MathResult<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != cols) {
            return Err(MathError::DimensionMismatch("matrix rows differ in length".into()));
        }
        let n = rows.len();
        Ok(Self {
            rows: n,
            cols,
            items: rows.into_iter().flatten().collect(),
        })
    }

    /// A vector as a one-column matrix.
    #[must_use]
    pub fn column(v: &Vector) -> Self {
        Self {
            rows: v.len(),
            cols: 1,
            items: v.items().to_vec(),
        }
    }

    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    #[must_use]
    pub fn items(&self) -> &[RealValue] {
        &self.items
    }

    /// 1-based element access.
    pub fn get(&self, row: usize, col: usize) -> MathResult<&RealValue> {
        if row == 0 || row > self.rows {
            return Err(MathError::IndexOutOfRange { index: row, len: self.rows });
        }
        if col == 0 || col > self.cols {
            return Err(MathError::IndexOutOfRange { index: col, len: self.cols });
        }
        Ok(&self.items[(row - 1) * self.cols + col - 1])
    }

    /// Flatten into a vector, row by row.
    #[must_use]
    pub fn to_vector(&self) -> Vector {
        self.items.clone().into()
    }

    pub fn map(&self, f: impl Fn(&RealValue) -> MathResult<RealValue>) -> MathResult<Self> {
        Ok(Self {
            rows: self.rows,
            cols: self.cols,
            items: self.items.iter().map(f).collect::<MathResult<_>>()?,
        })
    }

    pub fn zip_with(
        &self,
        other: &Self,
        f: impl Fn(&RealValue, &RealValue) -> MathResult<RealValue>,
    ) -> MathResult<Self> {
        if self.rows != other.rows || self.cols != other.cols {
            return Err(MathError::DimensionMismatch(format!(
                "{}x{} and {}x{} matrices",
                self.rows, self.cols, other.rows, other.cols
            )));
        }
        Ok(Self {
            rows: self.rows,
            cols: self.cols,
            items: self
                .items
                .iter()
                .zip(&other.items)
                .map(|(a, b)| f(a, b))
                .collect::<MathResult<_>>()?,
        })
    }

    /// Matrix product.
    pub fn product(&self, other: &Self) -> MathResult<Self> {
        if self.cols != other.rows {
            return Err(MathError::DimensionMismatch(format!(
                "cannot multiply {}x{} by {}x{}",
                self.rows, self.cols, other.rows, other.cols
            )));
        }
        let mut items = Vec::with_capacity(self.rows * other.cols);
        for i in 0..self.rows {
            for j in 0..other.cols {
                let mut acc: Option<RealValue> = None;
                for k in 0..self.cols {
                    let term = self.items[i * self.cols + k].mul(&other.items[k * other.cols + j]);
                    acc = Some(match acc {
                        None => term,
                        Some(a) => a.add(&term)?,
                    });
                }
                items.push(acc.unwrap_or(RealValue::ZERO));
            }
        }
        Ok(Self {
            rows: self.rows,
            cols: other.cols,
            items,
        })
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for r in 0..self.rows {
            if r > 0 {
                f.write_str(" | ")?;
            }
            for c in 0..self.cols {
                if c > 0 {
                    f.write_str("; ")?;
                }
                write!(f, "{}", self.items[r * self.cols + c])?;
            }
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(rows: &[&[f64]]) -> Matrix {
        Matrix::from_rows(
            rows.iter()
                .map(|r| r.iter().map(|&x| RealValue::new(x)).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn product_of_matrices() {
        let a = m(&[&[1.0, 2.0], &[3.0, 4.0]]);
        let b = m(&[&[5.0], &[6.0]]);
        let c = a.product(&b).unwrap();
        assert_eq!((c.rows(), c.cols()), (2, 1));
        assert_eq!(c.get(1, 1).unwrap().value, 17.0);
        assert_eq!(c.get(2, 1).unwrap().value, 39.0);
        assert!(b.product(&b).is_err());
    }

    #[test]
    fn ragged_rows_rejected() {
        let rows = vec![vec![RealValue::ONE], vec![RealValue::ONE, RealValue::ZERO]];
        assert!(Matrix::from_rows(rows).is_err());
    }

    #[test]
    fn display() {
        assert_eq!(m(&[&[1.0, 2.0], &[3.0, 4.0]]).to_string(), "[1; 2 | 3; 4]");
    }
}
