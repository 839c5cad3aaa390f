//! Real vectors of unit-aware elements.

use std::fmt;

use crate::error::{MathError, MathResult};
use crate::scalar::RealValue;

/// A column of real values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Vector {
    items: Vec<RealValue>,
}

impl From<Vec<RealValue>> for Vector {
    fn from(items: Vec<RealValue>) -> Self {
        Self { items }
    }
}

impl Vector {
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn items(&self) -> &[RealValue] {
        &self.items
    }

    #[must_use]
    pub fn into_items(self) -> Vec<RealValue> {
        self.items
    }

    /// 1-based element access.
    pub fn get(&self, index: usize) -> MathResult<&RealValue> {
        index
            .checked_sub(1)
            .and_then(|i| self.items.get(i))
            .ok_or(MathError::IndexOutOfRange {
                index,
                len: self.items.len(),
            })
    }

    pub fn map(&self, f: impl Fn(&RealValue) -> MathResult<RealValue>) -> MathResult<Self> {
        self.items.iter().map(f).collect::<MathResult<Vec<_>>>().map(Self::from)
    }

    /// Element-wise combination of two equally long vectors.
    pub fn zip_with(
        &self,
        other: &Self,
        f: impl Fn(&RealValue, &RealValue) -> MathResult<RealValue>,
    ) -> MathResult<Self> {
        if self.len() != other.len() {
            return Err(MathError::DimensionMismatch(format!(
                "vectors of length {} and {}",
                self.len(),
                other.len()
            )));
        }
        self.items
            .iter()
            .zip(&other.items)
            .map(|(a, b)| f(a, b))
            .collect::<MathResult<Vec<_>>>()
            .map(Self::from)
    }

    /// Scalar product.
    pub fn dot(&self, other: &Self) -> MathResult<RealValue> {
        if self.len() != other.len() {
            return Err(MathError::DimensionMismatch(format!(
                "dot product of lengths {} and {}",
                self.len(),
                other.len()
            )));
        }
        let mut pairs = self.items.iter().zip(&other.items);
        let Some((a, b)) = pairs.next() else {
            return Ok(RealValue::ZERO);
        };
        pairs.try_fold(a.mul(b), |acc, (a, b)| acc.add(&a.mul(b)))
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, x) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{x}")?;
        }
        f.write_str("]")
    }
}
