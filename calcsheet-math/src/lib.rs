//! Numeric primitives for calcsheet documents.
//!
//! - [`complex`]: the complex kernel with its classification and sentinels
//! - [`unit`]: compact dimensional units shared by reference
//! - [`scalar`]: unit-aware real and complex scalars
//! - [`value`]: the `Real | Complex | Vector | Matrix` value algebra
//! - [`calculator`]: named functions and multi-argument entry points

pub mod calculator;
pub mod complex;
pub mod error;
pub mod math;
pub mod matrix;
pub mod scalar;
pub mod unit;
pub mod value;
pub mod vector;

pub use complex::Complex;
pub use error::{MathError, MathResult};
pub use scalar::{ComplexValue, RealValue, Scalar};
pub use unit::{Unit, UnitRef};
pub use value::{Operator, Value};
