//! Operands flowing through a CGP graph: scalars or shaped arrays.

use serde::{Deserialize, Serialize};

/// Dense row-major array with an explicit shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Array {
    shape: Vec<usize>,
    data: Vec<f64>,
}

impl Array {
    /// Create an array, checking that `data` fills `shape`.
    pub fn new(shape: Vec<usize>, data: Vec<f64>) -> Result<Self, OperandError> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(OperandError::ShapeMismatch {
                shape,
                len: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// One-dimensional array.
    pub fn from_vec(data: Vec<f64>) -> Self {
        Self {
            shape: vec![data.len()],
            data,
        }
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[inline]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            shape: self.shape.clone(),
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }
}

/// Per-axis minimum of two shapes over their common leading axes.
pub fn minimum_shape(a: &[usize], b: &[usize]) -> Vec<usize> {
    a.iter().zip(b).map(|(&x, &y)| x.min(y)).collect()
}

/// A value produced or consumed by a graph node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    Scalar(f64),
    Array(Array),
}

impl Operand {
    /// Apply `f` to every element.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Operand {
        match self {
            Operand::Scalar(v) => Operand::Scalar(f(*v)),
            Operand::Array(a) => Operand::Array(a.map(f)),
        }
    }

    /// Combine two operands element-wise.
    ///
    /// Scalars broadcast against arrays. Two arrays are first cut down to
    /// their minimum shape: each keeps the leading elements of its row-major
    /// buffer, so `[a, b, c]` against `[d, e]` combines `a`/`d` and `b`/`e`.
    pub fn zip_with(&self, other: &Operand, f: impl Fn(f64, f64) -> f64) -> Operand {
        match (self, other) {
            (Operand::Scalar(x), Operand::Scalar(y)) => Operand::Scalar(f(*x, *y)),
            (Operand::Scalar(x), Operand::Array(b)) => Operand::Array(b.map(|y| f(*x, y))),
            (Operand::Array(a), Operand::Scalar(y)) => Operand::Array(a.map(|x| f(x, *y))),
            (Operand::Array(a), Operand::Array(b)) => {
                let shape = if a.shape == b.shape {
                    a.shape.clone()
                } else {
                    minimum_shape(&a.shape, &b.shape)
                };
                let n = shape.iter().product::<usize>().min(a.len()).min(b.len());
                let data = a.data[..n]
                    .iter()
                    .zip(&b.data[..n])
                    .map(|(&x, &y)| f(x, y))
                    .collect();
                // Empty operands collapse to a flat empty array.
                let shape = if n == shape.iter().product::<usize>() {
                    shape
                } else {
                    vec![n]
                };
                Operand::Array(Array { shape, data })
            }
        }
    }

    /// Reduce to a single number: the scalar itself or the array mean.
    pub fn scalar_value(&self) -> f64 {
        match self {
            Operand::Scalar(v) => *v,
            Operand::Array(a) if a.is_empty() => 0.0,
            Operand::Array(a) => a.data.iter().sum::<f64>() / a.len() as f64,
        }
    }

    /// Shape of the operand; scalars have rank 0.
    pub fn shape(&self) -> &[usize] {
        match self {
            Operand::Scalar(_) => &[],
            Operand::Array(a) => &a.shape,
        }
    }

    /// Raw bit patterns of every element, for exact comparisons.
    pub fn to_bits(&self) -> Vec<u64> {
        match self {
            Operand::Scalar(v) => vec![v.to_bits()],
            Operand::Array(a) => a.data.iter().map(|v| v.to_bits()).collect(),
        }
    }
}

impl From<f64> for Operand {
    fn from(value: f64) -> Self {
        Operand::Scalar(value)
    }
}

impl From<Vec<f64>> for Operand {
    fn from(data: Vec<f64>) -> Self {
        Operand::Array(Array::from_vec(data))
    }
}

impl From<Array> for Operand {
    fn from(array: Array) -> Self {
        Operand::Array(array)
    }
}

/// Operand construction errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OperandError {
    #[error("Shape {shape:?} does not hold {len} elements")]
    ShapeMismatch { shape: Vec<usize>, len: usize },
}
