//! The primitive function catalog.
//!
//! Genomes store function slots positionally, so the order of [`FUNCTIONS`]
//! is part of the genome format. Every function takes `(x, y, p)` and maps
//! non-finite results to `0.0`.

use std::f64::consts::{E, PI, SQRT_2};

use serde::{Deserialize, Serialize};

use super::Operand;

/// A primitive operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Function {
    /// `(x + y) / 2`
    Add,
    /// `|x - y| / 2`
    AMinus,
    /// `x * y`
    Mult,
    /// `x * p`
    CMult,
    /// `1 / x`
    Inv,
    /// `|x|`
    Abs,
    /// `sqrt(|x|)`
    Sqrt,
    /// `|x| ^ (p + 1)`
    CPow,
    /// `|x| ^ |y|`
    YPow,
    /// `(e^x - 1) / (e - 1)`
    ExpX,
    /// `sin(x)`
    SinX,
    /// `sqrt(x^2 + y^2) / sqrt(2)`
    SqrtXY,
    /// `acos(x) / pi`, with `x` clamped to `[-1, 1]`
    ACos,
}

/// The catalog, indexed by function slot.
pub const FUNCTIONS: [Function; 13] = [
    Function::Add,
    Function::AMinus,
    Function::Mult,
    Function::CMult,
    Function::Inv,
    Function::Abs,
    Function::Sqrt,
    Function::CPow,
    Function::YPow,
    Function::ExpX,
    Function::SinX,
    Function::SqrtXY,
    Function::ACos,
];

/// Replace NaN and infinities with zero.
#[inline]
fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

impl Function {
    /// Number of functions in the catalog.
    pub const COUNT: usize = FUNCTIONS.len();

    /// Look up a function by slot.
    #[inline]
    pub fn from_slot(slot: usize) -> Option<Function> {
        FUNCTIONS.get(slot).copied()
    }

    /// Slot of this function in the catalog.
    #[inline]
    pub fn slot(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Function::Add => "add",
            Function::AMinus => "aminus",
            Function::Mult => "mult",
            Function::CMult => "cmult",
            Function::Inv => "inv",
            Function::Abs => "abs",
            Function::Sqrt => "sqrt",
            Function::CPow => "cpow",
            Function::YPow => "ypow",
            Function::ExpX => "expx",
            Function::SinX => "sinx",
            Function::SqrtXY => "sqrtxy",
            Function::ACos => "acos",
        }
    }

    /// Number of operands the function reads (1 means `y` is ignored).
    pub fn arity(self) -> usize {
        match self {
            Function::Add
            | Function::AMinus
            | Function::Mult
            | Function::YPow
            | Function::SqrtXY => 2,
            _ => 1,
        }
    }

    /// Whether the scalar parameter affects the result.
    pub fn uses_parameter(self) -> bool {
        matches!(self, Function::CMult | Function::CPow)
    }

    /// Apply the function.
    pub fn apply(self, x: &Operand, y: &Operand, p: f64) -> Operand {
        match self {
            Function::Add => x.zip_with(y, |a, b| finite_or_zero((a + b) / 2.0)),
            Function::AMinus => x.zip_with(y, |a, b| finite_or_zero((a - b).abs() / 2.0)),
            Function::Mult => x.zip_with(y, |a, b| finite_or_zero(a * b)),
            Function::CMult => x.map(|a| finite_or_zero(a * p)),
            Function::Inv => x.map(|a| finite_or_zero(1.0 / a)),
            Function::Abs => x.map(|a| finite_or_zero(a.abs())),
            Function::Sqrt => x.map(|a| finite_or_zero(a.abs().sqrt())),
            Function::CPow => x.map(|a| finite_or_zero(a.abs().powf(p + 1.0))),
            Function::YPow => x.zip_with(y, |a, b| finite_or_zero(a.abs().powf(b.abs()))),
            Function::ExpX => x.map(|a| finite_or_zero((a.exp() - 1.0) / (E - 1.0))),
            Function::SinX => x.map(|a| finite_or_zero(a.sin())),
            Function::SqrtXY => {
                x.zip_with(y, |a, b| finite_or_zero((a * a + b * b).sqrt() / SQRT_2))
            }
            Function::ACos => x.map(|a| finite_or_zero(a.clamp(-1.0, 1.0).acos() / PI)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(f: Function, x: f64, y: f64, p: f64) -> f64 {
        f.apply(&Operand::Scalar(x), &Operand::Scalar(y), p)
            .scalar_value()
    }

    #[test]
    fn test_slots_are_positional() {
        for (slot, function) in FUNCTIONS.iter().enumerate() {
            assert_eq!(function.slot(), slot);
            assert_eq!(Function::from_slot(slot), Some(*function));
        }
        assert_eq!(Function::from_slot(Function::COUNT), None);
    }

    #[test]
    fn test_inv_zero_is_zero() {
        assert_eq!(scalar(Function::Inv, 0.0, 0.0, 0.0), 0.0);
        assert_eq!(scalar(Function::Inv, -0.0, 0.0, 0.0), 0.0);
        assert_eq!(scalar(Function::Inv, 4.0, 0.0, 0.0), 0.25);

        let array = Function::Inv.apply(&Operand::from(vec![0.0, 2.0]), &Operand::Scalar(0.0), 0.0);
        assert_eq!(array, Operand::from(vec![0.0, 0.5]));
    }

    #[test]
    fn test_overflow_is_zero() {
        assert_eq!(scalar(Function::ExpX, 1000.0, 0.0, 0.0), 0.0);
        assert_eq!(scalar(Function::YPow, 1e10, 1e10, 0.0), 0.0);
        assert_eq!(scalar(Function::Mult, f64::MAX, 2.0, 0.0), 0.0);
    }

    #[test]
    fn test_values() {
        assert_eq!(scalar(Function::Add, 1.0, 0.5, 0.0), 0.75);
        assert_eq!(scalar(Function::AMinus, -1.0, 1.0, 0.0), 1.0);
        assert_eq!(scalar(Function::CMult, 0.5, 9.0, -0.5), -0.25);
        assert_eq!(scalar(Function::Sqrt, -0.25, 0.0, 0.0), 0.5);
        assert_eq!(scalar(Function::CPow, -0.5, 0.0, 1.0), 0.25);
        assert!((scalar(Function::ExpX, 1.0, 0.0, 0.0) - 1.0).abs() < 1e-12);
        assert!((scalar(Function::ACos, -3.0, 0.0, 0.0) - 1.0).abs() < 1e-12);
        assert!((scalar(Function::SqrtXY, 1.0, 1.0, 0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_parameter_ignored_by_plain_functions() {
        for function in FUNCTIONS {
            if function.uses_parameter() {
                continue;
            }
            assert_eq!(
                scalar(function, 0.3, -0.7, 0.1).to_bits(),
                scalar(function, 0.3, -0.7, 0.9).to_bits(),
                "{}",
                function.name()
            );
        }
    }

    #[test]
    fn test_unary_functions_ignore_y() {
        for function in FUNCTIONS.into_iter().filter(|f| f.arity() == 1) {
            assert_eq!(
                scalar(function, 0.4, 0.1, 0.5).to_bits(),
                scalar(function, 0.4, -0.8, 0.5).to_bits(),
                "{}",
                function.name()
            );
        }
    }
}
