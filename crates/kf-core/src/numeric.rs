use crate::KfError;

/// Floating point type used throughout system
pub type Real = f64;

/// Absolute/relative tolerance pair.
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, KfError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(KfError::NonFinite { what, value: v })
    }
}

/// Accept finite values `>= 0`.
pub fn ensure_non_negative(v: Real, what: &'static str) -> Result<Real, KfError> {
    let v = ensure_finite(v, what)?;
    if v < 0.0 {
        return Err(KfError::Negative { what, value: v });
    }
    Ok(v)
}

/// Accept finite values `> 0`.
pub fn ensure_positive(v: Real, what: &'static str) -> Result<Real, KfError> {
    let v = ensure_finite(v, what)?;
    if v <= 0.0 {
        return Err(KfError::NonPositive { what, value: v });
    }
    Ok(v)
}

pub mod constants {
    /// Universal gas constant [J/(mol·K)].
    pub const GAS_CONSTANT: f64 = 8.314_462_618;

    /// Molar mass of water [kg/mol].
    pub const WATER_MOLAR_MASS: f64 = 0.018_015_28;

    /// Standard-state pressure [Pa].
    pub const STANDARD_PRESSURE: f64 = 1.0e5;

    /// Default temperature of a fresh chemical state [K].
    pub const DEFAULT_TEMPERATURE: f64 = 298.15;

    /// Default pressure of a fresh chemical state [Pa].
    pub const DEFAULT_PRESSURE: f64 = 1.0e5;
}
