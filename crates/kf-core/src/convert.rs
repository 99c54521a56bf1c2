//! Unit-string conversion.
//!
//! Every recognised unit maps to a [`Dimension`] plus an affine map onto the
//! canonical SI unit of that dimension: `si = value * scale + offset`. Two
//! units are convertible iff they share a dimension.
//!
//! Symbols are case-sensitive, so `"MPa"` is megapascal and `"mPa"` is not
//! recognised. Spelled-out names like `"Kelvin"` or `"BAR"` match in any case.
//! Ambiguous spellings (plain `psi`, plain `lb`) are rejected.

use std::fmt;
use thiserror::Error;

/// Physical dimension of a unit string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    /// Canonical: kelvin
    Temperature,
    /// Canonical: pascal
    Pressure,
    /// Canonical: mole
    Amount,
    /// Canonical: kilogram
    Mass,
    /// Canonical: cubic metre
    Volume,
    /// Canonical: mol/kg (molal)
    Molality,
    /// Canonical: second
    Time,
    /// Canonical: J/mol
    MolarEnergy,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Temperature => write!(f, "temperature"),
            Self::Pressure => write!(f, "pressure"),
            Self::Amount => write!(f, "amount"),
            Self::Mass => write!(f, "mass"),
            Self::Volume => write!(f, "volume"),
            Self::Molality => write!(f, "molality"),
            Self::Time => write!(f, "time"),
            Self::MolarEnergy => write!(f, "molar energy"),
        }
    }
}

/// Error in unit parsing or conversion.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnitError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Unknown unit '{unit}'")]
    UnknownUnit { unit: String },

    #[error("Ambiguous unit '{unit}': {reason}")]
    AmbiguousUnit { unit: String, reason: String },

    #[error("Cannot convert '{from}' ({from_dim}) to '{to}' ({to_dim})")]
    Incompatible {
        from: String,
        from_dim: Dimension,
        to: String,
        to_dim: Dimension,
    },
}

/// Resolved unit: dimension plus affine map to SI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitDef {
    pub dimension: Dimension,
    pub scale: f64,
    pub offset: f64,
}

impl UnitDef {
    const fn linear(dimension: Dimension, scale: f64) -> Self {
        Self {
            dimension,
            scale,
            offset: 0.0,
        }
    }

    const fn affine(dimension: Dimension, scale: f64, offset: f64) -> Self {
        Self {
            dimension,
            scale,
            offset,
        }
    }

    pub fn to_si(&self, value: f64) -> f64 {
        value * self.scale + self.offset
    }

    pub fn from_si(&self, si: f64) -> f64 {
        (si - self.offset) / self.scale
    }
}

/// Resolve a unit string.
///
/// Symbols are matched case-sensitively so SI prefixes keep their meaning;
/// spelled-out words fall back to a case-insensitive match.
pub fn lookup(unit: &str) -> Result<UnitDef, UnitError> {
    let trimmed = unit.trim();
    if let Some(def) = symbol(trimmed) {
        return Ok(def);
    }
    match trimmed.to_lowercase().as_str() {
        "psi" => Err(UnitError::AmbiguousUnit {
            unit: unit.to_string(),
            reason: "Use 'psia' for absolute pressure".to_string(),
        }),
        "lb" => Err(UnitError::AmbiguousUnit {
            unit: unit.to_string(),
            reason: "Use 'lbm' for mass".to_string(),
        }),
        key => word(key).ok_or_else(|| UnitError::UnknownUnit {
            unit: unit.to_string(),
        }),
    }
}

fn symbol(unit: &str) -> Option<UnitDef> {
    use Dimension::*;

    let def = match unit {
        "K" => UnitDef::linear(Temperature, 1.0),
        "C" | "°C" | "degC" => UnitDef::affine(Temperature, 1.0, 273.15),
        "F" | "°F" | "degF" => UnitDef::affine(Temperature, 5.0 / 9.0, 459.67 * 5.0 / 9.0),
        "R" | "°R" => UnitDef::linear(Temperature, 5.0 / 9.0),

        "Pa" => UnitDef::linear(Pressure, 1.0),
        "kPa" => UnitDef::linear(Pressure, 1e3),
        "MPa" => UnitDef::linear(Pressure, 1e6),
        "GPa" => UnitDef::linear(Pressure, 1e9),
        "mbar" => UnitDef::linear(Pressure, 100.0),
        "kbar" => UnitDef::linear(Pressure, 1e8),

        "mol" => UnitDef::linear(Amount, 1.0),
        "kmol" => UnitDef::linear(Amount, 1e3),
        "mmol" => UnitDef::linear(Amount, 1e-3),
        "umol" | "µmol" => UnitDef::linear(Amount, 1e-6),
        "nmol" => UnitDef::linear(Amount, 1e-9),

        "kg" => UnitDef::linear(Mass, 1.0),
        "g" => UnitDef::linear(Mass, 1e-3),
        "mg" => UnitDef::linear(Mass, 1e-6),
        "ug" | "µg" => UnitDef::linear(Mass, 1e-9),
        "t" => UnitDef::linear(Mass, 1e3),

        "m3" | "m^3" | "m³" => UnitDef::linear(Volume, 1.0),
        "dm3" | "dm^3" | "L" | "l" => UnitDef::linear(Volume, 1e-3),
        "cm3" | "cm^3" | "mL" | "ml" => UnitDef::linear(Volume, 1e-6),

        "mol/kg" => UnitDef::linear(Molality, 1.0),
        "mmolal" | "mmol/kg" => UnitDef::linear(Molality, 1e-3),
        "umolal" | "µmolal" | "umol/kg" => UnitDef::linear(Molality, 1e-6),

        "s" => UnitDef::linear(Time, 1.0),
        "ms" => UnitDef::linear(Time, 1e-3),
        "min" => UnitDef::linear(Time, 60.0),
        "h" => UnitDef::linear(Time, 3_600.0),
        "d" => UnitDef::linear(Time, 86_400.0),

        "J/mol" => UnitDef::linear(MolarEnergy, 1.0),
        "kJ/mol" => UnitDef::linear(MolarEnergy, 1e3),
        "cal/mol" => UnitDef::linear(MolarEnergy, 4.184),
        "kcal/mol" => UnitDef::linear(MolarEnergy, 4_184.0),

        _ => return None,
    };
    Some(def)
}

/// Unprefixed names, already lowercased.
fn word(unit: &str) -> Option<UnitDef> {
    use Dimension::*;

    let def = match unit {
        "kelvin" => UnitDef::linear(Temperature, 1.0),
        "celsius" => UnitDef::affine(Temperature, 1.0, 273.15),
        "fahrenheit" => UnitDef::affine(Temperature, 5.0 / 9.0, 459.67 * 5.0 / 9.0),
        "rankine" => UnitDef::linear(Temperature, 5.0 / 9.0),

        "pascal" => UnitDef::linear(Pressure, 1.0),
        "bar" => UnitDef::linear(Pressure, 1e5),
        "millibar" => UnitDef::linear(Pressure, 100.0),
        "atm" => UnitDef::linear(Pressure, 101_325.0),
        "torr" | "mmhg" => UnitDef::linear(Pressure, 101_325.0 / 760.0),
        "psia" => UnitDef::linear(Pressure, 6_894.757_293),

        "mole" | "moles" => UnitDef::linear(Amount, 1.0),

        "kilogram" => UnitDef::linear(Mass, 1.0),
        "gram" => UnitDef::linear(Mass, 1e-3),
        "tonne" => UnitDef::linear(Mass, 1e3),
        "lbm" => UnitDef::linear(Mass, 0.453_592_37),

        "liter" | "litre" => UnitDef::linear(Volume, 1e-3),
        "cc" => UnitDef::linear(Volume, 1e-6),

        "molal" => UnitDef::linear(Molality, 1.0),

        "sec" | "second" | "seconds" => UnitDef::linear(Time, 1.0),
        "minute" | "minutes" => UnitDef::linear(Time, 60.0),
        "hr" | "hour" | "hours" => UnitDef::linear(Time, 3_600.0),
        "day" | "days" => UnitDef::linear(Time, 86_400.0),
        "yr" | "year" | "years" => UnitDef::linear(Time, 365.25 * 86_400.0),

        _ => return None,
    };
    Some(def)
}

/// Dimension of a unit string.
pub fn dimension(unit: &str) -> Result<Dimension, UnitError> {
    lookup(unit).map(|def| def.dimension)
}

/// Whether `from` can be converted to `to`.
///
/// Unknown or ambiguous units are never convertible.
pub fn convertible(from: &str, to: &str) -> bool {
    match (lookup(from), lookup(to)) {
        (Ok(a), Ok(b)) => a.dimension == b.dimension,
        _ => false,
    }
}

/// Convert `value` expressed in `from` into `to`.
pub fn convert(value: f64, from: &str, to: &str) -> Result<f64, UnitError> {
    let src = lookup(from)?;
    let dst = lookup(to)?;
    if src.dimension != dst.dimension {
        return Err(UnitError::Incompatible {
            from: from.to_string(),
            from_dim: src.dimension,
            to: to.to_string(),
            to_dim: dst.dimension,
        });
    }
    Ok(dst.from_si(src.to_si(value)))
}

/// Convert `value` in `unit` into the canonical SI unit of `expected`.
pub fn to_si(value: f64, unit: &str, expected: Dimension) -> Result<f64, UnitError> {
    let def = lookup(unit)?;
    if def.dimension != expected {
        return Err(UnitError::Incompatible {
            from: unit.to_string(),
            from_dim: def.dimension,
            to: "SI".to_string(),
            to_dim: expected,
        });
    }
    Ok(def.to_si(value))
}

/// Split a value+unit string into (numeric_value, unit_string).
///
/// Examples:
/// - "25C" -> (25.0, "C")
/// - "1.5 mmolal" -> (1.5, "mmolal")
/// - "300" -> (300.0, "")
pub fn split_value_and_unit(input: &str) -> Result<(f64, String), UnitError> {
    let trimmed = input.trim();

    let split_idx = trimmed
        .char_indices()
        .find(|&(i, c)| {
            let exponent = (c == 'e' || c == 'E')
                && trimmed[i + 1..]
                    .chars()
                    .next()
                    .is_some_and(|n| n.is_ascii_digit() || n == '-' || n == '+');
            !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+' || exponent)
        })
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());

    let (num_part, unit_part) = trimmed.split_at(split_idx);
    let value: f64 = num_part.trim().parse().map_err(|_| {
        UnitError::ParseError(format!("Could not parse numeric value from '{}'", input))
    })?;

    Ok((value, unit_part.trim().to_string()))
}
