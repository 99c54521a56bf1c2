//! Chemical formula parsing.
//!
//! Accepted forms: `H2O`, `NaCl`, `Ca(HCO3)2`, `CaCO3`, `Na+`, `Cl-`,
//! `Ca++`, `Ca+2`, `CO3--`, `CO3-2`, optionally followed by a lowercase phase
//! tag such as `(aq)`, `(l)`, `(g)` or `(s)` which is ignored.

use crate::error::{ChemError, ChemResult};

/// Element counts and charge of a formula.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFormula {
    /// Element symbols with their stoichiometric counts, in order of first appearance.
    pub elements: Vec<(String, f64)>,
    /// Electric charge in units of the elementary charge.
    pub charge: f64,
}

impl ParsedFormula {
    pub fn count(&self, symbol: &str) -> f64 {
        self.elements
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, c)| *c)
            .unwrap_or(0.0)
    }
}

/// Parse a chemical formula into element counts and charge.
pub fn parse_formula(formula: &str) -> ChemResult<ParsedFormula> {
    let fail = |reason: &str| ChemError::Formula {
        formula: formula.to_string(),
        reason: reason.to_string(),
    };

    let body = strip_phase_tag(formula.trim());
    if body.is_empty() {
        return Err(fail("empty formula"));
    }

    let (body, charge) = match body.find(['+', '-']) {
        Some(idx) => (&body[..idx], parse_charge(&body[idx..]).ok_or_else(|| fail("malformed charge"))?),
        None => (body, 0.0),
    };

    let chars: Vec<char> = body.chars().collect();
    let mut pos = 0;
    let elements = parse_group(&chars, &mut pos, None).map_err(|r| fail(r))?;
    if pos != chars.len() {
        return Err(fail("unbalanced parentheses"));
    }
    if elements.is_empty() {
        return Err(fail("no elements"));
    }

    Ok(ParsedFormula { elements, charge })
}

/// Drop a trailing `(aq)`-style tag made only of lowercase letters.
fn strip_phase_tag(s: &str) -> &str {
    if let Some(stripped) = s.strip_suffix(')') {
        if let Some(open) = stripped.rfind('(') {
            let tag = &stripped[open + 1..];
            if !tag.is_empty() && tag.chars().all(|c| c.is_ascii_lowercase()) {
                return s[..open].trim_end();
            }
        }
    }
    s
}

fn parse_charge(s: &str) -> Option<f64> {
    let sign = match s.chars().next()? {
        '+' => 1.0,
        '-' => -1.0,
        _ => return None,
    };
    let rest = &s[1..];
    if rest.chars().all(|c| c == s.chars().next().unwrap_or('+')) {
        return Some(sign * s.len() as f64);
    }
    if rest.chars().all(|c| c.is_ascii_digit()) {
        let magnitude: f64 = rest.parse().ok()?;
        return Some(sign * magnitude);
    }
    None
}

fn parse_group(
    chars: &[char],
    pos: &mut usize,
    close: Option<char>,
) -> Result<Vec<(String, f64)>, &'static str> {
    let mut out: Vec<(String, f64)> = Vec::new();

    while *pos < chars.len() {
        let c = chars[*pos];
        if Some(c) == close {
            *pos += 1;
            return Ok(out);
        }
        if c.is_ascii_uppercase() {
            let mut symbol = String::from(c);
            *pos += 1;
            while *pos < chars.len() && chars[*pos].is_ascii_lowercase() {
                symbol.push(chars[*pos]);
                *pos += 1;
            }
            let count = parse_count(chars, pos)?;
            merge(&mut out, symbol, count);
        } else if c == '(' || c == '[' {
            *pos += 1;
            let inner = parse_group(chars, pos, Some(if c == '(' { ')' } else { ']' }))?;
            let count = parse_count(chars, pos)?;
            for (symbol, n) in inner {
                merge(&mut out, symbol, n * count);
            }
        } else {
            return Err("unexpected character");
        }
    }

    if close.is_some() {
        return Err("unbalanced parentheses");
    }
    Ok(out)
}

fn parse_count(chars: &[char], pos: &mut usize) -> Result<f64, &'static str> {
    let start = *pos;
    while *pos < chars.len() && (chars[*pos].is_ascii_digit() || chars[*pos] == '.') {
        *pos += 1;
    }
    if start == *pos {
        return Ok(1.0);
    }
    let digits: String = chars[start..*pos].iter().collect();
    digits.parse().map_err(|_| "malformed count")
}

fn merge(out: &mut Vec<(String, f64)>, symbol: String, count: f64) {
    match out.iter_mut().find(|(s, _)| *s == symbol) {
        Some((_, c)) => *c += count,
        None => out.push((symbol, count)),
    }
}
