// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.
#![allow(
    clippy::float_cmp,
    clippy::as_conversions,
    clippy::option_if_let_else
)]

use core::cmp::Ordering;
use core::fmt::{self, Debug, Display, Formatter};
use core::str::FromStr;

use anyhow::{bail, Result};
use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

const F64_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0; // 2^53

/// Numeric value of the configuration language.
///
/// Integers are kept exact as long as they fit in 64 bits; anything else
/// (fractions, overflowing arithmetic) is carried as a float.
#[derive(Clone, Copy)]
pub enum Number {
    UInt(u64),
    Int(i64),
    Float(f64),
}

impl Number {
    fn from_i128(value: i128) -> Self {
        if value >= 0 {
            if let Ok(u) = u64::try_from(value) {
                return Number::UInt(u);
            }
        }

        if let Ok(i) = i64::try_from(value) {
            Number::Int(i)
        } else {
            Number::Float(value as f64)
        }
    }

    fn as_exact_i128(&self) -> Option<i128> {
        match self {
            Number::UInt(v) => Some(*v as i128),
            Number::Int(v) => Some(*v as i128),
            Number::Float(f) => {
                if f.is_finite() && f.fract() == 0.0 && f.abs() <= F64_SAFE_INTEGER {
                    Some(*f as i128)
                } else {
                    None
                }
            }
        }
    }

    fn to_f64_lossy(self) -> f64 {
        match self {
            Number::UInt(v) => v as f64,
            Number::Int(v) => v as f64,
            Number::Float(v) => v,
        }
    }

    fn is_zero(&self) -> bool {
        match self {
            Number::UInt(v) => *v == 0,
            Number::Int(v) => *v == 0,
            Number::Float(f) => *f == 0.0,
        }
    }

    fn normalize_float(value: f64) -> Number {
        if value.is_finite() && value.fract() == 0.0 && value.abs() <= F64_SAFE_INTEGER {
            return Number::from_i128(value as i128);
        }
        Number::Float(value)
    }

    fn is_float(&self) -> bool {
        matches!(self, Number::Float(_))
    }
}

impl Debug for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_decimal())
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_decimal())
    }
}

impl Serialize for Number {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match *self {
            Number::UInt(v) => serializer.serialize_u64(v),
            Number::Int(v) => serializer.serialize_i64(v),
            Number::Float(v) => match Self::normalize_float(v) {
                Number::UInt(u) => serializer.serialize_u64(u),
                Number::Int(i) => serializer.serialize_i64(i),
                Number::Float(f) => serializer.serialize_f64(f),
            },
        }
    }
}

struct NumberVisitor;

impl<'de> Visitor<'de> for NumberVisitor {
    type Value = Number;

    fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
        formatter.write_str("a number")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Number, E> {
        Ok(Number::UInt(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Number, E> {
        Ok(Number::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Number, E> {
        Ok(Number::from(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Number, E> {
        Number::from_str(v).map_err(|_| E::custom(format!("invalid number `{v}`")))
    }
}

impl<'de> Deserialize<'de> for Number {
    fn deserialize<D>(deserializer: D) -> Result<Number, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(NumberVisitor)
    }
}

impl From<u64> for Number {
    fn from(value: u64) -> Self {
        Number::UInt(value)
    }
}

impl From<usize> for Number {
    fn from(value: usize) -> Self {
        Number::UInt(value as u64)
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        if value >= 0 {
            Number::UInt(value as u64)
        } else {
            Number::Int(value)
        }
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Number::from(i64::from(value))
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::normalize_float(value)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseNumberError;

impl Display for ParseNumberError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("a number is required")
    }
}

impl std::error::Error for ParseNumberError {}

impl FromStr for Number {
    type Err = ParseNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.trim() != s {
            return Err(ParseNumberError);
        }

        let normalized = if let Some(rest) = s.strip_prefix("-.") {
            format!("-0.{rest}")
        } else if let Some(rest) = s.strip_prefix('.') {
            format!("0.{rest}")
        } else {
            s.to_string()
        };

        let is_integer_literal = !normalized.contains('.')
            && !normalized.contains('e')
            && !normalized.contains('E');

        if is_integer_literal {
            if let Ok(u) = normalized.parse::<u64>() {
                return Ok(Number::UInt(u));
            }
            if let Ok(i) = normalized.parse::<i64>() {
                return Ok(Number::Int(i));
            }
        }

        // Rust accepts spellings like "inf" and "NaN" which are not numbers
        // in the configuration language.
        if !normalized
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
        {
            return Err(ParseNumberError);
        }

        match normalized.parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(Number::normalize_float(f)),
            _ => Err(ParseNumberError),
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        if let (Some(a), Some(b)) = (self.as_exact_i128(), other.as_exact_i128()) {
            return a == b;
        }

        let a = self.to_f64_lossy();
        let b = other.to_f64_lossy();
        if a.is_nan() || b.is_nan() {
            return false;
        }
        a == b
    }
}

impl Eq for Number {}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        if let (Some(a), Some(b)) = (self.as_exact_i128(), other.as_exact_i128()) {
            return a.cmp(&b);
        }

        self.to_f64_lossy()
            .partial_cmp(&other.to_f64_lossy())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Number {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Number::UInt(v) => Some(*v),
            Number::Int(v) if *v >= 0 => Some(*v as u64),
            Number::Float(_) => self.as_exact_i128().and_then(|v| u64::try_from(v).ok()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::UInt(v) => i64::try_from(*v).ok(),
            Number::Int(v) => Some(*v),
            Number::Float(_) => self.as_exact_i128().and_then(|v| i64::try_from(v).ok()),
        }
    }

    pub fn is_integer(&self) -> bool {
        match self {
            Number::Float(f) => f.is_finite() && f.fract() == 0.0,
            _ => true,
        }
    }

    // Arithmetic results must stay finite decimals.
    fn finite(result: Number) -> Result<Number> {
        match result {
            Number::Float(f) if !f.is_finite() => bail!("number overflow"),
            n => Ok(n),
        }
    }

    pub fn add(&self, rhs: &Self) -> Result<Number> {
        if self.is_float() || rhs.is_float() {
            return Self::finite(Number::normalize_float(
                self.to_f64_lossy() + rhs.to_f64_lossy(),
            ));
        }

        match (self.as_exact_i128(), rhs.as_exact_i128()) {
            (Some(a), Some(b)) => Ok(Number::from_i128(a + b)),
            _ => Self::finite(Number::Float(self.to_f64_lossy() + rhs.to_f64_lossy())),
        }
    }

    pub fn sub(&self, rhs: &Self) -> Result<Number> {
        if self.is_float() || rhs.is_float() {
            return Self::finite(Number::normalize_float(
                self.to_f64_lossy() - rhs.to_f64_lossy(),
            ));
        }

        match (self.as_exact_i128(), rhs.as_exact_i128()) {
            (Some(a), Some(b)) => Ok(Number::from_i128(a - b)),
            _ => Self::finite(Number::Float(self.to_f64_lossy() - rhs.to_f64_lossy())),
        }
    }

    pub fn mul(&self, rhs: &Self) -> Result<Number> {
        if self.is_float() || rhs.is_float() {
            return Self::finite(Number::normalize_float(
                self.to_f64_lossy() * rhs.to_f64_lossy(),
            ));
        }

        match (self.as_exact_i128(), rhs.as_exact_i128()) {
            (Some(a), Some(b)) => match a.checked_mul(b) {
                Some(product) => Ok(Number::from_i128(product)),
                None => Self::finite(Number::Float(self.to_f64_lossy() * rhs.to_f64_lossy())),
            },
            _ => Self::finite(Number::Float(self.to_f64_lossy() * rhs.to_f64_lossy())),
        }
    }

    pub fn divide(&self, rhs: &Self) -> Result<Number> {
        if rhs.is_zero() {
            bail!("divide by zero");
        }

        if let (false, false, Some(a), Some(b)) = (
            self.is_float(),
            rhs.is_float(),
            self.as_exact_i128(),
            rhs.as_exact_i128(),
        ) {
            if a % b == 0 {
                return Ok(Number::from_i128(a / b));
            }
        }

        Self::finite(Number::normalize_float(
            self.to_f64_lossy() / rhs.to_f64_lossy(),
        ))
    }

    pub fn modulo(&self, rhs: &Self) -> Result<Number> {
        if rhs.is_zero() {
            bail!("modulo by zero");
        }

        match (self.as_exact_i128(), rhs.as_exact_i128()) {
            (Some(a), Some(b)) => Ok(Number::from_i128(a % b)),
            _ => Self::finite(Number::normalize_float(
                self.to_f64_lossy() % rhs.to_f64_lossy(),
            )),
        }
    }

    pub fn neg(&self) -> Result<Number> {
        match self.as_exact_i128() {
            Some(v) => Ok(Number::from_i128(-v)),
            None => Self::finite(Number::Float(-self.to_f64_lossy())),
        }
    }

    /// Decimal text without exponent; integral values carry no fraction.
    pub fn format_decimal(&self) -> String {
        match self {
            Number::UInt(v) => v.to_string(),
            Number::Int(v) => v.to_string(),
            Number::Float(f) => {
                if f.is_nan() {
                    "NaN".to_string()
                } else {
                    f.to_string()
                }
            }
        }
    }
}
