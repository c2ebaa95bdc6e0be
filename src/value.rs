//! Decoded field values.

use alloc::{string::String, vec::Vec};
use core::fmt;

use either::Either::{Left, Right};

use crate::avec::FromValue;

/// A single numeric element of a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Unsigned(u64),
    Signed(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(&self) -> f64 {
        match *self {
            Self::Unsigned(u) => u as f64,
            Self::Signed(i) => i as f64,
            Self::Float(f) => f,
        }
    }

    /// The value as a signed integer, if it is integral and fits.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Unsigned(u) => i64::try_from(u).ok(),
            Self::Signed(i) => Some(i),
            Self::Float(f) => {
                let i = f as i64;
                (i as f64 == f).then_some(i)
            }
        }
    }

    /// The value as an unsigned integer, if it is integral and fits.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Self::Unsigned(u) => Some(u),
            Self::Signed(i) => u64::try_from(i).ok(),
            Self::Float(f) => {
                let u = f as u64;
                (f >= 0.0 && u as f64 == f).then_some(u)
            }
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsigned(u) => write!(f, "{u}"),
            Self::Signed(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
        }
    }
}

/// The value of a field, raw or scaled.
///
/// A field holding its base type's 'invalid' marker decodes to [`Value::Absent`]
/// rather than to a number, so a transmitted zero is never confused with a
/// missing reading. Arrays mark absent elements individually.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Absent,
    Enum(u8),
    Number(Number),
    Array(Vec<Option<Number>>),
    String(String),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Convert to a Rust type, if the value is present and representable.
    pub fn get<T: FromValue>(&self) -> Option<T> {
        T::from_value(self)
    }

    /// The scalar value as a float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Enum(e) => Some(*e as f64),
            Self::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    /// Iterate over numeric elements; a scalar yields one element, other
    /// values yield none.
    pub fn elements(&self) -> impl Iterator<Item = Option<Number>> + '_ {
        match self {
            Self::Number(n) => Left(Some(Some(*n)).into_iter()),
            Self::Enum(e) => Left(Some(Some(Number::Unsigned(*e as u64))).into_iter()),
            Self::Array(items) => Right(items.iter().copied()),
            _ => Left(None.into_iter()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => Ok(()),
            Self::Enum(e) => write!(f, "{e}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i != 0 {
                        f.write_str(";")?;
                    }
                    match item {
                        Some(n) => write!(f, "{n}")?,
                        None => f.write_str("-")?,
                    }
                }
                Ok(())
            }
            Self::String(s) => f.write_str(s),
            Self::Bytes(b) => {
                for byte in b {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }
    }
}
