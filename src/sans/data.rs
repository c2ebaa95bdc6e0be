//! Base types and the decoding of field bytes into values.

use alloc::{string::String, vec::Vec};

use thiserror::Error;

use super::definition::Architecture;
use crate::value::{Number, Value};

/// How a base type is represented once decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Unsigned,
    Signed,
    Float,
    String,
    Byte,
}

/// A FIT base type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Enum,
    SInt8,
    UInt8,
    SInt16,
    UInt16,
    SInt32,
    UInt32,
    String,
    Float32,
    Float64,
    UInt8z,
    UInt16z,
    UInt32z,
    Byte,
    SInt64,
    UInt64,
    UInt64z,
}

macro_rules! base_types {
    ($($t:ident = $number:literal, $width:literal, $kind:ident, $invalid:literal;)*) => {
        impl BaseType {
            /// Resolve a base type byte. Only the low five bits identify the type.
            pub fn from_byte(b: u8) -> Option<Self> {
                match b & 0x1F {
                    $($number => Some(Self::$t),)*
                    _ => None,
                }
            }

            /// The base type byte, with the endian-ability flag for multi-byte types.
            pub fn to_byte(self) -> u8 {
                match self {
                    $(Self::$t => if $width > 1 { 0x80 | $number } else { $number },)*
                }
            }

            /// Width of one element in bytes.
            pub fn width(self) -> usize {
                match self {
                    $(Self::$t => $width,)*
                }
            }

            pub fn kind(self) -> Kind {
                match self {
                    $(Self::$t => Kind::$kind,)*
                }
            }

            /// The 'invalid' marker bit pattern of one element.
            pub fn invalid(self) -> u64 {
                match self {
                    $(Self::$t => $invalid,)*
                }
            }
        }
    };
}

base_types! {
    Enum = 0x00, 1, Unsigned, 0xFF;
    SInt8 = 0x01, 1, Signed, 0x7F;
    UInt8 = 0x02, 1, Unsigned, 0xFF;
    SInt16 = 0x03, 2, Signed, 0x7FFF;
    UInt16 = 0x04, 2, Unsigned, 0xFFFF;
    SInt32 = 0x05, 4, Signed, 0x7FFF_FFFF;
    UInt32 = 0x06, 4, Unsigned, 0xFFFF_FFFF;
    String = 0x07, 1, String, 0x00;
    Float32 = 0x08, 4, Float, 0xFFFF_FFFF;
    Float64 = 0x09, 8, Float, 0xFFFF_FFFF_FFFF_FFFF;
    UInt8z = 0x0A, 1, Unsigned, 0x00;
    UInt16z = 0x0B, 2, Unsigned, 0x0000;
    UInt32z = 0x0C, 4, Unsigned, 0x0000_0000;
    Byte = 0x0D, 1, Byte, 0xFF;
    SInt64 = 0x0E, 8, Signed, 0x7FFF_FFFF_FFFF_FFFF;
    UInt64 = 0x0F, 8, Unsigned, 0xFFFF_FFFF_FFFF_FFFF;
    UInt64z = 0x10, 8, Unsigned, 0x0000_0000_0000_0000;
}

/// A reason a field's bytes could not be decoded or encoded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// Base type byte does not name a known base type.
    #[error("Unknown base type ({0:#04x}).")]
    UnknownBaseType(u8),
    /// Field size is not a whole number of elements.
    #[error("Size {size} is not a multiple of the base type width {width}.")]
    SizeMismatch { size: usize, width: usize },
    /// String bytes are not valid UTF-8.
    #[error("String is not valid UTF-8.")]
    InvalidUtf8,
    /// Value does not fit the field's base type.
    #[error("Value is out of range for the base type.")]
    OutOfRange,
    /// Value variant does not match the field's base type.
    #[error("Value does not match the base type.")]
    TypeMismatch,
}

/// Mask covering the low `bits` bits.
pub fn mask(bits: u32) -> u64 {
    if bits >= 64 { u64::MAX } else { (1 << bits) - 1 }
}

fn read_bits(r: &[u8], architecture: Architecture) -> u64 {
    let fold = |acc: u64, b: &u8| (acc << 8) | *b as u64;
    match architecture {
        Architecture::Little => r.iter().rev().fold(0, fold),
        Architecture::Big => r.iter().fold(0, fold),
    }
}

fn write_bits(out: &mut Vec<u8>, bits: u64, width: usize, architecture: Architecture) {
    let bytes = bits.to_le_bytes();
    match architecture {
        Architecture::Little => out.extend_from_slice(&bytes[..width]),
        Architecture::Big => out.extend(bytes[..width].iter().rev()),
    }
}

/// Convert one element's bits to a number, or `None` for the 'invalid' marker.
fn element(base: BaseType, bits: u64) -> Option<Number> {
    if bits == base.invalid() {
        return None;
    }

    let width = base.width() as u32 * 8;

    Some(match base.kind() {
        Kind::Signed => {
            let shift = 64 - width;
            Number::Signed(((bits << shift) as i64) >> shift)
        }
        Kind::Float if width == 32 => Number::Float(f32::from_bits(bits as u32) as f64),
        Kind::Float => Number::Float(f64::from_bits(bits)),
        _ => Number::Unsigned(bits),
    })
}

/// Decode the bytes of a field of the given base type.
pub fn decode_value(
    base: BaseType,
    architecture: Architecture,
    r: &[u8],
) -> Result<Value, ValueError> {
    match base.kind() {
        Kind::String => {
            let end = r.iter().position(|b| *b == 0).unwrap_or(r.len());
            if end == 0 {
                return Ok(Value::Absent);
            }
            let s = core::str::from_utf8(&r[..end]).map_err(|_| ValueError::InvalidUtf8)?;
            Ok(Value::String(String::from(s)))
        }
        Kind::Byte => {
            if r.iter().all(|b| *b == 0xFF) {
                Ok(Value::Absent)
            } else {
                Ok(Value::Bytes(r.to_vec()))
            }
        }
        _ => {
            let width = base.width();
            if r.len() % width != 0 {
                Err(ValueError::SizeMismatch {
                    size: r.len(),
                    width,
                })?;
            }

            let mut elements = r
                .chunks_exact(width)
                .map(|c| element(base, read_bits(c, architecture)))
                .collect::<Vec<_>>();

            if elements.iter().all(Option::is_none) {
                return Ok(Value::Absent);
            }

            if elements.len() > 1 {
                return Ok(Value::Array(elements));
            }

            Ok(match (base, elements.pop().flatten()) {
                (BaseType::Enum, Some(Number::Unsigned(e))) => Value::Enum(e as u8),
                (_, Some(n)) => Value::Number(n),
                (_, None) => Value::Absent,
            })
        }
    }
}

/// Convert a number to the bits of one element of `base`.
///
/// With `truncate`, unsigned values wider than the base type keep their low
/// bits instead of failing.
pub fn element_bits(base: BaseType, n: Number, truncate: bool) -> Result<u64, ValueError> {
    let width = base.width() as u32 * 8;

    match base.kind() {
        Kind::Unsigned | Kind::Byte => {
            let u = n.as_u64().ok_or(ValueError::OutOfRange)?;
            if !truncate && u > mask(width) {
                Err(ValueError::OutOfRange)?;
            }
            Ok(u & mask(width))
        }
        Kind::Signed => {
            let i = n.as_i64().ok_or(ValueError::OutOfRange)?;
            let max = (mask(width) >> 1) as i64;
            if i > max || i < -max - 1 {
                Err(ValueError::OutOfRange)?;
            }
            Ok(i as u64 & mask(width))
        }
        Kind::Float if width == 32 => Ok((n.as_f64() as f32).to_bits() as u64),
        Kind::Float => Ok(n.as_f64().to_bits()),
        Kind::String => Err(ValueError::TypeMismatch),
    }
}

/// Encode a raw value as `size` bytes of the given base type.
pub fn encode_value(
    out: &mut Vec<u8>,
    base: BaseType,
    architecture: Architecture,
    size: usize,
    raw: &Value,
    truncate: bool,
) -> Result<(), ValueError> {
    let width = base.width();
    if size % width != 0 {
        Err(ValueError::SizeMismatch { size, width })?;
    }

    match (base.kind(), raw) {
        (Kind::String, Value::Absent) => out.extend(core::iter::repeat_n(0, size)),
        (Kind::String, Value::String(s)) => {
            if s.len() > size {
                Err(ValueError::OutOfRange)?;
            }
            out.extend_from_slice(s.as_bytes());
            out.extend(core::iter::repeat_n(0, size - s.len()));
        }
        (Kind::Byte, Value::Bytes(b)) => {
            if b.len() != size {
                Err(ValueError::SizeMismatch { size, width })?;
            }
            out.extend_from_slice(b);
        }
        (Kind::String, _) | (_, Value::String(_)) => Err(ValueError::TypeMismatch)?,
        (_, Value::Absent) => {
            for _ in 0..size / width {
                write_bits(out, base.invalid(), width, architecture);
            }
        }
        (_, Value::Enum(e)) => {
            let bits = element_bits(base, Number::Unsigned(*e as u64), truncate)?;
            write_bits(out, bits, width, architecture);
        }
        (_, Value::Number(n)) => {
            if size != width {
                Err(ValueError::SizeMismatch { size, width })?;
            }
            write_bits(out, element_bits(base, *n, truncate)?, width, architecture);
        }
        (_, Value::Array(items)) => {
            if items.len() * width != size {
                Err(ValueError::SizeMismatch { size, width })?;
            }
            for item in items {
                let bits = match item {
                    Some(n) => element_bits(base, *n, truncate)?,
                    None => base.invalid(),
                };
                write_bits(out, bits, width, architecture);
            }
        }
        (_, Value::Bytes(b)) => {
            if b.len() != size {
                Err(ValueError::SizeMismatch { size, width })?;
            }
            out.extend_from_slice(b);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_decode_as_absent() {
        let le = Architecture::Little;
        assert_eq!(decode_value(BaseType::UInt8, le, &[0xFF]), Ok(Value::Absent));
        assert_eq!(decode_value(BaseType::SInt16, le, &[0xFF, 0x7F]), Ok(Value::Absent));
        assert_eq!(decode_value(BaseType::UInt32z, le, &[0, 0, 0, 0]), Ok(Value::Absent));
        assert_eq!(decode_value(BaseType::Float32, le, &[0xFF; 4]), Ok(Value::Absent));
        assert_eq!(decode_value(BaseType::String, le, &[0, b'x']), Ok(Value::Absent));
        assert_eq!(
            decode_value(BaseType::UInt8, le, &[0]),
            Ok(Value::Number(Number::Unsigned(0)))
        );
    }

    #[test]
    fn signed_values_are_sign_extended() {
        assert_eq!(
            decode_value(BaseType::SInt16, Architecture::Big, &[0xFF, 0xFE]),
            Ok(Value::Number(Number::Signed(-2)))
        );
        assert_eq!(
            decode_value(BaseType::SInt8, Architecture::Little, &[0x80]),
            Ok(Value::Number(Number::Signed(-128)))
        );
    }

    #[test]
    fn partial_arrays_keep_present_elements() {
        let value = decode_value(BaseType::UInt8, Architecture::Little, &[0xFF, 5, 0xFF, 0xFF]);
        assert_eq!(
            value,
            Ok(Value::Array(alloc::vec![
                None,
                Some(Number::Unsigned(5)),
                None,
                None
            ]))
        );
    }

    #[test]
    fn ragged_sizes_are_rejected() {
        assert_eq!(
            decode_value(BaseType::UInt16, Architecture::Little, &[1, 2, 3]),
            Err(ValueError::SizeMismatch { size: 3, width: 2 })
        );
    }

    #[test]
    fn encoding_mirrors_decoding() {
        let mut out = Vec::new();
        let value = Value::Array(alloc::vec![Some(Number::Signed(-2)), None]);
        encode_value(&mut out, BaseType::SInt16, Architecture::Big, 4, &value, false).unwrap();
        assert_eq!(out, [0xFF, 0xFE, 0x7F, 0xFF]);
        assert_eq!(decode_value(BaseType::SInt16, Architecture::Big, &out), Ok(value));
    }

    #[test]
    fn out_of_range_values_are_rejected_unless_truncating() {
        let n = Number::Unsigned(266);
        assert_eq!(element_bits(BaseType::UInt8, n, false), Err(ValueError::OutOfRange));
        assert_eq!(element_bits(BaseType::UInt8, n, true), Ok(10));
    }
}
