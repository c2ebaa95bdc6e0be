//! Field decoding: scaling, bit-packed components and developer fields.

use alloc::{string::String, vec::Vec};

use thiserror::Error;

use super::{
    accumulate::Accumulators,
    data::{BaseType, Kind, ValueError, decode_value, element_bits, mask},
    definition::Architecture,
};
use crate::{
    message::{DeveloperField, Field, FieldSource},
    profile::{Component, Profile, field_meta},
    value::{Number, Value},
};

/// Deepest chain of components unpacked from components.
pub const MAX_COMPONENT_DEPTH: usize = 4;

/// A field that could not be decoded, recorded on its message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Field {field}: {kind}")]
pub struct FieldError {
    pub field: u8,
    pub kind: ValueError,
}

/// Apply a scale and offset to a raw value.
///
/// Strings, bytes and enums pass through unchanged, as does everything when
/// the scale is one and the offset zero.
pub fn scale(raw: &Value, scale: f64, offset: f64) -> Value {
    if scale == 1.0 && offset == 0.0 {
        return raw.clone();
    }

    let apply = |n: Number| Number::Float(n.as_f64() / scale - offset);

    match raw {
        Value::Number(n) => Value::Number(apply(*n)),
        Value::Array(items) => Value::Array(items.iter().map(|n| n.map(apply)).collect()),
        other => other.clone(),
    }
}

/// Invert [`scale`], rounding to the nearest integer for integral base types.
pub fn unscale(
    value: &Value,
    base: BaseType,
    scale: f64,
    offset: f64,
) -> Result<Value, ValueError> {
    if scale == 1.0 && offset == 0.0 {
        return Ok(value.clone());
    }

    let apply = |n: Number| -> Result<Number, ValueError> {
        let x = (n.as_f64() + offset) * scale;
        if base.kind() == Kind::Float {
            Ok(Number::Float(x))
        } else {
            integral(round(x))
        }
    };

    Ok(match value {
        Value::Number(n) => Value::Number(apply(*n)?),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|n| n.map(apply).transpose())
                .collect::<Result<_, _>>()?,
        ),
        other => other.clone(),
    })
}

fn round(x: f64) -> i128 {
    if x >= 0.0 {
        (x + 0.5) as i128
    } else {
        (x - 0.5) as i128
    }
}

fn integral(i: i128) -> Result<Number, ValueError> {
    if i >= 0 {
        u64::try_from(i)
            .map(Number::Unsigned)
            .map_err(|_| ValueError::OutOfRange)
    } else {
        i64::try_from(i)
            .map(Number::Signed)
            .map_err(|_| ValueError::OutOfRange)
    }
}

/// Per-record context for decoding the fields of one message.
pub struct FieldDecoder<'a, P: ?Sized> {
    pub profile: &'a P,
    pub accumulators: &'a mut Accumulators,
    pub global: u16,
    pub local: u8,
    pub architecture: Architecture,
    pub expand_components: bool,
}

impl<P: Profile + ?Sized> FieldDecoder<'_, P> {
    /// Decode one transmitted field, appending it and any components it
    /// carries to `fields`.
    pub fn decode(
        &mut self,
        number: u8,
        base_type: u8,
        r: &[u8],
        fields: &mut Vec<Field>,
    ) -> Result<(), FieldError> {
        let error = |kind| FieldError {
            field: number,
            kind,
        };

        let base = BaseType::from_byte(base_type)
            .ok_or(error(ValueError::UnknownBaseType(base_type)))?;
        let mut raw = decode_value(base, self.architecture, r).map_err(error)?;

        let meta = field_meta(self.profile, self.global, number);

        if meta.is_some_and(|m| m.accumulate) {
            if let Value::Number(Number::Unsigned(u)) = raw {
                let bits = base.width() as u32 * 8;
                let total = self.accumulators.accumulate(self.local, number, u, bits);
                raw = Value::Number(Number::Unsigned(total));
            }
        }

        let (value, name, units) = match meta {
            Some(meta) => (scale(&raw, meta.scale, meta.offset), Some(meta.name), meta.units),
            None => (raw.clone(), None, ""),
        };

        let components = match meta {
            Some(meta) if self.expand_components => meta.components,
            _ => &[],
        };

        fields.push(Field {
            number,
            name,
            units,
            base_type: base,
            size: r.len() as u8,
            raw: raw.clone(),
            value,
            source: FieldSource::Transmitted,
        });

        self.expand(number, base, &raw, components, fields, 0);

        Ok(())
    }

    /// Unpack the components of a field's raw value.
    fn expand(
        &mut self,
        parent: u8,
        base: BaseType,
        raw: &Value,
        components: &[Component],
        fields: &mut Vec<Field>,
        depth: usize,
    ) {
        if components.is_empty() || depth >= MAX_COMPONENT_DEPTH {
            return;
        }

        let Some(source) = source_bytes(raw, base) else {
            return;
        };
        let profile = self.profile;

        for component in components {
            let bits = component.bits as u32;
            let Some(mut v) = extract(&source, component.bit_offset as usize, bits) else {
                continue;
            };

            if bits > 1 && v == mask(bits) {
                continue;
            }

            if component.accumulate {
                v = self
                    .accumulators
                    .accumulate(self.local, component.field, v, bits);
            }

            let destination = field_meta(profile, self.global, component.field);
            let (dest_base, dest_scale, dest_offset) = match destination {
                Some(meta) => (meta.base_type, meta.scale, meta.offset),
                None => (BaseType::UInt32, 1.0, 0.0),
            };

            let x = (v as f64 / component.scale - component.offset + dest_offset) * dest_scale;
            let Ok(n) = integral(round(x)) else {
                continue;
            };
            let dest_raw = Value::Number(n);

            fields.push(Field {
                number: component.field,
                name: destination.map(|m| m.name),
                units: destination.map_or("", |m| m.units),
                base_type: dest_base,
                size: dest_base.width() as u8,
                raw: dest_raw.clone(),
                value: scale(&dest_raw, dest_scale, dest_offset),
                source: FieldSource::Component { parent },
            });

            if let Some(meta) = destination {
                let nested = meta.components;
                self.expand(component.field, dest_base, &dest_raw, nested, fields, depth + 1);
            }
        }
    }
}

/// Little-endian bytes carrying a raw value's bits, or `None` when some
/// element is absent.
fn source_bytes(raw: &Value, base: BaseType) -> Option<Vec<u8>> {
    let width = base.width();
    let bytes = |n: Number| element_bits(base, n, true).ok().map(u64::to_le_bytes);

    match raw {
        Value::Enum(e) => Some(alloc::vec![*e]),
        Value::Bytes(b) => Some(b.clone()),
        Value::Number(n) => Some(bytes(*n)?[..width].to_vec()),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len() * width);
            for item in items {
                out.extend_from_slice(&bytes((*item)?)?[..width]);
            }
            Some(out)
        }
        _ => None,
    }
}

/// Read `bits` bits starting at bit `offset` of a little-endian byte string.
fn extract(r: &[u8], offset: usize, bits: u32) -> Option<u64> {
    if bits == 0 || bits > 64 || offset + bits as usize > r.len() * 8 {
        return None;
    }

    Some((0..bits as usize).fold(0, |acc, i| {
        let bit = offset + i;
        let set = (r[bit / 8] >> (bit % 8)) & 1;
        acc | ((set as u64) << i)
    }))
}

/// What a `field_description` message declares about a developer field.
#[derive(Debug, Clone, PartialEq)]
pub struct DeveloperDescription {
    pub base_type: BaseType,
    pub name: Option<String>,
    pub units: Option<String>,
    pub scale: f64,
    pub offset: f64,
}

/// Decode the bytes of a developer field, resolving them with a description
/// when one is known.
pub fn decode_developer(
    developer_data_index: u8,
    number: u8,
    description: Option<&DeveloperDescription>,
    architecture: Architecture,
    r: &[u8],
) -> DeveloperField {
    let unresolved = || {
        let raw = decode_value(BaseType::Byte, architecture, r).unwrap_or_default();
        DeveloperField {
            developer_data_index,
            number,
            name: None,
            units: None,
            base_type: BaseType::Byte,
            size: r.len() as u8,
            scale: 1.0,
            offset: 0.0,
            value: raw.clone(),
            raw,
        }
    };

    let Some(description) = description else {
        return unresolved();
    };

    match decode_value(description.base_type, architecture, r) {
        Ok(raw) => DeveloperField {
            developer_data_index,
            number,
            name: description.name.clone(),
            units: description.units.clone(),
            base_type: description.base_type,
            size: r.len() as u8,
            scale: description.scale,
            offset: description.offset,
            value: scale(&raw, description.scale, description.offset),
            raw,
        },
        Err(err) => {
            log::warn!(
                "Developer field {developer_data_index}:{number} does not match its description: {err}"
            );
            unresolved()
        }
    }
}
