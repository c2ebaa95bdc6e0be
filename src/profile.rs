//! Message and field metadata consumed by the decoder and encoder.
//!
//! The engine never hard-codes message semantics. It asks a [`Profile`] for
//! the name, base type, scaling, accumulation and component layout of each
//! field, and passes messages it cannot find through as opaque.
//!
//! [`Standard`] carries a subset of the published profile covering the
//! messages common to activity and course documents. Applications needing
//! more can implement [`Profile`] over a generated table.

mod standard;

pub use standard::Standard;

use crate::sans::data::BaseType;

/// Global message numbers with no message in the profile. These are treated
/// exactly as unknown numbers.
pub const KNOWN_WITHOUT_MESSAGE: [u16; 2] = [105, 160];

/// Field number conventionally holding a message's timestamp.
pub const TIMESTAMP_FIELD: u8 = 253;

/// Metadata for a global message number, with the numbers in
/// [`KNOWN_WITHOUT_MESSAGE`] unknown whatever `profile` says.
pub fn message_meta<P: Profile + ?Sized>(profile: &P, global: u16) -> Option<&MessageMeta> {
    if KNOWN_WITHOUT_MESSAGE.contains(&global) {
        return None;
    }
    profile.message(global)
}

/// Metadata for a field, with the same treatment of known-absent messages as
/// [`message_meta`].
pub fn field_meta<P: Profile + ?Sized>(profile: &P, global: u16, number: u8) -> Option<&FieldMeta> {
    if KNOWN_WITHOUT_MESSAGE.contains(&global) {
        return None;
    }
    profile.field(global, number)
}

/// A lookup from global message numbers to their metadata.
///
/// The engine reads implementations through [`message_meta`] and
/// [`field_meta`].
pub trait Profile {
    /// Metadata for a global message number, if known.
    fn message(&self, global: u16) -> Option<&MessageMeta>;

    /// Metadata for a field of a message, if known.
    fn field(&self, global: u16, number: u8) -> Option<&FieldMeta> {
        self.message(global)?
            .fields
            .iter()
            .find(|f| f.number == number)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MessageMeta {
    pub number: u16,
    pub name: &'static str,
    pub fields: &'static [FieldMeta],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldMeta {
    pub number: u8,
    pub name: &'static str,
    pub base_type: BaseType,
    pub scale: f64,
    pub offset: f64,
    pub units: &'static str,
    /// Transmitted values are truncated and must be accumulated.
    pub accumulate: bool,
    /// Values are absolute timestamps that anchor compressed time offsets.
    pub timestamp: bool,
    pub components: &'static [Component],
}

/// A sub-field packed into the bits of another field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Component {
    /// Field number the unpacked value is published under.
    pub field: u8,
    pub bit_offset: u8,
    pub bits: u8,
    pub scale: f64,
    pub offset: f64,
    pub accumulate: bool,
}

/// Start a field descriptor with unit scale and no components.
pub const fn field(number: u8, name: &'static str, base_type: BaseType) -> FieldMeta {
    FieldMeta {
        number,
        name,
        base_type,
        scale: 1.0,
        offset: 0.0,
        units: "",
        accumulate: false,
        timestamp: false,
        components: &[],
    }
}

impl FieldMeta {
    pub const fn scaled(self, scale: f64, offset: f64) -> Self {
        Self {
            scale,
            offset,
            ..self
        }
    }

    pub const fn units(self, units: &'static str) -> Self {
        Self { units, ..self }
    }

    pub const fn accumulated(self) -> Self {
        Self {
            accumulate: true,
            ..self
        }
    }

    pub const fn timestamp(self) -> Self {
        Self {
            timestamp: true,
            ..self
        }
    }

    pub const fn components(self, components: &'static [Component]) -> Self {
        Self { components, ..self }
    }
}

/// Start a component descriptor with unit scale.
pub const fn component(field: u8, bit_offset: u8, bits: u8) -> Component {
    Component {
        field,
        bit_offset,
        bits,
        scale: 1.0,
        offset: 0.0,
        accumulate: false,
    }
}

impl Component {
    pub const fn scaled(self, scale: f64, offset: f64) -> Self {
        Self {
            scale,
            offset,
            ..self
        }
    }

    pub const fn accumulated(self) -> Self {
        Self {
            accumulate: true,
            ..self
        }
    }
}
