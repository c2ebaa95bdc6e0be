//! Decoded messages and documents.

use alloc::{string::String, vec::Vec};

use crate::{
    avec::FromMessages,
    sans::{data::BaseType, field::FieldError, header::FileHeader},
    value::Value,
};

/// Where a field's value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    /// Read from the field's own bytes.
    Transmitted,
    /// Unpacked from the bits of another field.
    Component { parent: u8 },
}

/// A profile field of a message.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub number: u8,
    /// Profile name, absent for fields the profile does not know.
    pub name: Option<&'static str>,
    pub units: &'static str,
    pub base_type: BaseType,
    /// Size in bytes as defined, or the base type width for components.
    pub size: u8,
    /// Value in transmitted units, after accumulation.
    pub raw: Value,
    /// Value after scale and offset.
    pub value: Value,
    pub source: FieldSource,
}

impl Field {
    pub fn is_component(&self) -> bool {
        matches!(self.source, FieldSource::Component { .. })
    }
}

/// A developer field, resolved against a `field_description` when one was seen.
#[derive(Debug, Clone, PartialEq)]
pub struct DeveloperField {
    pub developer_data_index: u8,
    pub number: u8,
    pub name: Option<String>,
    pub units: Option<String>,
    /// `Byte` when unresolved.
    pub base_type: BaseType,
    pub size: u8,
    pub scale: f64,
    pub offset: f64,
    pub raw: Value,
    pub value: Value,
}

/// A decoded data record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Message {
    pub global: u16,
    /// Profile name. A message without one is opaque.
    pub name: Option<&'static str>,
    pub fields: Vec<Field>,
    pub developer_fields: Vec<DeveloperField>,
    /// Absolute timestamp, from field 253 or a compressed header.
    pub timestamp: Option<u32>,
    /// Offset carried by a compressed record header.
    pub time_offset: Option<u8>,
    /// Fields that could not be decoded.
    pub errors: Vec<FieldError>,
}

impl Message {
    pub fn new(global: u16, name: Option<&'static str>) -> Self {
        Self {
            global,
            name,
            ..Self::default()
        }
    }

    pub fn is_opaque(&self) -> bool {
        self.name.is_none()
    }

    /// The field with a given number, preferring a transmitted field over one
    /// unpacked from a component.
    pub fn field(&self, number: u8) -> Option<&Field> {
        let position = self.position(number)?;
        self.fields.get(position)
    }

    pub fn field_mut(&mut self, number: u8) -> Option<&mut Field> {
        let position = self.position(number)?;
        self.fields.get_mut(position)
    }

    /// The scaled value of a field, if present.
    pub fn value(&self, number: u8) -> Option<&Value> {
        self.field(number)
            .map(|f| &f.value)
            .filter(|v| !v.is_absent())
    }

    pub fn developer_field(&self, developer_data_index: u8, number: u8) -> Option<&DeveloperField> {
        self.developer_fields
            .iter()
            .find(|f| f.developer_data_index == developer_data_index && f.number == number)
    }

    fn position(&self, number: u8) -> Option<usize> {
        let mut matching = self.fields.iter().enumerate().filter(|(_, f)| f.number == number);
        let first = matching.next()?;

        if first.1.is_component() {
            if let Some((i, _)) = matching.find(|(_, f)| !f.is_component()) {
                return Some(i);
            }
        }

        Some(first.0)
    }
}

/// A decoded document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct File {
    pub header: FileHeader,
    /// Messages in the order their records appeared.
    pub messages: Vec<Message>,
}

impl File {
    /// The first message with a global number.
    pub fn first(&self, global: u16) -> Option<&Message> {
        self.messages.iter().find(|m| m.global == global)
    }

    pub fn first_mut(&mut self, global: u16) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.global == global)
    }

    /// All messages with a global number, in order.
    pub fn messages_of(&self, global: u16) -> impl Iterator<Item = &Message> + '_ {
        self.messages.iter().filter(move |m| m.global == global)
    }

    /// Publish every message to a receiver.
    ///
    /// Receivers see each field's scaled value; absent values are skipped.
    pub fn publish(&self, o: &mut impl FromMessages) {
        for message in &self.messages {
            let Some(o) = o.add_message(message.global) else {
                continue;
            };

            if let Some(timestamp) = message.timestamp {
                o.add_timestamp(timestamp);
            }

            for field in message.fields.iter().filter(|f| !f.value.is_absent()) {
                o.add_field(field);
            }
        }
    }
}
