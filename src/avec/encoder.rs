//! Encoding of messages back into a document.

use alloc::vec::Vec;

use thiserror::Error;

use crate::{
    config::EncodeOptions,
    message::{DeveloperField, File, Message},
    profile::{Profile, Standard, field_meta},
    sans::{
        accumulate::Accumulators,
        check::compute_crc,
        data::{BaseType, ValueError, encode_value, mask},
        definition::{Definition, DeveloperFieldDefinition, FieldDefinition, LOCAL_MESSAGES},
        field::unscale,
        header::{DATA_TYPE, FileHeader, RecordHeader},
    },
    value::{Number, Value},
};

/// Local message numbers reachable from compressed record headers.
const COMPRESSED_LOCALS: u8 = 4;

/// Largest offset a compressed record header can carry.
const MAX_TIME_OFFSET: u8 = 0x1F;

/// Errors occurring while encoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// A field value cannot be written as its base type.
    #[error("Message {global}, field {field}: {kind}")]
    Field {
        global: u16,
        field: u8,
        kind: ValueError,
    },
    /// A developer field value cannot be written as its base type.
    #[error("Message {global}, developer field {developer_data_index}:{field}: {kind}")]
    DeveloperField {
        global: u16,
        developer_data_index: u8,
        field: u8,
        kind: ValueError,
    },
    /// A field needs more than 255 bytes.
    #[error("Message {global}, field {field}: {size} bytes do not fit a field definition.")]
    FieldSize { global: u16, field: u8, size: usize },
    /// A message has more than 255 fields of one kind.
    #[error("Message {global} has too many fields for one definition.")]
    TooManyFields { global: u16 },
    /// A compressed time offset does not fit in five bits.
    #[error("Message {global}: time offset {offset} does not fit a compressed header.")]
    TimeOffset { global: u16, offset: u8 },
    /// The records exceed the header's 32-bit data size.
    #[error("Document of {0} record bytes is too large.")]
    DocumentSize(usize),
}

/// Encode a document with the standard profile and default options.
pub fn encode(file: &File) -> Result<Vec<u8>, EncodeError> {
    encode_with(file, &Standard, EncodeOptions::default())
}

/// Encode a document.
pub fn encode_with<P: Profile + ?Sized>(
    file: &File,
    profile: &P,
    options: EncodeOptions,
) -> Result<Vec<u8>, EncodeError> {
    let mut encoder = Encoder::new(profile, options);
    encoder.prepare(&file.messages)?;
    for message in &file.messages {
        encoder.message(message)?;
    }
    encoder.finish(&file.header)
}

/// A message laid out as a definition and the bytes of its data record.
struct Layout {
    definition: Definition,
    data: Vec<u8>,
    /// `(field, total, bits)` of each accumulated field.
    totals: Vec<(u8, u64, u32)>,
}

/// An encoder writing messages as records, managing its own local message
/// numbers.
///
/// Numbers 0 to 3 hold definitions used by messages with a compressed time
/// offset, for their uncompressed messages as well once [`Encoder::prepare`]
/// has seen them. Other definitions are bound to numbers 4 to 15. A number
/// already bound to an identical definition is reused, otherwise the least
/// recently used number of the range is rebound.
pub struct Encoder<'p, P: ?Sized = Standard> {
    profile: &'p P,
    options: EncodeOptions,
    slots: [Option<Definition>; LOCAL_MESSAGES],
    last_used: [usize; LOCAL_MESSAGES],
    compressed: Vec<Definition>,
    /// Counters as a decoder will rebuild them from the records written.
    accumulators: Accumulators,
    records: Vec<u8>,
    messages: usize,
}

impl<'p, P: Profile + ?Sized> Encoder<'p, P> {
    pub fn new(profile: &'p P, options: EncodeOptions) -> Self {
        Self {
            profile,
            options,
            slots: Default::default(),
            last_used: [0; LOCAL_MESSAGES],
            compressed: Vec::new(),
            accumulators: Accumulators::new(),
            records: Vec::new(),
            messages: 0,
        }
    }

    /// Look ahead at the messages to be encoded.
    ///
    /// Definitions used by any compressed message are then bound to numbers a
    /// compressed header can reach for all of their messages, so mixing header
    /// kinds never splits the counters accumulated under one definition.
    pub fn prepare<'m>(
        &mut self,
        messages: impl IntoIterator<Item = &'m Message>,
    ) -> Result<(), EncodeError> {
        for message in messages {
            if message.time_offset.is_none() {
                continue;
            }

            let Layout { definition, .. } = self.layout(message)?;
            if !self.compressed.contains(&definition) {
                self.compressed.push(definition);
            }
        }

        Ok(())
    }

    /// Append a message, preceded by a definition record when needed.
    pub fn message(&mut self, message: &Message) -> Result<(), EncodeError> {
        let global = message.global;

        let time_offset = match message.time_offset {
            Some(offset) if offset > MAX_TIME_OFFSET => {
                Err(EncodeError::TimeOffset { global, offset })?
            }
            time_offset => time_offset,
        };

        let Layout {
            definition,
            data,
            totals,
        } = self.layout(message)?;

        let low = time_offset.is_some() || self.compressed.contains(&definition);
        let local = self.bind(definition, low);

        let header = match time_offset {
            Some(time_offset) => RecordHeader::CompressedData { local, time_offset },
            None => RecordHeader::Data { local },
        };

        log::trace!("Encoding message {global} as {header:?}");

        for (field, total, bits) in totals {
            let decoded = self
                .accumulators
                .accumulate(local, field, total & mask(bits), bits);
            if decoded != total {
                log::warn!(
                    "Message {global}, field {field}: accumulated total {total} will decode as {decoded}"
                );
            }
        }

        self.records.push(header.to_byte());
        self.records.extend_from_slice(&data);
        self.messages += 1;

        Ok(())
    }

    fn layout(&self, message: &Message) -> Result<Layout, EncodeError> {
        let global = message.global;
        let architecture = self.options.architecture;

        let mut definition = Definition {
            global,
            architecture,
            fields: Vec::new(),
            developer_fields: Vec::new(),
        };
        let mut data = Vec::new();
        let mut totals = Vec::new();

        for field in message.fields.iter().filter(|f| !f.is_component()) {
            let (scale, offset, truncate) = match field_meta(self.profile, global, field.number) {
                Some(meta) => (meta.scale, meta.offset, meta.accumulate),
                None => (1.0, 0.0, false),
            };

            let error = |kind| EncodeError::Field {
                global,
                field: field.number,
                kind,
            };

            let raw = unscale(&field.value, field.base_type, scale, offset).map_err(error)?;
            let size = field_size(global, field.number, field.base_type, field.size, &raw)?;

            if truncate {
                if let Value::Number(Number::Unsigned(total)) = &raw {
                    let bits = field.base_type.width() as u32 * 8;
                    totals.push((field.number, *total, bits));
                }
            }

            encode_value(&mut data, field.base_type, architecture, size as usize, &raw, truncate)
                .map_err(error)?;

            definition.fields.push(FieldDefinition {
                number: field.number,
                size,
                base_type: field.base_type.to_byte(),
            });
        }

        for field in &message.developer_fields {
            let DeveloperField {
                developer_data_index,
                number,
                base_type,
                ..
            } = *field;

            let error = |kind| EncodeError::DeveloperField {
                global,
                developer_data_index,
                field: number,
                kind,
            };

            let raw = unscale(&field.value, base_type, field.scale, field.offset).map_err(error)?;
            let size = field_size(global, number, base_type, field.size, &raw)?;

            encode_value(&mut data, base_type, architecture, size as usize, &raw, false)
                .map_err(error)?;

            definition.developer_fields.push(DeveloperFieldDefinition {
                number,
                size,
                developer_data_index,
            });
        }

        if definition.fields.len() > u8::MAX as usize
            || definition.developer_fields.len() > u8::MAX as usize
        {
            Err(EncodeError::TooManyFields { global })?;
        }

        Ok(Layout {
            definition,
            data,
            totals,
        })
    }

    /// Find or assign a local message number for a definition, writing the
    /// definition record if it is not already bound.
    fn bind(&mut self, definition: Definition, low: bool) -> u8 {
        let range = if low {
            0..COMPRESSED_LOCALS
        } else {
            COMPRESSED_LOCALS..LOCAL_MESSAGES as u8
        };
        let stamp = self.messages;

        if let Some(local) = range
            .clone()
            .find(|l| self.slots[*l as usize].as_ref() == Some(&definition))
        {
            self.last_used[local as usize] = stamp;
            return local;
        }

        // An unbound number, otherwise the least recently used one.
        let start = range.start;
        let local = range
            .min_by_key(|l| (self.slots[*l as usize].is_some(), self.last_used[*l as usize]))
            .unwrap_or(start);

        if self.slots[local as usize].is_some() {
            log::debug!("Rebinding local message {local}, resetting its accumulators");
            self.accumulators.invalidate(local);
        }

        log::debug!("Binding local message {local} to global {}", definition.global);

        definition.encode(local, &mut self.records);
        self.slots[local as usize] = Some(definition);
        self.last_used[local as usize] = stamp;
        local
    }

    /// Complete the document: header, records, then the trailing CRC.
    ///
    /// The header keeps the size and versions of `header`, falling back to a
    /// 14-byte header when its size is not valid.
    pub fn finish(self, header: &FileHeader) -> Result<Vec<u8>, EncodeError> {
        let data_size = u32::try_from(self.records.len())
            .map_err(|_| EncodeError::DocumentSize(self.records.len()))?;

        let mut header = match header.size {
            12 | 14 => FileHeader {
                data_size,
                data_type: DATA_TYPE,
                crc: 0,
                ..*header
            },
            _ => FileHeader::new(data_size),
        };

        if header.size == 14 && self.options.header_crc {
            header.crc = header.checksum();
        }

        let mut out = Vec::with_capacity(header.size as usize + self.records.len() + 2);
        header.encode(&mut out);
        out.extend_from_slice(&self.records);

        let crc = compute_crc(0, &out);
        out.extend_from_slice(&crc.to_le_bytes());

        log::info!(
            "Encoded {} messages into {} record bytes",
            self.messages,
            data_size
        );

        Ok(out)
    }
}

/// Bytes needed to write a raw value.
fn field_size(
    global: u16,
    field: u8,
    base: BaseType,
    declared: u8,
    raw: &Value,
) -> Result<u8, EncodeError> {
    let width = base.width();
    let declared = declared as usize;

    let size = match raw {
        Value::Absent if declared > 0 && declared % width == 0 => declared,
        Value::Absent => width,
        Value::Enum(_) | Value::Number(_) => width,
        Value::Array(items) => items.len() * width,
        Value::String(s) => declared.max(s.len() + 1),
        Value::Bytes(b) => b.len(),
    };

    u8::try_from(size).map_err(|_| EncodeError::FieldSize {
        global,
        field,
        size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Field, FieldSource};

    fn field(number: u8, base_type: BaseType, value: Value) -> Field {
        Field {
            number,
            name: None,
            units: "",
            base_type,
            size: 0,
            raw: Value::Absent,
            value,
            source: FieldSource::Transmitted,
        }
    }

    #[test]
    fn identical_definitions_are_reused() {
        let mut encoder = Encoder::new(&Standard, EncodeOptions::default());
        let mut message = Message::new(0xFF00, None);
        message
            .fields
            .push(field(1, BaseType::UInt8, Value::Number(Number::Unsigned(1))));

        encoder.message(&message).unwrap();
        let first = encoder.records.len();
        encoder.message(&message).unwrap();

        // Definition (6 + 3 bytes) and data (2 bytes), then data only.
        assert_eq!(first, 11);
        assert_eq!(encoder.records.len(), 13);
        assert_eq!(encoder.records[0], 0x44);
        assert_eq!(encoder.records[11], 0x04);
    }

    #[test]
    fn compressed_messages_use_low_locals() {
        let mut encoder = Encoder::new(&Standard, EncodeOptions::default());
        let mut message = Message::new(20, Some("record"));
        message
            .fields
            .push(field(3, BaseType::UInt8, Value::Number(Number::Unsigned(60))));
        message.time_offset = Some(9);

        encoder.message(&message).unwrap();
        assert_eq!(encoder.records[0], 0x40);
        assert_eq!(
            RecordHeader::parse(encoder.records[9]),
            RecordHeader::CompressedData {
                local: 0,
                time_offset: 9
            }
        );
    }

    #[test]
    fn prepared_definitions_share_compressed_locals() {
        let mut normal = Message::new(20, Some("record"));
        normal
            .fields
            .push(field(3, BaseType::UInt8, Value::Number(Number::Unsigned(60))));
        let mut compressed = normal.clone();
        compressed.time_offset = Some(4);

        let mut encoder = Encoder::new(&Standard, EncodeOptions::default());
        encoder.prepare([&normal, &compressed]).unwrap();
        encoder.message(&normal).unwrap();
        encoder.message(&compressed).unwrap();

        // One definition, then a normal and a compressed record on local 0.
        assert_eq!(encoder.records.len(), 13);
        assert_eq!(encoder.records[0], 0x40);
        assert_eq!(encoder.records[9], 0x00);
        assert_eq!(
            RecordHeader::parse(encoder.records[11]),
            RecordHeader::CompressedData {
                local: 0,
                time_offset: 4
            }
        );
    }

    #[test]
    fn least_recently_used_locals_are_rebound() {
        let opaque = |global: u16| {
            let mut message = Message::new(global, None);
            message
                .fields
                .push(field(1, BaseType::UInt8, Value::Number(Number::Unsigned(1))));
            message
        };

        let mut encoder = Encoder::new(&Standard, EncodeOptions::default());
        for global in 0xFF00..0xFF0C {
            encoder.message(&opaque(global)).unwrap();
        }
        encoder.message(&opaque(0xFF00)).unwrap();
        encoder.message(&opaque(0xFF0C)).unwrap();

        let global = |local: usize| encoder.slots[local].as_ref().map(|d| d.global);
        assert_eq!(global(4), Some(0xFF00));
        assert_eq!(global(5), Some(0xFF0C));
        assert_eq!(global(6), Some(0xFF02));
    }

    #[test]
    fn values_are_unscaled() {
        let mut encoder = Encoder::new(&Standard, EncodeOptions::default());
        let mut message = Message::new(20, Some("record"));
        message
            .fields
            .push(field(2, BaseType::UInt16, Value::Number(Number::Float(100.0))));

        encoder.message(&message).unwrap();
        assert_eq!(&encoder.records[9..], &[0x04, 0xB8, 0x0B]);
    }

    #[test]
    fn component_fields_are_not_written() {
        let mut encoder = Encoder::new(&Standard, EncodeOptions::default());
        let mut message = Message::new(20, Some("record"));
        let mut component = field(19, BaseType::UInt32, Value::Number(Number::Unsigned(266)));
        component.source = FieldSource::Component { parent: 18 };
        message.fields.push(component);

        encoder.message(&message).unwrap();
        // Definition with no fields, then the bare record header.
        assert_eq!(encoder.records.len(), 7);
    }

    #[test]
    fn out_of_range_values_are_reported() {
        let mut encoder = Encoder::new(&Standard, EncodeOptions::default());
        let mut message = Message::new(20, Some("record"));
        message
            .fields
            .push(field(3, BaseType::UInt8, Value::Number(Number::Unsigned(300))));

        assert_eq!(
            encoder.message(&message),
            Err(EncodeError::Field {
                global: 20,
                field: 3,
                kind: ValueError::OutOfRange
            })
        );
    }

    #[test]
    fn strings_gain_a_terminator() {
        let mut encoder = Encoder::new(&Standard, EncodeOptions::default());
        let mut message = Message::new(0, Some("file_id"));
        message
            .fields
            .push(field(8, BaseType::String, Value::String("edge".into())));

        encoder.message(&message).unwrap();
        assert_eq!(&encoder.records[6..9], &[8, 5, 0x07]);
        assert_eq!(&encoder.records[10..], b"edge\0");
    }

    #[test]
    fn headers_carry_sizes_and_checksums() {
        let out = Encoder::new(&Standard, EncodeOptions::default())
            .finish(&FileHeader::default())
            .unwrap();

        assert_eq!(out.len(), 16);
        assert_eq!(out[0], 14);
        assert_eq!(&out[4..8], &[0, 0, 0, 0]);
        assert_eq!(&out[8..12], b".FIT");
        assert_eq!(
            u16::from_le_bytes([out[12], out[13]]),
            FileHeader::new(0).checksum()
        );
        assert_eq!(compute_crc(0, &out), 0);

        let out = Encoder::new(&Standard, EncodeOptions::default().with_header_crc(false))
            .finish(&FileHeader::default())
            .unwrap();
        assert_eq!(&out[12..14], &[0, 0]);
    }
}
