#![allow(dead_code)]

use sprocket::{
    profile::{FieldMeta, MessageMeta, Profile, field},
    sans::{check::compute_crc, data::BaseType},
};

static COUNTER_FIELDS: &[FieldMeta] = &[
    field(253, "timestamp", BaseType::UInt32).timestamp(),
    field(19, "total_cycles", BaseType::UInt32).accumulated(),
];

static COUNTER: MessageMeta = MessageMeta {
    number: 20,
    name: "record",
    fields: COUNTER_FIELDS,
};

/// A profile whose records transmit `total_cycles` truncated.
pub struct Counters;

impl Profile for Counters {
    fn message(&self, global: u16) -> Option<&MessageMeta> {
        (global == 20).then_some(&COUNTER)
    }
}

/// Assembles document bytes record by record.
#[derive(Debug, Default)]
pub struct Builder {
    records: Vec<u8>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A little-endian definition of `(number, size, base type)` fields.
    pub fn definition(self, local: u8, global: u16, fields: &[(u8, u8, u8)]) -> Self {
        self.definition_with(local, 0, global.to_le_bytes(), fields, &[])
    }

    pub fn big_endian_definition(self, local: u8, global: u16, fields: &[(u8, u8, u8)]) -> Self {
        self.definition_with(local, 1, global.to_be_bytes(), fields, &[])
    }

    /// A definition with `(number, size, developer data index)` developer fields.
    pub fn developer_definition(
        self,
        local: u8,
        global: u16,
        fields: &[(u8, u8, u8)],
        developer: &[(u8, u8, u8)],
    ) -> Self {
        self.definition_with(local, 0, global.to_le_bytes(), fields, developer)
    }

    fn definition_with(
        mut self,
        local: u8,
        architecture: u8,
        global: [u8; 2],
        fields: &[(u8, u8, u8)],
        developer: &[(u8, u8, u8)],
    ) -> Self {
        let flag = if developer.is_empty() { 0x40 } else { 0x60 };
        self.records.push(flag | local);
        self.records
            .extend_from_slice(&[0, architecture, global[0], global[1], fields.len() as u8]);

        for &(number, size, base_type) in fields {
            self.records.extend_from_slice(&[number, size, base_type]);
        }

        if !developer.is_empty() {
            self.records.push(developer.len() as u8);
            for &(number, size, index) in developer {
                self.records.extend_from_slice(&[number, size, index]);
            }
        }

        self
    }

    pub fn data(mut self, local: u8, bytes: &[u8]) -> Self {
        self.records.push(local);
        self.records.extend_from_slice(bytes);
        self
    }

    pub fn compressed(mut self, local: u8, offset: u8, bytes: &[u8]) -> Self {
        self.records.push(0x80 | (local << 5) | offset);
        self.records.extend_from_slice(bytes);
        self
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.records.extend_from_slice(bytes);
        self
    }

    /// A document with a 14-byte header (CRC unset) and a valid trailing CRC.
    pub fn build(&self) -> Vec<u8> {
        self.build_with_size(self.records.len() as u32)
    }

    /// As [`Builder::build`], declaring an arbitrary data size.
    pub fn build_with_size(&self, data_size: u32) -> Vec<u8> {
        let mut out = header(14, 0x10, data_size, *b".FIT", 0);
        out.extend_from_slice(&self.records);
        let crc = compute_crc(0, &out);
        out.extend_from_slice(&crc.to_le_bytes());
        out
    }
}

/// Header bytes with the given fields; `size` 12 omits the CRC.
pub fn header(size: u8, protocol: u8, data_size: u32, data_type: [u8; 4], crc: u16) -> Vec<u8> {
    let mut out = vec![size, protocol];
    out.extend_from_slice(&2132u16.to_le_bytes());
    out.extend_from_slice(&data_size.to_le_bytes());
    out.extend_from_slice(&data_type);
    if size == 14 {
        out.extend_from_slice(&crc.to_le_bytes());
    }
    out
}

/// A `file_id` definition on local 0 and its data record.
pub fn file_id(builder: Builder) -> Builder {
    builder
        .definition(0, 0, &[(0, 1, 0x00), (1, 2, 0x84), (2, 2, 0x84)])
        .data(0, &[4, 1, 0, 0x89, 0x0A])
}

/// A small activity: records (one compressed), an event, an unknown message
/// and a session.
pub fn activity() -> Builder {
    file_id(Builder::new())
        .definition(
            1,
            20,
            &[(253, 4, 0x86), (2, 2, 0x84), (3, 1, 0x02), (6, 2, 0x84), (18, 1, 0x02)],
        )
        .data(1, &[0x00, 0xCA, 0x9A, 0x3B, 0xB8, 0x0B, 140, 0xC4, 0x09, 250])
        .data(1, &[0x01, 0xCA, 0x9A, 0x3B, 0xBD, 0x0B, 141, 0x28, 0x0A, 10])
        .definition(2, 20, &[(3, 1, 0x02)])
        .compressed(2, 6, &[150])
        .definition(3, 21, &[(253, 4, 0x86), (0, 1, 0x00), (1, 1, 0x00)])
        .data(3, &[0x0A, 0xCA, 0x9A, 0x3B, 0, 4])
        .definition(4, 0xFF00, &[(1, 4, 0x02)])
        .data(4, &[0xFF, 5, 0xFF, 0xFF])
        .definition(
            5,
            18,
            &[(253, 4, 0x86), (7, 4, 0x86), (9, 4, 0x86), (14, 2, 0x84), (16, 1, 0x02)],
        )
        .data(
            5,
            &[
                0x14, 0xCA, 0x9A, 0x3B, 0x20, 0x4E, 0, 0, 0xF0, 0x49, 0x02, 0, 0xF6, 0x09, 145,
            ],
        )
}
