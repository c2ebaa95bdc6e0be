//! Definition records and the registry binding local message numbers.

use alloc::vec::Vec;

use thiserror::Error;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use super::header::RecordHeader;

/// Number of local message slots.
pub const LOCAL_MESSAGES: usize = 16;

/// An error decoding a definition record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    /// Architecture byte is neither little (0) nor big (1) endian.
    #[error("Unknown architecture ({0}).")]
    UnknownArchitecture(u8),
}

/// Byte order of multi-byte values in data records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Architecture {
    #[default]
    Little,
    Big,
}

impl Architecture {
    fn to_byte(self) -> u8 {
        match self {
            Self::Little => 0,
            Self::Big => 1,
        }
    }
}

#[repr(C)]
#[derive(Debug, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
struct DefinitionMessage {
    _reserved: u8,
    architecture: u8,
    global_message: [u8; 2],
    fields: u8,
}

#[repr(C)]
#[derive(Debug, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
struct FieldHeader {
    field: u8,
    size: u8,
    base_type: u8,
}

/// The fixed part of a definition record, before its field definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefinitionHeader {
    pub global: u16,
    pub architecture: Architecture,
    /// Number of field definitions that follow.
    pub fields: u8,
}

impl DefinitionHeader {
    /// Decode the five bytes following a definition record header.
    pub fn parse(r: [u8; 5]) -> Result<Self, DefinitionError> {
        let DefinitionMessage {
            architecture,
            global_message,
            fields,
            ..
        } = zerocopy::transmute!(r);

        let (architecture, global) = match architecture {
            0 => (Architecture::Little, u16::from_le_bytes(global_message)),
            1 => (Architecture::Big, u16::from_be_bytes(global_message)),
            other => Err(DefinitionError::UnknownArchitecture(other))?,
        };

        Ok(Self {
            global,
            architecture,
            fields,
        })
    }
}

/// Layout of one field in a data record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDefinition {
    pub number: u8,
    /// Size in bytes, a multiple of the base type width for arrays.
    pub size: u8,
    /// The base type byte as transmitted.
    pub base_type: u8,
}

impl FieldDefinition {
    pub fn parse(r: [u8; 3]) -> Self {
        let FieldHeader {
            field,
            size,
            base_type,
        } = zerocopy::transmute!(r);

        Self {
            number: field,
            size,
            base_type,
        }
    }

    fn encode(&self, out: &mut Vec<u8>) {
        let header = FieldHeader {
            field: self.number,
            size: self.size,
            base_type: self.base_type,
        };
        out.extend_from_slice(header.as_bytes());
    }
}

/// Layout of one developer field in a data record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeveloperFieldDefinition {
    pub number: u8,
    pub size: u8,
    pub developer_data_index: u8,
}

impl DeveloperFieldDefinition {
    pub fn parse(r: [u8; 3]) -> Self {
        let [number, size, developer_data_index] = r;
        Self {
            number,
            size,
            developer_data_index,
        }
    }
}

/// A decoded definition record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Definition {
    pub global: u16,
    pub architecture: Architecture,
    pub fields: Vec<FieldDefinition>,
    pub developer_fields: Vec<DeveloperFieldDefinition>,
}

impl Definition {
    pub fn new(header: DefinitionHeader) -> Self {
        Self {
            global: header.global,
            architecture: header.architecture,
            fields: Vec::with_capacity(header.fields as usize),
            developer_fields: Vec::new(),
        }
    }

    /// Number of bytes in a data record following this definition.
    pub fn data_size(&self) -> usize {
        let fields = self.fields.iter().map(|f| f.size as usize);
        let developer = self.developer_fields.iter().map(|f| f.size as usize);
        fields.chain(developer).sum()
    }

    /// Append a complete definition record, header byte included.
    pub fn encode(&self, local: u8, out: &mut Vec<u8>) {
        let developer = !self.developer_fields.is_empty();
        out.push(RecordHeader::Definition { local, developer }.to_byte());

        let global_message = match self.architecture {
            Architecture::Little => self.global.to_le_bytes(),
            Architecture::Big => self.global.to_be_bytes(),
        };
        let message = DefinitionMessage {
            _reserved: 0,
            architecture: self.architecture.to_byte(),
            global_message,
            fields: self.fields.len() as u8,
        };
        out.extend_from_slice(message.as_bytes());

        for field in &self.fields {
            field.encode(out);
        }

        if developer {
            out.push(self.developer_fields.len() as u8);
            for field in &self.developer_fields {
                out.extend_from_slice(&[field.number, field.size, field.developer_data_index]);
            }
        }
    }
}

/// Definitions bound to each local message number.
#[derive(Debug, Default)]
pub struct Registry {
    slots: [Option<Definition>; LOCAL_MESSAGES],
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a definition to a local message number, returning the one it replaces.
    pub fn define(&mut self, local: u8, definition: Definition) -> Option<Definition> {
        self.slots[local as usize % LOCAL_MESSAGES].replace(definition)
    }

    /// The definition currently bound to a local message number.
    pub fn get(&self, local: u8) -> Option<&Definition> {
        self.slots[local as usize % LOCAL_MESSAGES].as_ref()
    }
}
