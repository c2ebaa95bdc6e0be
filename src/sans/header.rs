//! States processing document and record headers.

use alloc::vec::Vec;

use either::Either::{self, Left, Right};
use tartan_bitfield::bitfield;
use thiserror::Error;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned, little_endian};

use super::check::Crc;

/// Highest protocol version understood, major version in the top nibble.
pub const PROTOCOL_VERSION: u8 = 0x10;

/// Default profile version written by the encoder (21.32).
pub const PROFILE_VERSION: u16 = 2132;

/// The filetype marker every document carries.
pub const DATA_TYPE: [u8; 4] = *b".FIT";

/// An error advancing over a document header.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HeaderError {
    /// Unknown header length.
    #[error("Unknown header length ({0}).")]
    InvalidSize(u8),
    /// Protocol major version newer than supported.
    #[error("Protocol version {}.x is not supported (up to {}.x).", .0 >> 4, PROTOCOL_VERSION >> 4)]
    UnsupportedProtocolVersion(u8),
    /// Incorrect filetype marker.
    #[error("Incorrect file type marker.")]
    NotFitData,
    /// Calculated and found header CRC values do not match.
    #[error("Calculated ({calculated}) and found ({found}) header CRC values do not match.")]
    ChecksumMismatch { found: u16, calculated: u16 },
}

/// A validated document header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileHeader {
    /// Header length in bytes, 12 or 14.
    pub size: u8,
    pub protocol_version: u8,
    pub profile_version: u16,
    /// Number of record bytes between the header and the trailing CRC.
    pub data_size: u32,
    pub data_type: [u8; 4],
    /// Header CRC, zero when absent or unset.
    pub crc: u16,
}

#[repr(C)]
#[derive(FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
struct HeaderBody {
    protocol_version: u8,
    profile_version: little_endian::U16,
    data_size: little_endian::U32,
    data_type: [u8; 4],
}

#[repr(C)]
#[derive(FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
struct ExtendedHeaderBody {
    body: HeaderBody,
    crc: little_endian::U16,
}

impl FileHeader {
    /// A 14-byte header for a document of `data_size` record bytes.
    pub fn new(data_size: u32) -> Self {
        Self {
            size: 14,
            protocol_version: PROTOCOL_VERSION,
            profile_version: PROFILE_VERSION,
            data_size,
            data_type: DATA_TYPE,
            crc: 0,
        }
    }

    fn from_body(size: u8, body: HeaderBody, crc: u16) -> Result<Self, HeaderError> {
        let HeaderBody {
            protocol_version,
            profile_version,
            data_size,
            data_type,
        } = body;

        if protocol_version >> 4 > PROTOCOL_VERSION >> 4 {
            Err(HeaderError::UnsupportedProtocolVersion(protocol_version))?;
        }

        if data_type != DATA_TYPE {
            Err(HeaderError::NotFitData)?;
        }

        Ok(Self {
            size,
            protocol_version,
            profile_version: profile_version.get(),
            data_size: data_size.get(),
            data_type,
            crc,
        })
    }

    fn body(&self) -> HeaderBody {
        HeaderBody {
            protocol_version: self.protocol_version,
            profile_version: little_endian::U16::new(self.profile_version),
            data_size: little_endian::U32::new(self.data_size),
            data_type: self.data_type,
        }
    }

    /// Compute the CRC over the first twelve header bytes.
    pub fn checksum(&self) -> u16 {
        Crc::new()
            .update(&[self.size])
            .update(self.body().as_bytes())
            .value()
    }

    /// Append the header bytes, writing `crc` as stored for 14-byte headers.
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.size);
        out.extend_from_slice(self.body().as_bytes());
        if self.size == 14 {
            out.extend_from_slice(&self.crc.to_le_bytes());
        }
    }
}

/// State token to decode the header length byte.
#[derive(Debug)]
pub struct HeaderStart;

impl HeaderStart {
    /// Transition to another state by decoding the header length byte.
    ///
    /// Returns a successor state token expecting the remaining header bytes.
    pub fn advance(r: [u8; 1]) -> Result<Either<ShortHeader, LongHeader>, HeaderError> {
        match r[0] {
            12 => Ok(Left(ShortHeader(()))),
            14 => Ok(Right(LongHeader(()))),
            size => Err(HeaderError::InvalidSize(size)),
        }
    }
}

/// State token to decode the remainder of a 12-byte header.
#[derive(Debug)]
pub struct ShortHeader(pub(super) ());

impl ShortHeader {
    /// Decode the bytes following the length byte.
    pub fn advance(self, r: [u8; 11]) -> Result<FileHeader, HeaderError> {
        let body: HeaderBody = zerocopy::transmute!(r);
        FileHeader::from_body(12, body, 0)
    }
}

/// State token to decode the remainder of a 14-byte header.
#[derive(Debug)]
pub struct LongHeader(pub(super) ());

impl LongHeader {
    /// Decode the bytes following the length byte, verifying a non-zero CRC.
    pub fn advance(self, r: [u8; 13]) -> Result<FileHeader, HeaderError> {
        let ExtendedHeaderBody { body, crc } = zerocopy::transmute!(r);
        let header = FileHeader::from_body(14, body, crc.get())?;

        if header.crc != 0 {
            let calculated = header.checksum();
            if calculated != header.crc {
                Err(HeaderError::ChecksumMismatch {
                    found: header.crc,
                    calculated,
                })?;
            }
        }

        Ok(header)
    }
}

/// A classified record header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordHeader {
    /// A definition record, optionally followed by developer field definitions.
    Definition { local: u8, developer: bool },
    /// A data record.
    Data { local: u8 },
    /// A data record carrying a compressed time offset.
    CompressedData { local: u8, time_offset: u8 },
}

bitfield! {
    struct NormalHeader(u8) {
        [0..4] local_message: u8,
        [5] is_developer,
        [6] is_definition,
    }
}

bitfield! {
    struct CompressedHeader(u8) {
        [0..5] time_offset: u8,
        [5..7] local_message: u8,
        [7] is_compressed,
    }
}

impl RecordHeader {
    /// Classify a record header byte.
    pub fn parse(r: u8) -> Self {
        let header = CompressedHeader(r);

        if header.is_compressed() {
            Self::CompressedData {
                local: header.local_message(),
                time_offset: header.time_offset(),
            }
        } else {
            let header = NormalHeader(r);
            let local = header.local_message();

            if header.is_definition() {
                Self::Definition {
                    local,
                    developer: header.is_developer(),
                }
            } else {
                Self::Data { local }
            }
        }
    }

    /// Encode to a record header byte.
    pub fn to_byte(self) -> u8 {
        match self {
            Self::Definition { local, developer } => {
                let mut header = NormalHeader(0);
                header.set_local_message(local);
                header.set_is_developer(developer);
                header.set_is_definition(true);
                header.0
            }
            Self::Data { local } => {
                let mut header = NormalHeader(0);
                header.set_local_message(local);
                header.0
            }
            Self::CompressedData { local, time_offset } => {
                let mut header = CompressedHeader(0);
                header.set_time_offset(time_offset);
                header.set_local_message(local);
                header.set_is_compressed(true);
                header.0
            }
        }
    }
}
