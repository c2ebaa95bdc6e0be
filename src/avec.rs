//! Convenience interfaces for common decoding and encoding patterns.
//!
//! The functions in this module decode whole documents from data slices and
//! readers into a [`File`](crate::File), stream messages one at a time with a
//! [`Stream`], and encode a [`File`](crate::File) back to bytes.
//!
//! Decoded documents can be published to the [`FromMessages`] and
//! [`FromMessage`] traits. In many cases (when messages are of a known shape),
//! these traits can be derived. See the [`FromMessages`](macro@FromMessages)
//! and [`FromMessage`](macro@FromMessage) macros for details.

use alloc::{string::String, vec::Vec};

use thiserror::Error;

use crate::{
    message::Field,
    sans::{
        definition::DefinitionError,
        header::HeaderError,
        session::SessionError,
    },
    value::{Number, Value},
};

pub mod encoder;
#[cfg(feature = "std")]
pub mod reader;
pub mod slice;
pub mod stream;

pub use encoder::{EncodeError, Encoder, encode};
#[cfg(feature = "std")]
pub use reader::{IoSource, decode as decode_reader};
pub use slice::decode as decode_slice;
pub use stream::Stream;

/// Errors ending a decode.
#[derive(Debug, Error)]
pub enum Error {
    /// Unexpectedly reached the end of the input.
    #[error("Unexpectedly reached the end of the input.")]
    UnexpectedEof,
    /// An error from the supplied reader.
    #[cfg(feature = "std")]
    #[error(transparent)]
    Io(std::io::Error),
    /// Incorrect file header.
    #[error("Incorrect file header: {0}")]
    Header(HeaderError),
    /// Calculated and found header CRC values do not match.
    #[error("Calculated ({calculated}) and found ({found}) header CRC values do not match.")]
    HeaderChecksum { found: u16, calculated: u16 },
    /// Incorrect definition record.
    #[error("Incorrect definition record: {0}")]
    Definition(#[from] DefinitionError),
    /// Data record for a local message number with no definition.
    #[error("Data record for undefined local message type ({0}).")]
    UndefinedLocalType(u8),
    /// Compressed timestamp header before any absolute timestamp.
    #[error("Compressed timestamp without a preceding absolute timestamp.")]
    NoBaseTimestamp,
    /// Records do not end where the header's data size says.
    #[error("Records do not end at the declared data size.")]
    DataSize,
    /// Calculated and found CRC values do not match.
    #[error("Calculated ({calculated}) and found ({found}) CRC values do not match.")]
    CyclicRedundancyCheck { found: u16, calculated: u16 },
    /// First message is not `file_id`.
    #[error("First message is not a file identification message.")]
    MissingFileId,
}

impl From<HeaderError> for Error {
    fn from(err: HeaderError) -> Self {
        match err {
            HeaderError::ChecksumMismatch { found, calculated } => {
                Self::HeaderChecksum { found, calculated }
            }
            err => Self::Header(err),
        }
    }
}

impl From<SessionError> for Error {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::UndefinedLocalType(local) => Self::UndefinedLocalType(local),
            SessionError::NoBaseTimestamp => Self::NoBaseTimestamp,
            SessionError::RecordSize { .. } => Self::DataSize,
        }
    }
}

/// A supply of document bytes.
pub trait Source {
    /// Fill `buf` entirely, or fail with [`Error::UnexpectedEof`].
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), Error>;
}

impl<'a> Source for &'a [u8] {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        let r: &'a [u8] = *self;
        let (head, tail) = r.split_at_checked(buf.len()).ok_or(Error::UnexpectedEof)?;
        buf.copy_from_slice(head);
        *self = tail;
        Ok(())
    }
}

/// Derive [`FromMessages`] for a struct holding a collection of messages.
///
/// _Requires Cargo feature `derive`._
///
/// # Example
///
/// To collect a single message, add the `message(N)` attribute to an
/// `Option<T>` struct field, where `N` is the global message number and `T`
/// is a type implementing [`FromMessage`] and [`Default`]. Additional messages
/// received for the same number will overwrite earlier ones. To collect
/// multiple occurrences of a message, apply the attribute to a `Vec<T>`
/// instead.
///
/// ```
/// #[derive(Debug, Default, FromMessages)]
/// struct Activity {
///     #[message(0)]
///     file_id: Option<FileId>,
///     #[message(20)]
///     records: Vec<Record>,
/// }
/// ```
#[cfg(feature = "derive")]
pub use sprocket_derive::FromMessages;

/// Produce message receivers for a document.
///
/// See the [`FromMessages`](macro@FromMessages) derive macro for an automatic
/// implementation of this trait.
pub trait FromMessages {
    /// Retrieve a receiver for a message, if one exists.
    fn add_message(&mut self, global: u16) -> Option<&mut dyn FromMessage>;
}

/// Derive [`FromMessage`] for a struct representing a single message.
///
/// _Requires Cargo feature `derive`._
///
/// # Examples
///
/// To receive a field, add the `field(N)` attribute to an `Option<T>` struct
/// field, where `N` is the field number and `T` implements [`FromValue`].
/// Values are scaled before conversion, so a scaled field is best received
/// as `f64`. Values that do not convert are skipped.
///
/// To receive the message's absolute timestamp, including those expanded
/// from compressed headers, supply `time` in place of a field number.
///
/// ```
/// #[derive(Debug, Default, FromMessage)]
/// struct Record {
///     #[field(time)]
///     timestamp: Option<u32>,
///     #[field(0)]
///     position_lat: Option<i32>,
///     #[field(2)]
///     altitude: Option<f64>,
/// }
/// ```
///
/// For anything else, supply an accumulator closure. Since the value type
/// cannot be inferred, the second argument must be typed.
///
/// ```
/// #[derive(Debug, Default, FromMessage)]
/// struct Hrv {
///     #[field(0, |v, t: Vec<Option<f64>>| v.extend(t.into_iter().flatten()))]
///     intervals: Vec<f64>,
/// }
/// ```
#[cfg(feature = "derive")]
pub use sprocket_derive::FromMessage;

/// Receive field values for a message.
///
/// Absent fields are never published. The default implementation of each
/// method ignores received values.
///
/// See the [`FromMessage`](macro@FromMessage) derive macro for an automatic
/// implementation of this trait.
#[allow(unused_variables)]
pub trait FromMessage {
    /// Add the message's absolute timestamp.
    fn add_timestamp(&mut self, timestamp: u32) {}
    /// Add a decoded field.
    fn add_field(&mut self, field: &Field) {}
}

/// Conversion from a decoded [`Value`] to a Rust type.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! from_integer {
    ($($t:ty => $as:ident;)*) => {
        $(impl FromValue for $t {
            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::Enum(e) => Self::try_from(*e).ok(),
                    Value::Number(n) => n.$as().and_then(|n| Self::try_from(n).ok()),
                    _ => None,
                }
            }
        })*
    };
}

from_integer! {
    u8 => as_u64;
    u16 => as_u64;
    u32 => as_u64;
    u64 => as_u64;
    i8 => as_i64;
    i16 => as_i64;
    i32 => as_i64;
    i64 => as_i64;
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64().map(|f| f as f32)
    }
}

impl FromValue for Number {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(*n),
            Value::Enum(e) => Some(Number::Unsigned(*e as u64)),
            _ => None,
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bytes(b) => Some(b.clone()),
            _ => None,
        }
    }
}

impl FromValue for Vec<Option<f64>> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Absent | Value::String(_) | Value::Bytes(_) => None,
            _ => Some(value.elements().map(|n| n.map(|n| n.as_f64())).collect()),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}
