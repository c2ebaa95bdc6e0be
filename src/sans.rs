//! Internal engine for implementing decoders and encoders.
//!
//! This module holds no byte source. Applications needing fine control over
//! reading (for example on embedded systems, or when records arrive over a
//! link) can drive it directly; see [`crate::avec`] for implementations
//! covering common patterns.
//!
//! # Architecture
//!
//! Decoding a document header is a chain of state tokens. Begin with
//! [`Decoder`], and once enough bytes are ready transition to a successor by
//! calling the token's `advance` method. The length byte selects between the
//! 12- and 14-byte layouts; the final state yields a validated
//! [`header::FileHeader`].
//!
//! Records then follow until the header's data size is consumed. Each begins
//! with one byte classified by [`header::RecordHeader::parse`]:
//!
//! - A definition record is five bytes decoded by
//! [`definition::DefinitionHeader::parse`], then three bytes per field, then
//! (when flagged) a count and three bytes per developer field. Bind the
//! result with [`session::Session::define`].
//!
//! - A data record is [`definition::Definition::data_size`] bytes, decoded by
//! [`session::Session::data`] into a [`crate::Message`].
//!
//! Some areas of the decoding process are left to the implementation:
//!
//! - Reading bytes from the correct place in the document, including buffering
//! as necessary.
//!
//! - Ending decoding once the specified number of document bytes have been
//! read.
//!
//! - Applying cyclic redundancy checks. A running [`check::Crc`] is provided.

pub mod accumulate;
pub mod check;
pub mod data;
pub mod definition;
pub mod field;
pub mod header;
pub mod session;
pub mod time;

/// Entrypoint to the header states.
pub type Decoder = header::HeaderStart;
