//! Slice-based decoder implementation.

use alloc::vec::Vec;

use super::{Error, Stream, stream::read_header};
use crate::{
    config::DecodeOptions,
    message::File,
    profile::{Profile, Standard},
    sans::{check::Crc, header::FileHeader},
};

/// Decode a document from a slice with the standard profile and default
/// options.
///
/// This method is also re-exported as `sprocket::avec::decode_slice`.
pub fn decode(r: &[u8]) -> Result<File, Error> {
    decode_with(r, &Standard, DecodeOptions::default())
}

/// Decode a document from a slice.
pub fn decode_with<P: Profile + ?Sized>(
    r: &[u8],
    profile: &P,
    options: DecodeOptions,
) -> Result<File, Error> {
    let stream = Stream::new(r, profile, options)?;
    let header = *stream.header();

    let messages = stream.collect::<Result<Vec<_>, _>>()?;

    Ok(File { header, messages })
}

/// Decode and validate only the header at the start of a slice.
pub fn header(mut r: &[u8]) -> Result<FileHeader, Error> {
    read_header(&mut r, &mut Crc::new())
}
