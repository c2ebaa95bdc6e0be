//! Reader-based decoder implementation.
//!
//! _Requires Cargo feature `std`._

use std::io::{self, Read};

use alloc::vec::Vec;

use super::{Error, Source, Stream};
use crate::{
    config::DecodeOptions,
    message::File,
    profile::{Profile, Standard},
};

/// A [`Source`] over an [`io::Read`] implementation.
///
/// Reads are passed straight through, so wrap unbuffered readers (such as
/// files) in a [`std::io::BufReader`].
#[derive(Debug)]
pub struct IoSource<R>(pub R);

impl<R: Read> Source for IoSource<R> {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        self.0.read_exact(buf).map_err(|err| match err.kind() {
            io::ErrorKind::UnexpectedEof => Error::UnexpectedEof,
            _ => Error::Io(err),
        })
    }
}

/// Decode a document from a reader with the standard profile and default
/// options.
///
/// This method is also re-exported as `sprocket::avec::decode_reader`.
///
/// _Requires Cargo feature `std`._
pub fn decode(r: &mut impl Read) -> Result<File, Error> {
    decode_with(r, &Standard, DecodeOptions::default())
}

/// Decode a document from a reader.
pub fn decode_with<P: Profile + ?Sized>(
    r: &mut impl Read,
    profile: &P,
    options: DecodeOptions,
) -> Result<File, Error> {
    let stream = Stream::new(IoSource(r), profile, options)?;
    let header = *stream.header();

    let messages = stream.collect::<Result<Vec<_>, _>>()?;

    Ok(File { header, messages })
}
