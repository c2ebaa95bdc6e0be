//! Streaming decoder yielding one message at a time.

use alloc::{vec, vec::Vec};

use either::Either::{Left, Right};

use super::{Error, Source};
use crate::{
    config::DecodeOptions,
    message::Message,
    profile::{Profile, Standard},
    sans::{
        Decoder,
        check::Crc,
        definition::{Definition, DefinitionHeader, DeveloperFieldDefinition, FieldDefinition},
        header::{FileHeader, RecordHeader},
        session::Session,
    },
};

/// Global number of `file_id` messages.
const FILE_ID: u16 = 0;

/// A decoder reading records from a [`Source`] on demand.
///
/// The trailing CRC is read and checked after the last record, so a stream
/// only reports a corrupt document once it has been read to the end. A stream
/// yields nothing further after an error.
pub struct Stream<'p, S, P: ?Sized = Standard> {
    source: S,
    session: Session<'p, P>,
    header: FileHeader,
    crc: Crc,
    /// Document bytes read, header included.
    consumed: usize,
    /// Offset to the end of the record section.
    end: usize,
    messages: usize,
    done: bool,
}

impl<'p, S: Source, P: Profile + ?Sized> Stream<'p, S, P> {
    /// Read and validate the document header.
    pub fn new(mut source: S, profile: &'p P, options: DecodeOptions) -> Result<Self, Error> {
        let mut crc = Crc::new();
        let header = read_header(&mut source, &mut crc)?;

        log::debug!(
            "Accepted {}-byte header: protocol {:#04x}, profile {}, {} record bytes",
            header.size,
            header.protocol_version,
            header.profile_version,
            header.data_size
        );

        let consumed = header.size as usize;

        Ok(Self {
            source,
            session: Session::new(profile, options),
            header,
            crc,
            consumed,
            end: consumed + header.data_size as usize,
            messages: 0,
            done: false,
        })
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Decode records up to and including the next data record.
    ///
    /// Returns `None` once the trailing CRC has been read and verified.
    pub fn next_message(&mut self) -> Result<Option<Message>, Error> {
        if self.done {
            return Ok(None);
        }

        let result = self.advance();
        if !matches!(result, Ok(Some(_))) {
            self.done = true;
        }
        result
    }

    fn advance(&mut self) -> Result<Option<Message>, Error> {
        while self.consumed < self.end {
            let [byte] = self.take()?;
            let header = RecordHeader::parse(byte);
            log::trace!("Record header {byte:#04x}: {header:?}");

            let message = match header {
                RecordHeader::Definition { local, developer } => {
                    self.definition(local, developer)?;
                    continue;
                }
                RecordHeader::Data { local } => self.data(local, None)?,
                RecordHeader::CompressedData { local, time_offset } => {
                    self.data(local, Some(time_offset))?
                }
            };

            return Ok(Some(message));
        }

        self.finish()?;
        Ok(None)
    }

    fn definition(&mut self, local: u8, developer: bool) -> Result<(), Error> {
        let header = DefinitionHeader::parse(self.take()?)?;
        let mut definition = Definition::new(header);

        for _ in 0..header.fields {
            definition.fields.push(FieldDefinition::parse(self.take()?));
        }

        if developer {
            let [count] = self.take()?;
            for _ in 0..count {
                let field = DeveloperFieldDefinition::parse(self.take()?);
                definition.developer_fields.push(field);
            }
        }

        self.session.define(local, definition);
        Ok(())
    }

    fn data(&mut self, local: u8, time_offset: Option<u8>) -> Result<Message, Error> {
        let size = self.session.definition(local)?.data_size();
        let r = self.take_vec(size)?;
        let message = self.session.data(local, time_offset, &r)?;

        if self.messages == 0 && self.session.options().require_file_id && message.global != FILE_ID
        {
            Err(Error::MissingFileId)?;
        }

        self.messages += 1;
        Ok(message)
    }

    /// Check the record section ends where declared, then the trailing CRC.
    fn finish(&mut self) -> Result<(), Error> {
        if self.consumed != self.end {
            Err(Error::DataSize)?;
        }

        let calculated = self.crc.value();
        let mut r = [0; 2];
        self.source.read_exact(&mut r)?;
        let found = u16::from_le_bytes(r);

        if self.session.options().verify_checksum && found != calculated {
            Err(Error::CyclicRedundancyCheck { found, calculated })?;
        }

        log::info!(
            "Decoded {} messages from {} record bytes",
            self.messages,
            self.header.data_size
        );

        Ok(())
    }

    /// Take an exact number of document bytes, accumulating the CRC.
    fn take<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let mut buf = [0; N];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    fn take_vec(&mut self, n: usize) -> Result<Vec<u8>, Error> {
        let mut buf = vec![0; n];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        self.source.read_exact(buf)?;
        self.crc.update(buf);
        self.consumed += buf.len();
        Ok(())
    }
}

/// Read and validate a document header, accumulating its bytes into `crc`.
pub(super) fn read_header<S: Source>(source: &mut S, crc: &mut Crc) -> Result<FileHeader, Error> {
    let mut take = |buf: &mut [u8]| -> Result<(), Error> {
        source.read_exact(buf)?;
        crc.update(buf);
        Ok(())
    };

    let mut size = [0; 1];
    take(&mut size)?;

    Ok(match Decoder::advance(size)? {
        Left(state) => {
            let mut r = [0; 11];
            take(&mut r)?;
            state.advance(r)?
        }
        Right(state) => {
            let mut r = [0; 13];
            take(&mut r)?;
            state.advance(r)?
        }
    })
}

impl<S: Source, P: Profile + ?Sized> Iterator for Stream<'_, S, P> {
    type Item = Result<Message, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_message().transpose()
    }
}
