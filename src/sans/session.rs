//! Per-document decode state.
//!
//! A [`Session`] owns everything a data record needs beyond its own bytes: the
//! definitions bound to local message numbers, accumulated counters, the
//! timestamp behind compressed headers, and developer field descriptions.

use alloc::{collections::BTreeMap, string::String};

use thiserror::Error;

use super::{
    accumulate::Accumulators,
    data::BaseType,
    definition::{Definition, Registry},
    field::{DeveloperDescription, FieldDecoder, decode_developer},
    time::{self, Clock},
};
use crate::{
    config::DecodeOptions,
    message::Message,
    profile::{Profile, TIMESTAMP_FIELD, field_meta, message_meta},
    value::{Number, Value},
};

/// Global number of `field_description` messages.
pub const FIELD_DESCRIPTION: u16 = 206;

/// An error decoding a data record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Data record for a local message number with no definition.
    #[error("Data record for undefined local message type ({0}).")]
    UndefinedLocalType(u8),
    /// Compressed timestamp header before any absolute timestamp.
    #[error("Compressed timestamp without a preceding absolute timestamp.")]
    NoBaseTimestamp,
    /// Record bytes do not match the size of their definition.
    #[error("Data record of {found} bytes for a definition of {expected}.")]
    RecordSize { expected: usize, found: usize },
}

impl From<time::NoBaseTimestamp> for SessionError {
    fn from(_: time::NoBaseTimestamp) -> Self {
        Self::NoBaseTimestamp
    }
}

pub struct Session<'p, P: ?Sized> {
    profile: &'p P,
    options: DecodeOptions,
    registry: Registry,
    accumulators: Accumulators,
    clock: Clock,
    descriptions: BTreeMap<(u8, u8), DeveloperDescription>,
}

impl<'p, P: Profile + ?Sized> Session<'p, P> {
    pub fn new(profile: &'p P, options: DecodeOptions) -> Self {
        Self {
            profile,
            options,
            registry: Registry::new(),
            accumulators: Accumulators::new(),
            clock: Clock::new(),
            descriptions: BTreeMap::new(),
        }
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Bind a definition to a local message number.
    ///
    /// Counters accumulated under the number are forgotten when it is rebound.
    pub fn define(&mut self, local: u8, definition: Definition) {
        log::debug!(
            "Local message {local} bound to global {} ({} fields, {} developer)",
            definition.global,
            definition.fields.len(),
            definition.developer_fields.len()
        );

        if self.registry.define(local, definition).is_some() {
            log::debug!("Local message {local} redefined, resetting its accumulators");
            self.accumulators.invalidate(local);
        }
    }

    /// The definition bound to a local message number.
    pub fn definition(&self, local: u8) -> Result<&Definition, SessionError> {
        self.registry
            .get(local)
            .ok_or(SessionError::UndefinedLocalType(local))
    }

    /// Decode the bytes of a data record.
    ///
    /// `time_offset` is the offset carried by a compressed record header.
    pub fn data(
        &mut self,
        local: u8,
        time_offset: Option<u8>,
        r: &[u8],
    ) -> Result<Message, SessionError> {
        let Self {
            profile,
            options,
            registry,
            accumulators,
            clock,
            descriptions,
        } = self;
        let profile: &P = *profile;

        let definition = registry
            .get(local)
            .ok_or(SessionError::UndefinedLocalType(local))?;

        let expected = definition.data_size();
        if r.len() != expected {
            Err(SessionError::RecordSize {
                expected,
                found: r.len(),
            })?;
        }

        let global = definition.global;
        let meta = message_meta(profile, global);
        if meta.is_none() {
            log::trace!("Passing through unknown message {global}");
        }

        let mut message = Message::new(global, meta.map(|m| m.name));

        if let Some(offset) = time_offset {
            message.timestamp = Some(clock.expand(offset)?);
            message.time_offset = Some(offset);
        }

        let mut decoder = FieldDecoder {
            profile,
            accumulators,
            global,
            local,
            architecture: definition.architecture,
            expand_components: options.expand_components,
        };

        let mut r = r;

        for field in &definition.fields {
            let (bytes, rest) = r.split_at(field.size as usize);
            r = rest;

            if let Err(err) = decoder.decode(field.number, field.base_type, bytes, &mut message.fields)
            {
                log::warn!("Message {global}: {err}");
                message.errors.push(err);
            }
        }

        for field in &definition.developer_fields {
            let (bytes, rest) = r.split_at(field.size as usize);
            r = rest;

            let key = (field.developer_data_index, field.number);
            message.developer_fields.push(decode_developer(
                field.developer_data_index,
                field.number,
                descriptions.get(&key),
                definition.architecture,
                bytes,
            ));
        }

        let timestamp = message
            .fields
            .iter()
            .filter(|f| !f.is_component())
            .find(|f| match field_meta(profile, global, f.number) {
                Some(meta) => meta.timestamp,
                None => f.number == TIMESTAMP_FIELD && f.base_type == BaseType::UInt32,
            })
            .and_then(|f| match f.raw {
                Value::Number(Number::Unsigned(u)) => u32::try_from(u).ok(),
                _ => None,
            });

        if let Some(timestamp) = timestamp {
            clock.observe(timestamp);
            message.timestamp = Some(timestamp);
        }

        if global == FIELD_DESCRIPTION {
            describe(descriptions, &message);
        }

        log::trace!(
            "Decoded message {global} with {} fields",
            message.fields.len() + message.developer_fields.len()
        );

        Ok(message)
    }
}

/// Record what a `field_description` message declares.
fn describe(descriptions: &mut BTreeMap<(u8, u8), DeveloperDescription>, message: &Message) {
    let raw = |n| message.field(n).map(|f| &f.raw);

    let (Some(index), Some(number), Some(base_type)) = (
        raw(0).and_then(Value::get::<u8>),
        raw(1).and_then(Value::get::<u8>),
        raw(2).and_then(Value::get::<u8>),
    ) else {
        log::warn!("Incomplete developer field description");
        return;
    };

    let Some(base_type) = BaseType::from_byte(base_type) else {
        log::warn!("Developer field {index}:{number} has unknown base type {base_type:#04x}");
        return;
    };

    let description = DeveloperDescription {
        base_type,
        name: raw(3).and_then(Value::get::<String>),
        units: raw(8).and_then(Value::get::<String>),
        scale: raw(6)
            .and_then(Value::get::<f64>)
            .filter(|s| *s != 0.0)
            .unwrap_or(1.0),
        offset: raw(7).and_then(Value::get::<f64>).unwrap_or(0.0),
    };

    log::debug!(
        "Developer field {index}:{number} described as {:?}",
        description.name
    );
    descriptions.insert((index, number), description);
}
