#![no_std]

//! A decoder and encoder for Garmin's Flexible and Interoperable Data
//! Transfer protocol.
//!
//! Sprocket turns FIT documents into ordered, profile-scaled [`Message`]s and
//! back. It provides a set of ergonomic interfaces for common decoding
//! patterns, and exposes its underlying engine for applications needing finer
//! control over internals (such as those running on embedded systems).
//!
//! Most users should begin with the functions and derive macros in the [`avec`]
//! module. If these prove insufficient, consider implementing a decoder as
//! described in the [`sans`] module.
//!
//! Message semantics come from a [`Profile`]. The built-in [`Standard`]
//! profile covers the messages common to activity documents; anything it does
//! not know is passed through as an opaque message.
//!
//! ## Cargo Features
//!
//! The following crate feature flags are available:
//!
//! - `derive`: enable derive macros (default).
//! - `std`: enable reader-based decoder (default).

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod avec;
pub mod config;
pub mod message;
pub mod profile;
pub mod sans;
pub mod value;

pub use avec::{Error, FromMessage, FromMessages, FromValue, decode_slice, encode};
#[cfg(feature = "std")]
pub use avec::decode_reader;
pub use config::{DecodeOptions, EncodeOptions};
pub use message::{DeveloperField, Field, FieldSource, File, Message};
pub use profile::{Profile, Standard};
pub use value::{Number, Value};
