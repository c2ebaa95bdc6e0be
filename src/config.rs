//! Options controlling decoding and encoding.

use crate::sans::definition::Architecture;

/// Options for a decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Compare the trailing document CRC with the one calculated.
    pub verify_checksum: bool,
    /// Unpack fields declared as bit-packed components into their destinations.
    pub expand_components: bool,
    /// Reject documents whose first message is not `file_id`.
    pub require_file_id: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            verify_checksum: true,
            expand_components: true,
            require_file_id: true,
        }
    }
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: enable or disable the trailing CRC check.
    pub fn with_checksum(mut self, enabled: bool) -> Self {
        self.verify_checksum = enabled;
        self
    }

    /// Builder method: enable or disable component expansion.
    pub fn with_components(mut self, enabled: bool) -> Self {
        self.expand_components = enabled;
        self
    }

    /// Builder method: require or allow a missing leading `file_id`.
    pub fn with_file_id(mut self, required: bool) -> Self {
        self.require_file_id = required;
        self
    }
}

/// Options for an encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Byte order written in every definition record.
    pub architecture: Architecture,
    /// Write the header CRC of 14-byte headers rather than leaving it zero.
    pub header_crc: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            architecture: Architecture::Little,
            header_crc: true,
        }
    }
}

impl EncodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: select the byte order of data records.
    pub fn with_architecture(mut self, architecture: Architecture) -> Self {
        self.architecture = architecture;
        self
    }

    /// Builder method: write or omit the header CRC.
    pub fn with_header_crc(mut self, enabled: bool) -> Self {
        self.header_crc = enabled;
        self
    }
}
