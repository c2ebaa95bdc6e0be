//! Cyclic redundancy checks over headers and documents.

const CRC_TABLE: [u16; 16] = [
    0x0000, 0xCC01, 0xD801, 0x1400, 0xF001, 0x3C00, 0x2800, 0xE401, 0xA001, 0x6C00, 0x7800,
    0xB401, 0x5000, 0x9C01, 0x8801, 0x4400,
];

/// Running cyclic redundancy check over a sequence of bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Crc(u16);

impl Crc {
    pub fn new() -> Self {
        Self(0)
    }

    /// Accumulate a slice of bytes.
    pub fn update(&mut self, r: &[u8]) -> &mut Self {
        self.0 = compute_crc(self.0, r);
        self
    }

    /// The check value over all bytes accumulated so far.
    pub fn value(&self) -> u16 {
        self.0
    }
}

/// Accumulate a slice of bytes into a cyclic redundancy check value.
pub fn compute_crc(init: u16, r: &[u8]) -> u16 {
    r.iter().fold(init, |acc, b| crc_byte(acc, *b))
}

/// Accumulate a single byte, low nibble first.
fn crc_byte(crc: u16, b: u8) -> u16 {
    let crc = crc_nibble(crc, b & 0xF);
    crc_nibble(crc, b >> 4)
}

fn crc_nibble(crc: u16, nibble: u8) -> u16 {
    let tmp = CRC_TABLE[(crc & 0xF) as usize];
    let crc = (crc >> 4) & 0x0FFF;
    crc ^ tmp ^ CRC_TABLE[nibble as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_check_value() {
        let header = [14, 0x10, 0x57, 0x04, 0x63, 0x6f, 0x01, 0x00, b'.', b'F', b'I', b'T'];
        assert_eq!(compute_crc(0, &header), 13371);
    }

    #[test]
    fn running_matches_oneshot() {
        let bytes = b"sprocket teeth";
        let mut crc = Crc::new();
        crc.update(&bytes[..5]).update(&bytes[5..]);
        assert_eq!(crc.value(), compute_crc(0, bytes));
    }

    #[test]
    fn appending_check_value_zeroes_the_sum() {
        let bytes = b"chainring";
        let check = compute_crc(0, bytes);
        assert_eq!(compute_crc(check, &check.to_le_bytes()), 0);
    }
}
