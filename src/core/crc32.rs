//! Rolling CRC32 checksum
//!
//! Standard reflected CRC-32 (polynomial 0xEDB88320), fed one byte at a time
//! as the parser consumes input. Enabled with the `compute_checksum` option.

const fn make_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ 0xEDB8_8320
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

static TABLE: [u32; 256] = make_table();

/// Incremental CRC32 state
#[derive(Debug, Clone, Copy)]
pub struct Crc32 {
    value: u32,
}

impl Crc32 {
    #[inline]
    pub fn new() -> Self {
        Crc32 { value: 0xFFFF_FFFF }
    }

    /// Fold one byte into the checksum
    #[inline]
    pub fn update(&mut self, byte: u8) {
        let idx = ((self.value ^ byte as u32) & 0xFF) as usize;
        self.value = (self.value >> 8) ^ TABLE[idx];
    }

    /// Final checksum value
    #[inline]
    pub fn checksum(&self) -> u32 {
        !self.value
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Crc32::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crc_of(data: &[u8]) -> u32 {
        let mut crc = Crc32::new();
        for &b in data {
            crc.update(b);
        }
        crc.checksum()
    }

    #[test]
    fn test_known_vector() {
        // CRC-32 of "123456789" is the standard check value
        assert_eq!(crc_of(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn test_empty() {
        assert_eq!(crc_of(b""), 0);
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(crc_of(b"<html></html>"), crc_of(b"<html></html>"));
        assert_ne!(crc_of(b"<html></html>"), crc_of(b"<html> </html>"));
    }
}
