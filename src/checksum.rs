//! CRC-16 and LRC checksums for the serial transports.
//!
//! RTU frames end with a CRC-16 (Modbus polynomial 0xA001, initial value
//! 0xFFFF, reflected) transmitted low byte first — the one little-endian
//! field in an otherwise big-endian protocol. ASCII frames carry an LRC: the
//! two's complement of the byte sum of address, function and data.

use crc::{Crc, Digest, CRC_16_MODBUS};

static CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_MODBUS);

/// One-shot CRC-16/Modbus over `data`.
pub fn crc16(data: &[u8]) -> u16 {
    CRC16.checksum(data)
}

/// One-shot LRC over `data`.
pub fn lrc(data: &[u8]) -> u8 {
    let mut sum = Lrc::new();
    sum.push_bytes(data);
    sum.value()
}

/// Incremental CRC-16/Modbus.
pub struct Crc16 {
    digest: Digest<'static, u16>,
}

impl Crc16 {
    pub fn new() -> Self {
        Self { digest: CRC16.digest() }
    }

    pub fn push_byte(&mut self, byte: u8) -> &mut Self {
        self.digest.update(&[byte]);
        self
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.digest.update(bytes);
        self
    }

    pub fn value(self) -> u16 {
        self.digest.finalize()
    }
}

impl Default for Crc16 {
    fn default() -> Self {
        Self::new()
    }
}

/// Incremental LRC.
pub struct Lrc {
    sum: u8,
}

impl Lrc {
    pub fn new() -> Self {
        Self { sum: 0 }
    }

    pub fn reset(&mut self) -> &mut Self {
        self.sum = 0;
        self
    }

    pub fn push_byte(&mut self, byte: u8) -> &mut Self {
        self.sum = self.sum.wrapping_add(byte);
        self
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        for byte in bytes {
            self.sum = self.sum.wrapping_add(*byte);
        }
        self
    }

    pub fn value(&self) -> u8 {
        self.sum.wrapping_neg()
    }
}

impl Default for Lrc {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc16_known_vectors() {
        // Classic read-coils query from the serial line specification.
        assert_eq!(crc16(&[0x11, 0x01, 0x00, 0x13, 0x00, 0x25]), 0x840E);
        assert_eq!(crc16(&[0x11, 0x01, 0x00, 0x13, 0x00, 0x13]), 0x928E);
        assert_eq!(crc16(&[0x01, 0x03, 0x00, 0x00, 0x00, 0x0A]), 0xCDC5);
        assert_eq!(crc16(&[0x11, 0x05, 0x00, 0xAC, 0xFF, 0x00]), 0x8B4E);
    }

    #[test]
    fn test_crc16_incremental_matches_one_shot() {
        let frame = [0x01u8, 0x03, 0x00, 0x6B, 0x00, 0x03];
        let mut digest = Crc16::new();
        digest.push_byte(frame[0]).push_bytes(&frame[1..]);
        assert_eq!(digest.value(), crc16(&frame));
    }

    #[test]
    fn test_lrc_known_vectors() {
        assert_eq!(lrc(&[0x01, 0x03, 0x00, 0x00, 0x00, 0x01]), 0xFB);
        assert_eq!(lrc(&[0x01, 0x03, 0x02, 0x00, 0x05]), 0xF5);
        assert_eq!(lrc(&[0x01, 0x83, 0x02]), 0x7A);
        assert_eq!(lrc(&[]), 0x00);
    }

    #[test]
    fn test_lrc_incremental() {
        let mut sum = Lrc::new();
        sum.push_byte(0x01).push_byte(0x03).push_bytes(&[0x00, 0x00, 0x00, 0x01]);
        assert_eq!(sum.value(), 0xFB);
        sum.reset();
        assert_eq!(sum.value(), 0x00);
    }
}
