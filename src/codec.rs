//! Per-transport framers.
//!
//! Each framer implements the same small capability set over the
//! transport-independent PDU:
//!
//! - `encode` wraps a PDU into the transport's ADU (checksums and headers
//!   included),
//! - `verify` checks that a raw response belongs to a raw request by
//!   comparing the identifying header bytes,
//! - `decode` validates checksums/lengths and extracts the PDU back out.
//!
//! Exception responses decode like any other PDU; interpreting them is the
//! caller's business.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::checksum::{crc16, Lrc};
use crate::error::{ModbusError, ModbusResult};
use crate::protocol::{
    ProtocolDataUnit, SlaveId, ASCII_END, ASCII_MAX_SIZE, ASCII_MIN_SIZE, ASCII_START,
    RTU_MAX_SIZE, RTU_MIN_SIZE, TCP_HEADER_SIZE, TCP_MAX_LENGTH, TCP_PROTOCOL_IDENTIFIER,
};

/// Capability set shared by the RTU, TCP and ASCII framers.
pub trait FrameCodec: Send + Sync {
    fn slave_id(&self) -> SlaveId;

    fn set_slave_id(&mut self, id: SlaveId);

    /// Encode a PDU into a complete ADU for this transport. Fails with a
    /// frame-too-large error past the transport maximum.
    fn encode(&self, pdu: &ProtocolDataUnit) -> ModbusResult<Vec<u8>>;

    /// Check that `response` plausibly answers `request` by comparing the
    /// identifying header bytes. Does not validate checksums; see `decode`.
    fn verify(&self, request: &[u8], response: &[u8]) -> ModbusResult<()>;

    /// Validate checksums and framing, then extract the PDU.
    fn decode(&self, adu: &[u8]) -> ModbusResult<ProtocolDataUnit>;

    /// Extract `(slave_id, function)` from an encoded request, for logging.
    fn describe(&self, adu: &[u8]) -> ModbusResult<(SlaveId, u8)>;
}

fn be16(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[0], bytes[1]])
}

// ---------------------------------------------------------------------------
// RTU
// ---------------------------------------------------------------------------

/// Framer for Modbus RTU: `slave | function | data | crc_lo | crc_hi`.
#[derive(Debug, Default)]
pub struct RtuCodec {
    slave_id: SlaveId,
}

impl RtuCodec {
    pub fn new(slave_id: SlaveId) -> Self {
        Self { slave_id }
    }
}

impl FrameCodec for RtuCodec {
    fn slave_id(&self) -> SlaveId {
        self.slave_id
    }

    fn set_slave_id(&mut self, id: SlaveId) {
        self.slave_id = id;
    }

    fn encode(&self, pdu: &ProtocolDataUnit) -> ModbusResult<Vec<u8>> {
        let length = pdu.data.len() + 4;
        if length > RTU_MAX_SIZE {
            return Err(ModbusError::FrameTooLarge { length, max: RTU_MAX_SIZE });
        }
        let mut adu = Vec::with_capacity(length);
        adu.push(self.slave_id);
        adu.push(pdu.function);
        adu.extend_from_slice(&pdu.data);

        // CRC is the one little-endian field in the protocol: low byte first.
        let checksum = crc16(&adu);
        adu.push(checksum as u8);
        adu.push((checksum >> 8) as u8);
        Ok(adu)
    }

    fn verify(&self, request: &[u8], response: &[u8]) -> ModbusResult<()> {
        let length = response.len();
        if length < RTU_MIN_SIZE {
            return Err(ModbusError::frame(format!(
                "response length '{length}' does not meet minimum '{RTU_MIN_SIZE}'"
            )));
        }
        if request.is_empty() {
            return Err(ModbusError::frame("empty request"));
        }
        if response[0] != request[0] {
            return Err(ModbusError::mismatch(
                "slave id",
                request[0].into(),
                response[0].into(),
            ));
        }
        Ok(())
    }

    fn decode(&self, adu: &[u8]) -> ModbusResult<ProtocolDataUnit> {
        let length = adu.len();
        if length < RTU_MIN_SIZE {
            return Err(ModbusError::frame(format!(
                "adu length '{length}' does not meet minimum '{RTU_MIN_SIZE}'"
            )));
        }
        let expected = crc16(&adu[..length - 2]);
        let actual = u16::from(adu[length - 1]) << 8 | u16::from(adu[length - 2]);
        if actual != expected {
            return Err(ModbusError::CrcMismatch { expected, actual });
        }
        if adu[0] != self.slave_id {
            return Err(ModbusError::mismatch(
                "slave id",
                self.slave_id.into(),
                adu[0].into(),
            ));
        }
        Ok(ProtocolDataUnit {
            function: adu[1],
            data: adu[2..length - 2].to_vec(),
        })
    }

    fn describe(&self, adu: &[u8]) -> ModbusResult<(SlaveId, u8)> {
        if adu.len() < 2 {
            return Err(ModbusError::frame("adu too short"));
        }
        Ok((adu[0], adu[1]))
    }
}

// ---------------------------------------------------------------------------
// TCP
// ---------------------------------------------------------------------------

/// Framer for Modbus TCP: MBAP header + PDU.
///
/// Each `encode` consumes the next transaction identifier via an atomic
/// fetch-add, so concurrent encodes from one client always carry distinct
/// ids without taking the transport lock.
#[derive(Debug, Default)]
pub struct TcpCodec {
    slave_id: SlaveId,
    transaction_id: AtomicU32,
}

impl TcpCodec {
    pub fn new(slave_id: SlaveId) -> Self {
        Self { slave_id, transaction_id: AtomicU32::new(0) }
    }
}

impl FrameCodec for TcpCodec {
    fn slave_id(&self) -> SlaveId {
        self.slave_id
    }

    fn set_slave_id(&mut self, id: SlaveId) {
        self.slave_id = id;
    }

    fn encode(&self, pdu: &ProtocolDataUnit) -> ModbusResult<Vec<u8>> {
        let length = TCP_HEADER_SIZE + 1 + pdu.data.len();
        if length > TCP_MAX_LENGTH {
            return Err(ModbusError::FrameTooLarge { length, max: TCP_MAX_LENGTH });
        }
        let transaction_id = self.transaction_id.fetch_add(1, Ordering::Relaxed).wrapping_add(1);

        let mut adu = vec![0u8; length];
        adu[0..2].copy_from_slice(&(transaction_id as u16).to_be_bytes());
        adu[2..4].copy_from_slice(&TCP_PROTOCOL_IDENTIFIER.to_be_bytes());
        // Length counts everything after the length field itself.
        let pdu_length = (1 + 1 + pdu.data.len()) as u16;
        adu[4..6].copy_from_slice(&pdu_length.to_be_bytes());
        adu[6] = self.slave_id;
        adu[7] = pdu.function;
        adu[8..].copy_from_slice(&pdu.data);
        Ok(adu)
    }

    fn verify(&self, request: &[u8], response: &[u8]) -> ModbusResult<()> {
        if request.len() < TCP_HEADER_SIZE || response.len() < TCP_HEADER_SIZE {
            return Err(ModbusError::frame("adu shorter than MBAP header"));
        }
        let response_val = be16(&response[0..2]);
        let request_val = be16(&request[0..2]);
        if response_val != request_val {
            return Err(ModbusError::mismatch("transaction id", request_val, response_val));
        }
        let response_val = be16(&response[2..4]);
        let request_val = be16(&request[2..4]);
        if response_val != request_val {
            return Err(ModbusError::mismatch("protocol id", request_val, response_val));
        }
        if response[6] != request[6] {
            return Err(ModbusError::mismatch(
                "unit id",
                request[6].into(),
                response[6].into(),
            ));
        }
        Ok(())
    }

    fn decode(&self, adu: &[u8]) -> ModbusResult<ProtocolDataUnit> {
        if adu.len() < TCP_HEADER_SIZE + 1 {
            return Err(ModbusError::frame("adu shorter than MBAP header"));
        }
        let length = be16(&adu[4..6]) as usize;
        let pdu_length = adu.len() - TCP_HEADER_SIZE;
        if pdu_length == 0 || pdu_length + 1 != length {
            return Err(ModbusError::frame(format!(
                "length in response '{}' does not match pdu data length '{pdu_length}'",
                length.saturating_sub(1)
            )));
        }
        if adu[6] != self.slave_id {
            return Err(ModbusError::mismatch(
                "unit id",
                self.slave_id.into(),
                adu[6].into(),
            ));
        }
        Ok(ProtocolDataUnit {
            function: adu[TCP_HEADER_SIZE],
            data: adu[TCP_HEADER_SIZE + 1..].to_vec(),
        })
    }

    fn describe(&self, adu: &[u8]) -> ModbusResult<(SlaveId, u8)> {
        if adu.len() < TCP_HEADER_SIZE + 1 {
            return Err(ModbusError::frame("adu shorter than MBAP header"));
        }
        Ok((adu[6], adu[7]))
    }
}

// ---------------------------------------------------------------------------
// ASCII
// ---------------------------------------------------------------------------

const HEX_TABLE: &[u8; 16] = b"0123456789ABCDEF";

fn push_hex(out: &mut Vec<u8>, bytes: &[u8]) {
    for byte in bytes {
        out.push(HEX_TABLE[(byte >> 4) as usize]);
        out.push(HEX_TABLE[(byte & 0x0F) as usize]);
    }
}

fn hex_value(ch: u8) -> ModbusResult<u8> {
    match ch {
        b'0'..=b'9' => Ok(ch - b'0'),
        b'A'..=b'F' => Ok(ch - b'A' + 10),
        b'a'..=b'f' => Ok(ch - b'a' + 10),
        _ => Err(ModbusError::frame(format!("invalid hex character '{}'", ch as char))),
    }
}

/// Decode one hex-encoded byte, e.g. `"8C"` → `0x8C`.
fn read_hex(chars: &[u8]) -> ModbusResult<u8> {
    if chars.len() < 2 {
        return Err(ModbusError::frame("truncated hex byte"));
    }
    Ok(hex_value(chars[0])? << 4 | hex_value(chars[1])?)
}

fn decode_hex(chars: &[u8]) -> ModbusResult<Vec<u8>> {
    if chars.len() % 2 != 0 {
        return Err(ModbusError::frame("hex region has odd length"));
    }
    chars.chunks(2).map(read_hex).collect()
}

/// Framer for Modbus ASCII: `":"` + uppercase hex of `{slave, function,
/// data, lrc}` + CRLF.
#[derive(Debug, Default)]
pub struct AsciiCodec {
    slave_id: SlaveId,
}

impl AsciiCodec {
    pub fn new(slave_id: SlaveId) -> Self {
        Self { slave_id }
    }
}

impl FrameCodec for AsciiCodec {
    fn slave_id(&self) -> SlaveId {
        self.slave_id
    }

    fn set_slave_id(&mut self, id: SlaveId) {
        self.slave_id = id;
    }

    fn encode(&self, pdu: &ProtocolDataUnit) -> ModbusResult<Vec<u8>> {
        let length = 1 + (2 + pdu.data.len() + 1) * 2 + 2;
        if length > ASCII_MAX_SIZE {
            return Err(ModbusError::FrameTooLarge { length, max: ASCII_MAX_SIZE });
        }
        let mut adu = Vec::with_capacity(length);
        adu.extend_from_slice(ASCII_START.as_bytes());
        push_hex(&mut adu, &[self.slave_id, pdu.function]);
        push_hex(&mut adu, &pdu.data);

        // LRC covers the raw bytes, not their hex encoding.
        let mut sum = Lrc::new();
        sum.push_byte(self.slave_id).push_byte(pdu.function).push_bytes(&pdu.data);
        push_hex(&mut adu, &[sum.value()]);
        adu.extend_from_slice(ASCII_END.as_bytes());
        Ok(adu)
    }

    fn verify(&self, request: &[u8], response: &[u8]) -> ModbusResult<()> {
        let length = response.len();
        if length < ASCII_MIN_SIZE + 6 {
            return Err(ModbusError::frame(format!(
                "response length '{length}' does not meet minimum '{}'",
                ASCII_MIN_SIZE + 6
            )));
        }
        // Colon plus an even number of hex characters and CRLF.
        if length % 2 != 1 {
            return Err(ModbusError::frame(format!(
                "response length '{}' is not an even number",
                length - 1
            )));
        }
        if !response.starts_with(ASCII_START.as_bytes()) {
            return Err(ModbusError::frame(format!(
                "response frame does not start with '{ASCII_START}'"
            )));
        }
        if !response.ends_with(ASCII_END.as_bytes()) {
            return Err(ModbusError::frame("response frame does not end with CRLF"));
        }
        if request.len() < 3 {
            return Err(ModbusError::frame("request too short"));
        }
        let response_val = read_hex(&response[1..])?;
        let request_val = read_hex(&request[1..])?;
        if response_val != request_val {
            return Err(ModbusError::mismatch(
                "slave id",
                request_val.into(),
                response_val.into(),
            ));
        }
        Ok(())
    }

    fn decode(&self, adu: &[u8]) -> ModbusResult<ProtocolDataUnit> {
        // Fixed offsets after the colon; reject anything too short to hold
        // them instead of slicing out of bounds.
        if adu.len() < ASCII_MIN_SIZE || adu.len() % 2 != 1 {
            return Err(ModbusError::frame(format!(
                "adu length '{}' is inconsistent with ascii framing",
                adu.len()
            )));
        }
        let address = read_hex(&adu[1..])?;
        let function = read_hex(&adu[3..])?;
        let data_end = adu.len() - 4;
        let data = decode_hex(&adu[5..data_end])?;
        let actual = read_hex(&adu[data_end..])?;

        let mut sum = Lrc::new();
        sum.push_byte(address).push_byte(function).push_bytes(&data);
        let expected = sum.value();
        if actual != expected {
            return Err(ModbusError::LrcMismatch { expected, actual });
        }
        Ok(ProtocolDataUnit { function, data })
    }

    fn describe(&self, adu: &[u8]) -> ModbusResult<(SlaveId, u8)> {
        if adu.len() < 5 {
            return Err(ModbusError::frame("adu too short"));
        }
        Ok((read_hex(&adu[1..])?, read_hex(&adu[3..])?))
    }
}
