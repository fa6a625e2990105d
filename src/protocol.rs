//! Core protocol definitions: function codes, exception codes, the
//! transport-independent PDU and the data-block builders that assemble the
//! function-specific data field.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ModbusError, ModbusResult};

/// Modbus slave/unit identifier.
pub type SlaveId = u8;

/// Smallest RTU ADU: address + function + CRC.
pub const RTU_MIN_SIZE: usize = 4;
/// Largest RTU ADU on the wire.
pub const RTU_MAX_SIZE: usize = 256;
/// Length of an RTU exception response: address + function + code + CRC.
pub const RTU_EXCEPTION_SIZE: usize = 5;

/// MBAP header: transaction id + protocol id + length + unit id.
pub const TCP_HEADER_SIZE: usize = 7;
/// Largest TCP ADU (MBAP header + PDU).
pub const TCP_MAX_LENGTH: usize = 260;
/// Protocol identifier carried in every MBAP header.
pub const TCP_PROTOCOL_IDENTIFIER: u16 = 0x0000;

/// ASCII frame start delimiter.
pub const ASCII_START: &str = ":";
/// ASCII frame end delimiter.
pub const ASCII_END: &str = "\r\n";
/// Smallest decodable ASCII frame: colon + address + function + LRC + CRLF.
pub const ASCII_MIN_SIZE: usize = 9;
/// Largest ASCII frame in characters.
pub const ASCII_MAX_SIZE: usize = 513;

/// Set on the function byte of an exception response.
pub const EXCEPTION_FLAG: u8 = 0x80;

/// The public Modbus function codes supported by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FunctionCode {
    /// Read Coils (0x01)
    ReadCoils = 0x01,
    /// Read Discrete Inputs (0x02)
    ReadDiscreteInputs = 0x02,
    /// Read Holding Registers (0x03)
    ReadHoldingRegisters = 0x03,
    /// Read Input Registers (0x04)
    ReadInputRegisters = 0x04,
    /// Write Single Coil (0x05)
    WriteSingleCoil = 0x05,
    /// Write Single Register (0x06)
    WriteSingleRegister = 0x06,
    /// Write Multiple Coils (0x0F)
    WriteMultipleCoils = 0x0F,
    /// Write Multiple Registers (0x10)
    WriteMultipleRegisters = 0x10,
    /// Mask Write Register (0x16)
    MaskWriteRegister = 0x16,
    /// Read/Write Multiple Registers (0x17)
    ReadWriteMultipleRegisters = 0x17,
    /// Read FIFO Queue (0x18)
    ReadFifoQueue = 0x18,
}

impl FunctionCode {
    pub fn from_u8(value: u8) -> ModbusResult<Self> {
        match value {
            0x01 => Ok(Self::ReadCoils),
            0x02 => Ok(Self::ReadDiscreteInputs),
            0x03 => Ok(Self::ReadHoldingRegisters),
            0x04 => Ok(Self::ReadInputRegisters),
            0x05 => Ok(Self::WriteSingleCoil),
            0x06 => Ok(Self::WriteSingleRegister),
            0x0F => Ok(Self::WriteMultipleCoils),
            0x10 => Ok(Self::WriteMultipleRegisters),
            0x16 => Ok(Self::MaskWriteRegister),
            0x17 => Ok(Self::ReadWriteMultipleRegisters),
            0x18 => Ok(Self::ReadFifoQueue),
            _ => Err(ModbusError::frame(format!("unknown function code 0x{value:02X}"))),
        }
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for FunctionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ReadCoils => "Read Coils",
            Self::ReadDiscreteInputs => "Read Discrete Inputs",
            Self::ReadHoldingRegisters => "Read Holding Registers",
            Self::ReadInputRegisters => "Read Input Registers",
            Self::WriteSingleCoil => "Write Single Coil",
            Self::WriteSingleRegister => "Write Single Register",
            Self::WriteMultipleCoils => "Write Multiple Coils",
            Self::WriteMultipleRegisters => "Write Multiple Registers",
            Self::MaskWriteRegister => "Mask Write Register",
            Self::ReadWriteMultipleRegisters => "Read/Write Multiple Registers",
            Self::ReadFifoQueue => "Read FIFO Queue",
        };
        write!(f, "{} (0x{:02X})", name, *self as u8)
    }
}

/// Standard exception codes a slave may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExceptionCode {
    IllegalFunction = 0x01,
    IllegalDataAddress = 0x02,
    IllegalDataValue = 0x03,
    ServerDeviceFailure = 0x04,
    Acknowledge = 0x05,
    ServerDeviceBusy = 0x06,
    MemoryParityError = 0x08,
    GatewayPathUnavailable = 0x0A,
    GatewayTargetFailedToRespond = 0x0B,
}

impl ExceptionCode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::IllegalFunction),
            0x02 => Some(Self::IllegalDataAddress),
            0x03 => Some(Self::IllegalDataValue),
            0x04 => Some(Self::ServerDeviceFailure),
            0x05 => Some(Self::Acknowledge),
            0x06 => Some(Self::ServerDeviceBusy),
            0x08 => Some(Self::MemoryParityError),
            0x0A => Some(Self::GatewayPathUnavailable),
            0x0B => Some(Self::GatewayTargetFailedToRespond),
            _ => None,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::IllegalFunction => "illegal function",
            Self::IllegalDataAddress => "illegal data address",
            Self::IllegalDataValue => "illegal data value",
            Self::ServerDeviceFailure => "server device failure",
            Self::Acknowledge => "acknowledge",
            Self::ServerDeviceBusy => "server device busy",
            Self::MemoryParityError => "memory parity error",
            Self::GatewayPathUnavailable => "gateway path unavailable",
            Self::GatewayTargetFailedToRespond => "gateway target device failed to respond",
        }
    }
}

impl fmt::Display for ExceptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exception 0x{:02X}: {}", *self as u8, self.description())
    }
}

/// Transport-independent protocol data unit: a function code and an opaque
/// data field of at most 252 bytes.
///
/// The function byte is kept raw so that exception responses (high bit set)
/// pass through the framing layer untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolDataUnit {
    pub function: u8,
    pub data: Vec<u8>,
}

impl ProtocolDataUnit {
    pub fn new(function: FunctionCode, data: Vec<u8>) -> Self {
        Self { function: function.to_u8(), data }
    }

    /// Whether this PDU is an exception response.
    pub fn is_exception(&self) -> bool {
        self.function & EXCEPTION_FLAG != 0
    }

    /// The exception code carried by an exception response, if any.
    pub fn exception_code(&self) -> Option<ExceptionCode> {
        if self.is_exception() {
            self.data.first().copied().and_then(ExceptionCode::from_u8)
        } else {
            None
        }
    }
}

/// Serialize 16-bit words in big-endian order, concatenated. This produces
/// the data field of every fixed-layout request.
pub fn data_block(words: &[u16]) -> Vec<u8> {
    let mut data = Vec::with_capacity(words.len() * 2);
    for word in words {
        data.extend_from_slice(&word.to_be_bytes());
    }
    data
}

/// Serialize 16-bit words big-endian, then append a one-byte count of
/// `suffix` followed by `suffix` itself. Used by the multiple-write requests
/// whose data field ends with `byte count + values`.
pub fn data_block_suffix(suffix: &[u8], words: &[u16]) -> Vec<u8> {
    let mut data = Vec::with_capacity(words.len() * 2 + 1 + suffix.len());
    for word in words {
        data.extend_from_slice(&word.to_be_bytes());
    }
    data.push(suffix.len() as u8);
    data.extend_from_slice(suffix);
    data
}
