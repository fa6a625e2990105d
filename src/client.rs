//! Typed request builders.
//!
//! A [`Client`] carries a slave id and a transport mode, validates arguments
//! against the per-function limits, and hands the assembled PDU to the
//! matching framer. It produces and consumes raw ADUs; moving them over the
//! wire is the transporter's job, so one transporter is typically shared by
//! many clients.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::codec::{AsciiCodec, FrameCodec, RtuCodec, TcpCodec};
use crate::error::{ModbusError, ModbusResult};
use crate::protocol::{data_block, data_block_suffix, FunctionCode, ProtocolDataUnit, SlaveId};

/// The three framing variants of the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolMode {
    Rtu,
    Ascii,
    Tcp,
}

impl fmt::Display for ProtocolMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rtu => write!(f, "rtu"),
            Self::Ascii => write!(f, "ascii"),
            Self::Tcp => write!(f, "tcp"),
        }
    }
}

impl FromStr for ProtocolMode {
    type Err = ModbusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rtu" => Ok(Self::Rtu),
            "ascii" => Ok(Self::Ascii),
            "tcp" => Ok(Self::Tcp),
            other => Err(ModbusError::configuration(format!("unknown protocol mode '{other}'"))),
        }
    }
}

fn codec_for(slave_id: SlaveId, mode: ProtocolMode) -> Box<dyn FrameCodec> {
    match mode {
        ProtocolMode::Rtu => Box::new(RtuCodec::new(slave_id)),
        ProtocolMode::Ascii => Box::new(AsciiCodec::new(slave_id)),
        ProtocolMode::Tcp => Box::new(TcpCodec::new(slave_id)),
    }
}

fn check_quantity(quantity: u16, min: u16, max: u16) -> ModbusResult<()> {
    if quantity < min || quantity > max {
        return Err(ModbusError::InvalidQuantity { quantity, min, max });
    }
    Ok(())
}

/// Request builder bound to one slave and one framing variant.
pub struct Client {
    mode: ProtocolMode,
    codec: Box<dyn FrameCodec>,
}

impl Client {
    pub fn new(slave_id: SlaveId, mode: ProtocolMode) -> Self {
        Self { mode, codec: codec_for(slave_id, mode) }
    }

    /// Rebind the client to a different slave and/or mode. A TCP client's
    /// transaction counter restarts from zero.
    pub fn set(&mut self, slave_id: SlaveId, mode: ProtocolMode) {
        self.mode = mode;
        self.codec = codec_for(slave_id, mode);
    }

    pub fn mode(&self) -> ProtocolMode {
        self.mode
    }

    pub fn slave_id(&self) -> SlaveId {
        self.codec.slave_id()
    }

    pub fn set_slave_id(&mut self, id: SlaveId) {
        self.codec.set_slave_id(id);
    }

    /// Check a decoded slave id against the configured one.
    pub fn verify_slave(&self, id: SlaveId) -> ModbusResult<()> {
        if id != self.codec.slave_id() {
            return Err(ModbusError::mismatch(
                "slave id",
                self.codec.slave_id().into(),
                id.into(),
            ));
        }
        Ok(())
    }

    fn encode(&self, function: FunctionCode, data: Vec<u8>) -> ModbusResult<Vec<u8>> {
        self.codec.encode(&ProtocolDataUnit::new(function, data))
    }

    /// Request:  function 0x01 | starting address (2) | quantity of coils (2)
    /// Response: function 0x01 | byte count (1) | coil status (N)
    pub fn read_coils(&self, address: u16, quantity: u16) -> ModbusResult<Vec<u8>> {
        check_quantity(quantity, 1, 2000)?;
        self.encode(FunctionCode::ReadCoils, data_block(&[address, quantity]))
    }

    /// Request:  function 0x02 | starting address (2) | quantity of inputs (2)
    /// Response: function 0x02 | byte count (1) | input status (N)
    pub fn read_discrete_inputs(&self, address: u16, quantity: u16) -> ModbusResult<Vec<u8>> {
        check_quantity(quantity, 1, 2000)?;
        self.encode(FunctionCode::ReadDiscreteInputs, data_block(&[address, quantity]))
    }

    /// Request:  function 0x03 | starting address (2) | quantity of registers (2)
    /// Response: function 0x03 | byte count (1) | register values (N x 2)
    pub fn read_holding_registers(&self, address: u16, quantity: u16) -> ModbusResult<Vec<u8>> {
        check_quantity(quantity, 1, 125)?;
        self.encode(FunctionCode::ReadHoldingRegisters, data_block(&[address, quantity]))
    }

    /// Request:  function 0x04 | starting address (2) | quantity of registers (2)
    /// Response: function 0x04 | byte count (1) | register values (N x 2)
    pub fn read_input_registers(&self, address: u16, quantity: u16) -> ModbusResult<Vec<u8>> {
        check_quantity(quantity, 1, 125)?;
        self.encode(FunctionCode::ReadInputRegisters, data_block(&[address, quantity]))
    }

    /// Request:  function 0x05 | output address (2) | output value (2)
    /// Response: echo of the request.
    ///
    /// `value` must be `0xFF00` (ON) or `0x0000` (OFF).
    pub fn write_single_coil(&self, address: u16, value: u16) -> ModbusResult<Vec<u8>> {
        if value != 0xFF00 && value != 0x0000 {
            return Err(ModbusError::InvalidCoilState { value });
        }
        self.encode(FunctionCode::WriteSingleCoil, data_block(&[address, value]))
    }

    /// [`Client::write_single_coil`] with the two legal states mapped from a
    /// bool.
    pub fn write_single_coil_bool(&self, address: u16, value: bool) -> ModbusResult<Vec<u8>> {
        self.write_single_coil(address, if value { 0xFF00 } else { 0x0000 })
    }

    /// Request:  function 0x06 | register address (2) | register value (2)
    /// Response: echo of the request.
    pub fn write_single_register(&self, address: u16, value: u16) -> ModbusResult<Vec<u8>> {
        self.encode(FunctionCode::WriteSingleRegister, data_block(&[address, value]))
    }

    /// Request:  function 0x0F | starting address (2) | quantity (2) |
    ///           byte count (1) | output values (N)
    /// Response: function 0x0F | starting address (2) | quantity (2)
    pub fn write_multiple_coils(
        &self,
        address: u16,
        quantity: u16,
        values: &[u8],
    ) -> ModbusResult<Vec<u8>> {
        check_quantity(quantity, 1, 1968)?;
        self.encode(
            FunctionCode::WriteMultipleCoils,
            data_block_suffix(values, &[address, quantity]),
        )
    }

    /// Request:  function 0x10 | starting address (2) | quantity (2) |
    ///           byte count (1) | register values (N x 2)
    /// Response: function 0x10 | starting address (2) | quantity (2)
    pub fn write_multiple_registers(
        &self,
        address: u16,
        quantity: u16,
        values: &[u8],
    ) -> ModbusResult<Vec<u8>> {
        check_quantity(quantity, 1, 123)?;
        self.encode(
            FunctionCode::WriteMultipleRegisters,
            data_block_suffix(values, &[address, quantity]),
        )
    }

    /// Request:  function 0x16 | reference address (2) | AND mask (2) | OR mask (2)
    /// Response: echo of the request.
    pub fn mask_write_register(
        &self,
        address: u16,
        and_mask: u16,
        or_mask: u16,
    ) -> ModbusResult<Vec<u8>> {
        self.encode(
            FunctionCode::MaskWriteRegister,
            data_block(&[address, and_mask, or_mask]),
        )
    }

    /// Request:  function 0x17 | read address (2) | read quantity (2) |
    ///           write address (2) | write quantity (2) | byte count (1) |
    ///           write register values (N x 2)
    /// Response: function 0x17 | byte count (1) | read register values (N x 2)
    pub fn read_write_multiple_registers(
        &self,
        read_address: u16,
        read_quantity: u16,
        write_address: u16,
        write_quantity: u16,
        values: &[u8],
    ) -> ModbusResult<Vec<u8>> {
        check_quantity(read_quantity, 1, 125)?;
        check_quantity(write_quantity, 1, 121)?;
        self.encode(
            FunctionCode::ReadWriteMultipleRegisters,
            data_block_suffix(
                values,
                &[read_address, read_quantity, write_address, write_quantity],
            ),
        )
    }

    /// Request:  function 0x18 | FIFO pointer address (2)
    /// Response: function 0x18 | byte count (2) | FIFO count (2) | values (N x 2)
    pub fn read_fifo_queue(&self, address: u16) -> ModbusResult<Vec<u8>> {
        self.encode(FunctionCode::ReadFifoQueue, data_block(&[address]))
    }

    /// Check that a raw response belongs to a raw request.
    pub fn verify(&self, request: &[u8], response: &[u8]) -> ModbusResult<()> {
        self.codec.verify(request, response)
    }

    /// Validate framing and extract the PDU from a raw response.
    pub fn decode(&self, adu: &[u8]) -> ModbusResult<ProtocolDataUnit> {
        self.codec.decode(adu)
    }

    /// Extract `(slave_id, function)` from an encoded request, for logging.
    pub fn describe(&self, adu: &[u8]) -> ModbusResult<(SlaveId, u8)> {
        self.codec.describe(adu)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("slave_id", &self.codec.slave_id())
            .field("mode", &self.mode)
            .finish()
    }
}
