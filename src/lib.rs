//! # Gridbus — asynchronous Modbus client toolkit
//!
//! Client-side building blocks for polling and controlling field devices
//! (PLCs, sensors, actuators) over the three framing variants of the Modbus
//! protocol: RTU (binary over serial), ASCII (hex-encoded over serial) and
//! TCP (binary over a stream socket with an MBAP header).
//!
//! The crate splits a transaction into three independent pieces:
//!
//! - a [`Client`] builds and validates typed requests and turns raw
//!   responses back into PDUs,
//! - a [`Transporter`] moves one encoded frame over the wire and returns the
//!   paired response, respecting serial silent intervals and MBAP length
//!   prefixes,
//! - a [`Blacklist`] tracks per-device fault counts so a polling loop can
//!   quarantine dead devices.
//!
//! ## Supported function codes
//!
//! | Code | Function |
//! |------|----------|
//! | 0x01 | Read Coils |
//! | 0x02 | Read Discrete Inputs |
//! | 0x03 | Read Holding Registers |
//! | 0x04 | Read Input Registers |
//! | 0x05 | Write Single Coil |
//! | 0x06 | Write Single Register |
//! | 0x0F | Write Multiple Coils |
//! | 0x10 | Write Multiple Registers |
//! | 0x16 | Mask Write Register |
//! | 0x17 | Read/Write Multiple Registers |
//! | 0x18 | Read FIFO Queue |
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use gridbus::{Client, ProtocolMode, TcpConfig, Transport, Transporter};
//!
//! #[tokio::main]
//! async fn main() -> gridbus::ModbusResult<()> {
//!     let transporter = Transporter::tcp(TcpConfig::new("10.0.0.7:502"));
//!     let client = Client::new(1, ProtocolMode::Tcp);
//!
//!     let request = client.read_holding_registers(0x006B, 3)?;
//!     let response = transporter.send(&request).await?;
//!     client.verify(&request, &response)?;
//!     let pdu = client.decode(&response)?;
//!     println!("registers: {:02X?}", &pdu.data);
//!     Ok(())
//! }
//! ```
//!
//! One transporter is typically shared by many clients: the transporter
//! serializes the write-then-read exchange under an internal lock, so
//! responses always pair with the request that produced them.

/// Error types and severity classification.
pub mod error;

/// Function codes, exception codes, PDU and data-block builders.
pub mod protocol;

/// CRC-16 and LRC checksums.
pub mod checksum;

/// Per-transport framers (encode / verify / decode).
pub mod codec;

/// Typed request builders.
pub mod client;

/// Serial and TCP transports.
pub mod transport;

/// Per-device fault tracking.
pub mod blacklist;

/// Callback-based logging.
pub mod logging;

pub use blacklist::{Blacklist, BlockCallback, CleanCallback};
pub use checksum::{crc16, lrc, Crc16, Lrc};
pub use client::{Client, ProtocolMode};
pub use codec::{AsciiCodec, FrameCodec, RtuCodec, TcpCodec};
pub use error::{ModbusError, ModbusResult};
pub use logging::{CallbackLogger, LogCallback, LogLevel};
pub use protocol::{
    data_block, data_block_suffix, ExceptionCode, FunctionCode, ProtocolDataUnit, SlaveId,
};
pub use transport::{
    expected_response_len, turnaround_delay, AsciiTransport, RtuTransport, SerialConfig,
    TcpConfig, TcpTransport, Transport, Transporter, TransportStats,
};

/// Default per-operation timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
