//! Error types for the Modbus client stack.
//!
//! Errors fall into three severities, distinguished at the send boundary:
//!
//! 1. **Argument errors** — rejected before anything touches the wire
//!    (quantity out of range, illegal coil state, frame too large). These are
//!    never retryable; fix the call.
//! 2. **Warnings** — non-fatal protocol anomalies observed while reading a
//!    response (short or malformed frames, read timeouts, checksum or
//!    identifier mismatches). [`ModbusError::is_recoverable`] returns `true`
//!    for these; a polling loop may count them against a device and move on.
//! 3. **Fatal transport errors** — the underlying handle is unusable. The
//!    transport drops the handle before returning one of these, so the next
//!    `send` reconnects.
//!
//! Exception responses from a slave are *not* errors at this layer: the
//! framers hand them back as ordinary PDUs with the function high bit set.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type ModbusResult<T> = Result<T, ModbusError>;

/// All error conditions surfaced by the codec, client and transport layers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModbusError {
    /// Handle-level I/O failure. The connection has been dropped.
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Connection could not be established (dial or serial open failed).
    #[error("connection error: {message}")]
    Connection { message: String },

    /// A read did not complete within the configured per-operation timeout.
    #[error("timeout after {timeout_ms}ms: {operation}")]
    Timeout { operation: String, timeout_ms: u64 },

    /// Protocol violation that forces a resynchronization, e.g. an MBAP
    /// length field outside the legal range.
    #[error("protocol error: {message}")]
    Protocol { message: String },

    /// Short, truncated or otherwise malformed frame.
    #[error("frame error: {message}")]
    Frame { message: String },

    /// RTU checksum in the response does not match the recomputed value.
    #[error("response crc 0x{actual:04X} does not match expected 0x{expected:04X}")]
    CrcMismatch { expected: u16, actual: u16 },

    /// ASCII checksum in the response does not match the recomputed value.
    #[error("response lrc 0x{actual:02X} does not match expected 0x{expected:02X}")]
    LrcMismatch { expected: u8, actual: u8 },

    /// An identifying header field of the response differs from the request.
    /// `field` names which one (slave id, transaction id, protocol id,
    /// unit id).
    #[error("response {field} '{response}' does not match request '{request}'")]
    Mismatch {
        field: &'static str,
        request: u16,
        response: u16,
    },

    /// A read/write quantity argument is outside the per-function limits.
    #[error("quantity '{quantity}' out of range, must be between '{min}' and '{max}'")]
    InvalidQuantity { quantity: u16, min: u16, max: u16 },

    /// Single-coil write with a value other than the two legal states.
    #[error("state '{value:#06X}' must be either ON (0xFF00) or OFF (0x0000)")]
    InvalidCoilState { value: u16 },

    /// The assembled ADU would exceed the transport maximum.
    #[error("frame length '{length}' exceeds transport maximum '{max}'")]
    FrameTooLarge { length: usize, max: usize },

    /// Invalid transport or client configuration.
    #[error("configuration error: {message}")]
    Configuration { message: String },
}

impl ModbusError {
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io { message: message.into() }
    }

    pub fn connection<S: Into<String>>(message: S) -> Self {
        Self::Connection { message: message.into() }
    }

    pub fn timeout<S: Into<String>>(operation: S, timeout_ms: u64) -> Self {
        Self::Timeout { operation: operation.into(), timeout_ms }
    }

    pub fn protocol<S: Into<String>>(message: S) -> Self {
        Self::Protocol { message: message.into() }
    }

    pub fn frame<S: Into<String>>(message: S) -> Self {
        Self::Frame { message: message.into() }
    }

    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration { message: message.into() }
    }

    pub fn mismatch(field: &'static str, request: u16, response: u16) -> Self {
        Self::Mismatch { field, request, response }
    }

    /// Whether the error is a non-fatal protocol anomaly (the warning
    /// severity). The transport handle is still usable; retrying or skipping
    /// the device are both reasonable caller policies.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::Frame { .. }
                | Self::CrcMismatch { .. }
                | Self::LrcMismatch { .. }
                | Self::Mismatch { .. }
        )
    }

    /// Whether the error originates in the transport rather than the
    /// protocol framing.
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            Self::Io { .. } | Self::Connection { .. } | Self::Timeout { .. }
        )
    }

    /// Whether the error is a framing/protocol violation.
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::Protocol { .. }
                | Self::Frame { .. }
                | Self::CrcMismatch { .. }
                | Self::LrcMismatch { .. }
                | Self::Mismatch { .. }
        )
    }

    /// Whether the error was raised by argument validation before any I/O.
    pub fn is_argument_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidQuantity { .. }
                | Self::InvalidCoilState { .. }
                | Self::FrameTooLarge { .. }
                | Self::Configuration { .. }
        )
    }
}

impl From<std::io::Error> for ModbusError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}
