//! Transport layer: serial (RTU/ASCII) and TCP request/response exchange.
//!
//! A transport owns one lazily-opened handle guarded by a single async lock,
//! so exactly one request is in flight per transport and every response is
//! paired with the request that produced it. The serial transports hold the
//! lock across the full write-sleep-read cycle; TCP holds it across write
//! and both reads.
//!
//! When an idle timeout is configured, a watcher task closes the handle once
//! `idle_timeout` has elapsed since the last send. The watcher re-checks
//! idleness under the same lock the send path uses, so it can never tear
//! down a connection mid-transaction; the next `send` simply reconnects.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::BytesMut;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout};
use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilder, SerialStream, StopBits};

use crate::client::ProtocolMode;
use crate::error::{ModbusError, ModbusResult};
use crate::logging::{hex_frame, CallbackLogger};
use crate::protocol::{
    FunctionCode, ASCII_END, ASCII_MAX_SIZE, ASCII_MIN_SIZE, EXCEPTION_FLAG, RTU_EXCEPTION_SIZE,
    RTU_MAX_SIZE, RTU_MIN_SIZE, TCP_HEADER_SIZE, TCP_MAX_LENGTH,
};
use crate::DEFAULT_TIMEOUT_MS;

/// Serial line configuration for the RTU and ASCII transports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyUSB0`.
    pub path: String,
    pub baud_rate: u32,
    /// 7 or 8.
    pub data_bits: u8,
    /// `"N"`, `"E"` or `"O"`.
    pub parity: String,
    /// 1 or 2.
    pub stop_bits: u8,
    /// Per-operation read/write deadline.
    pub timeout: Duration,
    /// Close the port after this much inactivity; zero disables.
    pub idle_timeout: Duration,
}

impl SerialConfig {
    /// 8N1 with the default timeout and no idle close.
    pub fn new(path: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            path: path.into(),
            baud_rate,
            data_bits: 8,
            parity: "N".to_string(),
            stop_bits: 1,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            idle_timeout: Duration::ZERO,
        }
    }

    fn builder(&self) -> SerialPortBuilder {
        let data_bits = match self.data_bits {
            7 => DataBits::Seven,
            _ => DataBits::Eight,
        };
        let parity = match self.parity.to_ascii_uppercase().as_str() {
            "E" => Parity::Even,
            "O" => Parity::Odd,
            _ => Parity::None,
        };
        let stop_bits = match self.stop_bits {
            2 => StopBits::Two,
            _ => StopBits::One,
        };
        tokio_serial::new(self.path.clone(), self.baud_rate)
            .data_bits(data_bits)
            .parity(parity)
            .stop_bits(stop_bits)
            .flow_control(FlowControl::None)
            .timeout(self.timeout)
    }
}

/// Configuration for the TCP transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TcpConfig {
    /// `host:port`.
    pub address: String,
    /// Per-operation connect/read/write deadline.
    pub timeout: Duration,
    /// Close the socket after this much inactivity; zero disables.
    pub idle_timeout: Duration,
}

impl TcpConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            idle_timeout: Duration::ZERO,
        }
    }
}

/// Wire-level counters kept by every transport.
#[derive(Debug, Clone, Default)]
pub struct TransportStats {
    pub requests_sent: u64,
    pub responses_received: u64,
    pub errors: u64,
    pub timeouts: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

#[derive(Debug, Default, Clone)]
struct StatsCell(Arc<StdMutex<TransportStats>>);

impl StatsCell {
    fn update(&self, f: impl FnOnce(&mut TransportStats)) {
        if let Ok(mut stats) = self.0.lock() {
            f(&mut stats);
        }
    }

    fn snapshot(&self) -> TransportStats {
        self.0.lock().map(|stats| stats.clone()).unwrap_or_default()
    }
}

/// One request/response channel: open/close the handle, exchange frames.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Lazily open the underlying handle. Idempotent.
    async fn connect(&self) -> ModbusResult<()>;

    /// Tear the handle down. Idempotent.
    async fn close(&self) -> ModbusResult<()>;

    /// Perform one request/response exchange under the transport lock.
    ///
    /// Recoverable errors ([`ModbusError::is_recoverable`]) leave the handle
    /// open; fatal ones drop it so the next `send` reconnects.
    async fn send(&self, request: &[u8]) -> ModbusResult<Vec<u8>>;

    async fn is_connected(&self) -> bool;

    fn stats(&self) -> TransportStats;
}

struct ChannelState<S> {
    handle: Option<S>,
    last_activity: Instant,
    watcher_armed: bool,
}

impl<S> ChannelState<S> {
    fn new() -> Self {
        Self {
            handle: None,
            last_activity: Instant::now(),
            watcher_armed: false,
        }
    }
}

/// Spawn the idle-close watcher for this channel if one is not already
/// running. The watcher re-validates idleness under the channel lock before
/// closing, so a send in progress is never interrupted.
fn arm_idle_watcher<S: Send + 'static>(
    shared: &Arc<Mutex<ChannelState<S>>>,
    state: &mut ChannelState<S>,
    idle_timeout: Duration,
    logger: CallbackLogger,
) {
    if idle_timeout.is_zero() || state.watcher_armed {
        return;
    }
    state.watcher_armed = true;
    let shared = Arc::clone(shared);
    tokio::spawn(async move {
        let mut wait = idle_timeout;
        loop {
            sleep(wait).await;
            let mut state = shared.lock().await;
            if state.handle.is_none() {
                state.watcher_armed = false;
                return;
            }
            let idle_for = state.last_activity.elapsed();
            if idle_for >= idle_timeout {
                logger.info(&format!("closing connection due to idle timeout: {idle_for:?}"));
                state.handle = None;
                state.watcher_armed = false;
                return;
            }
            wait = idle_timeout - idle_for;
        }
    });
}

async fn write_frame<S: AsyncWrite + Unpin + Send>(
    handle: &mut Option<S>,
    frame: &[u8],
    per_op: Duration,
    operation: &str,
) -> ModbusResult<()> {
    let stream = handle
        .as_mut()
        .ok_or_else(|| ModbusError::connection("connection not open"))?;
    if per_op.is_zero() {
        return stream
            .write_all(frame)
            .await
            .map_err(|e| ModbusError::io(format!("{operation} failed: {e}")));
    }
    match timeout(per_op, stream.write_all(frame)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(ModbusError::io(format!("{operation} failed: {e}"))),
        Err(_) => Err(ModbusError::io(format!(
            "{operation} timed out after {}ms",
            per_op.as_millis()
        ))),
    }
}

async fn read_some<S: AsyncRead + Unpin + Send>(
    handle: &mut Option<S>,
    buf: &mut [u8],
    per_op: Duration,
    operation: &str,
) -> ModbusResult<usize> {
    let stream = handle
        .as_mut()
        .ok_or_else(|| ModbusError::connection("connection not open"))?;
    if per_op.is_zero() {
        return stream
            .read(buf)
            .await
            .map_err(|e| ModbusError::frame(format!("{operation} failed: {e}")));
    }
    match timeout(per_op, stream.read(buf)).await {
        Ok(Ok(n)) => Ok(n),
        Ok(Err(e)) => Err(ModbusError::frame(format!("{operation} failed: {e}"))),
        Err(_) => Err(ModbusError::timeout(operation, per_op.as_millis() as u64)),
    }
}

async fn read_exactly<S: AsyncRead + Unpin + Send>(
    handle: &mut Option<S>,
    buf: &mut [u8],
    per_op: Duration,
    operation: &str,
) -> ModbusResult<()> {
    let stream = handle
        .as_mut()
        .ok_or_else(|| ModbusError::connection("connection not open"))?;
    if per_op.is_zero() {
        return stream
            .read_exact(buf)
            .await
            .map(|_| ())
            .map_err(|e| ModbusError::frame(format!("{operation} failed: {e}")));
    }
    match timeout(per_op, stream.read_exact(buf)).await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(e)) => Err(ModbusError::frame(format!("{operation} failed: {e}"))),
        Err(_) => Err(ModbusError::timeout(operation, per_op.as_millis() as u64)),
    }
}

fn open_serial(config: &SerialConfig) -> ModbusResult<SerialStream> {
    SerialStream::open(&config.builder())
        .map_err(|e| ModbusError::connection(format!("failed to open {}: {e}", config.path)))
}

/// Expected byte count of a well-formed RTU response to `request`, including
/// address, function and CRC. Exception responses are shorter; the reader
/// handles them separately.
pub fn expected_response_len(request: &[u8]) -> usize {
    let mut length = RTU_MIN_SIZE;
    if request.len() < 2 {
        return length;
    }
    let count = if request.len() >= 6 {
        u16::from_be_bytes([request[4], request[5]]) as usize
    } else {
        0
    };
    match FunctionCode::from_u8(request[1]) {
        Ok(FunctionCode::ReadCoils | FunctionCode::ReadDiscreteInputs) => {
            length += 1 + count / 8;
            if count % 8 != 0 {
                length += 1;
            }
        }
        Ok(FunctionCode::ReadHoldingRegisters
        | FunctionCode::ReadInputRegisters
        | FunctionCode::ReadWriteMultipleRegisters) => {
            length += 1 + count * 2;
        }
        Ok(FunctionCode::WriteSingleCoil
        | FunctionCode::WriteSingleRegister
        | FunctionCode::WriteMultipleCoils
        | FunctionCode::WriteMultipleRegisters) => {
            length += 4;
        }
        Ok(FunctionCode::MaskWriteRegister) => {
            length += 6;
        }
        // Read FIFO Queue: length depends on the queue, undetermined.
        Ok(FunctionCode::ReadFifoQueue) => {}
        Err(_) => {}
    }
    length
}

/// Silent-interval sleep before reading an RTU response: per the serial line
/// specification the inter-character and inter-frame delays collapse to
/// constants above 19200 baud.
pub fn turnaround_delay(baud_rate: u32, chars: usize) -> Duration {
    let (character_delay, frame_delay): (u64, u64) = if baud_rate == 0 || baud_rate > 19200 {
        (750, 1750)
    } else {
        (15_000_000 / u64::from(baud_rate), 35_000_000 / u64::from(baud_rate))
    };
    Duration::from_micros(character_delay * chars as u64 + frame_delay)
}

// ---------------------------------------------------------------------------
// RTU
// ---------------------------------------------------------------------------

/// Serial transport with RTU byte-timing discipline.
pub struct RtuTransport {
    config: SerialConfig,
    logger: CallbackLogger,
    state: Arc<Mutex<ChannelState<SerialStream>>>,
    stats: StatsCell,
}

impl RtuTransport {
    pub fn new(config: SerialConfig) -> Self {
        Self::with_logger(config, CallbackLogger::disabled())
    }

    pub fn with_logger(config: SerialConfig, logger: CallbackLogger) -> Self {
        Self {
            config,
            logger,
            state: Arc::new(Mutex::new(ChannelState::new())),
            stats: StatsCell::default(),
        }
    }

    async fn exchange(
        &self,
        state: &mut ChannelState<SerialStream>,
        request: &[u8],
    ) -> ModbusResult<Vec<u8>> {
        let per_op = self.config.timeout;
        write_frame(&mut state.handle, request, per_op, "write request").await?;

        let expected = expected_response_len(request);
        sleep(turnaround_delay(self.config.baud_rate, request.len() + expected)).await;

        // Read the minimum frame first, then decide from the function byte
        // whether a full response or a short exception frame follows.
        let mut buf = BytesMut::zeroed(RTU_MAX_SIZE);
        let mut n = 0usize;
        while n < RTU_MIN_SIZE {
            let count = read_some(&mut state.handle, &mut buf[n..], per_op, "read response").await?;
            if count == 0 {
                return Err(ModbusError::frame(format!(
                    "short response: got {n} of {RTU_MIN_SIZE} bytes"
                )));
            }
            n += count;
        }

        let function = request[1];
        if buf[1] == function {
            if n < expected && expected > RTU_MIN_SIZE && expected <= RTU_MAX_SIZE {
                read_exactly(&mut state.handle, &mut buf[n..expected], per_op, "read response tail")
                    .await?;
                n = expected;
            }
        } else if buf[1] == (function | EXCEPTION_FLAG) {
            if n < RTU_EXCEPTION_SIZE {
                read_exactly(
                    &mut state.handle,
                    &mut buf[n..RTU_EXCEPTION_SIZE],
                    per_op,
                    "read exception response",
                )
                .await?;
                n = RTU_EXCEPTION_SIZE;
            }
        }
        Ok(buf[..n].to_vec())
    }
}

#[async_trait]
impl Transport for RtuTransport {
    async fn connect(&self) -> ModbusResult<()> {
        let mut state = self.state.lock().await;
        if state.handle.is_none() {
            state.handle = Some(open_serial(&self.config)?);
        }
        Ok(())
    }

    async fn close(&self) -> ModbusResult<()> {
        self.state.lock().await.handle = None;
        Ok(())
    }

    async fn send(&self, request: &[u8]) -> ModbusResult<Vec<u8>> {
        if request.len() < 2 {
            return Err(ModbusError::frame("request shorter than address and function"));
        }
        let mut state = self.state.lock().await;
        if state.handle.is_none() {
            state.handle = Some(open_serial(&self.config)?);
        }
        state.last_activity = Instant::now();
        arm_idle_watcher(&self.state, &mut state, self.config.idle_timeout, self.logger.clone());

        self.stats.update(|s| {
            s.requests_sent += 1;
            s.bytes_sent += request.len() as u64;
        });
        self.logger.debug(&format!("sending {}", hex_frame(request)));

        let result = self.exchange(&mut state, request).await;
        match &result {
            Ok(response) => {
                self.stats.update(|s| {
                    s.responses_received += 1;
                    s.bytes_received += response.len() as u64;
                });
                self.logger.debug(&format!("received {}", hex_frame(response)));
            }
            Err(error) => {
                self.stats.update(|s| {
                    s.errors += 1;
                    if matches!(error, ModbusError::Timeout { .. }) {
                        s.timeouts += 1;
                    }
                });
                if !error.is_recoverable() {
                    state.handle = None;
                }
            }
        }
        result
    }

    async fn is_connected(&self) -> bool {
        self.state.lock().await.handle.is_some()
    }

    fn stats(&self) -> TransportStats {
        self.stats.snapshot()
    }
}

// ---------------------------------------------------------------------------
// ASCII
// ---------------------------------------------------------------------------

/// Serial transport reading CR/LF-delimited ASCII frames.
pub struct AsciiTransport {
    config: SerialConfig,
    logger: CallbackLogger,
    state: Arc<Mutex<ChannelState<SerialStream>>>,
    stats: StatsCell,
}

impl AsciiTransport {
    pub fn new(config: SerialConfig) -> Self {
        Self::with_logger(config, CallbackLogger::disabled())
    }

    pub fn with_logger(config: SerialConfig, logger: CallbackLogger) -> Self {
        Self {
            config,
            logger,
            state: Arc::new(Mutex::new(ChannelState::new())),
            stats: StatsCell::default(),
        }
    }

    async fn exchange(
        &self,
        state: &mut ChannelState<SerialStream>,
        request: &[u8],
    ) -> ModbusResult<Vec<u8>> {
        let per_op = self.config.timeout;
        write_frame(&mut state.handle, request, per_op, "write request").await?;

        // Accumulate until the frame ends in CRLF, the buffer fills, or the
        // port stops producing bytes.
        let mut buf = BytesMut::zeroed(ASCII_MAX_SIZE);
        let mut length = 0usize;
        loop {
            let n = read_some(&mut state.handle, &mut buf[length..], per_op, "read response").await?;
            length += n;
            if length >= ASCII_MAX_SIZE || n == 0 {
                break;
            }
            if length > ASCII_MIN_SIZE && &buf[length - 2..length] == ASCII_END.as_bytes() {
                break;
            }
        }
        Ok(buf[..length].to_vec())
    }
}

#[async_trait]
impl Transport for AsciiTransport {
    async fn connect(&self) -> ModbusResult<()> {
        let mut state = self.state.lock().await;
        if state.handle.is_none() {
            state.handle = Some(open_serial(&self.config)?);
        }
        Ok(())
    }

    async fn close(&self) -> ModbusResult<()> {
        self.state.lock().await.handle = None;
        Ok(())
    }

    async fn send(&self, request: &[u8]) -> ModbusResult<Vec<u8>> {
        let mut state = self.state.lock().await;
        if state.handle.is_none() {
            state.handle = Some(open_serial(&self.config)?);
        }
        state.last_activity = Instant::now();
        arm_idle_watcher(&self.state, &mut state, self.config.idle_timeout, self.logger.clone());

        self.stats.update(|s| {
            s.requests_sent += 1;
            s.bytes_sent += request.len() as u64;
        });
        self.logger.debug(&format!("sending {:?}", String::from_utf8_lossy(request)));

        let result = self.exchange(&mut state, request).await;
        match &result {
            Ok(response) => {
                self.stats.update(|s| {
                    s.responses_received += 1;
                    s.bytes_received += response.len() as u64;
                });
                self.logger.debug(&format!("received {:?}", String::from_utf8_lossy(response)));
            }
            Err(error) => {
                self.stats.update(|s| {
                    s.errors += 1;
                    if matches!(error, ModbusError::Timeout { .. }) {
                        s.timeouts += 1;
                    }
                });
                if !error.is_recoverable() {
                    state.handle = None;
                }
            }
        }
        result
    }

    async fn is_connected(&self) -> bool {
        self.state.lock().await.handle.is_some()
    }

    fn stats(&self) -> TransportStats {
        self.stats.snapshot()
    }
}

// ---------------------------------------------------------------------------
// TCP
// ---------------------------------------------------------------------------

/// Stream transport reading length-prefixed MBAP frames.
pub struct TcpTransport {
    config: TcpConfig,
    logger: CallbackLogger,
    state: Arc<Mutex<ChannelState<TcpStream>>>,
    stats: StatsCell,
}

impl TcpTransport {
    pub fn new(config: TcpConfig) -> Self {
        Self::with_logger(config, CallbackLogger::disabled())
    }

    pub fn with_logger(config: TcpConfig, logger: CallbackLogger) -> Self {
        Self {
            config,
            logger,
            state: Arc::new(Mutex::new(ChannelState::new())),
            stats: StatsCell::default(),
        }
    }

    async fn connect_locked(&self, state: &mut ChannelState<TcpStream>) -> ModbusResult<()> {
        if state.handle.is_some() {
            return Ok(());
        }
        let address = self.config.address.clone();
        let stream = if self.config.timeout.is_zero() {
            TcpStream::connect(&address)
                .await
                .map_err(|e| ModbusError::connection(format!("failed to connect to {address}: {e}")))?
        } else {
            timeout(self.config.timeout, TcpStream::connect(&address))
                .await
                .map_err(|_| ModbusError::connection(format!("connect to {address} timed out")))?
                .map_err(|e| ModbusError::connection(format!("failed to connect to {address}: {e}")))?
        };
        state.handle = Some(stream);
        Ok(())
    }

    async fn exchange(
        &self,
        state: &mut ChannelState<TcpStream>,
        request: &[u8],
    ) -> ModbusResult<Vec<u8>> {
        let per_op = self.config.timeout;
        write_frame(&mut state.handle, request, per_op, "write request").await?;

        let mut header = [0u8; TCP_HEADER_SIZE];
        read_exactly(&mut state.handle, &mut header, per_op, "read response header").await?;

        let length = u16::from_be_bytes([header[4], header[5]]) as usize;
        let max_length = TCP_MAX_LENGTH - (TCP_HEADER_SIZE - 1);
        if length == 0 || length > max_length {
            // Discard whatever else is pending so the next exchange starts
            // on a frame boundary, then give up on this one.
            if let Some(conn) = state.handle.as_mut() {
                let mut scratch = [0u8; TCP_MAX_LENGTH];
                let _ = conn.try_read(&mut scratch);
            }
            return Err(ModbusError::protocol(format!(
                "length in response header '{length}' must be between '1' and '{max_length}'"
            )));
        }

        // The unit id is part of the header but counted by the length field.
        let total = TCP_HEADER_SIZE + length - 1;
        let mut frame = BytesMut::zeroed(total);
        frame[..TCP_HEADER_SIZE].copy_from_slice(&header);
        if total > TCP_HEADER_SIZE {
            read_exactly(&mut state.handle, &mut frame[TCP_HEADER_SIZE..], per_op, "read response body")
                .await?;
        }
        Ok(frame.to_vec())
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(&self) -> ModbusResult<()> {
        let mut state = self.state.lock().await;
        self.connect_locked(&mut state).await
    }

    async fn close(&self) -> ModbusResult<()> {
        self.state.lock().await.handle = None;
        Ok(())
    }

    async fn send(&self, request: &[u8]) -> ModbusResult<Vec<u8>> {
        let mut state = self.state.lock().await;
        self.connect_locked(&mut state).await?;
        state.last_activity = Instant::now();
        arm_idle_watcher(&self.state, &mut state, self.config.idle_timeout, self.logger.clone());

        self.stats.update(|s| {
            s.requests_sent += 1;
            s.bytes_sent += request.len() as u64;
        });
        self.logger.debug(&format!("sending {}", hex_frame(request)));

        let result = self.exchange(&mut state, request).await;
        match &result {
            Ok(response) => {
                self.stats.update(|s| {
                    s.responses_received += 1;
                    s.bytes_received += response.len() as u64;
                });
                self.logger.debug(&format!("received {}", hex_frame(response)));
            }
            Err(error) => {
                self.stats.update(|s| {
                    s.errors += 1;
                    if matches!(error, ModbusError::Timeout { .. }) {
                        s.timeouts += 1;
                    }
                });
                if !error.is_recoverable() {
                    state.handle = None;
                }
            }
        }
        result
    }

    async fn is_connected(&self) -> bool {
        self.state.lock().await.handle.is_some()
    }

    fn stats(&self) -> TransportStats {
        self.stats.snapshot()
    }
}

// ---------------------------------------------------------------------------
// Transporter
// ---------------------------------------------------------------------------

/// The transport chosen at construction time: one of the three closed
/// variants. Shared by reference between all clients polling the same bus or
/// endpoint.
pub enum Transporter {
    Rtu(RtuTransport),
    Ascii(AsciiTransport),
    Tcp(TcpTransport),
}

impl Transporter {
    pub fn rtu(config: SerialConfig) -> Self {
        Self::Rtu(RtuTransport::new(config))
    }

    pub fn ascii(config: SerialConfig) -> Self {
        Self::Ascii(AsciiTransport::new(config))
    }

    pub fn tcp(config: TcpConfig) -> Self {
        Self::Tcp(TcpTransport::new(config))
    }

    pub fn rtu_with_logger(config: SerialConfig, logger: CallbackLogger) -> Self {
        Self::Rtu(RtuTransport::with_logger(config, logger))
    }

    pub fn ascii_with_logger(config: SerialConfig, logger: CallbackLogger) -> Self {
        Self::Ascii(AsciiTransport::with_logger(config, logger))
    }

    pub fn tcp_with_logger(config: TcpConfig, logger: CallbackLogger) -> Self {
        Self::Tcp(TcpTransport::with_logger(config, logger))
    }

    pub fn mode(&self) -> ProtocolMode {
        match self {
            Self::Rtu(_) => ProtocolMode::Rtu,
            Self::Ascii(_) => ProtocolMode::Ascii,
            Self::Tcp(_) => ProtocolMode::Tcp,
        }
    }

    fn inner(&self) -> &dyn Transport {
        match self {
            Self::Rtu(t) => t,
            Self::Ascii(t) => t,
            Self::Tcp(t) => t,
        }
    }
}

#[async_trait]
impl Transport for Transporter {
    async fn connect(&self) -> ModbusResult<()> {
        self.inner().connect().await
    }

    async fn close(&self) -> ModbusResult<()> {
        self.inner().close().await
    }

    async fn send(&self, request: &[u8]) -> ModbusResult<Vec<u8>> {
        self.inner().send(request).await
    }

    async fn is_connected(&self) -> bool {
        self.inner().is_connected().await
    }

    fn stats(&self) -> TransportStats {
        self.inner().stats()
    }
}
