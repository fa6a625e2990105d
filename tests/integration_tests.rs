//! Integration tests exercising the codec, transport and blacklist layers
//! together against a loopback TCP slave.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::sleep;

use gridbus::{
    Blacklist, Client, ModbusError, ProtocolMode, TcpConfig, Transport, Transporter,
};

/// Spawn a minimal Modbus TCP slave that answers every request on every
/// connection with a well-formed response echoing transaction, protocol and
/// unit identifiers.
async fn spawn_mock_slave() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let (socket, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => return,
            };
            tokio::spawn(serve_connection(socket));
        }
    });
    addr
}

async fn serve_connection(mut socket: TcpStream) {
    let mut header = [0u8; 7];
    while socket.read_exact(&mut header).await.is_ok() {
        let length = u16::from_be_bytes([header[4], header[5]]) as usize;
        let mut rest = vec![0u8; length.saturating_sub(1)];
        if socket.read_exact(&mut rest).await.is_err() {
            return;
        }
        let function = rest[0];
        let payload = match function {
            // Bit reads: byte count then a recognizable pattern.
            0x01 | 0x02 => {
                let quantity = u16::from_be_bytes([rest[3], rest[4]]) as usize;
                let byte_count = (quantity + 7) / 8;
                let mut payload = vec![byte_count as u8];
                payload.extend(std::iter::repeat(0x55).take(byte_count));
                payload
            }
            // Register reads: byte count then zeroed registers.
            0x03 | 0x04 => {
                let quantity = u16::from_be_bytes([rest[3], rest[4]]) as usize;
                let mut payload = vec![(quantity * 2) as u8];
                payload.extend(std::iter::repeat(0x00).take(quantity * 2));
                payload
            }
            // Writes: echo address and value/quantity.
            0x05 | 0x06 | 0x0F | 0x10 => rest[1..5].to_vec(),
            _ => rest[1..].to_vec(),
        };

        let mut response = Vec::with_capacity(8 + payload.len());
        response.extend_from_slice(&header[0..4]);
        response.extend_from_slice(&((2 + payload.len()) as u16).to_be_bytes());
        response.push(header[6]);
        response.push(function);
        response.extend_from_slice(&payload);
        if socket.write_all(&response).await.is_err() {
            return;
        }
    }
}

fn tcp_transporter(addr: SocketAddr, timeout_ms: u64, idle_ms: u64) -> Transporter {
    let mut config = TcpConfig::new(addr.to_string());
    config.timeout = Duration::from_millis(timeout_ms);
    config.idle_timeout = Duration::from_millis(idle_ms);
    Transporter::tcp(config)
}

#[tokio::test]
async fn test_tcp_exchange_round_trip() {
    let addr = spawn_mock_slave().await;
    let transporter = tcp_transporter(addr, 1000, 0);
    let client = Client::new(0x01, ProtocolMode::Tcp);

    let request = client.read_holding_registers(0x006B, 3).unwrap();
    let response = transporter.send(&request).await.unwrap();

    client.verify(&request, &response).unwrap();
    let pdu = client.decode(&response).unwrap();
    assert_eq!(pdu.function, 0x03);
    assert_eq!(pdu.data.len(), 1 + 6);
    assert_eq!(pdu.data[0], 6);

    let stats = transporter.stats();
    assert_eq!(stats.requests_sent, 1);
    assert_eq!(stats.responses_received, 1);
    assert_eq!(stats.bytes_sent, request.len() as u64);
    assert_eq!(stats.bytes_received, response.len() as u64);
    assert_eq!(stats.errors, 0);
}

#[tokio::test]
async fn test_write_echo_round_trip() {
    let addr = spawn_mock_slave().await;
    let transporter = tcp_transporter(addr, 1000, 0);
    let client = Client::new(0x11, ProtocolMode::Tcp);

    let request = client.write_single_coil_bool(0x00AC, true).unwrap();
    let response = transporter.send(&request).await.unwrap();
    client.verify(&request, &response).unwrap();
    let pdu = client.decode(&response).unwrap();
    assert_eq!(pdu.function, 0x05);
    assert_eq!(pdu.data, vec![0x00, 0xAC, 0xFF, 0x00]);
}

/// A polling loop issuing ReadCoils then ReadHoldingRegisters to five slaves
/// over one shared transporter observes every response paired to its own
/// request, in order.
#[tokio::test]
async fn test_request_order_preserved_across_slaves() {
    let addr = spawn_mock_slave().await;
    let transporter = tcp_transporter(addr, 1000, 0);

    for slave in 0x12..=0x16u8 {
        let client = Client::new(slave, ProtocolMode::Tcp);

        let request = client.read_coils(0x0000, 16).unwrap();
        let response = transporter.send(&request).await.unwrap();
        client.verify(&request, &response).unwrap();
        let pdu = client.decode(&response).unwrap();
        assert_eq!(pdu.function, 0x01);
        assert_eq!(response[6], slave);

        let request = client.read_holding_registers(0x0000, 4).unwrap();
        let response = transporter.send(&request).await.unwrap();
        client.verify(&request, &response).unwrap();
        let pdu = client.decode(&response).unwrap();
        assert_eq!(pdu.function, 0x03);
        assert_eq!(response[6], slave);
    }

    let stats = transporter.stats();
    assert_eq!(stats.requests_sent, 10);
    assert_eq!(stats.responses_received, 10);
}

/// Concurrent senders sharing one transporter still get their own responses:
/// the transport lock serializes exchanges and `verify` proves the pairing.
#[tokio::test]
async fn test_concurrent_sends_stay_paired() {
    let addr = spawn_mock_slave().await;
    let transporter = Arc::new(tcp_transporter(addr, 2000, 0));

    let mut tasks = Vec::new();
    for slave in 0x12..=0x16u8 {
        let transporter = Arc::clone(&transporter);
        tasks.push(tokio::spawn(async move {
            let client = Client::new(slave, ProtocolMode::Tcp);
            for _ in 0..4 {
                let request = client.read_holding_registers(0x0010, 2).unwrap();
                let response = transporter.send(&request).await.unwrap();
                client.verify(&request, &response).unwrap();
                let pdu = client.decode(&response).unwrap();
                assert_eq!(pdu.function, 0x03);
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let stats = transporter.stats();
    assert_eq!(stats.requests_sent, 20);
    assert_eq!(stats.responses_received, 20);
}

#[tokio::test]
async fn test_idle_close_and_reconnect() {
    let addr = spawn_mock_slave().await;
    let transporter = tcp_transporter(addr, 1000, 50);
    let client = Client::new(0x01, ProtocolMode::Tcp);

    let request = client.read_holding_registers(0x0000, 1).unwrap();
    transporter.send(&request).await.unwrap();
    assert!(transporter.is_connected().await);

    // Nothing happens for twice the idle timeout; the watcher closes the
    // socket from under us.
    sleep(Duration::from_millis(150)).await;
    assert!(!transporter.is_connected().await);

    // The next send reopens transparently.
    let request = client.read_holding_registers(0x0000, 1).unwrap();
    let response = transporter.send(&request).await.unwrap();
    client.verify(&request, &response).unwrap();
    assert!(transporter.is_connected().await);
}

#[tokio::test]
async fn test_connect_and_close_are_idempotent() {
    let addr = spawn_mock_slave().await;
    let transporter = tcp_transporter(addr, 1000, 0);

    transporter.connect().await.unwrap();
    transporter.connect().await.unwrap();
    assert!(transporter.is_connected().await);

    transporter.close().await.unwrap();
    transporter.close().await.unwrap();
    assert!(!transporter.is_connected().await);
}

/// A response header announcing an illegal length is a fatal error: the
/// socket is drained, the error is not recoverable, and the handle is
/// dropped so the next send redials.
#[tokio::test]
async fn test_illegal_mbap_length_is_fatal() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let (mut socket, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => return,
            };
            tokio::spawn(async move {
                let mut request = [0u8; 12];
                if socket.read_exact(&mut request).await.is_err() {
                    return;
                }
                // Zero length field: nothing after it can be trusted.
                let bogus = [0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x01];
                let _ = socket.write_all(&bogus).await;
                sleep(Duration::from_millis(200)).await;
            });
        }
    });

    let transporter = tcp_transporter(addr, 500, 0);
    let client = Client::new(0x01, ProtocolMode::Tcp);
    let request = client.read_holding_registers(0x0000, 1).unwrap();

    let error = transporter.send(&request).await.unwrap_err();
    assert!(matches!(error, ModbusError::Protocol { .. }));
    assert!(!error.is_recoverable());
    assert!(!transporter.is_connected().await);
}

/// A slave that goes mute produces a recoverable timeout, which a polling
/// loop feeds into the blacklist until the device is quarantined.
#[tokio::test]
async fn test_timeout_feeds_blacklist_until_quarantine() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let (mut socket, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => return,
            };
            tokio::spawn(async move {
                // Swallow requests, never answer.
                let mut sink = [0u8; 64];
                while socket.read(&mut sink).await.map(|n| n > 0).unwrap_or(false) {}
            });
        }
    });

    let transporter = tcp_transporter(addr, 50, 0);
    let client = Client::new(0x09, ProtocolMode::Tcp);
    let blacklist = Blacklist::new(2, 60);

    for attempt in 1..=3u32 {
        let request = client.read_holding_registers(0x0000, 1).unwrap();
        let error = transporter.send(&request).await.unwrap_err();
        assert!(matches!(error, ModbusError::Timeout { .. }));
        assert!(error.is_recoverable());
        let (blocked, count) = blacklist.get(client.slave_id());
        assert_eq!(count, attempt);
        assert_eq!(blocked, attempt > 2);
    }

    let stats = transporter.stats();
    assert_eq!(stats.requests_sent, 3);
    assert_eq!(stats.timeouts, 3);
    assert_eq!(stats.responses_received, 0);
}
