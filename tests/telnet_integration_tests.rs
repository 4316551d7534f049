//! End-to-end scenarios driven over a real loopback `TcpStream`, one per
//! literal byte sequence enumerated for the protocol engine: plain data
//! passthrough, IAC escaping, polite refusal of an unknown option, the RFC
//! 2217 handshake, baud-rate set/acknowledge (including an IAC byte inside
//! the encoded payload), and purge-then-disconnect.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rfc2217_server::{ControlSignal, PurgeTarget, Rfc2217Callbacks, Rfc2217Server, Rfc2217ServerConfig};

#[derive(Clone, Default)]
struct RecordingCallbacks {
    connected: Arc<AtomicU32>,
    disconnected: Arc<AtomicU32>,
    data: Arc<Mutex<Vec<u8>>>,
    purges: Arc<Mutex<Vec<PurgeTarget>>>,
    controls: Arc<Mutex<Vec<ControlSignal>>>,
    baud_requests: Arc<Mutex<Vec<u32>>>,
}

impl Rfc2217Callbacks for RecordingCallbacks {
    fn on_client_connected(&self) {
        self.connected.fetch_add(1, Ordering::SeqCst);
    }
    fn on_client_disconnected(&self) {
        self.disconnected.fetch_add(1, Ordering::SeqCst);
    }
    fn on_data_received(&self, bytes: &[u8]) {
        self.data.lock().unwrap().extend_from_slice(bytes);
    }
    fn on_baudrate(&self, requested: u32) -> u32 {
        self.baud_requests.lock().unwrap().push(requested);
        requested
    }
    fn on_control(&self, requested: ControlSignal) -> ControlSignal {
        self.controls.lock().unwrap().push(requested);
        requested
    }
    fn on_purge(&self, requested: PurgeTarget) -> PurgeTarget {
        self.purges.lock().unwrap().push(requested);
        requested
    }
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port()
}

fn start_server(port: u16, callbacks: RecordingCallbacks) -> Rfc2217Server {
    let server = Rfc2217Server::create(Rfc2217ServerConfig::new(port), callbacks).unwrap();
    server.start().unwrap();
    server
}

fn connect(port: u16) -> TcpStream {
    for _ in 0..50 {
        if let Ok(stream) = TcpStream::connect(("127.0.0.1", port)) {
            stream.set_read_timeout(Some(Duration::from_millis(500))).unwrap();
            return stream;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    panic!("could not connect to test server");
}

/// Reads until at least `min_len` bytes are available or the read times out,
/// returning whatever was accumulated (so a test can assert "nothing more
/// arrived" by expecting a timeout with fewer bytes than `min_len`).
fn read_some(stream: &mut TcpStream, min_len: usize) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 256];
    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.len() >= min_len {
                    break;
                }
            }
            Err(ref err) if err.kind() == std::io::ErrorKind::WouldBlock || err.kind() == std::io::ErrorKind::TimedOut => break,
            Err(err) => panic!("unexpected read error: {err}"),
        }
    }
    buf
}

#[test]
fn plain_data_passthrough() {
    let port = free_port();
    let callbacks = RecordingCallbacks::default();
    let server = start_server(port, callbacks.clone());
    let mut client = connect(port);

    client.write_all(b"Hello").unwrap();
    std::thread::sleep(Duration::from_millis(100));

    assert_eq!(*callbacks.data.lock().unwrap(), b"Hello");
    let reply = read_some(&mut client, 1);
    assert!(reply.is_empty(), "no bytes should be sent for plain data");

    server.stop().unwrap();
}

#[test]
fn iac_escaping_in_data() {
    let port = free_port();
    let callbacks = RecordingCallbacks::default();
    let server = start_server(port, callbacks.clone());
    let mut client = connect(port);

    client.write_all(&[0x41, 0xFF, 0xFF, 0x42]).unwrap();
    std::thread::sleep(Duration::from_millis(100));

    assert_eq!(*callbacks.data.lock().unwrap(), vec![0x41, 0xFF, 0x42]);

    server.stop().unwrap();
}

#[test]
fn unknown_option_gets_polite_refusal() {
    let port = free_port();
    let callbacks = RecordingCallbacks::default();
    let server = start_server(port, callbacks.clone());
    let mut client = connect(port);

    // IAC WILL 0x2A
    client.write_all(&[0xFF, 0xFB, 0x2A]).unwrap();
    let reply = read_some(&mut client, 3);
    assert_eq!(reply, vec![0xFF, 0xFE, 0x2A]); // IAC DONT 0x2A

    server.stop().unwrap();
}

#[test]
fn com_port_handshake_activates_without_reply() {
    let port = free_port();
    let callbacks = RecordingCallbacks::default();
    let server = start_server(port, callbacks.clone());
    let mut client = connect(port);

    // IAC DO 0x2C (DO COM-PORT)
    client.write_all(&[0xFF, 0xFD, 0x2C]).unwrap();
    std::thread::sleep(Duration::from_millis(100));

    assert_eq!(callbacks.connected.load(Ordering::SeqCst), 1);
    let reply = read_some(&mut client, 1);
    assert!(reply.is_empty(), "REQUESTED -> ACTIVE via DO needs no reply");

    server.stop().unwrap();
}

#[test]
fn baudrate_set_and_acknowledge() {
    let port = free_port();
    let callbacks = RecordingCallbacks::default();
    let server = start_server(port, callbacks.clone());
    let mut client = connect(port);

    client.write_all(&[0xFF, 0xFD, 0x2C]).unwrap(); // activate com-port
    std::thread::sleep(Duration::from_millis(50));

    // IAC SB 0x2C SET-BAUDRATE(0x01) 00 01 C2 00 IAC SE  (115200)
    client
        .write_all(&[0xFF, 0xFA, 0x2C, 0x01, 0x00, 0x01, 0xC2, 0x00, 0xFF, 0xF0])
        .unwrap();

    let reply = read_some(&mut client, 7);
    assert_eq!(reply, vec![0xFF, 0xFA, 0x2C, 0x65, 0x00, 0x01, 0xC2, 0x00, 0xFF, 0xF0]);
    assert_eq!(*callbacks.baud_requests.lock().unwrap(), vec![115200]);

    server.stop().unwrap();
}

#[test]
fn baudrate_with_iac_in_payload_is_redoubled_on_reply() {
    let port = free_port();
    let callbacks = RecordingCallbacks::default();
    let server = start_server(port, callbacks.clone());
    let mut client = connect(port);

    // Requested baud rate encodes as 00 FF 00 00 (i.e. 0x00FF0000), with the
    // 0xFF byte IAC-doubled in transport: ... 00 FF FF 00 00 ...
    client
        .write_all(&[0xFF, 0xFA, 0x2C, 0x01, 0x00, 0xFF, 0xFF, 0x00, 0x00, 0xFF, 0xF0])
        .unwrap();

    let reply = read_some(&mut client, 8);
    assert_eq!(
        reply,
        vec![0xFF, 0xFA, 0x2C, 0x65, 0x00, 0xFF, 0xFF, 0x00, 0x00, 0xFF, 0xF0]
    );
    assert_eq!(*callbacks.baud_requests.lock().unwrap(), vec![0x00FF0000]);

    server.stop().unwrap();
}

#[test]
fn purge_then_disconnect() {
    let port = free_port();
    let callbacks = RecordingCallbacks::default();
    let server = start_server(port, callbacks.clone());
    let mut client = connect(port);

    // IAC SB 0x2C PURGE-DATA(0x0C) PURGE-BOTH(0x02) IAC SE
    client.write_all(&[0xFF, 0xFA, 0x2C, 0x0C, 0x02, 0xFF, 0xF0]).unwrap();

    let reply = read_some(&mut client, 5);
    assert_eq!(reply, vec![0xFF, 0xFA, 0x2C, 0x70, 0x02, 0xFF, 0xF0]);
    assert_eq!(*callbacks.purges.lock().unwrap(), vec![PurgeTarget::PurgeBoth]);

    drop(client);
    std::thread::sleep(Duration::from_millis(150));
    assert_eq!(callbacks.disconnected.load(Ordering::SeqCst), 1);

    server.stop().unwrap();
}

#[test]
fn chunked_delivery_yields_identical_data_stream() {
    let port = free_port();
    let callbacks = RecordingCallbacks::default();
    let server = start_server(port, callbacks.clone());
    let mut client = connect(port);

    // "Hello" split across several small writes plus an escaped IAC byte.
    for chunk in [&b"He"[..], &b"l"[..], &b"l"[..], &[0xFFu8, 0xFF][..], &b"o"[..]] {
        client.write_all(chunk).unwrap();
        std::thread::sleep(Duration::from_millis(20));
    }
    std::thread::sleep(Duration::from_millis(100));

    assert_eq!(*callbacks.data.lock().unwrap(), b"Hell\xffo");

    server.stop().unwrap();
}
