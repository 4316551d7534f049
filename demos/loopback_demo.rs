//! A minimal host application wired to a software loopback "serial port":
//! whatever bytes the Com-Port-Control client sends are echoed straight
//! back, and every control-line / baud-rate / purge request is logged and
//! accepted (coercing the baud rate to the nearest of a small supported
//! set, the way a real UART driver would). Run it, then:
//!
//! ```text
//! telnet 127.0.0.1 3333
//! ```
//!
//! and type — in an RFC 2217-aware client (e.g. Python's `pyserial` telnet
//! URL handler) you can also exercise SET-BAUDRATE / SET-CONTROL / PURGE-DATA.

use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::time::Duration;

use rfc2217_server::{ControlSignal, PurgeTarget, Rfc2217Callbacks, Rfc2217Server, Rfc2217ServerConfig};
use tracing::{debug, info, warn};

const SUPPORTED_BAUD_RATES: [u32; 8] = [1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200];

fn nearest_supported_baud(requested: u32) -> u32 {
    *SUPPORTED_BAUD_RATES
        .iter()
        .min_by_key(|&&rate| (rate as i64 - requested as i64).abs())
        .expect("SUPPORTED_BAUD_RATES is non-empty")
}

struct LoopbackCallbacks {
    server: Arc<OnceLock<Weak<Rfc2217Server>>>,
    baud: Mutex<u32>,
}

impl LoopbackCallbacks {
    fn new(server: Arc<OnceLock<Weak<Rfc2217Server>>>) -> Self {
        LoopbackCallbacks { server, baud: Mutex::new(9600) }
    }
}

impl Rfc2217Callbacks for LoopbackCallbacks {
    fn on_client_connected(&self) {
        info!("client confirmed RFC 2217-capable");
    }

    fn on_client_disconnected(&self) {
        info!("client disconnected");
    }

    fn on_data_received(&self, data: &[u8]) {
        debug!(len = data.len(), "looping data back to client");
        let Some(server) = self.server.get().and_then(Weak::upgrade) else {
            return;
        };
        if let Err(err) = server.send(data) {
            warn!(error = %err, "failed to echo data back to client");
        }
    }

    fn on_baudrate(&self, requested: u32) -> u32 {
        let accepted = nearest_supported_baud(requested);
        *self.baud.lock().expect("baud mutex poisoned") = accepted;
        info!(requested, accepted, "baud rate change");
        accepted
    }

    fn on_control(&self, requested: ControlSignal) -> ControlSignal {
        info!(?requested, "control line request (loopback transport has no real lines to drive)");
        requested
    }

    fn on_purge(&self, requested: PurgeTarget) -> PurgeTarget {
        info!(?requested, "purge request (loopback transport has no buffers to purge)");
        requested
    }
}

fn main() -> rfc2217_server::Rfc2217Result<()> {
    tracing_subscriber::fmt::init();

    let port: u16 = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(3333);

    let server_cell: Arc<OnceLock<Weak<Rfc2217Server>>> = Arc::new(OnceLock::new());
    let callbacks = LoopbackCallbacks::new(server_cell.clone());

    let server = Arc::new(Rfc2217Server::create(Rfc2217ServerConfig::new(port), callbacks)?);
    let _ = server_cell.set(Arc::downgrade(&server));

    server.start()?;
    println!("rfc2217 loopback demo listening on port {port}");
    println!("connect with: telnet 127.0.0.1 {port}");
    println!("press ctrl+c to stop");

    loop {
        std::thread::sleep(Duration::from_secs(3600));
    }
}
