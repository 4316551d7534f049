//! Session supervisor and lifecycle API.
//!
//! Owns the one listening socket this process exposes, spawns a fresh
//! [`crate::session::SessionContext`] for each accepted client, and
//! serializes clients behind a single accept loop: the accept thread spawns
//! a receive-loop thread per connection and joins it before accepting again,
//! so at most one client is ever active (spec §4.4, §5).

use std::io::{self, Read};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use telnet_negotiation::parser::TelnetParser;
use telnet_negotiation::protocol::RECV_BUFFER_SIZE;
use telnet_negotiation::Rfc2217Callbacks;

use tracing::{debug, error, info, info_span, warn};

use crate::config::Rfc2217ServerConfig;
use crate::errors::{is_disconnect, Rfc2217Error, Rfc2217Result};
use crate::session::{SendPath, SessionContext};

/// An RFC 2217 Com-Port-Control telnet server bound to a single TCP port.
///
/// Owns exactly the state §3 assigns to "server instance": configuration,
/// the accept thread, and a handle to whichever client is currently active
/// (there is at most one, per the single-client invariant). `create` is
/// infallible beyond config validation; `start`/`stop` drive the accept
/// thread; `send` transmits application data to the active client if any.
pub struct Rfc2217Server {
    config: Rfc2217ServerConfig,
    callbacks: Arc<dyn Rfc2217Callbacks + Send + Sync>,
    shutdown: Arc<AtomicBool>,
    accept_thread: Mutex<Option<JoinHandle<()>>>,
    active_send_path: Arc<Mutex<Option<Arc<SendPath>>>>,
}

impl Rfc2217Server {
    /// Validates `config` and constructs an inert server: no socket is
    /// bound and no thread is spawned until [`Rfc2217Server::start`].
    pub fn create(
        config: Rfc2217ServerConfig,
        callbacks: impl Rfc2217Callbacks + Send + Sync + 'static,
    ) -> Rfc2217Result<Self> {
        config.validate()?;
        Ok(Rfc2217Server {
            config,
            callbacks: Arc::new(callbacks),
            shutdown: Arc::new(AtomicBool::new(false)),
            accept_thread: Mutex::new(None),
            active_send_path: Arc::new(Mutex::new(None)),
        })
    }

    /// Binds the listen socket and spawns the accept thread. Calling
    /// `start` on an already-started server is misuse and fails with
    /// [`Rfc2217Error::State`].
    pub fn start(&self) -> Rfc2217Result<()> {
        let mut guard = self.accept_thread.lock().expect("accept thread mutex poisoned");
        if guard.is_some() {
            return Err(Rfc2217Error::State("server already started"));
        }

        let listener = TcpListener::bind(("0.0.0.0", self.config.port))
            .map_err(Rfc2217Error::from)?;

        // std's TcpListener sets SO_REUSEADDR on bind on every platform this
        // crate targets; no further socket option is needed to restart
        // promptly after a stop().
        self.shutdown.store(false, Ordering::SeqCst);

        let shutdown = self.shutdown.clone();
        let callbacks = self.callbacks.clone();
        let active_send_path = self.active_send_path.clone();
        let port = self.config.port;

        let handle = thread::Builder::new()
            .name("rfc2217-accept".to_string())
            .spawn(move || accept_loop(listener, port, shutdown, callbacks, active_send_path))
            .map_err(|err| Rfc2217Error::Config(format!("failed to spawn accept thread: {err}")))?;

        *guard = Some(handle);
        Ok(())
    }

    /// Transmits `data` to the currently active client through the send
    /// path. Fails with [`Rfc2217Error::State`] if no client is connected.
    /// Application data is sent as-is; per §4.5 this crate does not
    /// IAC-double outgoing application bytes.
    pub fn send(&self, data: &[u8]) -> Rfc2217Result<()> {
        let guard = self.active_send_path.lock().expect("send path mutex poisoned");
        match guard.as_ref() {
            Some(send_path) => send_path.send(data).map_err(Rfc2217Error::from),
            None => Err(Rfc2217Error::State("no client connected")),
        }
    }

    /// Requests shutdown of the receive thread (if any) and the accept
    /// thread, then joins both. Safe to call with no active client, and
    /// safe to call more than once.
    pub fn stop(&self) -> Rfc2217Result<()> {
        self.shutdown.store(true, Ordering::SeqCst);

        // The accept thread is blocked in accept(); std provides no portable
        // way to interrupt that call from another thread, so we wake it the
        // same way the loopback transport in the demo does: connect to our
        // own listening port. The accept loop checks the shutdown flag
        // before treating the resulting connection as a client.
        let _ = TcpStream::connect(("127.0.0.1", self.config.port));

        let handle = self.accept_thread.lock().expect("accept thread mutex poisoned").take();
        if let Some(handle) = handle {
            handle.join().map_err(|_| {
                Rfc2217Error::Transport(io::Error::other("accept thread panicked"))
            })?;
        }
        Ok(())
    }
}

impl Drop for Rfc2217Server {
    /// Best-effort `destroy`: a bare `Drop` cannot propagate the join error
    /// [`Rfc2217Server::stop`] can, so callers that care should call `stop`
    /// explicitly before letting the server go out of scope.
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

fn accept_loop(
    listener: TcpListener,
    port: u16,
    shutdown: Arc<AtomicBool>,
    callbacks: Arc<dyn Rfc2217Callbacks + Send + Sync>,
    active_send_path: Arc<Mutex<Option<Arc<SendPath>>>>,
) {
    info!(port, "rfc2217 server listening");
    // One parser reused across sessions: `reset` puts it back in the state
    // a brand-new client starts from (spec §3: "Reset to NORMAL on each new
    // client") without reallocating the suboption accumulator every time.
    let mut parser = TelnetParser::new();
    for incoming in listener.incoming() {
        if shutdown.load(Ordering::SeqCst) {
            debug!("accept loop observed shutdown request");
            break;
        }
        match incoming {
            Ok(stream) => {
                let peer = stream.peer_addr().ok();
                let span = info_span!("rfc2217_session", peer = ?peer);
                let _enter = span.enter();
                parser.reset();
                run_session(stream, &mut parser, &callbacks, &active_send_path);
            }
            Err(err) => {
                error!(error = %err, "accept failed");
            }
        }
    }
    info!("accept loop exiting");
}

/// Runs one client's receive loop to completion: `parser` has already been
/// reset to a fresh session's initial state, and a fresh option table is
/// built here; bytes are fed until EOF or a non-retryable error, with
/// `on_client_disconnected` fired exactly once on the way out.
fn run_session(
    stream: TcpStream,
    parser: &mut TelnetParser,
    callbacks: &Arc<dyn Rfc2217Callbacks + Send + Sync>,
    active_send_path: &Arc<Mutex<Option<Arc<SendPath>>>>,
) {
    let write_half = match stream.try_clone() {
        Ok(s) => s,
        Err(err) => {
            error!(error = %err, "failed to clone client socket for send path");
            return;
        }
    };
    let send_path = Arc::new(SendPath::new(write_half));
    *active_send_path.lock().expect("send path mutex poisoned") = Some(send_path.clone());

    let mut ctx = SessionContext::new(callbacks.as_ref(), &send_path);
    let mut read_stream = stream;
    let mut buf = [0u8; RECV_BUFFER_SIZE];

    loop {
        match read_stream.read(&mut buf) {
            Ok(0) => {
                debug!("peer closed connection (EOF)");
                break;
            }
            Ok(n) => parser.feed(&buf[..n], &mut ctx),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                if !is_disconnect(&err) {
                    warn!(error = %err, "receive error, ending session");
                }
                break;
            }
        }
    }

    *active_send_path.lock().expect("send path mutex poisoned") = None;
    callbacks.on_client_disconnected();
}
