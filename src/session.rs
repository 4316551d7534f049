use std::io::Write;
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use telnet_negotiation::{
    process_subnegotiation, ComPortReply, NegotiationEffect, OptionTable, ParserSink,
    Rfc2217Callbacks,
};
use telnet_negotiation::protocol::{subnegotiation_frame, OPT_COM_PORT};

use tracing::{debug, error, warn};

/// The mutex-guarded outbound half of one client connection. Guards the
/// full duration of one outbound frame (data, option reply, or
/// subnegotiation reply) so frames from different threads never interleave.
pub(crate) struct SendPath {
    stream: Mutex<TcpStream>,
}

impl SendPath {
    pub(crate) fn new(stream: TcpStream) -> Self {
        SendPath { stream: Mutex::new(stream) }
    }

    /// Writes `buf` fully, retrying over short writes, under the send mutex.
    pub(crate) fn send(&self, buf: &[u8]) -> std::io::Result<()> {
        let mut stream = self.stream.lock().expect("send mutex poisoned");
        let mut remaining = buf;
        while !remaining.is_empty() {
            let n = stream.write(remaining)?;
            if n == 0 {
                return Err(std::io::Error::new(std::io::ErrorKind::WriteZero, "short write"));
            }
            remaining = &remaining[n..];
        }
        Ok(())
    }

    /// Best-effort send for protocol-internal replies (option acks,
    /// subnegotiation replies): logs and drops on failure rather than
    /// propagating, per the send-path error policy. The receive loop will
    /// observe the same failed peer on its next `recv` and end the session.
    fn send_best_effort(&self, buf: &[u8]) {
        if let Err(err) = self.send(buf) {
            error!(error = %err, "failed to send telnet reply");
        }
    }
}

/// Per-session state: the option table, the one-shot RFC 2217 activation
/// flag, and the wiring from parser events to negotiation effects, the
/// Com-Port-Option handler, and the host callbacks. Implements
/// [`ParserSink`] so a [`telnet_negotiation::TelnetParser`] can drive it
/// directly.
pub(crate) struct SessionContext<'a> {
    table: OptionTable,
    client_is_rfc2217: AtomicBool,
    callbacks: &'a (dyn Rfc2217Callbacks + Send + Sync),
    send_path: &'a SendPath,
}

impl<'a> SessionContext<'a> {
    pub(crate) fn new(callbacks: &'a (dyn Rfc2217Callbacks + Send + Sync), send_path: &'a SendPath) -> Self {
        SessionContext {
            table: OptionTable::new_session(),
            client_is_rfc2217: AtomicBool::new(false),
            callbacks,
            send_path,
        }
    }

    fn apply_negotiation_effects(&mut self, effects: Vec<NegotiationEffect>) {
        for effect in effects {
            match effect {
                NegotiationEffect::Send { action, option } => {
                    let frame = telnet_negotiation::protocol::negotiation_reply(action, option);
                    self.send_path.send_best_effort(&frame);
                }
                NegotiationEffect::ComPortActivated => {
                    // One-shot: on_client_connected fires the first time
                    // either side of the Com-Port-Option reaches ACTIVE.
                    if !self.client_is_rfc2217.swap(true, Ordering::SeqCst) {
                        debug!("client confirmed RFC 2217-capable");
                        self.callbacks.on_client_connected();
                    }
                }
            }
        }
    }
}

impl<'a> ParserSink for SessionContext<'a> {
    fn data(&mut self, bytes: &[u8]) {
        self.callbacks.on_data_received(bytes);
    }

    fn negotiate(&mut self, command: u8, option: u8) {
        let effects = self.table.process(command, option);
        self.apply_negotiation_effects(effects);
    }

    fn subnegotiation(&mut self, payload: &[u8]) {
        if payload.first() != Some(&OPT_COM_PORT) {
            warn!(option = ?payload.first(), "unsupported subnegotiation option, ignoring");
            return;
        }
        match process_subnegotiation(payload, self.callbacks) {
            Some(ComPortReply { sub_command, payload }) => {
                let frame = subnegotiation_frame(OPT_COM_PORT, sub_command, &payload);
                self.send_path.send_best_effort(&frame);
            }
            None => {
                debug!("subnegotiation produced no reply (unsupported, flow-control, or malformed)");
            }
        }
    }
}
