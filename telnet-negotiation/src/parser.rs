//! Byte-level Telnet stream parser.
//!
//! Classifies each incoming octet as application data, an IAC escape, a
//! negotiation command, or part of a Com-Port-Option subnegotiation payload.
//! Pure state machine: no I/O, no knowledge of option semantics.

use crate::protocol::{is_negotiation_command, DONT, IAC, SB, SE, SUBOPTION_CAPACITY, WILL, WONT};

/// Callbacks the parser drives as it recognizes events in the byte stream.
///
/// Implementors own the option table and the data sink; the parser itself
/// holds no such state.
pub trait ParserSink {
    /// Application data, already de-Telneted (IAC IAC collapsed to one 0xFF).
    fn data(&mut self, bytes: &[u8]);
    /// A completed `IAC <command> <option>` negotiation.
    fn negotiate(&mut self, command: u8, option: u8);
    /// A completed `IAC SB ... IAC SE` subnegotiation payload (option code,
    /// sub-command and parameters; IAC-IAC already un-doubled).
    fn subnegotiation(&mut self, payload: &[u8]);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    GotIac,
    Negotiate,
}

/// Three-state Telnet byte parser plus a bounded subnegotiation accumulator.
///
/// Reset to its initial state at the start of every session; one instance is
/// owned exclusively by the receive loop for the lifetime of one client.
pub struct TelnetParser {
    mode: Mode,
    collecting_suboption: bool,
    suboption: Vec<u8>,
    pending_command: u8,
}

impl Default for TelnetParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TelnetParser {
    pub fn new() -> Self {
        TelnetParser {
            mode: Mode::Normal,
            collecting_suboption: false,
            suboption: Vec::with_capacity(SUBOPTION_CAPACITY),
            pending_command: 0,
        }
    }

    /// Resets the parser to its initial state, as done at the start of every
    /// new client session.
    pub fn reset(&mut self) {
        self.mode = Mode::Normal;
        self.collecting_suboption = false;
        self.suboption.clear();
        self.pending_command = 0;
    }

    /// Feeds `input` through the parser, invoking `sink` for each recognized
    /// event. Safe to call repeatedly with arbitrarily chunked input: the
    /// parser carries state across calls, so splitting a sequence at any byte
    /// boundary across multiple calls produces the same events as one call.
    pub fn feed(&mut self, input: &[u8], sink: &mut impl ParserSink) {
        // Fast path: no telnet processing in flight and nothing to escape.
        if self.mode == Mode::Normal && !self.collecting_suboption && !input.contains(&IAC) {
            if !input.is_empty() {
                sink.data(input);
            }
            return;
        }

        for &c in input {
            match self.mode {
                Mode::Normal => {
                    if c == IAC {
                        self.mode = Mode::GotIac;
                    } else if self.collecting_suboption {
                        self.push_suboption(c);
                    } else {
                        sink.data(std::slice::from_ref(&c));
                    }
                }
                Mode::GotIac => {
                    if c == IAC {
                        // Escaped literal 0xFF byte.
                        if self.collecting_suboption {
                            self.push_suboption(c);
                        } else {
                            sink.data(std::slice::from_ref(&c));
                        }
                        self.mode = Mode::Normal;
                    } else if c == SB {
                        self.suboption.clear();
                        self.collecting_suboption = true;
                        self.mode = Mode::Normal;
                    } else if c == SE {
                        if self.collecting_suboption {
                            sink.subnegotiation(&self.suboption);
                        }
                        self.suboption.clear();
                        self.collecting_suboption = false;
                        self.mode = Mode::Normal;
                    } else if is_negotiation_command(c) {
                        self.pending_command = c;
                        self.mode = Mode::Negotiate;
                    } else {
                        // Unrecognized in-band command: ignored.
                        self.mode = Mode::Normal;
                    }
                }
                Mode::Negotiate => {
                    sink.negotiate(self.pending_command, c);
                    self.mode = Mode::Normal;
                }
            }
        }
    }

    fn push_suboption(&mut self, c: u8) {
        if self.suboption.len() < SUBOPTION_CAPACITY {
            self.suboption.push(c);
        } else {
            // Overflow: drop the in-progress subnegotiation entirely.
            self.collecting_suboption = false;
            self.suboption.clear();
        }
    }
}
