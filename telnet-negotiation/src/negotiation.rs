//! Table-driven per-option Telnet negotiation engine.
//!
//! Each tracked option is represented independently for each side of the
//! connection ("we" initiate, "they" initiate) so that, for example,
//! `we-BINARY` and `they-BINARY` carry distinct states even though they share
//! an option code. This mirrors the source engine's state table rather than
//! RFC 1143's combined Q-method state per option.

use crate::protocol::{DO, DONT, OPT_BINARY, OPT_COM_PORT, OPT_ECHO, OPT_SGA, WILL, WONT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// We initiate: our own WILL/WONT, their DO/DONT acknowledges it.
    We,
    /// They initiate: their WILL/WONT, our DO/DONT acknowledges it.
    They,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionState {
    Requested,
    Active,
    Inactive,
    ReallyInactive,
}

/// An effect the engine wants performed by its caller. The engine itself
/// performs no I/O and fires no callbacks directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationEffect {
    /// Transmit `IAC action option`.
    Send { action: u8, option: u8 },
    /// The Com-Port-Option reached ACTIVE on this transition; the caller
    /// should mark the session RFC 2217-capable (one-shot) and fire the
    /// connected callback if this is the first time.
    ComPortActivated,
}

/// One tracked option, for one role.
pub struct OptionEntry {
    pub option_code: u8,
    pub label: &'static str,
    pub role: Role,
    send_yes: u8,
    send_no: u8,
    ack_yes: u8,
    ack_no: u8,
    pub state: OptionState,
    pub active: bool,
    /// Only the Com-Port-Option entries carry an activation hook in the
    /// source table; ECHO/SGA/BINARY transition state silently.
    has_activation_hook: bool,
    /// Only the Com-Port-Option entries carry a wired send-on-transition
    /// hook in the source table. For ECHO/SGA/BINARY the corresponding
    /// "send send_yes"/"send send_no" transition step is a no-op because no
    /// send callback was ever attached to those entries.
    has_send_hook: bool,
}

impl OptionEntry {
    fn we(option_code: u8, label: &'static str, initial_state: OptionState) -> Self {
        OptionEntry {
            option_code,
            label,
            role: Role::We,
            send_yes: WILL,
            send_no: WONT,
            ack_yes: DO,
            ack_no: DONT,
            state: initial_state,
            active: false,
            has_activation_hook: false,
            has_send_hook: false,
        }
    }

    fn they(option_code: u8, label: &'static str, initial_state: OptionState) -> Self {
        OptionEntry {
            option_code,
            label,
            role: Role::They,
            send_yes: DO,
            send_no: DONT,
            ack_yes: WILL,
            ack_no: WONT,
            state: initial_state,
            active: false,
            has_activation_hook: false,
            has_send_hook: false,
        }
    }

    fn with_com_port_hooks(mut self) -> Self {
        self.has_activation_hook = true;
        self.has_send_hook = true;
        self
    }

    /// Applies an incoming command to this entry if it matches (i.e. `cmd`
    /// is this entry's `ack_yes` or `ack_no`), per the per-entry transition
    /// table. Returns the effects the caller should perform, if any.
    fn process_incoming(&mut self, cmd: u8) -> Vec<NegotiationEffect> {
        let mut effects = Vec::new();
        if cmd == self.ack_yes {
            match self.state {
                OptionState::Requested => {
                    self.state = OptionState::Active;
                    self.active = true;
                    if self.has_activation_hook {
                        effects.push(NegotiationEffect::ComPortActivated);
                    }
                }
                OptionState::Active => {}
                OptionState::Inactive => {
                    self.state = OptionState::Active;
                    if self.has_send_hook {
                        effects.push(NegotiationEffect::Send {
                            action: self.send_yes,
                            option: self.option_code,
                        });
                    }
                    self.active = true;
                    if self.has_activation_hook {
                        effects.push(NegotiationEffect::ComPortActivated);
                    }
                }
                OptionState::ReallyInactive => {
                    if self.has_send_hook {
                        effects.push(NegotiationEffect::Send {
                            action: self.send_no,
                            option: self.option_code,
                        });
                    }
                }
            }
        } else if cmd == self.ack_no {
            match self.state {
                OptionState::Requested => {
                    self.state = OptionState::Inactive;
                    self.active = false;
                }
                OptionState::Active => {
                    self.state = OptionState::Inactive;
                    if self.has_send_hook {
                        effects.push(NegotiationEffect::Send {
                            action: self.send_no,
                            option: self.option_code,
                        });
                    }
                    self.active = false;
                }
                OptionState::Inactive | OptionState::ReallyInactive => {}
            }
        }
        effects
    }

    fn matches(&self, option: u8, cmd: u8) -> bool {
        self.option_code == option && (cmd == self.ack_yes || cmd == self.ack_no)
    }
}

/// The full set of tracked option entries for one session.
pub struct OptionTable {
    entries: Vec<OptionEntry>,
}

impl Default for OptionTable {
    fn default() -> Self {
        Self::new_session()
    }
}

impl OptionTable {
    /// Builds a fresh table with the initial states every new client session
    /// starts from.
    pub fn new_session() -> Self {
        OptionTable {
            entries: vec![
                OptionEntry::we(OPT_ECHO, "we-ECHO", OptionState::Requested),
                OptionEntry::we(OPT_SGA, "we-SGA", OptionState::Requested),
                OptionEntry::they(OPT_SGA, "they-SGA", OptionState::Inactive),
                OptionEntry::we(OPT_BINARY, "we-BINARY", OptionState::Inactive),
                OptionEntry::they(OPT_BINARY, "they-BINARY", OptionState::Requested),
                OptionEntry::we(OPT_COM_PORT, "we-COM-PORT", OptionState::Requested).with_com_port_hooks(),
                OptionEntry::they(OPT_COM_PORT, "they-COM-PORT", OptionState::Inactive).with_com_port_hooks(),
            ],
        }
    }

    /// True if the we- or they- Com-Port-Option entry is ACTIVE.
    fn com_port_active(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.option_code == OPT_COM_PORT && e.state == OptionState::Active)
    }

    /// Applies an incoming `(command, option)` negotiation pair, dispatching
    /// to every entry that matches. If no entry matches, replies with a
    /// polite refusal: DONT in response to WILL, WONT in response to DO;
    /// WONT/DONT with no matching entry are silently ignored.
    pub fn process(&mut self, command: u8, option: u8) -> Vec<NegotiationEffect> {
        let mut effects = Vec::new();
        let mut known = false;
        for entry in self.entries.iter_mut() {
            if entry.matches(option, command) {
                known = true;
                effects.extend(entry.process_incoming(command));
            }
        }
        if !known {
            if command == WILL {
                effects.push(NegotiationEffect::Send { action: DONT, option });
            } else if command == DO {
                effects.push(NegotiationEffect::Send { action: WONT, option });
            }
        }
        effects
    }
}
