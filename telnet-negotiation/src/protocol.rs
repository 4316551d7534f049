//! Telnet (RFC 854) wire constants and RFC 2217 Com-Port-Option framing helpers.
//!
//! This module holds only byte-level constants and pure framing functions; it
//! performs no I/O and carries no negotiation state.

/// Interpret-As-Command escape byte.
pub const IAC: u8 = 0xFF;
/// Subnegotiation End.
pub const SE: u8 = 0xF0;
/// Subnegotiation Begin.
pub const SB: u8 = 0xFA;
/// Option negotiation: "I will enable option".
pub const WILL: u8 = 0xFB;
/// Option negotiation: "I will not enable option".
pub const WONT: u8 = 0xFC;
/// Option negotiation: "please enable option".
pub const DO: u8 = 0xFD;
/// Option negotiation: "please do not enable option".
pub const DONT: u8 = 0xFE;

/// Returns true if `c` is one of WILL/WONT/DO/DONT.
pub fn is_negotiation_command(c: u8) -> bool {
    matches!(c, WILL | WONT | DO | DONT)
}

// Telnet options relevant to this engine. Most Telnet options (terminal
// type, NAWS, MCCP, ...) are out of scope; only the options the RFC 2217
// negotiation table cares about are named here.
pub const OPT_BINARY: u8 = 0x00;
pub const OPT_ECHO: u8 = 0x01;
pub const OPT_SGA: u8 = 0x03;
pub const OPT_COM_PORT: u8 = 0x2C;

// RFC 2217 Com-Port-Option sub-commands, client -> server.
pub const SET_BAUDRATE: u8 = 0x01;
pub const SET_DATASIZE: u8 = 0x02;
pub const SET_PARITY: u8 = 0x03;
pub const SET_STOPSIZE: u8 = 0x04;
pub const SET_CONTROL: u8 = 0x05;
pub const NOTIFY_LINESTATE: u8 = 0x06;
pub const NOTIFY_MODEMSTATE: u8 = 0x07;
pub const FLOWCONTROL_SUSPEND: u8 = 0x08;
pub const FLOWCONTROL_RESUME: u8 = 0x09;
pub const SET_LINESTATE_MASK: u8 = 0x0A;
pub const SET_MODEMSTATE_MASK: u8 = 0x0B;
pub const PURGE_DATA: u8 = 0x0C;

// RFC 2217 Com-Port-Option sub-commands, server -> client.
pub const SERVER_SET_BAUDRATE: u8 = 0x65;
pub const SERVER_SET_DATASIZE: u8 = 0x66;
pub const SERVER_SET_PARITY: u8 = 0x67;
pub const SERVER_SET_STOPSIZE: u8 = 0x68;
pub const SERVER_SET_CONTROL: u8 = 0x69;
pub const SERVER_NOTIFY_LINESTATE: u8 = 0x6A;
pub const SERVER_NOTIFY_MODEMSTATE: u8 = 0x6B;
#[allow(dead_code)]
pub const SERVER_FLOWCONTROL_SUSPEND: u8 = 0x6C;
#[allow(dead_code)]
pub const SERVER_FLOWCONTROL_RESUME: u8 = 0x6D;
pub const SERVER_SET_LINESTATE_MASK: u8 = 0x6E;
pub const SERVER_SET_MODEMSTATE_MASK: u8 = 0x6F;
pub const SERVER_PURGE_DATA: u8 = 0x70;

/// Minimum suboption accumulator capacity required to hold any defined
/// Com-Port-Option subnegotiation (the largest is SET-BAUDRATE: option code,
/// sub-command, 4 payload bytes = 6; 16 leaves ample headroom per the RFC).
pub const SUBOPTION_CAPACITY: usize = 16;

/// Minimum receive staging buffer size.
pub const RECV_BUFFER_SIZE: usize = 128;

/// Builds a 3-byte option negotiation reply: `IAC action option`.
pub fn negotiation_reply(action: u8, option: u8) -> [u8; 3] {
    [IAC, action, option]
}

/// Builds a full `IAC SB option_code sub_command <payload, IAC-doubled> IAC SE`
/// subnegotiation frame. Only bytes inside `payload` are doubled; the framing
/// IAC octets are emitted exactly once.
pub fn subnegotiation_frame(option_code: u8, sub_command: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() * 2 + 5);
    out.push(IAC);
    out.push(SB);
    out.push(option_code);
    out.push(sub_command);
    for &b in payload {
        if b == IAC {
            out.push(IAC);
        }
        out.push(b);
    }
    out.push(IAC);
    out.push(SE);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negotiation_reply_is_three_bytes() {
        assert_eq!(negotiation_reply(DONT, 0x2A), [IAC, DONT, 0x2A]);
    }

    #[test]
    fn subnegotiation_frame_doubles_iac_in_payload_only() {
        let frame = subnegotiation_frame(OPT_COM_PORT, SERVER_SET_BAUDRATE, &[0x00, 0xFF, 0x00, 0x00]);
        assert_eq!(
            frame,
            vec![IAC, SB, OPT_COM_PORT, SERVER_SET_BAUDRATE, 0x00, IAC, IAC, 0x00, 0x00, IAC, SE]
        );
    }

    #[test]
    fn subnegotiation_frame_with_no_iac_in_payload() {
        let frame = subnegotiation_frame(OPT_COM_PORT, SERVER_PURGE_DATA, &[0x02]);
        assert_eq!(frame, vec![IAC, SB, OPT_COM_PORT, SERVER_PURGE_DATA, 0x02, IAC, SE]);
    }

    #[test]
    fn is_negotiation_command_recognizes_all_four() {
        for c in [WILL, WONT, DO, DONT] {
            assert!(is_negotiation_command(c));
        }
        assert!(!is_negotiation_command(SB));
        assert!(!is_negotiation_command(0x41));
    }
}
