//! RFC 2217 Com-Port-Option subnegotiation handler.
//!
//! Decodes the payload captured between `IAC SB ... IAC SE` (with the
//! option code as its first byte), invokes the host callback for the
//! sub-commands that have one, and produces the matching server reply
//! payload. Framing and IAC-doubling are the caller's job (see
//! [`crate::protocol::subnegotiation_frame`]); this module only ever sees
//! and returns undoubled payload bytes.

use crate::protocol::{
    FLOWCONTROL_RESUME, FLOWCONTROL_SUSPEND, NOTIFY_LINESTATE, NOTIFY_MODEMSTATE, OPT_COM_PORT,
    PURGE_DATA, SERVER_NOTIFY_LINESTATE, SERVER_NOTIFY_MODEMSTATE, SERVER_PURGE_DATA,
    SERVER_SET_BAUDRATE, SERVER_SET_CONTROL, SERVER_SET_DATASIZE, SERVER_SET_LINESTATE_MASK,
    SERVER_SET_MODEMSTATE_MASK, SERVER_SET_PARITY, SERVER_SET_STOPSIZE, SET_BAUDRATE, SET_CONTROL,
    SET_DATASIZE, SET_LINESTATE_MASK, SET_MODEMSTATE_MASK, SET_PARITY, SET_STOPSIZE,
};

/// RFC 2217 SET-CONTROL values surfaced to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    SetNoFlowControl,
    SetXonXoffFlowControl,
    SetHardwareFlowControl,
    SetBreak,
    ClearBreak,
    SetDtr,
    ClearDtr,
    SetRts,
    ClearRts,
    /// A value outside the enumeration RFC 2217 defines; preserved verbatim
    /// so an unrecognized-but-well-formed request can still be echoed back.
    Other(u8),
}

impl ControlSignal {
    pub fn from_byte(b: u8) -> Self {
        match b {
            1 => ControlSignal::SetNoFlowControl,
            2 => ControlSignal::SetXonXoffFlowControl,
            3 => ControlSignal::SetHardwareFlowControl,
            5 => ControlSignal::SetBreak,
            6 => ControlSignal::ClearBreak,
            8 => ControlSignal::SetDtr,
            9 => ControlSignal::ClearDtr,
            11 => ControlSignal::SetRts,
            12 => ControlSignal::ClearRts,
            other => ControlSignal::Other(other),
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            ControlSignal::SetNoFlowControl => 1,
            ControlSignal::SetXonXoffFlowControl => 2,
            ControlSignal::SetHardwareFlowControl => 3,
            ControlSignal::SetBreak => 5,
            ControlSignal::ClearBreak => 6,
            ControlSignal::SetDtr => 8,
            ControlSignal::ClearDtr => 9,
            ControlSignal::SetRts => 11,
            ControlSignal::ClearRts => 12,
            ControlSignal::Other(b) => b,
        }
    }
}

/// RFC 2217 PURGE-DATA values surfaced to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeTarget {
    PurgeReceive,
    PurgeTransmit,
    PurgeBoth,
    Other(u8),
}

impl PurgeTarget {
    pub fn from_byte(b: u8) -> Self {
        match b {
            0 => PurgeTarget::PurgeReceive,
            1 => PurgeTarget::PurgeTransmit,
            2 => PurgeTarget::PurgeBoth,
            other => PurgeTarget::Other(other),
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            PurgeTarget::PurgeReceive => 0,
            PurgeTarget::PurgeTransmit => 1,
            PurgeTarget::PurgeBoth => 2,
            PurgeTarget::Other(b) => b,
        }
    }
}

/// Host-provided hooks bridging the virtualized serial port to a real
/// transport. Every method has a default that reproduces "no callback was
/// provided" from the C API: void callbacks no-op, value-returning callbacks
/// echo the request back unchanged.
///
/// `on_data_received` has no default; a type implementing this trait for a
/// real session must decide what to do with received bytes.
pub trait Rfc2217Callbacks {
    fn on_client_connected(&self) {}
    fn on_client_disconnected(&self) {}
    fn on_data_received(&self, data: &[u8]);
    fn on_baudrate(&self, requested: u32) -> u32 {
        requested
    }
    fn on_control(&self, requested: ControlSignal) -> ControlSignal {
        requested
    }
    fn on_purge(&self, requested: PurgeTarget) -> PurgeTarget {
        requested
    }
}

/// The outcome of processing one subnegotiation payload: the server
/// sub-command and undoubled payload to send back, if any reply is due.
pub struct ComPortReply {
    pub sub_command: u8,
    pub payload: Vec<u8>,
}

/// Processes one captured `[option_code, sub_command, parameters...]`
/// subnegotiation payload against `callbacks`. Returns `None` when the
/// option code is not the Com-Port-Option, when the sub-command carries no
/// reply (flow-control suspend/resume), or when the payload is too short for
/// the sub-command it claims to be (a malformed subnegotiation is discarded,
/// never partially replied to).
pub fn process_subnegotiation(payload: &[u8], callbacks: &dyn Rfc2217Callbacks) -> Option<ComPortReply> {
    if payload.first() != Some(&OPT_COM_PORT) {
        return None;
    }
    let sub_command = *payload.get(1)?;
    let params = &payload[2..];

    match sub_command {
        SET_BAUDRATE => {
            let requested = u32::from_be_bytes(params.get(0..4)?.try_into().ok()?);
            let accepted = callbacks.on_baudrate(requested);
            Some(ComPortReply {
                sub_command: SERVER_SET_BAUDRATE,
                payload: accepted.to_be_bytes().to_vec(),
            })
        }
        SET_DATASIZE => echo_byte(params, SERVER_SET_DATASIZE),
        SET_PARITY => echo_byte(params, SERVER_SET_PARITY),
        SET_STOPSIZE => echo_byte(params, SERVER_SET_STOPSIZE),
        SET_CONTROL => {
            let requested = ControlSignal::from_byte(*params.first()?);
            let accepted = callbacks.on_control(requested);
            Some(ComPortReply {
                sub_command: SERVER_SET_CONTROL,
                payload: vec![accepted.to_byte()],
            })
        }
        NOTIFY_LINESTATE => echo_byte(params, SERVER_NOTIFY_LINESTATE),
        NOTIFY_MODEMSTATE => echo_byte(params, SERVER_NOTIFY_MODEMSTATE),
        FLOWCONTROL_SUSPEND | FLOWCONTROL_RESUME => None,
        SET_LINESTATE_MASK => echo_byte(params, SERVER_SET_LINESTATE_MASK),
        SET_MODEMSTATE_MASK => echo_byte(params, SERVER_SET_MODEMSTATE_MASK),
        PURGE_DATA => {
            let requested = PurgeTarget::from_byte(*params.first()?);
            let accepted = callbacks.on_purge(requested);
            Some(ComPortReply {
                sub_command: SERVER_PURGE_DATA,
                payload: vec![accepted.to_byte()],
            })
        }
        _ => None,
    }
}

fn echo_byte(params: &[u8], server_sub_command: u8) -> Option<ComPortReply> {
    let b = *params.first()?;
    Some(ComPortReply {
        sub_command: server_sub_command,
        payload: vec![b],
    })
}
