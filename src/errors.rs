use std::fmt;

/// Errors this crate's public API can return, per the CONFIG / TRANSPORT /
/// PROTOCOL / STATE taxonomy.
#[derive(Debug)]
pub enum Rfc2217Error {
    /// Bad parameters at create/start time (e.g. port already in use).
    Config(String),

    /// Socket create/bind/listen/accept/recv/send failure.
    Transport(std::io::Error),

    /// A malformed subnegotiation: unknown sub-command, truncated payload,
    /// or an accumulator overflow. Always locally recovered; surfaced here
    /// only for diagnostics, never propagated out of the receive loop.
    Protocol(String),

    /// API misuse: send with no client connected, starting twice, etc.
    State(&'static str),
}

impl fmt::Display for Rfc2217Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rfc2217Error::Config(msg) => write!(f, "configuration error: {}", msg),
            Rfc2217Error::Transport(err) => write!(f, "transport error: {}", err),
            Rfc2217Error::Protocol(msg) => write!(f, "protocol error: {}", msg),
            Rfc2217Error::State(msg) => write!(f, "invalid state: {}", msg),
        }
    }
}

impl std::error::Error for Rfc2217Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Rfc2217Error::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Rfc2217Error {
    fn from(err: std::io::Error) -> Self {
        Rfc2217Error::Transport(err)
    }
}

/// True if an I/O error represents an ordinary peer disconnect rather than a
/// transport failure worth logging as an error.
pub fn is_disconnect(err: &std::io::Error) -> bool {
    use std::io::ErrorKind;
    matches!(
        err.kind(),
        ErrorKind::UnexpectedEof | ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted
    )
}

/// Result type alias for this crate's fallible operations.
pub type Rfc2217Result<T> = Result<T, Rfc2217Error>;
