use crate::errors::{Rfc2217Error, Rfc2217Result};

/// Immutable-after-`create` configuration for an [`crate::Rfc2217Server`].
///
/// Mirrors the original `rfc2217_server_config_t`: callbacks are provided as
/// a single [`telnet_negotiation::Rfc2217Callbacks`] implementation rather
/// than six nullable function pointers plus a `ctx` pointer, since a Rust
/// trait object with default methods already captures "callback not
/// provided" without an unsafe `void *`.
pub struct Rfc2217ServerConfig {
    /// TCP port to listen on.
    pub port: u16,

    /// Advisory OS-thread stack size. Retained for fidelity with hosts that
    /// tune it (e.g. embedded targets); has no effect on the std-threads
    /// backend this crate uses.
    pub task_stack_size: usize,

    /// Advisory OS-thread priority. Same caveat as `task_stack_size`.
    pub task_priority: i32,

    /// Advisory CPU core affinity. Same caveat as `task_stack_size`.
    pub task_core_id: Option<usize>,
}

impl Default for Rfc2217ServerConfig {
    fn default() -> Self {
        Rfc2217ServerConfig {
            port: 3333,
            task_stack_size: 4096,
            task_priority: 5,
            task_core_id: None,
        }
    }
}

impl Rfc2217ServerConfig {
    pub fn new(port: u16) -> Self {
        Rfc2217ServerConfig {
            port,
            ..Default::default()
        }
    }

    /// Validates the configuration shape. Port 0 means "let the OS pick" in
    /// `std::net`, which is a valid ephemeral bind but not a meaningful
    /// choice for a long-lived server host code expects at a fixed address;
    /// this crate's `create` rejects it as a CONFIG error the way the source
    /// API would reject any other structurally invalid parameter set.
    pub(crate) fn validate(&self) -> Rfc2217Result<()> {
        if self.port == 0 {
            return Err(Rfc2217Error::Config("port must be nonzero".to_string()));
        }
        Ok(())
    }
}
