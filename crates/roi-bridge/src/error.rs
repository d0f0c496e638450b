use std::{io, net::SocketAddr};
use thiserror::Error;

/// Failure of a single ROI exchange. None of these are fatal to the caller.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("socket creation error: {0}")]
    SocketCreateFailed(#[source] io::Error),

    #[error("invalid address {0:?}")]
    AddressInvalid(String),

    #[error("invalid config: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("connection to {addr} failed ({source}). Is the emotion server running?")]
    ConnectFailed {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to send request: {0}")]
    SendFailed(#[source] io::Error),

    #[error("no response from server")]
    NoResponse(#[source] Option<io::Error>),
}

/// A config value that cannot drive an exchange.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

impl ForwardError {
    /// Sorts a failed connect into "could not get a socket at all" versus
    /// "the peer could not be reached". Only resource exhaustion is the
    /// former.
    pub(crate) fn from_connect(addr: SocketAddr, source: io::Error) -> Self {
        if is_exhaustion(&source) {
            Self::SocketCreateFailed(source)
        } else {
            Self::ConnectFailed { addr, source }
        }
    }
}

fn is_exhaustion(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::OutOfMemory {
        return true;
    }

    #[cfg(unix)]
    {
        matches!(
            err.raw_os_error(),
            Some(libc::EMFILE | libc::ENFILE | libc::ENOBUFS | libc::ENOMEM)
        )
    }
    #[cfg(not(unix))]
    {
        false
    }
}
