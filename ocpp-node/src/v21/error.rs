use ocpp_core::v21::protocol_error::ProtocolError;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("connection `{0}` is closed")]
    Closed(String),
    #[error("connection `{0}` was lost")]
    Disconnected(String),
    #[error("send failed: {0}")]
    Io(String),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum OcppError {
    #[error("timeout must be greater than zero")]
    InvalidTimeout,
    #[error("no route to `{0}`")]
    UnknownDestination(String),
    #[error("request `{0}` timed out")]
    Timeout(String),
    #[error("request `{0}` was cancelled")]
    Cancelled(String),
    #[error("request id `{0}` is already pending")]
    DuplicateRequestId(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("peer answered with {code}: {description}")]
    Protocol {
        code: ProtocolError,
        description: String,
    },
    #[error("malformed payload: {0}")]
    Parsing(String),
}

impl OcppError {
    /// True when the peer could not be reached at all, as opposed to the peer
    /// answering with an error or a rejection.
    pub fn is_transport_fault(&self) -> bool {
        matches!(self, OcppError::Transport(_) | OcppError::Timeout(_))
    }
}
