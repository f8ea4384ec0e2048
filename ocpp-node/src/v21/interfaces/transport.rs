use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::v21::{error::TransportError, routing::{NodeId, Route}};

/// Outbound half of the websocket layer. Success only means the frame was
/// handed to the connection, never that the peer accepted it.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn send(&self, route: &Route, frame: String) -> Result<(), TransportError>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConnectionContext {
    pub connection_id: String,
    pub remote_address: Option<String>,
}

impl ConnectionContext {
    pub fn new(connection_id: &str) -> Self {
        Self {
            connection_id: connection_id.to_string(),
            remote_address: None,
        }
    }
}

/// A raw text frame as delivered by the transport.
#[derive(Clone, Debug)]
pub struct InboundFrame {
    pub received_at: DateTime<Utc>,
    pub source: NodeId,
    pub connection: ConnectionContext,
    pub text: String,
    pub cancel: CancellationToken,
}

impl InboundFrame {
    pub fn new(source: NodeId, connection: ConnectionContext, text: String) -> Self {
        Self {
            received_at: Utc::now(),
            source,
            connection,
            text,
            cancel: CancellationToken::new(),
        }
    }

    pub(crate) fn reply_route(&self) -> Route {
        Route {
            connection_id: self.connection.connection_id.clone(),
            hops: vec![self.source.clone()],
        }
    }
}
