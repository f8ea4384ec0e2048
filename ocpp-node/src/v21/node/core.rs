use std::{sync::Arc, time::Duration};

use chrono::Utc;
use ocpp_core::{
    format::{
        frame::{Call, CallError, CallResult},
        message::{EncodeDecode, OcppMessage},
    },
    v21::protocol_error::ProtocolError,
};
use tokio_util::sync::CancellationToken;

use crate::v21::{
    correlator::{Completion, Correlator},
    error::OcppError,
    forwarding::{DecisionKind, ForwardingEngine},
    interfaces::{ConnectionContext, InboundFrame, Transport},
    registry::{HandlerRegistry, Reply, RequestContext},
    routing::{ConnectionClock, NodeId, RequestIds, Route, RoutingTable},
    tasks::TaskSupervisor,
};

use super::{config::NodeConfig, sender::RequestSender};

/// One OCPP participant: correlates what it sends, filters and dispatches
/// what it receives.
pub struct NetworkingNode<T: Transport> {
    config: NodeConfig,
    sender: RequestSender<T>,
    forwarding: ForwardingEngine,
    registry: HandlerRegistry,
    tasks: TaskSupervisor,
    shutdown: CancellationToken,
}

impl<T: Transport> NetworkingNode<T> {
    pub fn new(config: NodeConfig, transport: Arc<T>) -> Self {
        let correlator = Arc::new(Correlator::new(transport, config.call_timeout()));
        let sender = RequestSender::new(
            NodeId::new(config.node_id.clone()),
            NodeId::new(config.csms_id.clone()),
            correlator,
            Arc::new(RoutingTable::new()),
            Arc::new(RequestIds::new(config.seed)),
            Arc::new(ConnectionClock::new()),
        );
        Self {
            config,
            sender,
            forwarding: ForwardingEngine::new(),
            registry: HandlerRegistry::new(),
            tasks: TaskSupervisor::new(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn sender(&self) -> &RequestSender<T> {
        &self.sender
    }

    pub fn correlator(&self) -> &Arc<Correlator<T>> {
        self.sender.correlator()
    }

    pub fn routing(&self) -> &Arc<RoutingTable> {
        self.sender.routing()
    }

    pub fn forwarding(&self) -> &ForwardingEngine {
        &self.forwarding
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn tasks(&self) -> &TaskSupervisor {
        &self.tasks
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Makes `destination` reachable as a direct neighbour on `connection_id`.
    pub fn connect(&self, destination: NodeId, connection_id: &str) {
        let route = Route::direct(connection_id, destination.clone());
        self.routing().add_route(destination, route);
    }

    /// Frame whose handling is cancelled when the node shuts down.
    pub fn frame(&self, source: NodeId, connection: ConnectionContext, text: String) -> InboundFrame {
        InboundFrame {
            received_at: Utc::now(),
            source,
            connection,
            text,
            cancel: self.shutdown.child_token(),
        }
    }

    /// Handles the frame on its own supervised task.
    pub fn handle_frame(self: &Arc<Self>, frame: InboundFrame) {
        let node = self.clone();
        self.tasks
            .spawn("inbound frame", async move { node.process_frame(frame).await });
    }

    pub async fn process_frame(&self, frame: InboundFrame) -> Result<(), OcppError> {
        log::info!("[MSG_IN] {}", frame.text);
        match OcppMessage::<ProtocolError>::decode(frame.text.clone()) {
            OcppMessage::Call(call) => {
                let unique_id = call.unique_id.clone();
                let reply = self.handle_call(&frame, call).await;
                self.send_reply(&frame, unique_id, reply).await
            }
            OcppMessage::CallResponse(response) => {
                if self.correlator().complete(response) == Completion::Orphan {
                    log::debug!("response on connection {} matched nothing", frame.connection.connection_id);
                }
                Ok(())
            }
            OcppMessage::Invalid(invalid) => {
                log::warn!("invalid frame from {}: {}", frame.source, invalid.err_msg);
                match invalid.unique_id {
                    Some(unique_id) => {
                        let reply = Reply::Error(ProtocolError::FormatViolation, invalid.err_msg);
                        self.send_reply(&frame, unique_id, reply).await
                    }
                    None => Ok(()),
                }
            }
        }
    }

    async fn handle_call(&self, frame: &InboundFrame, call: Call) -> Reply {
        let ctx = RequestContext {
            request_id: call.unique_id,
            action: call.action,
            received_at: frame.received_at,
            source: frame.source.clone(),
            connection: frame.connection.clone(),
            event_tracking_id: self.sender.ids().next_event_tracking_id(),
            cancel: frame.cancel.clone(),
            tasks: self.tasks.clone(),
        };
        let record = self.forwarding.decide(&ctx, &call.payload);
        match (record.decision, record.reply) {
            (DecisionKind::Forward, _) | (_, None) => {
                self.registry
                    .dispatch(ctx, call.payload, self.config.handler_timeout())
                    .await
            }
            (decision, Some(reply)) => {
                log::info!(
                    "{} `{}` answered by filter ({:?}{})",
                    record.action,
                    record.request_id,
                    decision,
                    record.reason.map(|r| format!(": {}", r)).unwrap_or_default()
                );
                reply
            }
        }
    }

    async fn send_reply(
        &self,
        frame: &InboundFrame,
        unique_id: String,
        reply: Reply,
    ) -> Result<(), OcppError> {
        let text = match reply {
            Reply::Result(payload) => CallResult::new(unique_id, payload).encode(),
            Reply::Error(code, description) => CallError::new(unique_id, code)
                .with_description(description)
                .encode(),
        };
        log::info!("[MSG_OUT] {}", text);
        self.correlator()
            .transport()
            .send(&frame.reply_route(), text)
            .await
            .map_err(OcppError::from)
    }

    /// Periodically times out requests whose deadline passed without anyone
    /// waiting on their handle. Stops on shutdown.
    pub fn spawn_sweeper(self: &Arc<Self>) {
        let node = self.clone();
        let interval = self.config.sweep_interval().max(Duration::from_millis(1));
        self.tasks.spawn("request sweeper", async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let expired = node.correlator().sweep_expired();
                        if expired > 0 {
                            log::debug!("sweeper timed out {} request(s)", expired);
                        }
                    }
                    _ = node.shutdown.cancelled() => return Ok(()),
                }
            }
        });
    }

    /// Fails the requests sent over the lost connection and forgets its routes.
    pub fn connection_lost(&self, connection_id: &str) -> Vec<NodeId> {
        let failed = self.correlator().fail_connection(connection_id);
        let unreachable = self.routing().remove_connection(connection_id);
        self.sender.clock().forget(connection_id);
        log::warn!(
            "connection {} lost: {} request(s) failed, {} node(s) unreachable",
            connection_id,
            failed,
            unreachable.len()
        );
        unreachable
    }

    pub async fn shutdown(&self) {
        log::info!("shutting down node {}", self.sender.node_id());
        self.shutdown.cancel();
        self.tasks.shutdown().await;
    }
}
