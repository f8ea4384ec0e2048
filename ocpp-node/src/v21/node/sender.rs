use std::{sync::Arc, time::Duration};

use ocpp_core::v21::messages::OcppRequest;
use tokio_util::sync::CancellationToken;

use crate::v21::{
    correlator::{Correlator, RequestEnvelope, ResponseHandle, Signature},
    error::OcppError,
    interfaces::Transport,
    routing::{ConnectionClock, NodeId, RequestIds, Route, RoutingTable},
};

/// Per-call overrides. Anything left unset is filled in by the sender.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    pub timeout: Option<Duration>,
    pub request_id: Option<String>,
    pub event_tracking_id: Option<u64>,
    pub cancel: Option<CancellationToken>,
    pub signatures: Vec<Signature>,
}

impl RequestOptions {
    pub fn timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Self::default()
        }
    }

    pub fn with_request_id(mut self, request_id: &str) -> Self {
        self.request_id = Some(request_id.to_string());
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Outbound side of a node. Cheap to clone, so handlers can keep one without
/// holding on to the node itself.
pub struct RequestSender<T: Transport> {
    node_id: NodeId,
    csms_id: NodeId,
    correlator: Arc<Correlator<T>>,
    routing: Arc<RoutingTable>,
    ids: Arc<RequestIds>,
    clock: Arc<ConnectionClock>,
}

impl<T: Transport> Clone for RequestSender<T> {
    fn clone(&self) -> Self {
        Self {
            node_id: self.node_id.clone(),
            csms_id: self.csms_id.clone(),
            correlator: self.correlator.clone(),
            routing: self.routing.clone(),
            ids: self.ids.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<T: Transport> RequestSender<T> {
    pub(crate) fn new(
        node_id: NodeId,
        csms_id: NodeId,
        correlator: Arc<Correlator<T>>,
        routing: Arc<RoutingTable>,
        ids: Arc<RequestIds>,
        clock: Arc<ConnectionClock>,
    ) -> Self {
        Self {
            node_id,
            csms_id,
            correlator,
            routing,
            ids,
            clock,
        }
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    pub fn csms_id(&self) -> &NodeId {
        &self.csms_id
    }

    pub fn correlator(&self) -> &Arc<Correlator<T>> {
        &self.correlator
    }

    pub fn routing(&self) -> &Arc<RoutingTable> {
        &self.routing
    }

    pub fn ids(&self) -> &Arc<RequestIds> {
        &self.ids
    }

    pub fn clock(&self) -> &Arc<ConnectionClock> {
        &self.clock
    }

    pub fn next_request_id(&self) -> String {
        self.ids
            .next_request_id(|id| self.correlator.is_pending(id))
    }

    pub fn envelope<R: OcppRequest>(
        &self,
        destination: &NodeId,
        route: &Route,
        payload: R,
        options: &RequestOptions,
    ) -> RequestEnvelope<R> {
        let mut network_path = Vec::with_capacity(route.hops.len() + 1);
        network_path.push(self.node_id.clone());
        network_path.extend(route.hops.iter().cloned());
        RequestEnvelope {
            request_id: options
                .request_id
                .clone()
                .unwrap_or_else(|| self.next_request_id()),
            action: R::ACTION,
            timestamp: self.clock.stamp(&route.connection_id),
            timeout: options.timeout.unwrap_or(self.correlator.default_timeout()),
            event_tracking_id: options
                .event_tracking_id
                .unwrap_or_else(|| self.ids.next_event_tracking_id()),
            destination: destination.clone(),
            network_path,
            payload,
            signatures: options.signatures.clone(),
        }
    }

    /// Writes the request and returns without waiting for the response.
    pub async fn submit<R: OcppRequest>(
        &self,
        destination: &NodeId,
        payload: R,
        options: &RequestOptions,
    ) -> Result<ResponseHandle, OcppError> {
        let route = self.routing.resolve(destination)?;
        let envelope = self.envelope(destination, &route, payload, options);
        self.correlator
            .send(&route, &envelope, options.timeout)
            .await
    }

    /// Sends the request and waits for its typed response.
    pub async fn send<R: OcppRequest>(
        &self,
        destination: &NodeId,
        payload: R,
        options: RequestOptions,
    ) -> Result<R::Response, OcppError> {
        let handle = self.submit(destination, payload, &options).await?;
        let cancel = options.cancel.unwrap_or_default();
        let value = handle.recv(&cancel).await?;
        serde_json::from_value::<R::Response>(value).map_err(|e| {
            log::warn!("malformed {} response: {}", R::ACTION, e);
            OcppError::Parsing(e.to_string())
        })
    }

    pub async fn send_to_csms<R: OcppRequest>(&self, payload: R) -> Result<R::Response, OcppError> {
        let csms = self.csms_id.clone();
        self.send(&csms, payload, RequestOptions::default()).await
    }
}
