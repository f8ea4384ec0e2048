use core::future::Future;
use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use futures::{future::BoxFuture, FutureExt};
use ocpp_core::v21::{messages::OcppRequest, protocol_error::ProtocolError};
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use crate::v21::{interfaces::ConnectionContext, routing::NodeId, tasks::TaskSupervisor};

/// Everything a handler or filter knows about the call besides its payload.
#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub action: String,
    pub received_at: DateTime<Utc>,
    pub source: NodeId,
    pub connection: ConnectionContext,
    pub event_tracking_id: u64,
    pub cancel: CancellationToken,
    pub tasks: TaskSupervisor,
}

/// What goes back to the peer for one inbound call.
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    Result(serde_json::Value),
    Error(ProtocolError, String),
}

impl Reply {
    pub(crate) fn from_response<R: serde::Serialize>(response: &R) -> Self {
        match serde_json::to_value(response) {
            Ok(payload) => Reply::Result(payload),
            Err(e) => Reply::Error(ProtocolError::InternalError, e.to_string()),
        }
    }
}

type ErasedHandler =
    Arc<dyn Fn(RequestContext, serde_json::Value) -> BoxFuture<'static, Reply> + Send + Sync>;

#[derive(Default)]
pub struct HandlerRegistry {
    handlers: RwLock<HashMap<&'static str, ErasedHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<R, F, Fut>(&self, handler: F)
    where
        R: OcppRequest,
        F: Fn(RequestContext, R) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R::Response> + Send + 'static,
    {
        let erased: ErasedHandler = Arc::new(move |ctx: RequestContext, payload: serde_json::Value| {
            match serde_json::from_value::<R>(payload) {
                Ok(req) => handler(ctx, req)
                    .map(|response| Reply::from_response(&response))
                    .boxed(),
                Err(e) => {
                    let reply = Reply::Error(ProtocolError::FormatViolation, e.to_string());
                    async move { reply }.boxed()
                }
            }
        });
        if self.handlers.write().insert(R::ACTION, erased).is_some() {
            log::warn!("handler for {} replaced", R::ACTION);
        }
    }

    pub fn is_registered(&self, action: &str) -> bool {
        self.handlers.read().contains_key(action)
    }

    pub fn registered_actions(&self) -> Vec<&'static str> {
        let mut actions: Vec<_> = self.handlers.read().keys().copied().collect();
        actions.sort_unstable();
        actions
    }

    /// Runs the handler for `ctx.action`. The reply is always produced here:
    /// unknown actions, bad payloads, overruns and cancellation all map to a
    /// CallError for the peer.
    pub async fn dispatch(
        &self,
        ctx: RequestContext,
        payload: serde_json::Value,
        handler_timeout: Duration,
    ) -> Reply {
        let handler = self.handlers.read().get(ctx.action.as_str()).cloned();
        let Some(handler) = handler else {
            log::warn!("no handler registered for {}", ctx.action);
            return Reply::Error(
                ProtocolError::NotImplemented,
                format!("{} is not implemented", ctx.action),
            );
        };
        let cancel = ctx.cancel.clone();
        let action = ctx.action.clone();
        tokio::select! {
            res = tokio::time::timeout(handler_timeout, handler(ctx, payload)) => match res {
                Ok(reply) => reply,
                Err(_) => {
                    log::error!("{} handler exceeded {:?}", action, handler_timeout);
                    Reply::Error(ProtocolError::InternalError, "handler timed out".into())
                }
            },
            _ = cancel.cancelled() => {
                log::debug!("{} cancelled while handling", action);
                Reply::Error(ProtocolError::GenericError, "Cancelled".into())
            }
        }
    }
}
