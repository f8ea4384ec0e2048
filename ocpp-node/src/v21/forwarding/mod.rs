mod rejection;

use std::{collections::HashMap, sync::Arc};

use ocpp_core::v21::{messages::OcppRequest, types::StatusInfo};
use parking_lot::RwLock;

use crate::v21::registry::{Reply, RequestContext};

pub use rejection::Rejectable;

/// Reason code put into `statusInfo` when a filter rejects a call.
pub const FILTERED: &str = "Filtered";

/// What a filter wants done with one inbound call.
#[derive(Clone, Debug, PartialEq)]
pub enum ForwardingDecision<R> {
    Forward,
    Reject(String),
    Replace(R),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecisionKind {
    Forward,
    Reject,
    Replace,
}

/// Outcome of running the filters of one call. `reply` is set for every
/// decision other than `Forward`.
#[derive(Clone, Debug, PartialEq)]
pub struct ForwardingRecord {
    pub request_id: String,
    pub action: String,
    pub decision: DecisionKind,
    pub reply: Option<Reply>,
    pub reason: Option<String>,
}

impl ForwardingRecord {
    fn forward(ctx: &RequestContext) -> Self {
        Self {
            request_id: ctx.request_id.clone(),
            action: ctx.action.clone(),
            decision: DecisionKind::Forward,
            reply: None,
            reason: None,
        }
    }
}

type ErasedFilter = Arc<
    dyn Fn(&RequestContext, &serde_json::Value) -> Option<(DecisionKind, Reply, Option<String>)>
        + Send
        + Sync,
>;

/// Filters consulted before any handler runs.
#[derive(Default)]
pub struct ForwardingEngine {
    filters: RwLock<HashMap<&'static str, Vec<ErasedFilter>>>,
}

impl ForwardingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters for the same action run in the order they were added.
    pub fn add_filter<R, F>(&self, filter: F)
    where
        R: OcppRequest,
        R::Response: Rejectable,
        F: Fn(&RequestContext, &R) -> ForwardingDecision<R::Response> + Send + Sync + 'static,
    {
        let erased: ErasedFilter = Arc::new(move |ctx: &RequestContext, payload: &serde_json::Value| {
            // malformed payloads are left for the registry to report
            let req = serde_json::from_value::<R>(payload.clone()).ok()?;
            match filter(ctx, &req) {
                ForwardingDecision::Forward => None,
                ForwardingDecision::Reject(reason) => {
                    let response = <R::Response as Rejectable>::rejected(StatusInfo::with_info(
                        FILTERED,
                        reason.clone(),
                    ));
                    Some((DecisionKind::Reject, Reply::from_response(&response), Some(reason)))
                }
                ForwardingDecision::Replace(response) => {
                    Some((DecisionKind::Replace, Reply::from_response(&response), None))
                }
            }
        });
        self.filters.write().entry(R::ACTION).or_default().push(erased);
    }

    pub fn filter_count(&self, action: &str) -> usize {
        self.filters.read().get(action).map(|f| f.len()).unwrap_or(0)
    }

    pub fn decide(&self, ctx: &RequestContext, payload: &serde_json::Value) -> ForwardingRecord {
        let filters = match self.filters.read().get(ctx.action.as_str()) {
            Some(filters) => filters.clone(),
            None => return ForwardingRecord::forward(ctx),
        };
        for filter in filters.iter() {
            if let Some((decision, reply, reason)) = filter(ctx, payload) {
                return ForwardingRecord {
                    request_id: ctx.request_id.clone(),
                    action: ctx.action.clone(),
                    decision,
                    reply: Some(reply),
                    reason,
                };
            }
        }
        ForwardingRecord::forward(ctx)
    }
}
