pub mod correlator;
pub mod error;
pub mod forwarding;
pub mod interfaces;
pub mod node;
pub mod registry;
pub mod routing;
pub mod station;
pub mod store;
mod tasks;

pub use {
    correlator::{Completion, Correlator, RequestEnvelope, ResponseEnvelope, ResponseHandle, Signature},
    error::{OcppError, TransportError},
    forwarding::{DecisionKind, ForwardingDecision, ForwardingEngine, ForwardingRecord, Rejectable, FILTERED},
    interfaces::{ConnectionContext, InboundFrame, Transport},
    node::{NetworkingNode, NodeConfig, RequestOptions, RequestSender},
    registry::{HandlerRegistry, Reply, RequestContext},
    routing::{ConnectionClock, NodeId, RequestIds, Route, RoutingTable},
    station::ChargingStation,
    store::EntityStore,
    tasks::TaskSupervisor,
};
