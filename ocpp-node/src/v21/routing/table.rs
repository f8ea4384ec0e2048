use dashmap::DashMap;

use crate::v21::error::OcppError;

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for NodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Where a frame for a given node has to be written: the local connection it
/// leaves on and the hops it will traverse, destination last.
#[derive(Clone, Debug, PartialEq)]
pub struct Route {
    pub connection_id: String,
    pub hops: Vec<NodeId>,
}

impl Route {
    pub fn direct(connection_id: &str, destination: NodeId) -> Self {
        Self {
            connection_id: connection_id.to_string(),
            hops: vec![destination],
        }
    }
}

#[derive(Default)]
pub struct RoutingTable {
    routes: DashMap<NodeId, Route>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_route(&self, destination: NodeId, route: Route) {
        log::debug!("route {} via connection {}", destination, route.connection_id);
        self.routes.insert(destination, route);
    }

    pub fn remove_route(&self, destination: &NodeId) -> Option<Route> {
        self.routes.remove(destination).map(|(_, route)| route)
    }

    /// Drops every route that leaves on `connection_id`, returning the
    /// destinations that became unreachable.
    pub fn remove_connection(&self, connection_id: &str) -> Vec<NodeId> {
        let lost: Vec<NodeId> = self
            .routes
            .iter()
            .filter(|entry| entry.value().connection_id == connection_id)
            .map(|entry| entry.key().clone())
            .collect();
        for destination in lost.iter() {
            self.routes.remove(destination);
        }
        lost
    }

    pub fn resolve(&self, destination: &NodeId) -> Result<Route, OcppError> {
        self.routes
            .get(destination)
            .map(|route| route.value().clone())
            .ok_or_else(|| OcppError::UnknownDestination(destination.to_string()))
    }

    pub fn routes(&self) -> Vec<(NodeId, Route)> {
        let mut routes: Vec<_> = self
            .routes
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        routes.sort_by(|a, b| a.0.cmp(&b.0));
        routes
    }
}
