mod clock;
mod identity;
mod table;

pub use clock::ConnectionClock;
pub use identity::RequestIds;
pub use table::{NodeId, Route, RoutingTable};
