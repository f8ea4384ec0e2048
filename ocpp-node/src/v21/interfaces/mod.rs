mod transport;

pub use transport::{ConnectionContext, InboundFrame, Transport};
