pub mod config;
mod core;
mod sender;

pub use self::core::NetworkingNode;
pub use config::NodeConfig;
pub use sender::{RequestOptions, RequestSender};
