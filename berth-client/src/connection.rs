//! Stream channel management
//!
//! Provides persistent WebSocket connections to the container host, one per
//! endpoint, with ordered single-consumer event delivery and no automatic
//! reconnection.

mod channel;
mod endpoint;
mod handler;
#[cfg(test)]
pub(crate) mod testing;

pub use channel::{ChannelState, StreamChannel};
pub use endpoint::{EndpointKey, EndpointKind};
pub use handler::{ChannelEvent, Connector, WsConnector};
