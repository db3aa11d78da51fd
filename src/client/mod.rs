//! Protocol client seam
//!
//! [`ProtocolClient`] is the boundary between the transport and whatever
//! speaks MQTT on the wire. [`MockProtocolClient`] implements it in memory
//! for tests.

pub mod mock;
mod r#trait;

pub use self::mock::{MockCall, MockMethod, MockProtocolClient};
pub use self::r#trait::{ClientError, ClientResult, EventHandler, ProtocolClient, ProtocolEvents};
