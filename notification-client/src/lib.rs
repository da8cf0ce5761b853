//! Client side of the notification stream: transport, reconnection policy
//! and a local mirror of the caller's recent notifications.

pub mod backoff;
pub mod controller;
pub mod frame;
pub mod mirror;
pub mod transport;

pub use controller::{spawn, ConnectionStatus, ControllerHandle};
pub use frame::{Envelope, Notification, Snapshot};
pub use mirror::Mirror;
pub use transport::{EventSourceTransport, Transport, TransportError};
