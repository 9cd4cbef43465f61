//! Session-scoped connection registry and broadcast relay.

pub mod events;
pub mod handle;
pub mod registry;
pub mod server;
