//! Wire-format events relayed over each connection.

use serde::Serialize;

/// A server → client event, serialized as `{"type": ..., "payload": {...}}`.
///
/// Delivery is at-most-once per live connection: no acks, no sequence
/// numbers, no retry on send failure.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Sent to the joining client only, carrying its assigned id.
    #[serde(rename_all = "camelCase")]
    SessionJoined { session_id: String, client_id: String },
    /// Sent to every other current member when a client joins.
    #[serde(rename_all = "camelCase")]
    ClientJoined { client_id: String },
    /// Sent to every remaining member when a client leaves.
    #[serde(rename_all = "camelCase")]
    ClientLeft { client_id: String },
    /// Opaque capture payload fanned out to every other member.
    #[serde(rename_all = "camelCase")]
    ScreenData { client_id: String, data: String },
}
