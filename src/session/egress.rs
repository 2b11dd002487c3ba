use async_trait::async_trait;

/// Outbound half of a transport
///
/// Implementations hand an already-serialized payload to the wire. A closed
/// or missing transport is reported as `false`; it is never an error.
#[async_trait]
pub trait Egress: Send + Sync {
    /// Queue `text` for delivery. Returns whether it was accepted.
    async fn transmit(&self, text: String) -> bool;

    /// Whether the transport can still accept payloads
    fn is_open(&self) -> bool;

    /// Transport name for logging
    fn name(&self) -> &str;
}
