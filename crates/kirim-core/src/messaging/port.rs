use async_trait::async_trait;

use crate::{
    domain::{GroupInfo, MessagingId, NormalizedPhone},
    messaging::types::{OutgoingContent, SessionState},
    Result,
};

/// Port to the chat-network client.
///
/// Session authentication, the wire protocol and reconnection all live behind
/// this interface; the core only enumerates, looks up, sends and asks for state.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Every group the session belongs to, in the client's enumeration order.
    async fn enumerate_groups(&self) -> Result<Vec<GroupInfo>>;

    /// `Ok(None)` when the number has no account on the network.
    async fn lookup_number(&self, phone: &NormalizedPhone) -> Result<Option<MessagingId>>;

    async fn send(&self, to: &MessagingId, content: OutgoingContent) -> Result<()>;

    async fn get_state(&self) -> Result<SessionState>;

    /// Re-establish the session, reusing persisted credentials.
    async fn initialize(&self) -> Result<()>;
}
