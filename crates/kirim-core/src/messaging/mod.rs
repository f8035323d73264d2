//! Port to the chat-network client plus the payload types that cross it.

pub mod port;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;
