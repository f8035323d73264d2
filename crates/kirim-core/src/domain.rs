use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable, network-assigned id of a group or personal account
/// (e.g. `628123456789@c.us`, `120363041234567890@g.us`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessagingId(pub String);

impl MessagingId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessagingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical phone number: digits only, country code prefixed, no `+`, 8..=15 digits.
///
/// Only [`crate::phone::normalize`] constructs one.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NormalizedPhone(String);

impl NormalizedPhone {
    pub(crate) fn new_unchecked(digits: String) -> Self {
        Self(digits)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedPhone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A group as enumerated by the messaging client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInfo {
    pub id: MessagingId,
    pub name: String,
}

impl GroupInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: MessagingId(id.into()),
            name: name.into(),
        }
    }
}
