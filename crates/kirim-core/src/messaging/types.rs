use std::fmt;

use serde::{Deserialize, Serialize};

/// Session state as reported by the chat-network client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    Connected,
    Opening,
    Pairing,
    Unpaired,
    UnpairedIdle,
    Conflict,
    Timeout,
    Unlaunched,
    DeprecatedVersion,
    Proxyblock,
    TosBlock,
    SmbTosBlock,
    #[serde(other)]
    Unknown,
}

impl SessionState {
    /// Only an authenticated, connected session can resolve and send.
    pub fn is_ready(self) -> bool {
        self == SessionState::Connected
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Connected => "CONNECTED",
            SessionState::Opening => "OPENING",
            SessionState::Pairing => "PAIRING",
            SessionState::Unpaired => "UNPAIRED",
            SessionState::UnpairedIdle => "UNPAIRED_IDLE",
            SessionState::Conflict => "CONFLICT",
            SessionState::Timeout => "TIMEOUT",
            SessionState::Unlaunched => "UNLAUNCHED",
            SessionState::DeprecatedVersion => "DEPRECATED_VERSION",
            SessionState::Proxyblock => "PROXYBLOCK",
            SessionState::TosBlock => "TOS_BLOCK",
            SessionState::SmbTosBlock => "SMB_TOS_BLOCK",
            SessionState::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File attachment as supplied by a caller. `data` is base64 and is passed
/// through to the messaging client untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Attachment {
    pub mime: String,
    pub data: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

/// Media item handed to the messaging client, with defaults applied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MediaAttachment {
    pub mime: String,
    pub data: String,
    pub filename: String,
    pub caption: String,
}

impl From<&Attachment> for MediaAttachment {
    fn from(a: &Attachment) -> Self {
        Self {
            mime: a.mime.clone(),
            data: a.data.clone(),
            filename: a
                .filename
                .clone()
                .filter(|f| !f.is_empty())
                .unwrap_or_else(|| "file".to_string()),
            caption: a.caption.clone().unwrap_or_default(),
        }
    }
}

/// One send call's worth of content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutgoingContent {
    Text(String),
    Media(MediaAttachment),
}

/// What a caller asked to deliver: optional text plus ordered attachments.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Payload {
    pub text: Option<String>,
    pub attachments: Vec<Attachment>,
}

impl Payload {
    pub fn new(text: Option<String>, attachments: Vec<Attachment>) -> Self {
        Self { text, attachments }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            attachments: Vec::new(),
        }
    }

    /// Text that will actually be sent; whitespace-only text is skipped.
    pub fn sendable_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }

    pub fn has_content(&self) -> bool {
        self.sendable_text().is_some() || !self.attachments.is_empty()
    }

    /// The send calls this payload expands to, in delivery order:
    /// text first, then each attachment with its own caption.
    pub fn contents(&self) -> Vec<OutgoingContent> {
        let mut out = Vec::with_capacity(self.attachments.len() + 1);
        if let Some(text) = self.sendable_text() {
            out.push(OutgoingContent::Text(text.to_string()));
        }
        out.extend(
            self.attachments
                .iter()
                .map(|a| OutgoingContent::Media(MediaAttachment::from(a))),
        );
        out
    }
}
