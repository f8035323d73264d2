/// Core error type for the gateway.
///
/// Adapter crates map their specific failures into [`Error::External`] so the
/// dispatch layer and the HTTP surface can treat collaborator faults uniformly.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    External(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("messaging client not ready")]
    NotReady,

    #[error("group \"{name}\" not found")]
    GroupNotFound {
        name: String,
        suggestions: Vec<String>,
    },

    #[error("send failed: {0}")]
    SendFailure(String),

    #[error("unauthorized")]
    Unauthorized,
}

impl Error {
    /// Message suitable for a client-facing response body.
    ///
    /// Collaborator messages are surfaced verbatim rather than wrapped.
    pub fn detail(&self) -> String {
        match self {
            Error::External(msg) | Error::SendFailure(msg) | Error::InvalidInput(msg) => {
                msg.clone()
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_keeps_collaborator_message_verbatim() {
        let e = Error::SendFailure("Evaluation failed: rate-overlimit".to_string());
        assert_eq!(e.detail(), "Evaluation failed: rate-overlimit");
        assert_eq!(e.to_string(), "send failed: Evaluation failed: rate-overlimit");
    }

    #[test]
    fn group_not_found_names_the_group() {
        let e = Error::GroupNotFound {
            name: "Pengajian".to_string(),
            suggestions: vec![],
        };
        assert_eq!(e.detail(), "group \"Pengajian\" not found");
    }
}
