//! Staff reply embedded in an inquiry document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopcore_core::{DomainError, DomainResult, UserId};

/// A single staff reply. `author_id` is absent for replies imported from the
/// shared mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub author_id: Option<UserId>,
    pub author_name: String,
    pub message: String,
    pub sent_at: DateTime<Utc>,
}

impl Reply {
    pub fn new(
        author_id: Option<UserId>,
        author_name: impl Into<String>,
        message: impl Into<String>,
        sent_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let author_name = author_name.into();
        let message = message.into();
        if author_name.trim().is_empty() {
            return Err(DomainError::validation("reply author name cannot be empty"));
        }
        if message.trim().is_empty() {
            return Err(DomainError::validation("reply message cannot be empty"));
        }
        Ok(Self {
            author_id,
            author_name,
            message,
            sent_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_message() {
        let err = Reply::new(None, "Sam", "   ", Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
