//! Quote requests: like contact messages but with a worked/completed stage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopcore_core::{DomainError, DomainResult, EmailAddress, Entity, EntityId};

use crate::reply::Reply;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct QuoteId(pub EntityId);

impl QuoteId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for QuoteId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum QuoteStatus {
    #[default]
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "replied")]
    Replied,
    #[serde(rename = "closed")]
    Closed,
}

/// A request for a custom quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub id: QuoteId,
    pub name: String,
    pub email: EmailAddress,
    pub phone: Option<String>,
    pub company: Option<String>,
    /// Free-text description of what the customer wants quoted.
    pub details: String,
    pub status: QuoteStatus,
    pub replies: Vec<Reply>,
    pub created_at: DateTime<Utc>,
    pub version: u64,
}

impl QuoteRequest {
    pub fn submit(
        id: QuoteId,
        name: impl Into<String>,
        email: &str,
        phone: Option<String>,
        company: Option<String>,
        details: impl Into<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = name.into();
        let details = details.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if details.trim().is_empty() {
            return Err(DomainError::validation("quote details cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            email: EmailAddress::parse(email)?,
            phone,
            company,
            details,
            status: QuoteStatus::Pending,
            replies: Vec::new(),
            created_at: now,
            version: 0,
        })
    }

    fn ensure_open(&self) -> DomainResult<()> {
        if self.status == QuoteStatus::Closed {
            return Err(DomainError::conflict("quote request is closed"));
        }
        Ok(())
    }

    /// Take the request into work.
    pub fn start(&mut self) -> DomainResult<()> {
        self.ensure_open()?;
        if self.status != QuoteStatus::Pending {
            return Err(DomainError::conflict("quote request is already in work"));
        }
        self.status = QuoteStatus::InProgress;
        self.version += 1;
        Ok(())
    }

    /// Mark the quote itself as worked out.
    pub fn complete(&mut self) -> DomainResult<()> {
        self.ensure_open()?;
        if self.status != QuoteStatus::InProgress {
            return Err(DomainError::conflict(
                "only an in-progress quote can be completed",
            ));
        }
        self.status = QuoteStatus::Completed;
        self.version += 1;
        Ok(())
    }

    /// Append a staff reply and stamp the status `replied`.
    pub fn reply(&mut self, reply: Reply) -> DomainResult<()> {
        self.ensure_open()?;
        self.replies.push(reply);
        self.status = QuoteStatus::Replied;
        self.version += 1;
        Ok(())
    }

    pub fn close(&mut self) -> DomainResult<()> {
        self.ensure_open()?;
        self.status = QuoteStatus::Closed;
        self.version += 1;
        Ok(())
    }
}

impl Entity for QuoteRequest {
    type Id = QuoteId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
