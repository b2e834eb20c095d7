//! Contact-form messages and the staff workflow around them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopcore_core::{DomainError, DomainResult, EmailAddress, Entity, EntityId};

use crate::reply::Reply;

/// Strongly-typed contact message identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct ContactId(pub EntityId);

impl ContactId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ContactId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    #[default]
    Pending,
    Read,
    Replied,
    Closed,
}

/// A message submitted through the contact form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: ContactId,
    pub name: String,
    pub email: EmailAddress,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    pub status: ContactStatus,
    pub replies: Vec<Reply>,
    pub created_at: DateTime<Utc>,
    pub version: u64,
}

impl ContactMessage {
    pub fn submit(
        id: ContactId,
        name: impl Into<String>,
        email: &str,
        phone: Option<String>,
        subject: impl Into<String>,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = name.into();
        let subject = subject.into();
        let message = message.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if message.trim().is_empty() {
            return Err(DomainError::validation("message cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            email: EmailAddress::parse(email)?,
            phone,
            subject,
            message,
            status: ContactStatus::Pending,
            replies: Vec::new(),
            created_at: now,
            version: 0,
        })
    }

    fn ensure_open(&self) -> DomainResult<()> {
        if self.status == ContactStatus::Closed {
            return Err(DomainError::conflict("contact message is closed"));
        }
        Ok(())
    }

    /// Mark a pending message as read. Reading an already-read or replied
    /// message is a no-op, not an error.
    pub fn mark_read(&mut self) -> DomainResult<()> {
        self.ensure_open()?;
        if self.status == ContactStatus::Pending {
            self.status = ContactStatus::Read;
            self.version += 1;
        }
        Ok(())
    }

    /// Append a staff reply and stamp the status `replied`.
    pub fn reply(&mut self, reply: Reply) -> DomainResult<()> {
        self.ensure_open()?;
        self.replies.push(reply);
        self.status = ContactStatus::Replied;
        self.version += 1;
        Ok(())
    }

    pub fn close(&mut self) -> DomainResult<()> {
        self.ensure_open()?;
        self.status = ContactStatus::Closed;
        self.version += 1;
        Ok(())
    }
}

impl Entity for ContactMessage {
    type Id = ContactId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
