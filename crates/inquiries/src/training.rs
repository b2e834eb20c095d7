//! Training course registrations.
//!
//! Unlike contact messages and quote requests, registrations carry money:
//! confirmation must precede payment, and completion freezes the record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopcore_core::{DomainError, DomainResult, EmailAddress, Entity, EntityId};

use crate::reply::Reply;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct TrainingId(pub EntityId);

impl TrainingId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for TrainingId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TrainingStatus {
    #[default]
    Pending,
    Confirmed,
    Paid,
    Completed,
    Cancelled,
}

/// A registration for a training course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingRegistration {
    pub id: TrainingId,
    pub name: String,
    pub email: EmailAddress,
    pub phone: Option<String>,
    pub course: String,
    pub preferred_date: Option<DateTime<Utc>>,
    pub status: TrainingStatus,
    /// Amount received, in minor currency units.
    pub amount_paid: u64,
    pub replies: Vec<Reply>,
    pub created_at: DateTime<Utc>,
    pub version: u64,
}

impl TrainingRegistration {
    pub fn submit(
        id: TrainingId,
        name: impl Into<String>,
        email: &str,
        phone: Option<String>,
        course: impl Into<String>,
        preferred_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = name.into();
        let course = course.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if course.trim().is_empty() {
            return Err(DomainError::validation("course cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            email: EmailAddress::parse(email)?,
            phone,
            course,
            preferred_date,
            status: TrainingStatus::Pending,
            amount_paid: 0,
            replies: Vec::new(),
            created_at: now,
            version: 0,
        })
    }

    pub fn confirm(&mut self) -> DomainResult<()> {
        if self.status != TrainingStatus::Pending {
            return Err(DomainError::conflict(
                "only a pending registration can be confirmed",
            ));
        }
        self.status = TrainingStatus::Confirmed;
        self.version += 1;
        Ok(())
    }

    /// Record the course fee. Confirmation must come first.
    pub fn record_payment(&mut self, amount: u64) -> DomainResult<()> {
        if amount == 0 {
            return Err(DomainError::validation("payment amount must be positive"));
        }
        if self.status != TrainingStatus::Confirmed {
            return Err(DomainError::conflict(
                "payment requires a confirmed registration",
            ));
        }
        self.amount_paid = self.amount_paid.saturating_add(amount);
        self.status = TrainingStatus::Paid;
        self.version += 1;
        Ok(())
    }

    pub fn complete(&mut self) -> DomainResult<()> {
        if self.status != TrainingStatus::Paid {
            return Err(DomainError::conflict(
                "only a paid registration can be completed",
            ));
        }
        self.status = TrainingStatus::Completed;
        self.version += 1;
        Ok(())
    }

    /// Cancellation is blocked once the course has been completed.
    pub fn cancel(&mut self) -> DomainResult<()> {
        match self.status {
            TrainingStatus::Completed => {
                Err(DomainError::conflict("a completed registration cannot be cancelled"))
            }
            TrainingStatus::Cancelled => {
                Err(DomainError::conflict("registration is already cancelled"))
            }
            _ => {
                self.status = TrainingStatus::Cancelled;
                self.version += 1;
                Ok(())
            }
        }
    }

    pub fn reply(&mut self, reply: Reply) -> DomainResult<()> {
        self.replies.push(reply);
        self.version += 1;
        Ok(())
    }
}

impl Entity for TrainingRegistration {
    type Id = TrainingId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submitted() -> TrainingRegistration {
        TrainingRegistration::submit(
            TrainingId::new(EntityId::new()),
            "Jane Doe",
            "jane@example.com",
            Some("+1 555 0100".to_string()),
            "Scale calibration basics",
            None,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn full_flow_pending_to_completed() {
        let mut reg = submitted();
        reg.confirm().unwrap();
        reg.record_payment(25_000).unwrap();
        assert_eq!(reg.status, TrainingStatus::Paid);
        assert_eq!(reg.amount_paid, 25_000);
        reg.complete().unwrap();
        assert_eq!(reg.status, TrainingStatus::Completed);
    }

    #[test]
    fn payment_requires_confirmation_first() {
        let mut reg = submitted();
        assert!(matches!(
            reg.record_payment(25_000),
            Err(DomainError::Conflict(_))
        ));
    }

    #[test]
    fn completed_registration_cannot_be_cancelled() {
        let mut reg = submitted();
        reg.confirm().unwrap();
        reg.record_payment(25_000).unwrap();
        reg.complete().unwrap();
        assert!(matches!(reg.cancel(), Err(DomainError::Conflict(_))));
    }

    #[test]
    fn cancel_allowed_before_completion() {
        let mut reg = submitted();
        reg.confirm().unwrap();
        reg.cancel().unwrap();
        assert_eq!(reg.status, TrainingStatus::Cancelled);
        assert!(matches!(reg.cancel(), Err(DomainError::Conflict(_))));
    }

    #[test]
    fn wire_strings_are_stable() {
        assert_eq!(
            serde_json::to_string(&TrainingStatus::Confirmed).unwrap(),
            "\"confirmed\""
        );
        let parsed: TrainingStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(parsed, TrainingStatus::Cancelled);
    }
}
