//! `shopcore-inquiries`: customer-initiated requests that staff work
//! through: contact messages, quote requests, training registrations.
//!
//! These are plain entities, not command/event aggregates. Each transition is
//! a single method that validates and then mutates the whole document, which
//! is persisted in one write.

pub mod contact;
pub mod quote;
pub mod reply;
pub mod training;

pub use contact::{ContactId, ContactMessage, ContactStatus};
pub use quote::{QuoteId, QuoteRequest, QuoteStatus};
pub use reply::Reply;
pub use training::{TrainingId, TrainingRegistration, TrainingStatus};
