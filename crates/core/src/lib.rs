//! `shopcore-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod aggregate;
pub mod email;
pub mod entity;
pub mod error;
pub mod event;
pub mod id;
pub mod slug;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot};
pub use email::EmailAddress;
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use event::Event;
pub use id::{EntityId, UserId};
pub use slug::Slug;
pub use value_object::ValueObject;
