//! `shopcore-store`: the document-store boundary.
//!
//! One trait per persisted aggregate, plus in-memory implementations used by
//! tests and as the reference semantics for a real document-database adapter.
//! Writes are whole-document last-write-wins upserts; uniqueness constraints
//! are checked at save time.

pub mod error;
pub mod order_store;
pub mod product_store;
pub mod user_store;

pub use error::{StoreError, StoreResult};
pub use order_store::{InMemoryOrderStore, OrderStore};
pub use product_store::{InMemoryProductStore, ProductStore};
pub use user_store::{InMemoryUserStore, UserStore};
