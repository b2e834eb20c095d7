//! `shopcore-accounts`: user identity, authentication state, administration.
//!
//! This crate is intentionally decoupled from HTTP and storage. Password
//! hashing and token generation live in their own modules; the aggregate
//! itself only ever sees hashes and digests.

pub mod password;
pub mod permissions;
pub mod roles;
pub mod token;
pub mod user;

pub use permissions::Permission;
pub use roles::Role;
pub use user::{
    AccountStatus, LoginOutcome, RegisterUser, User, UserCommand, UserEvent, UserProfile,
};
