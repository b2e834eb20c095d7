//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**; two value
/// objects with the same attribute values are equal. To "modify" one, build a
/// new one. `Slug` and `EmailAddress` are the canonical examples in this
/// workspace; `Review` and `DeliveryLocation` follow the same discipline in
/// the catalog crate.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
