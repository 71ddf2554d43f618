//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value** — two instances
/// with the same attributes are the same value. `Money` is a value object;
/// `Product` (which has an identity) is not.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
