//! # Domain Layer
//!
//! Canonical flight records and the search request model.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use errors::{DomainError, DomainResult};
