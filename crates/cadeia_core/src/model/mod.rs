//! Chain-of-title domain model.
//!
//! # Responsibility
//! - Define persisted records (properties, documents, entries).
//! - Define transient traversal shapes (nodes, edges, tree results).
//!
//! # Invariants
//! - Document numbers are unique only within one registry office.
//! - Traversal records are recomputed per request and never persisted.

pub mod chain;
pub mod document;
pub mod property;
