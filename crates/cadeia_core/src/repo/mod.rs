//! Repository ports and persistence adapters.
//!
//! # Responsibility
//! - Define the narrow data-access contracts consumed by the chain engine.
//! - Isolate SQLite query details and cache storage from services.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`PropertyNotFound`,
//!   `DocumentNotFound`) in addition to DB transport errors.

pub mod cache;
pub mod chain_repo;
