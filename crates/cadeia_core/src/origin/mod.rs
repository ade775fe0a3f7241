//! Free-text origin reference handling.
//!
//! # Responsibility
//! - Extract normalized document identifiers from origin text.
//!
//! # Invariants
//! - Parsing never fails; unparseable text yields no identifiers.

pub mod parser;
