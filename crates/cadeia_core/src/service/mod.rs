//! Chain-of-title use-case services.
//!
//! # Responsibility
//! - Orchestrate parser, resolver and repository calls into tree and trunk
//!   payloads.
//! - Keep rendering and storage collaborators decoupled from the engine.

pub mod chain_tree_service;
pub mod error;
pub mod levels;
pub mod origin_service;
pub mod provisioner;
pub mod resolver;
pub mod trunk_service;
