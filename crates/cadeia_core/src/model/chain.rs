//! Transient traversal records produced by the chain engine.
//!
//! # Responsibility
//! - Give explicit shapes to tree and trunk payloads consumed by renderers.
//!
//! # Invariants
//! - Edges always point child -> parent (document -> its origin).
//! - A `TreeResult` never lists the same document id twice.

use crate::model::document::{Document, DocumentId, Entry};
use crate::model::property::{OfficeId, Property, PropertyId};
use serde::Serialize;
use std::collections::BTreeMap;

/// Caller-supplied trunk choices: `document id -> chosen origin number`.
pub type OverrideMap = BTreeMap<DocumentId, String>;

/// Document plus traversal-computed metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentNode {
    pub document: Document,
    /// Distance from the principal document, or the pinned level.
    pub level: u32,
    /// Document is owned by a different property than the traversed one.
    pub is_shared: bool,
    pub is_principal: bool,
    pub total_entries: u32,
}

/// Relationship kind recorded by an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Origin parsed from a chain-opening entry.
    OriginEntry,
}

/// One resolved origin relationship, child -> parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    /// Citing document number.
    pub from: String,
    /// Cited (origin) document number.
    pub to: String,
    pub from_id: DocumentId,
    pub to_id: DocumentId,
    pub kind: EdgeKind,
}

/// Property summary embedded in the tree payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeProperty {
    pub id: PropertyId,
    pub number: String,
    pub name: String,
    pub owner: String,
}

impl From<&Property> for TreeProperty {
    fn from(value: &Property) -> Self {
        Self {
            id: value.id,
            number: value.registration_code.clone(),
            name: value.name.clone(),
            owner: value.owner.clone(),
        }
    }
}

/// One identifier parsed from origin text during traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentifiedOrigin {
    /// Number of the document whose entry cited the identifier.
    pub cited_by: String,
    /// Normalized identifier, e.g. `T001`.
    pub identifier: String,
    pub office_id: Option<OfficeId>,
    /// Number of the document the identifier resolved to.
    pub resolved_to: Option<String>,
    /// Document was synthesized by auto-provisioning.
    pub provisioned: bool,
}

/// Tree payload for one property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeResult {
    pub property: TreeProperty,
    pub documents: Vec<DocumentNode>,
    pub connections: Vec<Edge>,
    pub identified_origins: Vec<IdentifiedOrigin>,
    /// Documents participating in origin cycles.
    pub cyclic_documents: Vec<String>,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TreeResult {
    /// Empty result carrying a domain error message.
    pub fn failed(property: &Property, message: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            documents: Vec::new(),
            connections: Vec::new(),
            identified_origins: Vec::new(),
            cyclic_documents: Vec::new(),
            warnings: Vec::new(),
            error: Some(message.into()),
        }
    }

    /// Finds one node by document number.
    pub fn node_by_number(&self, number: &str) -> Option<&DocumentNode> {
        self.documents
            .iter()
            .find(|node| node.document.number == number)
    }
}

/// One resolvable origin offered for a trunk row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OriginOption {
    pub document_id: DocumentId,
    pub number: String,
}

/// One row of the tabular main-trunk payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrunkRow {
    pub document: Document,
    pub entries: Vec<Entry>,
    /// Candidates the user may pick from; more than one means a branch.
    pub available_origins: Vec<OriginOption>,
    /// Number of the origin followed by the trunk from this row.
    pub chosen_origin: Option<String>,
    /// Document is owned by another property and imported into this chain.
    pub is_imported: bool,
}

/// Tabular main-trunk payload plus the overrides that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrunkTable {
    pub property_id: PropertyId,
    pub rows: Vec<TrunkRow>,
    pub overrides: OverrideMap,
}
