//! Chain-of-title tree use-case service (graph builder).
//!
//! # Responsibility
//! - Pick the principal document of a property.
//! - Expand origins breadth-first into a deduplicated node/edge set.
//! - Assign hierarchical levels and flag cyclic origin references.
//!
//! # Invariants
//! - Each document id is expanded at most once; cyclic origins terminate.
//! - Edges are child -> parent and unique per `(child id, parent id)`.
//! - A property without documents yields an error payload, not `Err`.

use crate::config::ChainConfig;
use crate::model::chain::{DocumentNode, Edge, EdgeKind, IdentifiedOrigin, TreeResult};
use crate::model::document::{number_key, Document, DocumentId};
use crate::model::property::{Property, PropertyId};
use crate::origin::parser::parse_origins;
use crate::repo::chain_repo::ChainRepository;
use crate::service::error::ChainServiceError;
use crate::service::levels::assign_levels;
use crate::service::provisioner::{resolve_or_provision, ProvisionContext, Resolution};
use crate::service::resolver::scoping_office;
use log::{info, warn};
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Instant;

/// Error message used when a property has no principal document.
pub const NO_PRINCIPAL_DOCUMENT: &str = "no principal document";

/// Tree builder facade over repository implementations.
pub struct ChainTreeService<R: ChainRepository> {
    repo: R,
    config: ChainConfig,
}

impl<R: ChainRepository> ChainTreeService<R> {
    /// Creates service from repository implementation and config.
    pub fn new(repo: R, config: ChainConfig) -> Self {
        Self { repo, config }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Builds the tree payload for one property id.
    pub fn build_tree(&self, property_id: PropertyId) -> Result<TreeResult, ChainServiceError> {
        let property = self
            .repo
            .get_property(property_id)?
            .ok_or(ChainServiceError::PropertyNotFound(property_id))?;
        self.build_tree_for(&property)
    }

    /// Builds the tree payload for an already loaded property.
    ///
    /// Auto-provisioned documents are written through the repository; wrap
    /// the call in a transaction when they must commit or roll back together.
    pub fn build_tree_for(&self, property: &Property) -> Result<TreeResult, ChainServiceError> {
        let started_at = Instant::now();
        let owned = self.repo.find_documents_by_property(property.id)?;
        let Some(principal) = find_principal(property, &owned).cloned() else {
            warn!(
                "event=tree_build module=chain status=no_principal property={}",
                property.id
            );
            return Ok(TreeResult::failed(property, NO_PRINCIPAL_DOCUMENT));
        };

        let mut visited: HashSet<DocumentId> = HashSet::new();
        let mut queue: VecDeque<(Document, u32)> = VecDeque::from([(principal.clone(), 0)]);
        let mut nodes: Vec<DocumentNode> = Vec::new();
        let mut edges: Vec<Edge> = Vec::new();
        let mut edge_keys: HashSet<(DocumentId, DocumentId)> = HashSet::new();
        let mut identified: Vec<IdentifiedOrigin> = Vec::new();

        while let Some((document, level_hint)) = queue.pop_front() {
            if !visited.insert(document.id) {
                continue;
            }

            let entries = self.repo.find_chain_opening_entries_with_origin(document.id)?;
            for entry in entries.iter().filter(|entry| entry.carries_origin()) {
                let office_id = scoping_office(entry, &document, &self.config);
                let text = entry.origin.as_deref().unwrap_or_default();
                for reference in parse_origins(text) {
                    let resolution = resolve_or_provision(
                        &self.repo,
                        &self.config,
                        &reference,
                        office_id,
                        ProvisionContext {
                            property_id: property.id,
                            cited_by: &document.number,
                        },
                    )?;
                    identified.push(IdentifiedOrigin {
                        cited_by: document.number.clone(),
                        identifier: reference.key(),
                        office_id,
                        resolved_to: resolution.document().map(|parent| parent.number.clone()),
                        provisioned: matches!(resolution, Resolution::Provisioned(_)),
                    });

                    let (Resolution::Found(parent) | Resolution::Provisioned(parent)) = resolution
                    else {
                        continue;
                    };
                    if parent.id == document.id {
                        continue;
                    }
                    if edge_keys.insert((document.id, parent.id)) {
                        edges.push(Edge {
                            from: document.number.clone(),
                            to: parent.number.clone(),
                            from_id: document.id,
                            to_id: parent.id,
                            kind: EdgeKind::OriginEntry,
                        });
                    }
                    if !visited.contains(&parent.id) {
                        queue.push_back((parent, level_hint + 1));
                    }
                }
            }

            nodes.push(DocumentNode {
                is_shared: document.property_id != property.id,
                is_principal: document.id == principal.id,
                total_entries: self.repo.count_entries(document.id)?,
                level: level_hint,
                document,
            });
        }

        assign_levels(&mut nodes, &edges, principal.id);

        let cyclic_documents = find_cyclic_documents(&nodes, &edges);
        let mut warnings = Vec::new();
        if !cyclic_documents.is_empty() {
            warnings.push(format!(
                "{} document(s) reference each other",
                cyclic_documents.len()
            ));
        }

        info!(
            "event=tree_build module=chain status=ok property={} principal={} documents={} connections={} cyclic={} duration_ms={}",
            property.id,
            principal.number,
            nodes.len(),
            edges.len(),
            cyclic_documents.len(),
            started_at.elapsed().as_millis()
        );

        Ok(TreeResult {
            property: property.into(),
            documents: nodes,
            connections: edges,
            identified_origins: identified,
            cyclic_documents,
            warnings,
            error: None,
        })
    }
}

/// Picks the document a property's chain starts from.
///
/// Order: exact number match with the registration code, then a number that
/// contains the code, then the first owned document.
pub fn find_principal<'d>(property: &Property, documents: &'d [Document]) -> Option<&'d Document> {
    let code = property.registration_code.trim();
    let code_key = number_key(code);

    let exact = documents
        .iter()
        .find(|document| document.number == code || document.number_key() == code_key);
    let containing = || {
        if code.is_empty() {
            return None;
        }
        documents.iter().find(|document| {
            document.number.contains(code) || document.number_key().contains(code_key.as_str())
        })
    };

    exact.or_else(containing).or_else(|| documents.first())
}

/// Numbers of documents that lie on at least one origin cycle.
fn find_cyclic_documents(nodes: &[DocumentNode], edges: &[Edge]) -> Vec<String> {
    let mut parents: HashMap<DocumentId, Vec<DocumentId>> = HashMap::new();
    for edge in edges {
        parents.entry(edge.from_id).or_default().push(edge.to_id);
    }

    nodes
        .iter()
        .filter(|node| reaches(&parents, node.document.id))
        .map(|node| node.document.number.clone())
        .collect()
}

/// Whether `start` is reachable from any of its own parents.
fn reaches(parents: &HashMap<DocumentId, Vec<DocumentId>>, start: DocumentId) -> bool {
    let mut seen = HashSet::new();
    let mut queue: VecDeque<DocumentId> = parents.get(&start).into_iter().flatten().copied().collect();
    while let Some(current) = queue.pop_front() {
        if current == start {
            return true;
        }
        if !seen.insert(current) {
            continue;
        }
        queue.extend(parents.get(&current).into_iter().flatten().copied());
    }
    false
}
