//! Main-trunk selection and tabular chain payloads.
//!
//! # Responsibility
//! - Walk a property's chain from its oldest foundational document, picking
//!   one origin per step (user override or deterministic default).
//! - Produce the tabular payload and re-render it after an origin choice.
//!
//! # Invariants
//! - The trunk is a strict path; a document never appears twice.
//! - Only documents owned by or imported into the property are candidates.
//! - Cache reads and writes are skipped whenever overrides are non-empty.

use crate::config::ChainConfig;
use crate::model::chain::{OriginOption, OverrideMap, TrunkRow, TrunkTable};
use crate::model::document::{number_key, Document, DocumentId, DocumentKind};
use crate::model::property::{Property, PropertyId};
use crate::origin::parser::parse_origins;
use crate::repo::cache::{trunk_cache_key, TrunkCache};
use crate::repo::chain_repo::ChainRepository;
use crate::service::error::ChainServiceError;
use crate::service::resolver::{scoping_office, DocumentResolver};
use log::{debug, info};
use std::collections::{HashMap, HashSet};

/// One step of the walk: a trunk document and its resolvable origins.
#[derive(Debug, Clone)]
struct TrunkStep {
    document: Document,
    candidates: Vec<Document>,
    chosen: Option<Document>,
}

/// Main-trunk facade over repository and cache implementations.
pub struct TrunkService<R: ChainRepository, C: TrunkCache> {
    repo: R,
    cache: C,
    config: ChainConfig,
}

impl<R: ChainRepository, C: TrunkCache> TrunkService<R, C> {
    pub fn new(repo: R, cache: C, config: ChainConfig) -> Self {
        Self {
            repo,
            cache,
            config,
        }
    }

    /// Returns the ordered trunk documents for one property.
    ///
    /// Default results (empty `overrides`) are memoized through the cache
    /// port; override results are never read from or written to it.
    pub fn main_trunk(
        &self,
        property_id: PropertyId,
        overrides: &OverrideMap,
    ) -> Result<Vec<Document>, ChainServiceError> {
        let use_cache = overrides.is_empty();
        let key = trunk_cache_key(property_id);
        if use_cache {
            if let Some(cached) = self.cache.get(&key) {
                debug!("event=trunk_cache module=trunk status=hit property={property_id}");
                return Ok(cached);
            }
            debug!("event=trunk_cache module=trunk status=miss property={property_id}");
        }

        let property = self.load_property(property_id)?;
        let trunk: Vec<Document> = self
            .walk(&property, overrides)?
            .into_iter()
            .map(|step| step.document)
            .collect();

        if use_cache {
            self.cache
                .set(&key, trunk.clone(), self.config.trunk_cache_ttl());
        }
        Ok(trunk)
    }

    /// Builds the tabular payload for one property.
    pub fn trunk_table(
        &self,
        property_id: PropertyId,
        overrides: &OverrideMap,
    ) -> Result<TrunkTable, ChainServiceError> {
        let property = self.load_property(property_id)?;
        let steps = self.walk(&property, overrides)?;

        let mut rows = Vec::with_capacity(steps.len());
        for step in steps {
            rows.push(TrunkRow {
                entries: self.repo.list_entries(step.document.id)?,
                available_origins: step
                    .candidates
                    .iter()
                    .map(|candidate| OriginOption {
                        document_id: candidate.id,
                        number: candidate.number.clone(),
                    })
                    .collect(),
                chosen_origin: step.chosen.map(|chosen| chosen.number),
                is_imported: step.document.property_id != property.id,
                document: step.document,
            });
        }

        Ok(TrunkTable {
            property_id,
            rows,
            overrides: overrides.clone(),
        })
    }

    /// Records one origin choice and returns the re-rendered table.
    ///
    /// The property is explicit because the chosen document may be imported
    /// from another property's chain.
    pub fn apply_origin_choice(
        &self,
        property_id: PropertyId,
        document_id: DocumentId,
        chosen_origin_number: &str,
        current_overrides: &OverrideMap,
    ) -> Result<TrunkTable, ChainServiceError> {
        self.repo
            .get_document(document_id)?
            .ok_or(ChainServiceError::DocumentNotFound(document_id))?;

        let mut overrides = current_overrides.clone();
        overrides.insert(document_id, chosen_origin_number.trim().to_string());
        self.trunk_table(property_id, &overrides)
    }

    /// Drops the memoized default trunk of one property.
    pub fn invalidate_property(&self, property_id: PropertyId) {
        self.cache.invalidate(&trunk_cache_key(property_id));
    }

    fn load_property(&self, property_id: PropertyId) -> Result<Property, ChainServiceError> {
        self.repo
            .get_property(property_id)?
            .ok_or(ChainServiceError::PropertyNotFound(property_id))
    }

    fn walk(
        &self,
        property: &Property,
        overrides: &OverrideMap,
    ) -> Result<Vec<TrunkStep>, ChainServiceError> {
        let owned = self.repo.find_documents_by_property(property.id)?;
        let Some(start) = oldest_foundational(&owned).cloned() else {
            return Ok(Vec::new());
        };

        let mut members: HashMap<DocumentId, Document> = owned
            .into_iter()
            .map(|document| (document.id, document))
            .collect();
        for imported in self.repo.list_imported_documents(property.id)? {
            members.entry(imported.id).or_insert(imported);
        }

        let resolver = DocumentResolver::new(&self.repo);
        let mut in_trunk: HashSet<DocumentId> = HashSet::new();
        let mut steps: Vec<TrunkStep> = Vec::new();
        let mut current = Some(start);

        while let Some(document) = current.take() {
            in_trunk.insert(document.id);

            let mut candidates: Vec<Document> = Vec::new();
            for entry in self.repo.find_chain_opening_entries_with_origin(document.id)? {
                let office_id = scoping_office(&entry, &document, &self.config);
                let text = entry.origin.as_deref().unwrap_or_default();
                for reference in parse_origins(text) {
                    let Some(found) = resolver.resolve(&reference, office_id)? else {
                        continue;
                    };
                    if found.id != document.id
                        && members.contains_key(&found.id)
                        && !candidates.iter().any(|candidate| candidate.id == found.id)
                    {
                        candidates.push(found);
                    }
                }
            }

            let chosen = choose_origin(document.id, &candidates, overrides).cloned();
            if let Some(next) = chosen.as_ref().filter(|next| !in_trunk.contains(&next.id)) {
                current = Some(next.clone());
            }
            steps.push(TrunkStep {
                document,
                candidates,
                chosen,
            });
        }

        info!(
            "event=trunk_select module=trunk status=ok property={} length={} overrides={}",
            property.id,
            steps.len(),
            overrides.len()
        );
        Ok(steps)
    }
}

/// Earliest matrícula by opening date, else earliest transcrição.
///
/// Undated documents sort after dated ones; ties keep repository order.
pub fn oldest_foundational(documents: &[Document]) -> Option<&Document> {
    let earliest = |kind: DocumentKind| {
        documents
            .iter()
            .filter(|document| document.kind == kind)
            .min_by_key(|document| (document.opened_at.is_none(), document.opened_at))
    };
    earliest(DocumentKind::Matricula).or_else(|| earliest(DocumentKind::Transcricao))
}

/// Picks the origin followed from `document_id`.
///
/// An override wins when it names one of the candidates; otherwise the
/// highest-numbered matrícula, else the highest-numbered transcrição.
pub fn choose_origin<'c>(
    document_id: DocumentId,
    candidates: &'c [Document],
    overrides: &OverrideMap,
) -> Option<&'c Document> {
    let overridden = overrides.get(&document_id).and_then(|chosen| {
        let key = number_key(chosen);
        candidates
            .iter()
            .find(|candidate| candidate.number_key() == key)
    });
    if overridden.is_some() {
        return overridden;
    }

    let highest = |kind: DocumentKind| {
        candidates
            .iter()
            .filter(|candidate| candidate.kind == kind)
            .max_by_key(|candidate| candidate.numeric_value())
    };
    highest(DocumentKind::Matricula).or_else(|| highest(DocumentKind::Transcricao))
}
