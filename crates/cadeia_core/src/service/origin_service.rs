//! Explicit origin processing after a document write.
//!
//! Callers invoke `process_document_origins` deliberately once a document or
//! its chain-opening entries were saved; storage never triggers it.

use crate::config::ChainConfig;
use crate::model::document::DocumentId;
use crate::origin::parser::parse_origins;
use crate::repo::chain_repo::ChainRepository;
use crate::service::error::ChainServiceError;
use crate::service::provisioner::{resolve_or_provision, ProvisionContext, Resolution};
use crate::service::resolver::scoping_office;
use log::info;
use serde::Serialize;

/// Outcome of processing one document's origins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OriginProcessReport {
    /// Numbers of documents that already existed.
    pub resolved: Vec<String>,
    /// Numbers of documents created by auto-provisioning.
    pub provisioned: Vec<String>,
    /// Identifiers that matched nothing.
    pub unresolved: Vec<String>,
}

/// Origin post-processing facade.
pub struct OriginService<R: ChainRepository> {
    repo: R,
    config: ChainConfig,
}

impl<R: ChainRepository> OriginService<R> {
    pub fn new(repo: R, config: ChainConfig) -> Self {
        Self { repo, config }
    }

    /// Parses and resolves the chain-opening origins of one document.
    ///
    /// Provisioned stubs belong to the processed document's property.
    pub fn process_document_origins(
        &self,
        document_id: DocumentId,
    ) -> Result<OriginProcessReport, ChainServiceError> {
        let document = self
            .repo
            .get_document(document_id)?
            .ok_or(ChainServiceError::DocumentNotFound(document_id))?;

        let mut report = OriginProcessReport::default();
        for entry in self.repo.find_chain_opening_entries_with_origin(document.id)? {
            let office_id = scoping_office(&entry, &document, &self.config);
            let text = entry.origin.as_deref().unwrap_or_default();
            for reference in parse_origins(text) {
                let context = ProvisionContext {
                    property_id: document.property_id,
                    cited_by: &document.number,
                };
                match resolve_or_provision(&self.repo, &self.config, &reference, office_id, context)? {
                    Resolution::Found(found) => push_unique(&mut report.resolved, found.number),
                    Resolution::Provisioned(created) => {
                        push_unique(&mut report.provisioned, created.number)
                    }
                    Resolution::Missing => push_unique(&mut report.unresolved, reference.key()),
                }
            }
        }

        info!(
            "event=origin_process module=origin status=ok document={} resolved={} provisioned={} unresolved={}",
            document.id,
            report.resolved.len(),
            report.provisioned.len(),
            report.unresolved.len()
        );
        Ok(report)
    }
}

fn push_unique(values: &mut Vec<String>, value: String) {
    if !values.contains(&value) {
        values.push(value);
    }
}
