//! Auto-provisioning of placeholder documents for unresolved references.
//!
//! # Invariants
//! - Never provisions without a scoping office or with an unknown prefix.
//! - Re-checks `(number, office)` right before inserting; the repository
//!   insert is idempotent on the same key as well.

use crate::config::ChainConfig;
use crate::model::document::{Document, NewDocument};
use crate::model::property::{OfficeId, PropertyId};
use crate::origin::parser::OriginRef;
use crate::repo::chain_repo::{ChainRepoResult, ChainRepository};
use crate::service::resolver::DocumentResolver;
use log::info;

/// Where a provisioned document comes from.
#[derive(Debug, Clone, Copy)]
pub struct ProvisionContext<'a> {
    /// Property that will own the placeholder.
    pub property_id: PropertyId,
    /// Number of the document whose entry cited the reference.
    pub cited_by: &'a str,
}

/// Outcome of resolving one reference with optional provisioning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(Document),
    Provisioned(Document),
    Missing,
}

impl Resolution {
    pub fn document(&self) -> Option<&Document> {
        match self {
            Self::Found(document) | Self::Provisioned(document) => Some(document),
            Self::Missing => None,
        }
    }
}

/// Synthesizes stub documents for references that do not resolve.
pub struct AutoProvisioner<'r, R: ChainRepository + ?Sized> {
    repo: &'r R,
}

impl<'r, R: ChainRepository + ?Sized> AutoProvisioner<'r, R> {
    pub fn new(repo: &'r R) -> Self {
        Self { repo }
    }

    /// Creates (or returns the concurrently created) stub for `reference`.
    ///
    /// Returns `None` when no office is known or the prefix names no series.
    pub fn provision(
        &self,
        reference: &OriginRef,
        office_id: Option<OfficeId>,
        context: ProvisionContext<'_>,
    ) -> ChainRepoResult<Option<Document>> {
        let (Some(office_id), Some(kind)) = (office_id, reference.kind()) else {
            return Ok(None);
        };

        let number = reference.key();
        if let Some(existing) = self.repo.find_document(&number, office_id)? {
            return Ok(Some(existing));
        }

        let document = self.repo.create_document(&NewDocument {
            property_id: context.property_id,
            kind,
            number: number.clone(),
            office_id,
            book: None,
            page: None,
            origin: Some(format!(
                "auto-created from origin reference {number} cited by {}",
                context.cited_by
            )),
            opened_at: None,
        })?;
        info!(
            "event=document_provision module=provisioner status=ok number={} office={} cited_by={}",
            document.number, office_id, context.cited_by
        );
        Ok(Some(document))
    }
}

/// Resolves one reference, provisioning a stub on miss when enabled.
pub fn resolve_or_provision<R: ChainRepository + ?Sized>(
    repo: &R,
    config: &ChainConfig,
    reference: &OriginRef,
    office_id: Option<OfficeId>,
    context: ProvisionContext<'_>,
) -> ChainRepoResult<Resolution> {
    if let Some(document) = DocumentResolver::new(repo).resolve(reference, office_id)? {
        return Ok(Resolution::Found(document));
    }
    if !config.auto_provision {
        return Ok(Resolution::Missing);
    }
    Ok(AutoProvisioner::new(repo)
        .provision(reference, office_id, context)?
        .map_or(Resolution::Missing, Resolution::Provisioned))
}
