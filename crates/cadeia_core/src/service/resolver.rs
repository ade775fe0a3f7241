//! Document resolver: parsed reference + scoping office -> document.
//!
//! # Invariants
//! - With a scoping office, lookups never leave that office. Registry
//!   offices number independently, so equal digits in two offices are
//!   unrelated documents.
//! - Without a scoping office, an unscoped lookup by number is the last
//!   resort; the first match in repository order wins.

use crate::config::ChainConfig;
use crate::model::document::{Document, Entry};
use crate::model::property::OfficeId;
use crate::origin::parser::OriginRef;
use crate::repo::chain_repo::{ChainRepoResult, ChainRepository};
use log::debug;

const SERIES_PREFIXES: [char; 2] = ['M', 'T'];

/// Office that scopes resolution of one entry's references.
///
/// The entry's own origin office wins. Otherwise strict scoping falls back to
/// the citing document's office, and relaxed scoping leaves it unscoped.
pub fn scoping_office(entry: &Entry, citing: &Document, config: &ChainConfig) -> Option<OfficeId> {
    entry.origin_office_id.or_else(|| {
        config
            .strict_office_scoping
            .then_some(citing.office_id)
    })
}

/// Resolves references against repository documents.
pub struct DocumentResolver<'r, R: ChainRepository + ?Sized> {
    repo: &'r R,
}

impl<'r, R: ChainRepository + ?Sized> DocumentResolver<'r, R> {
    pub fn new(repo: &'r R) -> Self {
        Self { repo }
    }

    /// Returns the document a reference points to, or `None`.
    ///
    /// Scoped lookups first try the exact identifier, then the same digits
    /// under each series prefix, all inside `office_id`.
    pub fn resolve(
        &self,
        reference: &OriginRef,
        office_id: Option<OfficeId>,
    ) -> ChainRepoResult<Option<Document>> {
        let Some(office_id) = office_id else {
            let found = self
                .repo
                .find_documents_by_number(&reference.key())?
                .into_iter()
                .next();
            debug!(
                "event=origin_resolve module=resolver status={} scope=unscoped reference={}",
                if found.is_some() { "ok" } else { "miss" },
                reference
            );
            return Ok(found);
        };

        if let Some(document) = self.repo.find_document(&reference.key(), office_id)? {
            return Ok(Some(document));
        }

        for prefix in SERIES_PREFIXES {
            let variant = reference.with_prefix(prefix);
            if variant == *reference {
                continue;
            }
            if let Some(document) = self.repo.find_document(&variant.key(), office_id)? {
                debug!(
                    "event=origin_resolve module=resolver status=ok scope=office reference={} matched={} office={}",
                    reference, document.number, office_id
                );
                return Ok(Some(document));
            }
        }

        debug!(
            "event=origin_resolve module=resolver status=miss scope=office reference={} office={}",
            reference, office_id
        );
        Ok(None)
    }
}
