//! Registry documents and their transactional entries.
//!
//! # Invariants
//! - `(number_key(number), office_id)` identifies at most one document.
//! - Only `EntryKind::ChainOpening` entries carry ancestry-relevant origins.

use crate::model::property::{OfficeId, PropertyId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of one registry document.
pub type DocumentId = Uuid;

/// Stable identifier of one entry inside a document.
pub type EntryId = Uuid;

/// Numbering series of a registry document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Current registration series, numbers prefixed `M`.
    Matricula,
    /// Legacy transcription series, numbers prefixed `T`.
    Transcricao,
}

impl DocumentKind {
    /// Infers the series from a number prefix letter.
    pub fn from_prefix(prefix: char) -> Option<Self> {
        match prefix.to_ascii_uppercase() {
            'M' => Some(Self::Matricula),
            'T' => Some(Self::Transcricao),
            _ => None,
        }
    }

    pub fn prefix(self) -> char {
        match self {
            Self::Matricula => 'M',
            Self::Transcricao => 'T',
        }
    }
}

/// Transaction type recorded inside a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Opens the document as a continuation of prior document(s).
    ChainOpening,
    Registration,
    Annotation,
    Other,
}

/// Registry record of a property's legal status at some point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    /// Owning property.
    pub property_id: PropertyId,
    #[serde(rename = "type")]
    pub kind: DocumentKind,
    /// Number as written in the registry, e.g. `M-002` or `T 17`.
    pub number: String,
    pub office_id: OfficeId,
    pub book: Option<String>,
    pub page: Option<String>,
    /// Free-text origin, zero or more `;`-separated references.
    pub origin: Option<String>,
    /// Epoch ms when the document was opened.
    pub opened_at: Option<i64>,
    /// Manual level override used by tree rendering.
    pub pinned_level: Option<u32>,
    /// End-of-chain sentinel placed beyond the oldest ancestor.
    pub is_chain_end: bool,
}

impl Document {
    /// Normalized number key used for matching across spellings.
    pub fn number_key(&self) -> String {
        number_key(&self.number)
    }

    /// Numeric part of the document number, if any.
    pub fn numeric_value(&self) -> Option<u64> {
        let digits: String = self.number.chars().filter(char::is_ascii_digit).collect();
        digits.parse().ok()
    }
}

/// Fields required to create a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocument {
    pub property_id: PropertyId,
    pub kind: DocumentKind,
    pub number: String,
    pub office_id: OfficeId,
    pub book: Option<String>,
    pub page: Option<String>,
    pub origin: Option<String>,
    pub opened_at: Option<i64>,
}

/// Dated transaction recorded within a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub document_id: DocumentId,
    /// Entry label inside the document, e.g. `R-1` or `AV-3`.
    pub number: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Epoch ms of the recorded transaction.
    pub recorded_at: Option<i64>,
    /// Free-text origin references of this entry.
    pub origin: Option<String>,
    /// Office scoping resolution of this entry's references.
    pub origin_office_id: Option<OfficeId>,
}

impl Entry {
    /// Returns whether this entry contributes ancestry references.
    pub fn carries_origin(&self) -> bool {
        self.kind == EntryKind::ChainOpening
            && self
                .origin
                .as_deref()
                .is_some_and(|value| !value.trim().is_empty())
    }
}

/// Fields required to record an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub document_id: DocumentId,
    pub number: String,
    pub kind: EntryKind,
    pub recorded_at: Option<i64>,
    pub origin: Option<String>,
    pub origin_office_id: Option<OfficeId>,
}

/// Normalizes a document number to `<PREFIX><digits>`.
///
/// Whitespace, `-`, `.`, `/` and `º` separators are dropped and letters are
/// uppercased, so `t-001`, `T 001` and `T001` share one key.
pub fn number_key(number: &str) -> String {
    number
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '.' | '/' | 'º' | '°'))
        .flat_map(char::to_uppercase)
        .collect()
}
