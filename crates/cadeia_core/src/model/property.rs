//! Property and registry office records.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of one property.
pub type PropertyId = Uuid;

/// Stable identifier of one registry office (cartório).
pub type OfficeId = Uuid;

/// Independent numbering authority for registry documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryOffice {
    pub id: OfficeId,
    pub name: String,
}

/// Rural landholding whose chain of title is traversed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    /// Stable property id.
    pub id: PropertyId,
    /// User-facing property name.
    pub name: String,
    /// Registration code of the current matrícula, e.g. `M-1234`.
    pub registration_code: String,
    /// Office that holds the current matrícula.
    pub office_id: OfficeId,
    /// Owner reference as free text.
    pub owner: String,
}

/// Fields required to create a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProperty {
    pub name: String,
    pub registration_code: String,
    pub office_id: OfficeId,
    pub owner: String,
}
