#![allow(dead_code)]

use cadeia_core::db::open_db_in_memory;
use cadeia_core::{
    ChainRepository, Document, DocumentKind, Entry, EntryKind, NewDocument, NewEntry, NewProperty,
    OfficeId, Property, RegistryOffice, SqliteChainRepository,
};
use rusqlite::Connection;

pub fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

pub fn repo(conn: &Connection) -> SqliteChainRepository<'_> {
    SqliteChainRepository::try_new(conn).unwrap()
}

pub fn office(repo: &SqliteChainRepository<'_>, name: &str) -> RegistryOffice {
    repo.create_office(name).unwrap()
}

pub fn property(
    repo: &SqliteChainRepository<'_>,
    registration_code: &str,
    office_id: OfficeId,
) -> Property {
    repo.create_property(&NewProperty {
        name: format!("Fazenda {registration_code}"),
        registration_code: registration_code.to_string(),
        office_id,
        owner: "Owner".to_string(),
    })
    .unwrap()
}

/// Creates a document whose series follows the number prefix.
pub fn document(
    repo: &SqliteChainRepository<'_>,
    owner: &Property,
    number: &str,
    office_id: OfficeId,
    opened_at: Option<i64>,
) -> Document {
    let kind = match number.chars().next() {
        Some('T') => DocumentKind::Transcricao,
        _ => DocumentKind::Matricula,
    };
    repo.create_document(&NewDocument {
        property_id: owner.id,
        kind,
        number: number.to_string(),
        office_id,
        book: Some("2".to_string()),
        page: Some("10".to_string()),
        origin: None,
        opened_at,
    })
    .unwrap()
}

/// Records a chain-opening entry citing `origin`.
pub fn opening_entry(
    repo: &SqliteChainRepository<'_>,
    document: &Document,
    origin: &str,
    origin_office_id: Option<OfficeId>,
) -> Entry {
    repo.create_entry(&NewEntry {
        document_id: document.id,
        number: "AB-1".to_string(),
        kind: EntryKind::ChainOpening,
        recorded_at: Some(1_000),
        origin: Some(origin.to_string()),
        origin_office_id,
    })
    .unwrap()
}

pub fn plain_entry(repo: &SqliteChainRepository<'_>, document: &Document, kind: EntryKind) -> Entry {
    repo.create_entry(&NewEntry {
        document_id: document.id,
        number: "R-1".to_string(),
        kind,
        recorded_at: Some(2_000),
        origin: None,
        origin_office_id: None,
    })
    .unwrap()
}
