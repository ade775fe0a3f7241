//! Chain-of-title repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Expose the narrow read/write ports consumed by the chain engine.
//! - Keep SQL details and row decoding inside the repository boundary.
//!
//! # Invariants
//! - Document lookups by number always go through `number_key`.
//! - `find_document` never looks outside the requested office.
//! - `create_document` is idempotent on `(number_key, office_id)`.
//! - Listing order is deterministic: insertion order for documents,
//!   `recorded_at ASC` (nulls last) then insertion order for entries.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::document::{
    number_key, Document, DocumentId, DocumentKind, Entry, EntryKind, NewDocument, NewEntry,
};
use crate::model::property::{NewProperty, OfficeId, Property, PropertyId, RegistryOffice};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const DOCUMENT_SELECT_SQL: &str = "SELECT
    d.id AS id,
    d.property_id AS property_id,
    d.kind AS kind,
    d.number AS number,
    d.office_id AS office_id,
    d.book AS book,
    d.page AS page,
    d.origin AS origin,
    d.opened_at AS opened_at,
    d.pinned_level AS pinned_level,
    d.is_chain_end AS is_chain_end
FROM documents d";

const ENTRY_SELECT_SQL: &str = "SELECT
    id,
    document_id,
    number,
    kind,
    recorded_at,
    origin,
    origin_office_id
FROM entries";

/// Result type used by chain repository operations.
pub type ChainRepoResult<T> = Result<T, ChainRepoError>;

/// Errors from chain repository operations.
#[derive(Debug)]
pub enum ChainRepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Referenced property does not exist.
    PropertyNotFound(PropertyId),
    /// Referenced document does not exist.
    DocumentNotFound(DocumentId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
}

impl Display for ChainRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::PropertyNotFound(id) => write!(f, "property not found: {id}"),
            Self::DocumentNotFound(id) => write!(f, "document not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "chain repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "chain repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "chain repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid registry data: {message}"),
        }
    }
}

impl Error for ChainRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for ChainRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for ChainRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence ports consumed by the chain engine.
pub trait ChainRepository {
    /// Loads one property by id.
    fn get_property(&self, id: PropertyId) -> ChainRepoResult<Option<Property>>;
    /// Loads one document by id.
    fn get_document(&self, id: DocumentId) -> ChainRepoResult<Option<Document>>;
    /// Lists documents owned by one property.
    fn find_documents_by_property(&self, property_id: PropertyId)
        -> ChainRepoResult<Vec<Document>>;
    /// Lists documents owned elsewhere but imported into a property's chain.
    fn list_imported_documents(&self, property_id: PropertyId) -> ChainRepoResult<Vec<Document>>;
    /// Finds one document by number inside one registry office.
    fn find_document(&self, number: &str, office_id: OfficeId)
        -> ChainRepoResult<Option<Document>>;
    /// Finds documents by number in any office. Last-resort lookup only.
    fn find_documents_by_number(&self, number: &str) -> ChainRepoResult<Vec<Document>>;
    /// Lists chain-opening entries of one document with non-empty origin.
    fn find_chain_opening_entries_with_origin(
        &self,
        document_id: DocumentId,
    ) -> ChainRepoResult<Vec<Entry>>;
    /// Lists all entries of one document.
    fn list_entries(&self, document_id: DocumentId) -> ChainRepoResult<Vec<Entry>>;
    /// Counts all entries of one document.
    fn count_entries(&self, document_id: DocumentId) -> ChainRepoResult<u32> {
        Ok(self.list_entries(document_id)?.len() as u32)
    }
    /// Creates one document, returning the existing row on number/office conflict.
    fn create_document(&self, fields: &NewDocument) -> ChainRepoResult<Document>;
}

/// SQLite-backed chain repository.
///
/// Accepts any connection, including an open `Transaction`, so callers own
/// transaction boundaries around provisioning traversals.
#[derive(Clone, Copy)]
pub struct SqliteChainRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteChainRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> ChainRepoResult<Self> {
        ensure_chain_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Registers one registry office.
    pub fn create_office(&self, name: &str) -> ChainRepoResult<RegistryOffice> {
        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO registry_offices (id, name) VALUES (?1, ?2);",
            params![id.to_string(), name],
        )?;
        Ok(RegistryOffice {
            id,
            name: name.to_string(),
        })
    }

    /// Creates one property.
    pub fn create_property(&self, fields: &NewProperty) -> ChainRepoResult<Property> {
        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO properties (id, name, registration_code, office_id, owner)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                id.to_string(),
                fields.name.as_str(),
                fields.registration_code.as_str(),
                fields.office_id.to_string(),
                fields.owner.as_str(),
            ],
        )?;
        self.get_property(id)?
            .ok_or(ChainRepoError::PropertyNotFound(id))
    }

    /// Records one entry inside an existing document.
    pub fn create_entry(&self, fields: &NewEntry) -> ChainRepoResult<Entry> {
        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO entries (
                id,
                document_id,
                number,
                kind,
                recorded_at,
                origin,
                origin_office_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                id.to_string(),
                fields.document_id.to_string(),
                fields.number.as_str(),
                entry_kind_to_db(fields.kind),
                fields.recorded_at,
                fields.origin.as_deref(),
                fields.origin_office_id.map(|value| value.to_string()),
            ],
        )?;
        Ok(Entry {
            id,
            document_id: fields.document_id,
            number: fields.number.clone(),
            kind: fields.kind,
            recorded_at: fields.recorded_at,
            origin: fields.origin.clone(),
            origin_office_id: fields.origin_office_id,
        })
    }

    /// Links a document owned by another property into a property's chain.
    pub fn import_document(
        &self,
        property_id: PropertyId,
        document_id: DocumentId,
    ) -> ChainRepoResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO imported_documents (property_id, document_id)
             VALUES (?1, ?2);",
            params![property_id.to_string(), document_id.to_string()],
        )?;
        Ok(())
    }

    /// Pins or clears the manual tree level of one document.
    pub fn set_pinned_level(
        &self,
        document_id: DocumentId,
        level: Option<u32>,
    ) -> ChainRepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE documents SET pinned_level = ?2 WHERE id = ?1;",
            params![document_id.to_string(), level],
        )?;
        if changed == 0 {
            return Err(ChainRepoError::DocumentNotFound(document_id));
        }
        Ok(())
    }

    /// Flags or unflags one document as end-of-chain sentinel.
    pub fn set_chain_end(&self, document_id: DocumentId, is_chain_end: bool) -> ChainRepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE documents SET is_chain_end = ?2 WHERE id = ?1;",
            params![document_id.to_string(), bool_to_int(is_chain_end)],
        )?;
        if changed == 0 {
            return Err(ChainRepoError::DocumentNotFound(document_id));
        }
        Ok(())
    }

    fn query_documents(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> ChainRepoResult<Vec<Document>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_document_row(row)?);
        }
        Ok(items)
    }

    fn query_entries(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> ChainRepoResult<Vec<Entry>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_entry_row(row)?);
        }
        Ok(items)
    }
}

impl ChainRepository for SqliteChainRepository<'_> {
    fn get_property(&self, id: PropertyId) -> ChainRepoResult<Option<Property>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, registration_code, office_id, owner
             FROM properties
             WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_property_row(row)?));
        }
        Ok(None)
    }

    fn get_document(&self, id: DocumentId) -> ChainRepoResult<Option<Document>> {
        let mut items = self.query_documents(
            &format!("{DOCUMENT_SELECT_SQL} WHERE d.id = ?1;"),
            [id.to_string()],
        )?;
        Ok(items.pop())
    }

    fn find_documents_by_property(
        &self,
        property_id: PropertyId,
    ) -> ChainRepoResult<Vec<Document>> {
        self.query_documents(
            &format!("{DOCUMENT_SELECT_SQL} WHERE d.property_id = ?1 ORDER BY d.rowid ASC;"),
            [property_id.to_string()],
        )
    }

    fn list_imported_documents(&self, property_id: PropertyId) -> ChainRepoResult<Vec<Document>> {
        self.query_documents(
            &format!(
                "{DOCUMENT_SELECT_SQL}
                 INNER JOIN imported_documents i ON i.document_id = d.id
                 WHERE i.property_id = ?1
                 ORDER BY i.imported_at ASC, d.rowid ASC;"
            ),
            [property_id.to_string()],
        )
    }

    fn find_document(
        &self,
        number: &str,
        office_id: OfficeId,
    ) -> ChainRepoResult<Option<Document>> {
        let mut items = self.query_documents(
            &format!("{DOCUMENT_SELECT_SQL} WHERE d.number_key = ?1 AND d.office_id = ?2;"),
            params![number_key(number), office_id.to_string()],
        )?;
        Ok(items.pop())
    }

    fn find_documents_by_number(&self, number: &str) -> ChainRepoResult<Vec<Document>> {
        self.query_documents(
            &format!("{DOCUMENT_SELECT_SQL} WHERE d.number_key = ?1 ORDER BY d.rowid ASC;"),
            [number_key(number)],
        )
    }

    fn find_chain_opening_entries_with_origin(
        &self,
        document_id: DocumentId,
    ) -> ChainRepoResult<Vec<Entry>> {
        self.query_entries(
            &format!(
                "{ENTRY_SELECT_SQL}
                 WHERE document_id = ?1
                   AND kind = 'inicio_matricula'
                   AND origin IS NOT NULL
                   AND TRIM(origin) <> ''
                 ORDER BY recorded_at IS NULL, recorded_at ASC, rowid ASC;"
            ),
            [document_id.to_string()],
        )
    }

    fn list_entries(&self, document_id: DocumentId) -> ChainRepoResult<Vec<Entry>> {
        self.query_entries(
            &format!(
                "{ENTRY_SELECT_SQL}
                 WHERE document_id = ?1
                 ORDER BY recorded_at IS NULL, recorded_at ASC, rowid ASC;"
            ),
            [document_id.to_string()],
        )
    }

    fn count_entries(&self, document_id: DocumentId) -> ChainRepoResult<u32> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM entries WHERE document_id = ?1;",
            [document_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn create_document(&self, fields: &NewDocument) -> ChainRepoResult<Document> {
        let id = Uuid::new_v4();
        let key = number_key(&fields.number);
        self.conn.execute(
            "INSERT INTO documents (
                id,
                property_id,
                kind,
                number,
                number_key,
                office_id,
                book,
                page,
                origin,
                opened_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(number_key, office_id) DO NOTHING;",
            params![
                id.to_string(),
                fields.property_id.to_string(),
                document_kind_to_db(fields.kind),
                fields.number.as_str(),
                key,
                fields.office_id.to_string(),
                fields.book.as_deref(),
                fields.page.as_deref(),
                fields.origin.as_deref(),
                fields.opened_at,
            ],
        )?;
        self.find_document(&key, fields.office_id)?
            .ok_or(ChainRepoError::DocumentNotFound(id))
    }
}

fn parse_property_row(row: &Row<'_>) -> ChainRepoResult<Property> {
    let id_text: String = row.get("id")?;
    let office_text: String = row.get("office_id")?;
    Ok(Property {
        id: parse_uuid(&id_text, "properties.id")?,
        name: row.get("name")?,
        registration_code: row.get("registration_code")?,
        office_id: parse_uuid(&office_text, "properties.office_id")?,
        owner: row.get("owner")?,
    })
}

fn parse_document_row(row: &Row<'_>) -> ChainRepoResult<Document> {
    let id_text: String = row.get("id")?;
    let property_text: String = row.get("property_id")?;
    let office_text: String = row.get("office_id")?;

    let kind_text: String = row.get("kind")?;
    let kind = parse_document_kind(&kind_text).ok_or_else(|| {
        ChainRepoError::InvalidData(format!("invalid document kind `{kind_text}` in documents.kind"))
    })?;

    let is_chain_end = match row.get::<_, i64>("is_chain_end")? {
        0 => false,
        1 => true,
        other => {
            return Err(ChainRepoError::InvalidData(format!(
                "invalid is_chain_end value `{other}` in documents.is_chain_end"
            )));
        }
    };

    Ok(Document {
        id: parse_uuid(&id_text, "documents.id")?,
        property_id: parse_uuid(&property_text, "documents.property_id")?,
        kind,
        number: row.get("number")?,
        office_id: parse_uuid(&office_text, "documents.office_id")?,
        book: row.get("book")?,
        page: row.get("page")?,
        origin: row.get("origin")?,
        opened_at: row.get("opened_at")?,
        pinned_level: row.get("pinned_level")?,
        is_chain_end,
    })
}

fn parse_entry_row(row: &Row<'_>) -> ChainRepoResult<Entry> {
    let id_text: String = row.get("id")?;
    let document_text: String = row.get("document_id")?;
    let kind_text: String = row.get("kind")?;
    let kind = parse_entry_kind(&kind_text).ok_or_else(|| {
        ChainRepoError::InvalidData(format!("invalid entry kind `{kind_text}` in entries.kind"))
    })?;
    let origin_office_id = row
        .get::<_, Option<String>>("origin_office_id")?
        .map(|value| parse_uuid(&value, "entries.origin_office_id"))
        .transpose()?;

    Ok(Entry {
        id: parse_uuid(&id_text, "entries.id")?,
        document_id: parse_uuid(&document_text, "entries.document_id")?,
        number: row.get("number")?,
        kind,
        recorded_at: row.get("recorded_at")?,
        origin: row.get("origin")?,
        origin_office_id,
    })
}

fn document_kind_to_db(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Matricula => "matricula",
        DocumentKind::Transcricao => "transcricao",
    }
}

fn parse_document_kind(value: &str) -> Option<DocumentKind> {
    match value {
        "matricula" => Some(DocumentKind::Matricula),
        "transcricao" => Some(DocumentKind::Transcricao),
        _ => None,
    }
}

fn entry_kind_to_db(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::ChainOpening => "inicio_matricula",
        EntryKind::Registration => "registro",
        EntryKind::Annotation => "averbacao",
        EntryKind::Other => "outro",
    }
}

fn parse_entry_kind(value: &str) -> Option<EntryKind> {
    match value {
        "inicio_matricula" => Some(EntryKind::ChainOpening),
        "registro" => Some(EntryKind::Registration),
        "averbacao" => Some(EntryKind::Annotation),
        "outro" => Some(EntryKind::Other),
        _ => None,
    }
}

fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}

fn parse_uuid(value: &str, column: &'static str) -> ChainRepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| ChainRepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn ensure_chain_connection_ready(conn: &Connection) -> ChainRepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(ChainRepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    const REQUIRED: &[(&str, &[&str])] = &[
        ("registry_offices", &["id", "name"]),
        (
            "properties",
            &["id", "name", "registration_code", "office_id", "owner"],
        ),
        (
            "documents",
            &[
                "id",
                "property_id",
                "kind",
                "number",
                "number_key",
                "office_id",
                "origin",
                "opened_at",
                "pinned_level",
                "is_chain_end",
            ],
        ),
        (
            "entries",
            &["id", "document_id", "number", "kind", "origin", "origin_office_id"],
        ),
        ("imported_documents", &["property_id", "document_id"]),
    ];

    for &(table, columns) in REQUIRED {
        if !table_exists(conn, table)? {
            return Err(ChainRepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(ChainRepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> ChainRepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> ChainRepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
