mod support;

use cadeia_core::{
    ChainConfig, ChainRepository, ChainServiceError, Document, MemoryTrunkCache, NoopTrunkCache,
    OverrideMap, SqliteChainRepository, TrunkService,
};
use rusqlite::Connection;
use support::{document, office, opening_entry, property, repo, setup};
use uuid::Uuid;

fn numbers(trunk: &[Document]) -> Vec<&str> {
    trunk.iter().map(|document| document.number.as_str()).collect()
}

struct BranchFixture {
    conn: Connection,
    property_id: Uuid,
    branching: Document,
}

/// `M-500` opens from both `M-100` and `T-050`, all owned by one property.
fn branch_fixture() -> BranchFixture {
    let conn = setup();
    let (property_id, branching) = {
        let repo = repo(&conn);
        let office_a = office(&repo, "A");
        let owner = property(&repo, "M-500", office_a.id);
        let branching = document(&repo, &owner, "M-500", office_a.id, Some(1_000));
        document(&repo, &owner, "M-100", office_a.id, None);
        document(&repo, &owner, "T-050", office_a.id, None);
        opening_entry(&repo, &branching, "M-100; T-050", None);
        (owner.id, branching)
    };
    BranchFixture {
        conn,
        property_id,
        branching,
    }
}

fn service(conn: &Connection) -> TrunkService<SqliteChainRepository<'_>, NoopTrunkCache> {
    TrunkService::new(repo(conn), NoopTrunkCache, ChainConfig::default())
}

#[test]
fn default_walk_follows_highest_matricula() {
    let fixture = branch_fixture();
    let trunk = service(&fixture.conn)
        .main_trunk(fixture.property_id, &OverrideMap::new())
        .unwrap();
    assert_eq!(numbers(&trunk), vec!["M-500", "M-100"]);
}

#[test]
fn override_redirects_the_walk() {
    let fixture = branch_fixture();
    let overrides = OverrideMap::from([(fixture.branching.id, "T-050".to_string())]);
    let trunk = service(&fixture.conn)
        .main_trunk(fixture.property_id, &overrides)
        .unwrap();
    assert_eq!(numbers(&trunk), vec!["M-500", "T-050"]);
}

#[test]
fn override_naming_a_non_candidate_is_ignored() {
    let fixture = branch_fixture();
    let overrides = OverrideMap::from([(fixture.branching.id, "M-999".to_string())]);
    let trunk = service(&fixture.conn)
        .main_trunk(fixture.property_id, &overrides)
        .unwrap();
    assert_eq!(numbers(&trunk), vec!["M-500", "M-100"]);
}

#[test]
fn trunk_table_lists_branch_options_and_choice() {
    let fixture = branch_fixture();
    let table = service(&fixture.conn)
        .trunk_table(fixture.property_id, &OverrideMap::new())
        .unwrap();

    assert_eq!(table.property_id, fixture.property_id);
    assert_eq!(table.rows.len(), 2);
    let first = &table.rows[0];
    assert_eq!(first.document.id, fixture.branching.id);
    assert_eq!(first.entries.len(), 1);
    let options: Vec<&str> = first
        .available_origins
        .iter()
        .map(|option| option.number.as_str())
        .collect();
    assert_eq!(options, vec!["M-100", "T-050"]);
    assert_eq!(first.chosen_origin.as_deref(), Some("M-100"));
    assert!(!first.is_imported);

    let last = &table.rows[1];
    assert!(last.available_origins.is_empty());
    assert_eq!(last.chosen_origin, None);
}

#[test]
fn apply_origin_choice_rerenders_with_new_override() {
    let fixture = branch_fixture();
    let table = service(&fixture.conn)
        .apply_origin_choice(
            fixture.property_id,
            fixture.branching.id,
            " T-050 ",
            &OverrideMap::new(),
        )
        .unwrap();

    assert_eq!(
        table.overrides.get(&fixture.branching.id).map(String::as_str),
        Some("T-050")
    );
    assert_eq!(table.rows[0].chosen_origin.as_deref(), Some("T-050"));
    assert_eq!(table.rows[1].document.number, "T-050");
}

#[test]
fn apply_origin_choice_rejects_unknown_document() {
    let fixture = branch_fixture();
    let missing = Uuid::new_v4();
    let err = service(&fixture.conn)
        .apply_origin_choice(fixture.property_id, missing, "T-050", &OverrideMap::new())
        .unwrap_err();
    assert!(matches!(err, ChainServiceError::DocumentNotFound(id) if id == missing));
}

#[test]
fn default_trunk_is_cached_until_invalidated() {
    let fixture = branch_fixture();
    let cache = MemoryTrunkCache::new();
    let service = TrunkService::new(repo(&fixture.conn), &cache, ChainConfig::default());

    let first = service
        .main_trunk(fixture.property_id, &OverrideMap::new())
        .unwrap();
    assert_eq!(numbers(&first), vec!["M-500", "M-100"]);
    assert_eq!(cache.len(), 1);

    // A higher matrícula appears; the memoized trunk is still served.
    {
        let repo = repo(&fixture.conn);
        let owner = repo.get_property(fixture.property_id).unwrap().unwrap();
        document(&repo, &owner, "M-300", fixture.branching.office_id, None);
        opening_entry(&repo, &fixture.branching, "M-300", None);
    }
    let stale = service
        .main_trunk(fixture.property_id, &OverrideMap::new())
        .unwrap();
    assert_eq!(numbers(&stale), vec!["M-500", "M-100"]);

    service.invalidate_property(fixture.property_id);
    assert!(cache.is_empty());
    let fresh = service
        .main_trunk(fixture.property_id, &OverrideMap::new())
        .unwrap();
    assert_eq!(numbers(&fresh), vec!["M-500", "M-300"]);
}

#[test]
fn override_requests_bypass_the_cache() {
    let fixture = branch_fixture();
    let cache = MemoryTrunkCache::new();
    let service = TrunkService::new(repo(&fixture.conn), &cache, ChainConfig::default());

    let overrides = OverrideMap::from([(fixture.branching.id, "T-050".to_string())]);
    service.main_trunk(fixture.property_id, &overrides).unwrap();
    assert!(cache.is_empty());

    service
        .main_trunk(fixture.property_id, &OverrideMap::new())
        .unwrap();
    let overridden = service.main_trunk(fixture.property_id, &overrides).unwrap();
    assert_eq!(numbers(&overridden), vec!["M-500", "T-050"]);
}

#[test]
fn foreign_origin_counts_only_once_imported() {
    let conn = setup();
    let repo = repo(&conn);
    let office_a = office(&repo, "A");
    let owner = property(&repo, "M-500", office_a.id);
    let neighbour = property(&repo, "M-900", office_a.id);
    let start = document(&repo, &owner, "M-500", office_a.id, Some(1_000));
    let foreign = document(&repo, &neighbour, "T-050", office_a.id, None);
    opening_entry(&repo, &start, "T-050", None);

    let service = TrunkService::new(repo, NoopTrunkCache, ChainConfig::default());
    let before = service.trunk_table(owner.id, &OverrideMap::new()).unwrap();
    assert_eq!(before.rows.len(), 1);
    assert!(before.rows[0].available_origins.is_empty());

    repo.import_document(owner.id, foreign.id).unwrap();
    let after = service.trunk_table(owner.id, &OverrideMap::new()).unwrap();
    assert_eq!(after.rows.len(), 2);
    assert_eq!(after.rows[1].document.id, foreign.id);
    assert!(after.rows[1].is_imported);
    assert!(!after.rows[0].is_imported);
}

#[test]
fn walk_starts_at_earliest_dated_matricula() {
    let conn = setup();
    let repo = repo(&conn);
    let office_a = office(&repo, "A");
    let owner = property(&repo, "M-7", office_a.id);
    document(&repo, &owner, "M-7", office_a.id, None);
    document(&repo, &owner, "M-8", office_a.id, Some(5_000));
    document(&repo, &owner, "M-9", office_a.id, Some(2_000));
    document(&repo, &owner, "T-1", office_a.id, Some(1));

    let trunk = TrunkService::new(repo, NoopTrunkCache, ChainConfig::default())
        .main_trunk(owner.id, &OverrideMap::new())
        .unwrap();
    assert_eq!(numbers(&trunk), vec!["M-9"]);
}

#[test]
fn cyclic_origins_stop_the_walk() {
    let conn = setup();
    let repo = repo(&conn);
    let office_a = office(&repo, "A");
    let owner = property(&repo, "M-500", office_a.id);
    let a = document(&repo, &owner, "M-500", office_a.id, Some(1_000));
    let b = document(&repo, &owner, "M-600", office_a.id, Some(2_000));
    opening_entry(&repo, &a, "M-600", None);
    opening_entry(&repo, &b, "M-500", None);

    let trunk = TrunkService::new(repo, NoopTrunkCache, ChainConfig::default())
        .main_trunk(owner.id, &OverrideMap::new())
        .unwrap();
    assert_eq!(numbers(&trunk), vec!["M-500", "M-600"]);
}

#[test]
fn property_without_documents_has_empty_trunk() {
    let conn = setup();
    let repo = repo(&conn);
    let office_a = office(&repo, "A");
    let owner = property(&repo, "M-1", office_a.id);

    let trunk = TrunkService::new(repo, NoopTrunkCache, ChainConfig::default())
        .main_trunk(owner.id, &OverrideMap::new())
        .unwrap();
    assert!(trunk.is_empty());
}

#[test]
fn unknown_property_is_an_error() {
    let conn = setup();
    let missing = Uuid::new_v4();
    let err = service(&conn)
        .main_trunk(missing, &OverrideMap::new())
        .unwrap_err();
    assert!(matches!(err, ChainServiceError::PropertyNotFound(id) if id == missing));
}
