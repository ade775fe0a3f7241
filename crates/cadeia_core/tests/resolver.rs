mod support;

use cadeia_core::{
    AutoProvisioner, ChainRepository, DocumentKind, DocumentResolver, OriginRef, ProvisionContext,
};
use support::{document, office, property, repo, setup};

#[test]
fn scoped_lookup_never_borrows_other_series_from_another_office() {
    let conn = setup();
    let repo = repo(&conn);
    let office_a = office(&repo, "A");
    let office_b = office(&repo, "B");
    let owner = property(&repo, "M-12", office_b.id);
    let in_b = document(&repo, &owner, "M-12", office_b.id, None);

    let resolver = DocumentResolver::new(&repo);
    let reference = OriginRef::new('T', "12");

    assert!(resolver.resolve(&reference, Some(office_a.id)).unwrap().is_none());
    let same_office = resolver.resolve(&reference, Some(office_b.id)).unwrap();
    assert_eq!(same_office.map(|doc| doc.id), Some(in_b.id));
}

#[test]
fn exact_series_wins_over_variant_in_same_office() {
    let conn = setup();
    let repo = repo(&conn);
    let office_a = office(&repo, "A");
    let owner = property(&repo, "M-1234", office_a.id);
    document(&repo, &owner, "M-1234", office_a.id, None);
    let transcription = document(&repo, &owner, "T-1234", office_a.id, None);

    let found = DocumentResolver::new(&repo)
        .resolve(&OriginRef::new('T', "1234"), Some(office_a.id))
        .unwrap()
        .unwrap();
    assert_eq!(found.id, transcription.id);
}

#[test]
fn unscoped_lookup_takes_first_document_with_the_number() {
    let conn = setup();
    let repo = repo(&conn);
    let office_a = office(&repo, "A");
    let office_b = office(&repo, "B");
    let owner = property(&repo, "M-1", office_a.id);
    let first = document(&repo, &owner, "T-050", office_b.id, None);
    document(&repo, &owner, "T-050", office_a.id, None);

    let found = DocumentResolver::new(&repo)
        .resolve(&OriginRef::new('T', "050"), None)
        .unwrap()
        .unwrap();
    assert_eq!(found.id, first.id);
}

#[test]
fn provisioning_refuses_unknown_series_prefix() {
    let conn = setup();
    let repo = repo(&conn);
    let office_a = office(&repo, "A");
    let owner = property(&repo, "M-1", office_a.id);

    let created = AutoProvisioner::new(&repo)
        .provision(
            &OriginRef::new('X', "12"),
            Some(office_a.id),
            ProvisionContext {
                property_id: owner.id,
                cited_by: "M-1",
            },
        )
        .unwrap();

    assert!(created.is_none());
    assert!(repo.find_documents_by_number("X12").unwrap().is_empty());
    assert!(repo.find_documents_by_property(owner.id).unwrap().is_empty());
}

#[test]
fn provisioning_refuses_without_scoping_office() {
    let conn = setup();
    let repo = repo(&conn);
    let office_a = office(&repo, "A");
    let owner = property(&repo, "M-1", office_a.id);

    let created = AutoProvisioner::new(&repo)
        .provision(
            &OriginRef::new('T', "77"),
            None,
            ProvisionContext {
                property_id: owner.id,
                cited_by: "M-1",
            },
        )
        .unwrap();

    assert!(created.is_none());
    assert!(repo.find_documents_by_number("T77").unwrap().is_empty());
}

#[test]
fn provisioning_returns_existing_document_for_same_key() {
    let conn = setup();
    let repo = repo(&conn);
    let office_a = office(&repo, "A");
    let owner = property(&repo, "M-1", office_a.id);
    let context = ProvisionContext {
        property_id: owner.id,
        cited_by: "M-1",
    };
    let provisioner = AutoProvisioner::new(&repo);

    let first = provisioner
        .provision(&OriginRef::new('t', "77"), Some(office_a.id), context)
        .unwrap()
        .unwrap();
    let second = provisioner
        .provision(&OriginRef::new('T', "77"), Some(office_a.id), context)
        .unwrap()
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.kind, DocumentKind::Transcricao);
    assert_eq!(first.number, "T77");
    assert_eq!(repo.find_documents_by_number("T-77").unwrap().len(), 1);
}
