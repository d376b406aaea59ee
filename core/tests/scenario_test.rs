//! End-to-end comparison scenarios through the public API

use recdiff_core::{
    ChangeKind, ComparisonOptions, DiffEngine, IdentityResolver, KeySpec, MatchMode, RowKey,
    Side,
};

mod common;
use common::TestFixtures;

fn key(parts: &[&str]) -> RowKey {
    RowKey::Values(parts.iter().map(|p| p.to_string()).collect())
}

fn roster_identity() -> MatchMode {
    MatchMode::Keyed(KeySpec::Identity(
        IdentityResolver::new("Name").with_secondary("Chi Name"),
    ))
}

#[test]
fn test_keyed_phone_change() {
    let pair = TestFixtures::pair(
        &["id", "name", "phone"],
        &[&["1", "Alice", "123"]],
        &[&["1", "Alice", "124"]],
    );
    let options = ComparisonOptions::new(MatchMode::Keyed(KeySpec::Columns(vec!["id".into()])));
    let result = DiffEngine::compare(&pair, &options).unwrap();

    assert_eq!(result.modified().len(), 1);
    let row = &result.modified()[0];
    assert_eq!(row.key.to_string(), "(\"1\",)");
    assert_eq!(row.changes.len(), 1);
    assert_eq!(row.changes[0].column, "phone");
    assert_eq!(row.changes[0].old, "123");
    assert_eq!(row.changes[0].new, "124");
    assert!(result.added().is_empty() && result.removed().is_empty());
}

#[test]
fn test_positional_trailing_row_removed() {
    let pair = TestFixtures::pair(&["v"], &[&["r0"], &["r1"]], &[&["r0"]]);
    let result =
        DiffEngine::compare(&pair, &ComparisonOptions::new(MatchMode::Positional)).unwrap();

    assert_eq!(result.removed().len(), 1);
    assert_eq!(result.removed()[0].key.to_string(), "(1,)");
    assert!(result.added().is_empty());
    assert!(result.modified().is_empty());
}

#[test]
fn test_multiset_default_splits_edit() {
    let pair = TestFixtures::pair(&["k", "v"], &[&["A", "1"]], &[&["A", "2"]]);
    let result = DiffEngine::compare(&pair, &ComparisonOptions::default()).unwrap();

    assert_eq!(result.removed().len(), 1);
    assert_eq!(result.removed()[0].key, key(&["A", "1"]));
    assert_eq!(result.added().len(), 1);
    assert_eq!(result.added()[0].key, key(&["A", "2"]));
    assert!(result.modified().is_empty());
}

#[test]
fn test_identity_resolution_keeps_continuing_record() {
    let pair = TestFixtures::pair(
        &["Name", "Post"],
        &[&["O'Brien, John", "Manager"]],
        &[&["OBRIEN JOHN", "Manager"]],
    );
    let options = ComparisonOptions::new(MatchMode::Keyed(KeySpec::Identity(
        IdentityResolver::new("Name"),
    )));
    let result = DiffEngine::compare(&pair, &options).unwrap();

    assert!(result.added().is_empty());
    assert!(result.removed().is_empty());
    assert_eq!(result.statistics().matched, 1);
}

#[test]
fn test_classifier_threshold_examples() {
    let pair = TestFixtures::pair(
        &["id", "title"],
        &[&["1", "manager"], &["2", "sales"]],
        &[&["1", "mananger"], &["2", "marketing"]],
    );
    let options = ComparisonOptions::new(MatchMode::Keyed(KeySpec::Columns(vec!["id".into()])))
        .tolerant();
    let result = DiffEngine::compare(&pair, &options).unwrap();

    let kinds: Vec<ChangeKind> = result
        .modified()
        .iter()
        .map(|row| row.changes[0].classification.unwrap().kind)
        .collect();
    assert_eq!(kinds, vec![ChangeKind::MinorChange, ChangeKind::MajorChange]);
    assert!(result.modified()[0].changes[0].classification.unwrap().similarity > 0.8);
    assert!(result.modified()[1].changes[0].classification.unwrap().similarity <= 0.5);
}

#[test]
fn test_roster_tracking_tolerant() {
    let pair = TestFixtures::roster_pair();
    let options = ComparisonOptions::new(roster_identity()).tolerant();
    let result = DiffEngine::compare(&pair, &options).unwrap();

    let stats = result.statistics();
    assert_eq!(stats.total_old_records, 5);
    assert_eq!(stats.total_new_records, 4);
    assert_eq!(stats.matched, 3);
    assert_eq!(stats.excluded_old, 1);
    assert_eq!(stats.excluded_new, 0);
    assert_eq!(stats.records_with_changes, 2);
    assert_eq!(stats.total_field_changes, 2);

    assert_eq!(result.removed().len(), 1);
    assert_eq!(result.removed()[0].key, key(&["WONG SIU MING"]));
    assert_eq!(result.added().len(), 1);
    assert_eq!(result.added()[0].key, key(&["LEE KA YAN", "李嘉欣"]));

    let obrien = &result.modified()[0];
    assert_eq!(obrien.key, key(&["OBRIEN JOHN"]));
    assert_eq!(obrien.changes.len(), 1);
    assert_eq!(obrien.changes[0].column, "Post");
    assert_eq!(
        obrien.changes[0].classification.unwrap().kind,
        ChangeKind::MinorChange
    );

    // Same primary name, told apart by the secondary field
    let chan = &result.modified()[1];
    assert_eq!(chan.key, key(&["CHAN TAI MAN", "陳泰文"]));
    assert_eq!(chan.changes[0].new, "Director");
    assert_eq!(
        chan.changes[0].classification.unwrap().kind,
        ChangeKind::MajorChange
    );
}

#[test]
fn test_roster_tracking_strict_reports_raw_differences() {
    let pair = TestFixtures::roster_pair();
    let result = DiffEngine::compare(&pair, &ComparisonOptions::new(roster_identity())).unwrap();

    assert_eq!(result.modified().len(), 3);
    assert_eq!(result.statistics().total_field_changes, 5);

    let cosmetic = &result.modified()[1];
    assert_eq!(cosmetic.key, key(&["CHAN TAI MAN", "陳大文"]));
    assert!(cosmetic
        .changes
        .iter()
        .all(|change| change.classification.is_none()));
}

#[test]
fn test_roster_multiset_has_no_modifications() {
    let pair = TestFixtures::roster_pair();
    let result = DiffEngine::compare(&pair, &ComparisonOptions::default()).unwrap();

    assert!(result.modified().is_empty());
    assert_eq!(result.removed().len(), 5);
    assert_eq!(result.added().len(), 4);
}

#[test]
fn test_duplicate_keys_are_reported() {
    let pair = TestFixtures::pair(
        &["id", "name"],
        &[&["1", "Alice"], &["1", "Alicia"], &["2", "Bob"]],
        &[&["1", "Alicia"], &["2", "Bob"]],
    );
    let options = ComparisonOptions::new(MatchMode::Keyed(KeySpec::Columns(vec!["id".into()])));
    let result = DiffEngine::compare(&pair, &options).unwrap();

    // The later "Alicia" row wins, so nothing changed
    assert!(result.modified().is_empty());
    assert_eq!(result.duplicate_keys().len(), 1);
    assert_eq!(result.duplicate_keys()[0].side, Side::Old);
    assert_eq!(result.duplicate_keys()[0].occurrences, 2);
}

#[test]
fn test_schema_drift_unions_columns() {
    let pair = recdiff_core::SnapshotPair::new(
        TestFixtures::table("old.csv", &["id", "name", "fax"], &[&["1", "Alice", "555"]]),
        TestFixtures::table("new.csv", &["email", "id", "name"], &[&["a@x.org", "1", "Alice"]]),
    );
    let options = ComparisonOptions::new(MatchMode::Keyed(KeySpec::Columns(vec!["id".into()])));
    let result = DiffEngine::compare(&pair, &options).unwrap();

    assert_eq!(result.columns(), &["id", "name", "fax", "email"]);
    let changes: Vec<_> = result.modified()[0]
        .changes
        .iter()
        .map(|c| (c.column, c.old, c.new))
        .collect();
    assert_eq!(changes, vec![("fax", "555", ""), ("email", "", "a@x.org")]);
}
