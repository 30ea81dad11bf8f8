//! Property tests for schema compatibility and client-side diffing.

use std::collections::{BTreeMap, BTreeSet};

use oxide_rowsync_core::dialect::SqliteDialect;
use oxide_rowsync_core::local::diff_rows;
use oxide_rowsync_core::{
    Composite, Renderer, Row, SqlValue, StatementBuilder, StatementKind, TableMetadata,
};
use proptest::prelude::*;

// =============================================================================
// Schema compatibility
// =============================================================================

fn schema_strategy() -> impl Strategy<Value = (Vec<String>, BTreeSet<usize>)> {
    proptest::collection::vec("[a-z]{1,6}", 1..6).prop_flat_map(|names| {
        let len = names.len();
        (
            Just(names),
            proptest::sample::subsequence((0..len).collect::<Vec<_>>(), 0..=len)
                .prop_map(|pk| pk.into_iter().collect::<BTreeSet<_>>()),
        )
    })
}

proptest! {
    #[test]
    fn test_compatibility_is_reflexive_and_symmetric(
        (names_a, pk_a) in schema_strategy(),
        (names_b, pk_b) in schema_strategy(),
    ) {
        let a = TableMetadata::new(names_a, pk_a).unwrap();
        let b = TableMetadata::new(names_b, pk_b).unwrap();
        prop_assert!(a.is_compatible(&a));
        prop_assert_eq!(a.is_compatible(&b), b.is_compatible(&a));
        prop_assert_eq!(
            a.ensure_compatible(&b, "s", "t").is_ok(),
            a.is_compatible(&b)
        );
    }

    #[test]
    fn test_renaming_one_column_breaks_compatibility(
        (names, pk) in schema_strategy(),
        pick in any::<prop::sample::Index>(),
    ) {
        let a = TableMetadata::new(names.clone(), pk.clone()).unwrap();
        let mut renamed = names;
        let i = pick.index(renamed.len());
        renamed[i].push_str("_renamed");
        let b = TableMetadata::new(renamed, pk).unwrap();
        prop_assert!(!a.is_compatible(&b));
        prop_assert!(!b.is_compatible(&a));
    }

    #[test]
    fn test_toggling_key_membership_breaks_compatibility(
        (names, pk) in schema_strategy(),
        pick in any::<prop::sample::Index>(),
    ) {
        let a = TableMetadata::new(names.clone(), pk.clone()).unwrap();
        let i = pick.index(names.len());
        let mut toggled = pk;
        if !toggled.remove(&i) {
            toggled.insert(i);
        }
        let b = TableMetadata::new(names, toggled).unwrap();
        prop_assert!(!a.is_compatible(&b));
    }
}

// =============================================================================
// Local diff
// =============================================================================

type Table = BTreeMap<u8, (Option<String>, Option<String>)>;

fn cell() -> impl Strategy<Value = Option<String>> {
    proptest::option::of("[ab']{0,2}")
}

fn table_strategy() -> impl Strategy<Value = Table> {
    proptest::collection::btree_map(0u8..12, (cell(), cell()), 0..10)
}

fn rows(table: &Table) -> Vec<Row> {
    table
        .iter()
        .map(|(id, (a, b))| {
            Row::new(vec![
                SqlValue::from(id.to_string()),
                SqlValue::from(a.clone()),
                SqlValue::from(b.clone()),
            ])
        })
        .collect()
}

fn metadata() -> TableMetadata {
    TableMetadata::new(vec!["id".into(), "a".into(), "b".into()], [0]).unwrap()
}

fn id_of(key: &Composite) -> u8 {
    key.values()[0].as_text().unwrap().parse().unwrap()
}

proptest! {
    #[test]
    fn test_diff_counts_match_set_algebra(source in table_strategy(), target in table_strategy()) {
        let meta = metadata();
        let builder = StatementBuilder::new(Renderer::new(&meta, &SqliteDialect), "t");
        let statements = diff_rows(builder, rows(&source), rows(&target)).unwrap();

        let count = |kind: StatementKind| statements.iter().filter(|s| s.kind() == kind).count();
        let inserts = source.keys().filter(|k| !target.contains_key(*k)).count();
        let deletes = target.keys().filter(|k| !source.contains_key(*k)).count();
        let updates = source
            .iter()
            .filter(|(k, v)| target.get(*k).is_some_and(|t| t != *v))
            .count();

        prop_assert_eq!(count(StatementKind::Insert), inserts);
        prop_assert_eq!(count(StatementKind::Delete), deletes);
        prop_assert_eq!(count(StatementKind::Update), updates);
    }

    #[test]
    fn test_applying_the_diff_converges(source in table_strategy(), target in table_strategy()) {
        let meta = metadata();
        let builder = StatementBuilder::new(Renderer::new(&meta, &SqliteDialect), "t");
        let statements = diff_rows(builder, rows(&source), rows(&target)).unwrap();

        let mut applied = target.clone();
        for statement in &statements {
            let id = id_of(statement.key());
            match statement.kind() {
                StatementKind::Insert | StatementKind::Update => {
                    applied.insert(id, source[&id].clone());
                }
                StatementKind::Delete => {
                    applied.remove(&id);
                }
            }
        }
        prop_assert_eq!(&applied, &source);

        let again = diff_rows(builder, rows(&source), rows(&applied)).unwrap();
        prop_assert!(again.is_empty());
    }
}
