//! Integration tests for discovery and ordering

use pretty_assertions::assert_eq;
use sqlbuild_graph::{CsvLiteralExtractor, DependencyExtractor, GraphError, UnitGraph};
use std::collections::BTreeSet;
use std::path::Path;

fn write(dir: &Path, file: &str, contents: &str) {
    std::fs::write(dir.join(file), contents).unwrap();
}

fn order_of(dir: &Path) -> Vec<String> {
    UnitGraph::discover(dir, &CsvLiteralExtractor)
        .unwrap()
        .build_order()
        .unwrap()
        .into_iter()
        .map(|unit| unit.name)
        .collect()
}

#[test]
fn sales_pipeline_order() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "monthly_report.sql",
        "SELECT month, sum(total) AS revenue FROM read_csv_auto('enriched_orders.csv') GROUP BY month",
    );
    write(
        dir.path(),
        "enriched_orders.sql",
        r#"
        SELECT o.*, c.region
        FROM read_csv_auto('clean_orders.csv') o
        JOIN read_csv_auto("clean_customers.csv") c USING (customer_id)
        "#,
    );
    write(
        dir.path(),
        "clean_orders.sql",
        "SELECT * FROM read_csv_auto('raw/orders.csv') WHERE total > 0",
    );
    write(
        dir.path(),
        "clean_customers.sql",
        "SELECT DISTINCT * FROM read_csv_auto('raw/customers.csv')",
    );

    assert_eq!(
        order_of(dir.path()),
        vec!["clean_customers", "clean_orders", "enriched_orders", "monthly_report"]
    );
}

#[test]
fn order_is_stable_across_discoveries() {
    let dir = tempfile::tempdir().unwrap();
    for (name, deps) in [("e", vec!["a"]), ("d", vec!["a", "b"]), ("c", vec![]), ("b", vec!["c"]), ("a", vec![])] {
        let sql = deps
            .iter()
            .map(|d| format!("SELECT * FROM '{}.csv'", d))
            .collect::<Vec<_>>()
            .join(" UNION ALL ");
        let sql = if sql.is_empty() { "SELECT 1".to_string() } else { sql };
        write(dir.path(), &format!("{}.sql", name), &sql);
    }

    let first = order_of(dir.path());
    assert_eq!(first, order_of(dir.path()));
    assert_eq!(first, vec!["a", "c", "b", "d", "e"]);
}

#[test]
fn cycle_reported_with_path() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "x.sql", "SELECT * FROM 'y.csv'");
    write(dir.path(), "y.sql", "SELECT * FROM 'x.csv'");
    write(dir.path(), "z.sql", "SELECT 1");

    let graph = UnitGraph::discover(dir.path(), &CsvLiteralExtractor).unwrap();
    let err = graph.build_order().unwrap_err();

    assert!(matches!(err, GraphError::Cycle(_)));
    assert_eq!(err.to_string(), "cyclic dependency detected: x -> y -> x");
}

/// A structured declaration strategy can replace text scanning
struct DeclaredDependencies;

impl DependencyExtractor for DeclaredDependencies {
    fn extract(&self, sql: &str) -> BTreeSet<String> {
        sql.lines()
            .filter_map(|line| line.trim().strip_prefix("-- depends:"))
            .flat_map(|deps| deps.split(','))
            .map(|dep| dep.trim().to_string())
            .filter(|dep| !dep.is_empty())
            .collect()
    }
}

#[test]
fn pluggable_extraction_strategy() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.sql", "-- depends: b\nSELECT * FROM 'c.csv'");
    write(dir.path(), "b.sql", "SELECT 1");
    write(dir.path(), "c.sql", "-- depends: a\nSELECT 2");

    let graph = UnitGraph::discover(dir.path(), &DeclaredDependencies).unwrap();
    assert_eq!(graph.graph().parents("a"), &["b".to_string()]);

    let order: Vec<String> = graph
        .build_order()
        .unwrap()
        .into_iter()
        .map(|unit| unit.name)
        .collect();
    assert_eq!(order, vec!["b", "a", "c"]);
}
