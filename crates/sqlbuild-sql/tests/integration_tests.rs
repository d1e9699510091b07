//! Integration tests for SQL validation

use pretty_assertions::assert_eq;
use sqlbuild_core::{Config, DiagnosticCode};
use sqlbuild_sql::{strip_terminators, SqlParserValidator, SqlValidator};

const PIPELINE_UNITS: &[(&str, &str)] = &[
    (
        "clean_orders",
        "SELECT order_id, customer_id, CAST(total AS DECIMAL(10, 2)) AS total\n\
         FROM read_csv_auto('raw/orders.csv')\n\
         WHERE total IS NOT NULL;\n",
    ),
    (
        "customer_totals",
        "SELECT customer_id, sum(total) AS lifetime_value, count(*) AS orders\n\
         FROM read_csv_auto('clean_orders.csv')\n\
         GROUP BY customer_id\n\
         ORDER BY lifetime_value DESC\n\
         LIMIT 100",
    ),
    (
        "top_regions",
        "WITH totals AS (SELECT * FROM read_csv_auto('customer_totals.csv'))\n\
         SELECT c.region, sum(t.lifetime_value) AS value\n\
         FROM totals t JOIN read_csv_auto('customers.csv') c USING (customer_id)\n\
         GROUP BY c.region",
    ),
];

#[test]
fn realistic_units_validate_with_configured_dialect() {
    let config = Config::default();
    let validator = SqlParserValidator::from_dialect(&config.sql.dialect);

    for (name, sql) in PIPELINE_UNITS {
        if let Err(e) = validator.validate(sql) {
            panic!("{} should validate: {}", name, e);
        }
    }
}

#[test]
fn broken_unit_surfaces_parser_message() {
    let validator = SqlParserValidator::new();
    let err = validator
        .validate("SELECT customer_id, FROM read_csv_auto('clean_orders.csv') GROUP BY")
        .unwrap_err();

    let diag = err.to_diagnostic();
    assert_eq!(diag.code, DiagnosticCode::SqlValidationError);
    assert!(diag.message.ends_with(&err.message));
}

#[test]
fn terminators_removed_before_embedding() {
    let (_, sql) = PIPELINE_UNITS[0];
    let stripped = strip_terminators(sql);

    assert!(stripped.ends_with("WHERE total IS NOT NULL"));
    assert!(SqlParserValidator::new().validate(stripped).is_ok());
}
