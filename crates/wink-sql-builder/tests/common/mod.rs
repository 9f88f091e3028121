#![allow(dead_code)]

use wink_sql_builder::{SqlValue, Sqlifiable};

/// Renders a fragment and checks that every `?` has exactly one value.
pub fn render(fragment: &impl Sqlifiable) -> (String, Vec<SqlValue>) {
    let (sql, values) = fragment.build();
    assert_eq!(
        sql.matches('?').count(),
        values.len(),
        "placeholder/value mismatch in: {sql}"
    );
    (sql, values)
}

pub fn text(s: &str) -> SqlValue {
    SqlValue::Text(s.to_string())
}
