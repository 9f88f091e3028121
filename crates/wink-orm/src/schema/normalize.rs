//! Canonical forms of column and table definitions.
//!
//! Both the target definition and the definition parsed back from a live
//! table pass through here, so they can be compared field by field.

use serde_json::Value;
use tracing::debug;
use wink_sql_builder::utils::camel_to_underline;

use super::define::{ColumnDefine, ColumnType, TableDefine};
use crate::error::{OrmError, Result};

/// Charset applied when a table names none.
pub const DEFAULT_CHARSET: &str = "utf8mb4";

/// Engine applied when a table names none.
pub const DEFAULT_ENGINE: &str = "InnoDB";

/// Returns the canonical form of a column.
///
/// # Errors
///
/// Returns [`OrmError::InvalidType`] when `auto_increment` is set on a
/// column that is not [`ColumnType::Int`].
pub fn normalize_column_define(column: &ColumnDefine, normalize_name: bool) -> Result<ColumnDefine> {
    if column.auto_increment && column.column_type != ColumnType::Int {
        return Err(OrmError::InvalidType(column.name.clone()));
    }

    let name = if normalize_name {
        camel_to_underline(&column.name)
    } else {
        column.name.clone()
    };

    let length = if column.column_type.is_lengthless() {
        Vec::new()
    } else if column.length.is_empty() {
        column.column_type.default_length().to_vec()
    } else {
        column.length.clone()
    };

    Ok(ColumnDefine {
        name,
        length,
        required: column.required || column.primary,
        default_value: normalize_default(column.column_type, column.default_value.as_deref()),
        ..column.clone()
    })
}

/// Returns the canonical form of a table.
///
/// Columns are normalized and de-duplicated by name: a later definition
/// replaces an earlier one but keeps the earlier position.
///
/// # Errors
///
/// Propagates [`normalize_column_define`] errors.
pub fn normalize_table_define(table: &TableDefine, normalize_name: bool) -> Result<TableDefine> {
    let mut columns: Vec<ColumnDefine> = Vec::with_capacity(table.column_defines.len());
    for column in &table.column_defines {
        let column = normalize_column_define(column, normalize_name)?;
        match columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => {
                debug!(table = %table.name, column = %column.name, "duplicate column definition replaced");
                *existing = column;
            }
            None => columns.push(column),
        }
    }

    Ok(TableDefine {
        name: if normalize_name {
            camel_to_underline(&table.name)
        } else {
            table.name.clone()
        },
        charset: Some(table.charset.clone().unwrap_or_else(|| DEFAULT_CHARSET.to_string())),
        engine: Some(table.engine.clone().unwrap_or_else(|| DEFAULT_ENGINE.to_string())),
        column_defines: columns,
        constraints: table.constraints.clone(),
        is_relation_table: table.is_relation_table,
    })
}

fn strip_quotes(raw: &str) -> &str {
    for quote in ['\'', '"'] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return &raw[1..raw.len() - 1];
        }
    }
    raw
}

/// Integral floats print without a fraction, so `0.00` and `0` agree.
#[allow(clippy::cast_possible_truncation)]
fn number_to_string(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if !n.is_i64() && !n.is_u64() && f.fract() == 0.0 && f.abs() < 1e15 => (f as i64).to_string(),
        _ => n.to_string(),
    }
}

fn normalize_default(column_type: ColumnType, raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    if raw.eq_ignore_ascii_case("null") {
        return None;
    }
    let unquoted = strip_quotes(raw);
    let value = match serde_json::from_str::<Value>(unquoted) {
        Ok(Value::Null) => return None,
        Ok(Value::String(s)) => s,
        Ok(Value::Number(n)) => number_to_string(&n),
        Ok(Value::Bool(b)) => b.to_string(),
        Ok(other @ (Value::Array(_) | Value::Object(_))) => other.to_string(),
        Err(_) => unquoted.to_string(),
    };
    if column_type == ColumnType::Boolean {
        let falsy = matches!(value.as_str(), "" | "0" | "false" | "0.0");
        return Some(String::from(if falsy { "0" } else { "1" }));
    }
    Some(value)
}
