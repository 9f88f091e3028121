//! Detection of changes an `alter table` must not apply silently.

use tracing::warn;

use super::define::{ColumnDefine, ColumnType, TableDefine};
use crate::error::{OrmError, Result};

/// Type changes that never lose data.
fn is_widening(from: ColumnType, to: ColumnType) -> bool {
    use ColumnType as T;

    matches!(
        (from, to),
        (T::String, T::Text)
            | (T::Int, T::BigInt)
            | (T::Boolean, T::Int | T::BigInt)
            | (T::Float, T::Double)
            | (T::Date, T::DateTime | T::Timestamp)
    )
}

fn check_column(table: &str, old: &ColumnDefine, new: &ColumnDefine) -> Result<()> {
    let drift = |reason: String| OrmError::UnhandledSchemaDrift {
        table: table.to_string(),
        column: new.name.clone(),
        reason,
    };

    if old.column_type != new.column_type {
        if is_widening(old.column_type, new.column_type) {
            return Ok(());
        }
        return Err(drift(format!("type change {} -> {}", old.column_type, new.column_type)));
    }

    if new.column_type.has_display_width() {
        return Ok(());
    }
    let shrinks = new
        .length
        .iter()
        .zip(&old.length)
        .any(|(new_part, old_part)| new_part < old_part);
    if shrinks {
        return Err(drift(format!("length shrinks {:?} -> {:?}", old.length, new.length)));
    }
    Ok(())
}

/// Checks that altering `old` into `new` would not lose data.
///
/// Live columns absent from `new` are reported with a warning and left in
/// place.
///
/// # Errors
///
/// Returns [`OrmError::UnhandledSchemaDrift`] when a column changes to an
/// unrelated type or its length shrinks.
pub fn check_drift(old: &TableDefine, new: &TableDefine) -> Result<()> {
    for column in &new.column_defines {
        if let Some(existing) = old.find_column(&column.name) {
            check_column(&new.name, existing, column)?;
        }
    }
    for column in &old.column_defines {
        if new.find_column(&column.name).is_none() {
            warn!(table = %new.name, column = %column.name, "live column is not defined and is kept");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: Vec<ColumnDefine>) -> TableDefine {
        TableDefine {
            column_defines: columns,
            ..TableDefine::new("user")
        }
    }

    #[test]
    fn test_widening_is_allowed() {
        let old = table(vec![
            ColumnDefine::new("name", ColumnType::String).length([64]),
            ColumnDefine::new("hits", ColumnType::Int).length([4]),
        ]);
        let new = table(vec![
            ColumnDefine::new("name", ColumnType::Text),
            ColumnDefine::new("hits", ColumnType::BigInt).length([8]),
        ]);
        assert!(check_drift(&old, &new).is_ok());
    }

    #[test]
    fn test_unrelated_type_change_is_rejected() {
        let old = table(vec![ColumnDefine::new("age", ColumnType::String).length([10])]);
        let new = table(vec![ColumnDefine::new("age", ColumnType::Int).length([4])]);
        let err = check_drift(&old, &new).unwrap_err();
        assert!(matches!(
            err,
            OrmError::UnhandledSchemaDrift { ref table, ref column, .. } if table == "user" && column == "age"
        ));
    }

    #[test]
    fn test_shrinking_length_is_rejected() {
        let old = table(vec![ColumnDefine::new("name", ColumnType::String).length([255])]);
        let new = table(vec![ColumnDefine::new("name", ColumnType::String).length([64])]);
        assert!(check_drift(&old, &new).is_err());

        let old = table(vec![ColumnDefine::new("price", ColumnType::Decimal).length([10, 4])]);
        let new = table(vec![ColumnDefine::new("price", ColumnType::Decimal).length([10, 2])]);
        assert!(check_drift(&old, &new).is_err());
    }

    #[test]
    fn test_display_width_is_ignored() {
        let old = table(vec![ColumnDefine::new("age", ColumnType::Int).length([11])]);
        let new = table(vec![ColumnDefine::new("age", ColumnType::Int).length([4])]);
        assert!(check_drift(&old, &new).is_ok());
    }

    #[test]
    fn test_extra_live_columns_are_kept() {
        let old = table(vec![
            ColumnDefine::new("name", ColumnType::String).length([255]),
            ColumnDefine::new("legacy", ColumnType::Text),
        ]);
        let new = table(vec![ColumnDefine::new("name", ColumnType::String).length([255])]);
        assert!(check_drift(&old, &new).is_ok());
    }
}
