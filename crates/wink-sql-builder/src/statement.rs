//! `insert`, `update` and `delete` statements.

use crate::condition::ConditionBuilder;
use crate::sqlify::Sqlifiable;
use crate::utils::secure_name;
use crate::value::{SqlValue, ToSqlValue};

/// A multi-row `insert` statement.
///
/// ```
/// use wink_sql_builder::{InsertBuilder, Sqlifiable};
///
/// let mut insert = InsertBuilder::new("user");
/// insert.fields(["name", "age"]).row(["a", "b"]);
/// assert_eq!(insert.to_sql(), "insert into `user` (`name`, `age`) values (?, ?)");
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InsertBuilder {
    table: String,
    fields: Vec<String>,
    rows: Vec<Vec<SqlValue>>,
}

impl InsertBuilder {
    /// Creates an insert into `table`.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            fields: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Sets the column list.
    pub fn fields<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Appends a row. Missing trailing values are bound as NULL.
    pub fn row<I, V>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        let mut row: Vec<SqlValue> = values.into_iter().map(ToSqlValue::to_sql_value).collect();
        row.resize(self.fields.len(), SqlValue::Null);
        self.rows.push(row);
        self
    }

    /// Number of rows added so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` when no row was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Sqlifiable for InsertBuilder {
    fn to_sql(&self) -> String {
        let fields: Vec<String> = self.fields.iter().map(|f| secure_name(f)).collect();
        let marks = format!("({})", vec!["?"; self.fields.len()].join(", "));
        let rows = vec![marks; self.rows.len()].join(", ");
        format!(
            "insert into {} ({}) values {rows}",
            secure_name(&self.table),
            fields.join(", ")
        )
    }

    fn values(&self) -> Vec<SqlValue> {
        self.rows.iter().flatten().cloned().collect()
    }
}

/// An `update` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateBuilder {
    table: String,
    assignments: Vec<(String, SqlValue)>,
    conditions: ConditionBuilder,
}

impl UpdateBuilder {
    /// Creates an update of `table`.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            assignments: Vec::new(),
            conditions: ConditionBuilder::where_clause(),
        }
    }

    /// Appends `field = ?`.
    pub fn set(&mut self, field: impl Into<String>, value: impl ToSqlValue) -> &mut Self {
        self.assignments.push((field.into(), value.to_sql_value()));
        self
    }

    /// The `where` clause.
    pub fn where_clause(&mut self) -> &mut ConditionBuilder {
        &mut self.conditions
    }

    /// Replaces the `where` clause.
    pub fn conditions(&mut self, conditions: ConditionBuilder) -> &mut Self {
        self.conditions = conditions.into_where();
        self
    }

    /// Returns `true` when nothing would be assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

impl Sqlifiable for UpdateBuilder {
    fn to_sql(&self) -> String {
        let sets: Vec<String> = self
            .assignments
            .iter()
            .map(|(field, _)| format!("{} = ?", secure_name(field)))
            .collect();
        let mut sql = format!("update {} set {}", secure_name(&self.table), sets.join(", "));
        let conditions = self.conditions.to_sql();
        if !conditions.is_empty() {
            sql.push(' ');
            sql.push_str(&conditions);
        }
        sql
    }

    fn values(&self) -> Vec<SqlValue> {
        let mut values: Vec<SqlValue> = self.assignments.iter().map(|(_, v)| v.clone()).collect();
        values.extend(self.conditions.values());
        values
    }
}

/// A `delete` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteBuilder {
    table: String,
    conditions: ConditionBuilder,
}

impl DeleteBuilder {
    /// Creates a delete from `table`.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            conditions: ConditionBuilder::where_clause(),
        }
    }

    /// The `where` clause.
    pub fn where_clause(&mut self) -> &mut ConditionBuilder {
        &mut self.conditions
    }

    /// Replaces the `where` clause.
    pub fn conditions(&mut self, conditions: ConditionBuilder) -> &mut Self {
        self.conditions = conditions.into_where();
        self
    }
}

impl Sqlifiable for DeleteBuilder {
    fn to_sql(&self) -> String {
        let mut sql = format!("delete from {}", secure_name(&self.table));
        let conditions = self.conditions.to_sql();
        if !conditions.is_empty() {
            sql.push(' ');
            sql.push_str(&conditions);
        }
        sql
    }

    fn values(&self) -> Vec<SqlValue> {
        self.conditions.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_multiple_rows() {
        let mut insert = InsertBuilder::new("user");
        insert.fields(["name", "age"]);
        insert.row([SqlValue::Text(String::from("a")), SqlValue::Int(1)]);
        insert.row([SqlValue::Text(String::from("b"))]);
        assert_eq!(
            insert.to_sql(),
            "insert into `user` (`name`, `age`) values (?, ?), (?, ?)"
        );
        assert_eq!(insert.values().len(), 4);
        assert_eq!(insert.values()[3], SqlValue::Null);
    }

    #[test]
    fn test_update_with_where() {
        let mut update = UpdateBuilder::new("user");
        update.set("name", "x").set("age", 3);
        update.where_clause().in_list("id", [1, 2]);
        assert_eq!(
            update.to_sql(),
            "update `user` set `name` = ?, `age` = ? where `id` in (?, ?)"
        );
        assert_eq!(
            update.values(),
            vec![
                SqlValue::Text(String::from("x")),
                SqlValue::Int(3),
                SqlValue::Int(1),
                SqlValue::Int(2),
            ]
        );
    }

    #[test]
    fn test_delete() {
        let mut delete = DeleteBuilder::new("user");
        assert_eq!(delete.to_sql(), "delete from `user`");
        delete.where_clause().equal("id", 9);
        assert_eq!(delete.to_sql(), "delete from `user` where `id` = ?");
        assert_eq!(delete.values(), vec![SqlValue::Int(9)]);
    }
}
