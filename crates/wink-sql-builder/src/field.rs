//! Column references.

use crate::sqlify::Sqlifiable;
use crate::utils::{camel_to_underline, parse_alias_expression, secure_name};
use crate::value::SqlValue;

/// A column reference, optionally qualified by a table and aliased.
///
/// Names containing `(` are treated as raw expressions (`count(1)`) and are
/// emitted without quoting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    table: Option<String>,
    alias: Option<String>,
}

impl Field {
    /// Creates a field with the column name kept verbatim.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            alias: None,
        }
    }

    /// The `*` wildcard.
    #[must_use]
    pub fn all() -> Self {
        Self::new("*")
    }

    /// Qualifies the field with a table name or alias.
    #[must_use]
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Sets the output alias.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Parses `"u.roleId as role"` / `"u.roleId role"`.
    ///
    /// The column segment is converted to `snake_case`, so `u.roleId` refers
    /// to the `role_id` column of `u`. Raw expressions are kept as written.
    #[must_use]
    pub fn parse(express: &str) -> Self {
        let (name, alias) = parse_alias_expression(express);
        let alias = alias.map(String::from);
        if name.contains('(') {
            return Self {
                name: name.to_string(),
                table: None,
                alias,
            };
        }
        let (table, column) = match name.split_once('.') {
            Some((table, column)) => (Some(table.to_string()), column),
            None => (None, name),
        };
        let column = if column == "*" {
            column.to_string()
        } else {
            camel_to_underline(column)
        };
        Self {
            name: column,
            table,
            alias,
        }
    }

    /// Column name (or raw expression).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Qualifying table, if any.
    #[must_use]
    pub fn table_name(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Output alias, if any.
    #[must_use]
    pub fn alias_name(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    fn is_raw(&self) -> bool {
        self.name == "*" || self.name.contains('(')
    }
}

impl From<&str> for Field {
    fn from(express: &str) -> Self {
        Self::parse(express)
    }
}

impl From<String> for Field {
    fn from(express: String) -> Self {
        Self::parse(&express)
    }
}

impl From<&String> for Field {
    fn from(express: &String) -> Self {
        Self::parse(express)
    }
}

impl Sqlifiable for Field {
    fn to_sql(&self) -> String {
        let column = if self.is_raw() {
            self.name.clone()
        } else {
            secure_name(&self.name)
        };
        let mut sql = match &self.table {
            Some(table) => format!("{}.{column}", secure_name(table)),
            None => column,
        };
        if let Some(alias) = &self.alias {
            sql.push_str(" as ");
            sql.push_str(&secure_name(alias));
        }
        sql
    }

    fn values(&self) -> Vec<SqlValue> {
        Vec::new()
    }
}
