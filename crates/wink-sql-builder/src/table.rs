//! Table references and joins.

use crate::condition::ConditionBuilder;
use crate::sqlify::Sqlifiable;
use crate::utils::secure_name;
use crate::value::SqlValue;

/// A table name with an optional alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    name: String,
    alias: Option<String>,
}

impl Table {
    /// Creates a table reference.
    #[must_use]
    pub fn new(name: impl Into<String>, alias: Option<&str>) -> Self {
        Self {
            name: name.into(),
            alias: alias.map(String::from),
        }
    }

    /// Table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Alias, if any.
    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }
}

impl Sqlifiable for Table {
    fn to_sql(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{} as {}", secure_name(&self.name), secure_name(alias)),
            None => secure_name(&self.name),
        }
    }

    fn values(&self) -> Vec<SqlValue> {
        Vec::new()
    }
}

/// How a table takes part in the `from` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    /// The primary table, rendered with `from`.
    Primary,
    /// `left outer join`
    Left,
    /// `right outer join`
    Right,
    /// `full outer join`
    Full,
    /// `inner join`
    Inner,
}

impl JoinType {
    /// The SQL keyword introducing the table.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Primary => "from",
            Self::Left => "left outer join",
            Self::Right => "right outer join",
            Self::Full => "full outer join",
            Self::Inner => "inner join",
        }
    }
}

/// A table entry of the `from` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinTable {
    table: Table,
    join_type: JoinType,
    on: Option<ConditionBuilder>,
}

impl JoinTable {
    /// The primary table of a query.
    #[must_use]
    pub const fn primary(table: Table) -> Self {
        Self {
            table,
            join_type: JoinType::Primary,
            on: None,
        }
    }

    /// A joined table with its `on` condition.
    #[must_use]
    pub const fn join(table: Table, join_type: JoinType, on: ConditionBuilder) -> Self {
        Self {
            table,
            join_type,
            on: Some(on),
        }
    }

    /// The join type.
    #[must_use]
    pub const fn join_type(&self) -> JoinType {
        self.join_type
    }

    /// The referenced table.
    #[must_use]
    pub const fn table(&self) -> &Table {
        &self.table
    }
}

impl Sqlifiable for JoinTable {
    fn to_sql(&self) -> String {
        let mut sql = format!("{} {}", self.join_type.keyword(), self.table.to_sql());
        if self.join_type != JoinType::Primary {
            if let Some(on) = &self.on {
                let on = on.to_sql();
                if !on.is_empty() {
                    sql.push(' ');
                    sql.push_str(&on);
                }
            }
        }
        sql
    }

    fn values(&self) -> Vec<SqlValue> {
        match (&self.on, self.join_type) {
            (Some(on), join_type) if join_type != JoinType::Primary => on.values(),
            _ => Vec::new(),
        }
    }
}
