//! Clause builders: one per SQL clause of a query.

use crate::condition::ConditionBuilder;
use crate::field::Field;
use crate::sqlify::Sqlifiable;
use crate::table::{JoinTable, JoinType, Table};
use crate::value::{SqlValue, ToSqlValue};

// ============================================================================
// select
// ============================================================================

/// The `select` list. An empty list renders `select *`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectBuilder {
    fields: Vec<Field>,
}

impl SelectBuilder {
    /// Creates an empty select list.
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Appends fields.
    pub fn select<I, F>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Field>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Selected fields.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Clears the list.
    pub fn reset(&mut self) {
        self.fields.clear();
    }
}

impl Sqlifiable for SelectBuilder {
    fn to_sql(&self) -> String {
        if self.fields.is_empty() {
            return String::from("select *");
        }
        let fields: Vec<String> = self.fields.iter().map(Sqlifiable::to_sql).collect();
        format!("select {}", fields.join(", "))
    }

    fn values(&self) -> Vec<SqlValue> {
        Vec::new()
    }
}

// ============================================================================
// from / join
// ============================================================================

/// The `from` clause with its joins.
///
/// The primary table always sits at index 0; calling [`TableBuilder::from`]
/// again replaces it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableBuilder {
    tables: Vec<JoinTable>,
}

impl TableBuilder {
    /// Creates an empty clause.
    #[must_use]
    pub const fn new() -> Self {
        Self { tables: Vec::new() }
    }

    /// Sets the primary table.
    pub fn from(&mut self, name: &str, alias: Option<&str>) -> &mut Self {
        let primary = JoinTable::primary(Table::new(name, alias));
        match self.tables.first() {
            Some(first) if first.join_type() == JoinType::Primary => self.tables[0] = primary,
            _ => self.tables.insert(0, primary),
        }
        self
    }

    /// Appends a joined table.
    pub fn join(&mut self, join_type: JoinType, name: &str, alias: Option<&str>, on: ConditionBuilder) -> &mut Self {
        self.tables.push(JoinTable::join(Table::new(name, alias), join_type, on));
        self
    }

    /// Tables in render order.
    #[must_use]
    pub fn tables(&self) -> &[JoinTable] {
        &self.tables
    }

    /// Clears every table.
    pub fn reset(&mut self) {
        self.tables.clear();
    }
}

impl Sqlifiable for TableBuilder {
    fn to_sql(&self) -> String {
        let tables: Vec<String> = self.tables.iter().map(Sqlifiable::to_sql).collect();
        tables.join(" ")
    }

    fn values(&self) -> Vec<SqlValue> {
        self.tables.iter().flat_map(Sqlifiable::values).collect()
    }
}

// ============================================================================
// group by / having
// ============================================================================

/// The `group by` clause and its optional `having`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupByBuilder {
    fields: Vec<Field>,
    having: Option<ConditionBuilder>,
}

impl GroupByBuilder {
    /// Creates an empty clause.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fields: Vec::new(),
            having: None,
        }
    }

    /// Appends a grouping field.
    pub fn group_by(&mut self, field: impl Into<Field>) -> &mut Self {
        self.fields.push(field.into());
        self
    }

    /// Sets the `having` condition.
    pub fn having(&mut self, having: ConditionBuilder) -> &mut Self {
        self.having = Some(having);
        self
    }

    /// Clears the clause.
    pub fn reset(&mut self) {
        self.fields.clear();
        self.having = None;
    }
}

impl Sqlifiable for GroupByBuilder {
    fn to_sql(&self) -> String {
        if self.fields.is_empty() {
            return String::new();
        }
        let fields: Vec<String> = self.fields.iter().map(Sqlifiable::to_sql).collect();
        let mut sql = format!("group by {}", fields.join(", "));
        if let Some(having) = &self.having {
            let having = having.to_sql();
            if !having.is_empty() {
                sql.push(' ');
                sql.push_str(&having);
            }
        }
        sql
    }

    fn values(&self) -> Vec<SqlValue> {
        if self.fields.is_empty() {
            return Vec::new();
        }
        self.having.as_ref().map(Sqlifiable::values).unwrap_or_default()
    }
}

// ============================================================================
// order by
// ============================================================================

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl Direction {
    /// SQL keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    field: Field,
    direction: Direction,
}

impl OrderBy {
    /// Creates a sort key.
    #[must_use]
    pub fn new(field: impl Into<Field>, direction: Direction) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

impl Sqlifiable for OrderBy {
    fn to_sql(&self) -> String {
        format!("{} {}", self.field.to_sql(), self.direction.as_str())
    }

    fn values(&self) -> Vec<SqlValue> {
        Vec::new()
    }
}

/// The `order by` clause.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrderByBuilder {
    keys: Vec<OrderBy>,
}

impl OrderByBuilder {
    /// Creates an empty clause.
    #[must_use]
    pub const fn new() -> Self {
        Self { keys: Vec::new() }
    }

    /// Appends a sort key.
    pub fn order_by(&mut self, field: impl Into<Field>, direction: Direction) -> &mut Self {
        self.keys.push(OrderBy::new(field, direction));
        self
    }

    /// Clears the clause.
    pub fn reset(&mut self) {
        self.keys.clear();
    }
}

impl Sqlifiable for OrderByBuilder {
    fn to_sql(&self) -> String {
        if self.keys.is_empty() {
            return String::new();
        }
        let keys: Vec<String> = self.keys.iter().map(Sqlifiable::to_sql).collect();
        format!("order by {}", keys.join(", "))
    }

    fn values(&self) -> Vec<SqlValue> {
        Vec::new()
    }
}

// ============================================================================
// limit
// ============================================================================

/// A `limit ?,?` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    start: u64,
    end: u64,
}

impl Limit {
    /// Creates a window from raw bounds.
    #[must_use]
    pub const fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Window for a 1-based page: `start = size * (no - 1)`, `end = start + size`.
    ///
    /// A page number of 0 is treated as 1.
    #[must_use]
    pub const fn page(page_no: u64, page_size: u64) -> Self {
        let start = page_size.saturating_mul(page_no.saturating_sub(1));
        Self {
            start,
            end: start.saturating_add(page_size),
        }
    }

    /// First bound.
    #[must_use]
    pub const fn start(&self) -> u64 {
        self.start
    }

    /// Second bound.
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.end
    }
}

impl Sqlifiable for Limit {
    fn to_sql(&self) -> String {
        String::from("limit ?,?")
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![self.start.to_sql_value(), self.end.to_sql_value()]
    }
}

/// The `limit` clause; holds at most one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LimitBuilder {
    limit: Option<Limit>,
}

impl LimitBuilder {
    /// Creates an empty clause.
    #[must_use]
    pub const fn new() -> Self {
        Self { limit: None }
    }

    /// Sets raw bounds.
    pub fn limit(&mut self, start: u64, end: u64) -> &mut Self {
        self.limit = Some(Limit::new(start, end));
        self
    }

    /// Sets a page window.
    pub fn page(&mut self, page_no: u64, page_size: u64) -> &mut Self {
        self.limit = Some(Limit::page(page_no, page_size));
        self
    }

    /// Clears the clause.
    pub fn reset(&mut self) {
        self.limit = None;
    }
}

impl Sqlifiable for LimitBuilder {
    fn to_sql(&self) -> String {
        self.limit.as_ref().map(Sqlifiable::to_sql).unwrap_or_default()
    }

    fn values(&self) -> Vec<SqlValue> {
        self.limit.as_ref().map(Sqlifiable::values).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_select_is_wildcard() {
        assert_eq!(SelectBuilder::new().to_sql(), "select *");
    }

    #[test]
    fn test_from_replaces_primary() {
        let mut tables = TableBuilder::new();
        tables.from("a", None);
        tables.join(JoinType::Inner, "c", None, ConditionBuilder::on());
        tables.from("b", None);
        assert_eq!(tables.tables().len(), 2);
        assert_eq!(tables.tables()[0].table().name(), "b");
        assert_eq!(tables.tables()[0].join_type(), JoinType::Primary);
    }

    #[test]
    fn test_join_before_from_keeps_primary_first() {
        let mut tables = TableBuilder::new();
        tables.join(JoinType::Left, "c", Some("x"), ConditionBuilder::on());
        tables.from("a", None);
        assert_eq!(tables.to_sql(), "from `a` left outer join `c` as `x`");
    }

    #[test]
    fn test_group_by_with_having() {
        let mut having = ConditionBuilder::having();
        having.gt("count(1)", 1);
        let mut group = GroupByBuilder::new();
        group.group_by("role_id").having(having);
        assert_eq!(group.to_sql(), "group by `role_id` having count(1) > ?");
        assert_eq!(group.values(), vec![SqlValue::Int(1)]);
    }

    #[test]
    fn test_order_by() {
        let mut order = OrderByBuilder::new();
        order.order_by("u.createTime", Direction::Desc).order_by("id", Direction::Asc);
        assert_eq!(order.to_sql(), "order by `u`.`create_time` desc, `id` asc");
    }

    #[test]
    fn test_page_arithmetic() {
        for (no, size) in [(1_u64, 10_u64), (2, 10), (5, 0), (3, 7)] {
            let limit = Limit::page(no, size);
            assert_eq!(limit.start(), size * (no - 1));
            assert_eq!(limit.end(), limit.start() + size);
        }
    }

    #[test]
    fn test_limit_replaces_previous_window() {
        let mut limit = LimitBuilder::new();
        limit.limit(0, 5).page(2, 10);
        assert_eq!(limit.to_sql(), "limit ?,?");
        assert_eq!(limit.values(), vec![SqlValue::Int(10), SqlValue::Int(20)]);
    }
}
