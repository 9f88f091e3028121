//! The `select` statement facade.

use crate::clause::{Direction, GroupByBuilder, LimitBuilder, OrderByBuilder, SelectBuilder, TableBuilder};
use crate::condition::{ConditionBuilder, IntoOperand};
use crate::field::Field;
use crate::sqlify::Sqlifiable;
use crate::table::JoinType;
use crate::utils::concat_sql;
use crate::value::{SqlValue, ToSqlValue};

/// A `select` statement assembled from six clause builders.
///
/// Every clause method is forwarded so a whole query chains on one value:
///
/// ```
/// use wink_sql_builder::{Field, QueryBuilder, ConditionBuilder, Sqlifiable};
///
/// let mut on = ConditionBuilder::on();
/// on.equal("u.roleId", Field::parse("r.id"));
///
/// let mut query = QueryBuilder::new();
/// query
///     .from("user", Some("u"))
///     .select(["u.id", "u.name"])
///     .inner_join("role", Some("r"), on)
///     .equal("u.status", 1)
///     .page(1, 20);
///
/// assert_eq!(
///     query.to_sql(),
///     "select `u`.`id`, `u`.`name` from `user` as `u` \
///      inner join `role` as `r` on `u`.`role_id` = `r`.`id` \
///      where `u`.`status` = ? limit ?,?"
/// );
/// assert_eq!(query.values().len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct QueryBuilder {
    select: SelectBuilder,
    tables: TableBuilder,
    conditions: ConditionBuilder,
    group_by: GroupByBuilder,
    order_by: OrderByBuilder,
    limit: LimitBuilder,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! forward_comparisons {
    ($($name:ident, $name_if:ident;)*) => {
        $(
            #[doc = concat!("Forwards to [`ConditionBuilder::", stringify!($name), "`] on the `where` clause.")]
            pub fn $name(&mut self, field: impl Into<Field>, value: impl IntoOperand) -> &mut Self {
                self.conditions.$name(field, value);
                self
            }

            #[doc = concat!("Forwards to [`ConditionBuilder::", stringify!($name_if), "`] on the `where` clause.")]
            pub fn $name_if(
                &mut self,
                field: impl Into<Field>,
                value: impl IntoOperand,
                when: impl FnOnce() -> bool,
            ) -> &mut Self {
                self.conditions.$name_if(field, value, when);
                self
            }
        )*
    };
}

macro_rules! forward_patterns {
    ($($name:ident, $name_if:ident;)*) => {
        $(
            #[doc = concat!("Forwards to [`ConditionBuilder::", stringify!($name), "`] on the `where` clause.")]
            pub fn $name(&mut self, field: impl Into<Field>, value: impl ToSqlValue) -> &mut Self {
                self.conditions.$name(field, value);
                self
            }

            #[doc = concat!("Forwards to [`ConditionBuilder::", stringify!($name_if), "`] on the `where` clause.")]
            pub fn $name_if(
                &mut self,
                field: impl Into<Field>,
                value: impl ToSqlValue,
                when: impl FnOnce() -> bool,
            ) -> &mut Self {
                self.conditions.$name_if(field, value, when);
                self
            }
        )*
    };
}

impl QueryBuilder {
    /// Creates an empty query (`select *`).
    #[must_use]
    pub fn new() -> Self {
        Self {
            select: SelectBuilder::new(),
            tables: TableBuilder::new(),
            conditions: ConditionBuilder::where_clause(),
            group_by: GroupByBuilder::new(),
            order_by: OrderByBuilder::new(),
            limit: LimitBuilder::new(),
        }
    }

    /// Appends select fields.
    pub fn select<I, F>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Field>,
    {
        self.select.select(fields);
        self
    }

    /// Sets the primary table, replacing any earlier one.
    pub fn from(&mut self, table: &str, alias: Option<&str>) -> &mut Self {
        self.tables.from(table, alias);
        self
    }

    /// Appends an `inner join`.
    pub fn inner_join(&mut self, table: &str, alias: Option<&str>, on: ConditionBuilder) -> &mut Self {
        self.tables.join(JoinType::Inner, table, alias, on);
        self
    }

    /// Appends a `left outer join`.
    pub fn left_join(&mut self, table: &str, alias: Option<&str>, on: ConditionBuilder) -> &mut Self {
        self.tables.join(JoinType::Left, table, alias, on);
        self
    }

    /// Appends a `right outer join`.
    pub fn right_join(&mut self, table: &str, alias: Option<&str>, on: ConditionBuilder) -> &mut Self {
        self.tables.join(JoinType::Right, table, alias, on);
        self
    }

    /// Appends a `full outer join`.
    pub fn full_join(&mut self, table: &str, alias: Option<&str>, on: ConditionBuilder) -> &mut Self {
        self.tables.join(JoinType::Full, table, alias, on);
        self
    }

    /// Opens an `and` scope on the `where` clause and returns that scope.
    pub fn and(&mut self) -> &mut ConditionBuilder {
        self.conditions.and()
    }

    /// Opens an `or` scope on the `where` clause and returns that scope.
    pub fn or(&mut self) -> &mut ConditionBuilder {
        self.conditions.or()
    }

    /// Direct access to the `where` clause.
    pub fn where_clause(&mut self) -> &mut ConditionBuilder {
        &mut self.conditions
    }

    /// Replaces the `where` clause with a prebuilt tree.
    pub fn conditions(&mut self, conditions: ConditionBuilder) -> &mut Self {
        self.conditions = conditions.into_where();
        self
    }

    forward_comparisons! {
        equal, equal_if;
        not_equal, not_equal_if;
        gt, gt_if;
        gte, gte_if;
        lt, lt_if;
        lte, lte_if;
    }

    forward_patterns! {
        like, like_if;
        starts_with, starts_with_if;
        ends_with, ends_with_if;
    }

    /// Forwards to [`ConditionBuilder::matches`] on the `where` clause.
    pub fn matches(&mut self, field: impl Into<Field>, placeholder: &str, value: impl ToSqlValue) -> &mut Self {
        self.conditions.matches(field, placeholder, value);
        self
    }

    /// Forwards to [`ConditionBuilder::matches_if`] on the `where` clause.
    pub fn matches_if(
        &mut self,
        field: impl Into<Field>,
        placeholder: &str,
        value: impl ToSqlValue,
        when: impl FnOnce() -> bool,
    ) -> &mut Self {
        self.conditions.matches_if(field, placeholder, value, when);
        self
    }

    /// Forwards to [`ConditionBuilder::in_list`] on the `where` clause.
    pub fn in_list<I, V>(&mut self, field: impl Into<Field>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        self.conditions.in_list(field, values);
        self
    }

    /// Forwards to [`ConditionBuilder::in_list_if`] on the `where` clause.
    pub fn in_list_if<I, V>(&mut self, field: impl Into<Field>, values: I, when: impl FnOnce() -> bool) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        self.conditions.in_list_if(field, values, when);
        self
    }

    /// Forwards to [`ConditionBuilder::in_query`] on the `where` clause.
    pub fn in_query(&mut self, field: impl Into<Field>, query: Self) -> &mut Self {
        self.conditions.in_query(field, query);
        self
    }

    /// Forwards to [`ConditionBuilder::not_in_list`] on the `where` clause.
    pub fn not_in_list<I, V>(&mut self, field: impl Into<Field>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        self.conditions.not_in_list(field, values);
        self
    }

    /// Forwards to [`ConditionBuilder::not_in_list_if`] on the `where` clause.
    pub fn not_in_list_if<I, V>(&mut self, field: impl Into<Field>, values: I, when: impl FnOnce() -> bool) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        self.conditions.not_in_list_if(field, values, when);
        self
    }

    /// Forwards to [`ConditionBuilder::not_in_query`] on the `where` clause.
    pub fn not_in_query(&mut self, field: impl Into<Field>, query: Self) -> &mut Self {
        self.conditions.not_in_query(field, query);
        self
    }

    /// Forwards to [`ConditionBuilder::is_null`] on the `where` clause.
    pub fn is_null(&mut self, field: impl Into<Field>) -> &mut Self {
        self.conditions.is_null(field);
        self
    }

    /// Forwards to [`ConditionBuilder::is_null_if`] on the `where` clause.
    pub fn is_null_if(&mut self, field: impl Into<Field>, when: impl FnOnce() -> bool) -> &mut Self {
        self.conditions.is_null_if(field, when);
        self
    }

    /// Forwards to [`ConditionBuilder::not_null`] on the `where` clause.
    pub fn not_null(&mut self, field: impl Into<Field>) -> &mut Self {
        self.conditions.not_null(field);
        self
    }

    /// Forwards to [`ConditionBuilder::not_null_if`] on the `where` clause.
    pub fn not_null_if(&mut self, field: impl Into<Field>, when: impl FnOnce() -> bool) -> &mut Self {
        self.conditions.not_null_if(field, when);
        self
    }

    /// Forwards to [`ConditionBuilder::between`] on the `where` clause.
    pub fn between(&mut self, field: impl Into<Field>, low: impl ToSqlValue, high: impl ToSqlValue) -> &mut Self {
        self.conditions.between(field, low, high);
        self
    }

    /// Forwards to [`ConditionBuilder::between_if`] on the `where` clause.
    pub fn between_if(
        &mut self,
        field: impl Into<Field>,
        low: impl ToSqlValue,
        high: impl ToSqlValue,
        when: impl FnOnce() -> bool,
    ) -> &mut Self {
        self.conditions.between_if(field, low, high, when);
        self
    }

    /// Forwards to [`ConditionBuilder::not_between`] on the `where` clause.
    pub fn not_between(&mut self, field: impl Into<Field>, low: impl ToSqlValue, high: impl ToSqlValue) -> &mut Self {
        self.conditions.not_between(field, low, high);
        self
    }

    /// Forwards to [`ConditionBuilder::not_between_if`] on the `where` clause.
    pub fn not_between_if(
        &mut self,
        field: impl Into<Field>,
        low: impl ToSqlValue,
        high: impl ToSqlValue,
        when: impl FnOnce() -> bool,
    ) -> &mut Self {
        self.conditions.not_between_if(field, low, high, when);
        self
    }

    /// Appends a `group by` field.
    pub fn group_by(&mut self, field: impl Into<Field>) -> &mut Self {
        self.group_by.group_by(field);
        self
    }

    /// Sets the `having` condition of the `group by` clause.
    pub fn having(&mut self, having: ConditionBuilder) -> &mut Self {
        self.group_by.having(having);
        self
    }

    /// Appends an `order by` key.
    pub fn order_by(&mut self, field: impl Into<Field>, direction: Direction) -> &mut Self {
        self.order_by.order_by(field, direction);
        self
    }

    /// Sets raw `limit` bounds.
    pub fn limit(&mut self, start: u64, end: u64) -> &mut Self {
        self.limit.limit(start, end);
        self
    }

    /// Sets a 1-based page window.
    pub fn page(&mut self, page_no: u64, page_size: u64) -> &mut Self {
        self.limit.page(page_no, page_size);
        self
    }

    /// Clears every clause so the builder can be reused.
    pub fn reset(&mut self) -> &mut Self {
        self.select.reset();
        self.tables.reset();
        self.conditions.reset();
        self.group_by.reset();
        self.order_by.reset();
        self.limit.reset();
        self
    }

    /// Takes the current query out, leaving an empty builder behind.
    #[must_use]
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    fn clauses(&self) -> [&dyn Sqlifiable; 6] {
        [
            &self.select,
            &self.tables,
            &self.conditions,
            &self.group_by,
            &self.order_by,
            &self.limit,
        ]
    }
}

impl Sqlifiable for QueryBuilder {
    fn to_sql(&self) -> String {
        concat_sql(self.clauses().iter().map(|clause| clause.to_sql()), " ")
    }

    fn values(&self) -> Vec<SqlValue> {
        self.clauses().iter().flat_map(|clause| clause.values()).collect()
    }
}
