//! Conditions and condition trees for `where`, `on` and `having` clauses.

use std::fmt;

use tracing::warn;

use crate::error::{BuildError, Result};
use crate::field::Field;
use crate::query::QueryBuilder;
use crate::sqlify::Sqlifiable;
use crate::value::{SqlValue, ToSqlValue};

// ============================================================================
// Operators
// ============================================================================

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionOperator {
    /// `=`
    Equal,
    /// `<>`
    NotEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanOrEqual,
    /// `<`
    LessThan,
    /// `<=`
    LessThanOrEqual,
    /// Substring match.
    Like,
    /// Prefix match.
    StartsWith,
    /// Suffix match.
    EndsWith,
    /// `like` against a caller-supplied placeholder template.
    Match,
    /// `in (...)`
    In,
    /// `not in (...)`
    NotIn,
    /// `is null`
    IsNull,
    /// `is not null`
    IsNotNull,
    /// `between ? and ?`
    Between,
    /// `not between ? and ?`
    NotBetween,
}

impl ConditionOperator {
    /// The operator token emitted in SQL. The pattern operators all render as
    /// `like`.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "<>",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::Like | Self::StartsWith | Self::EndsWith | Self::Match => "like",
            Self::In => "in",
            Self::NotIn => "not in",
            Self::IsNull => "is null",
            Self::IsNotNull => "is not null",
            Self::Between => "between",
            Self::NotBetween => "not between",
        }
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Logic joining the direct children of a [`ConditionBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Logic {
    /// `and`
    #[default]
    And,
    /// `or`
    Or,
}

impl Logic {
    /// SQL keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

// ============================================================================
// Operands
// ============================================================================

/// The right-hand side of a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A single bound value.
    Value(SqlValue),
    /// A list of bound values (`in`, `between`).
    List(Vec<SqlValue>),
    /// Another column; rendered without a placeholder.
    Field(Field),
    /// A subquery; its values are flattened in place.
    Query(Box<QueryBuilder>),
    /// A `like` template such as `'_a%'` with the value bound to its `?`.
    Pattern {
        /// Template containing exactly one `?`.
        placeholder: String,
        /// Value bound to the template.
        value: SqlValue,
    },
    /// No operand (`is null`).
    None,
}

impl Operand {
    /// Builds a [`Operand::Pattern`].
    #[must_use]
    pub fn pattern(placeholder: impl Into<String>, value: impl ToSqlValue) -> Self {
        Self::Pattern {
            placeholder: placeholder.into(),
            value: value.to_sql_value(),
        }
    }

    /// Builds a [`Operand::List`].
    #[must_use]
    pub fn list<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        Self::List(values.into_iter().map(ToSqlValue::to_sql_value).collect())
    }
}

/// Conversion into an [`Operand`] for the comparison methods.
///
/// Only shapes valid for every comparison operator convert: a value, a
/// column or a subquery. Other operands go through [`Condition::new`].
pub trait IntoOperand {
    /// Converts into an operand.
    fn into_operand(self) -> Operand;
}

impl<T: ToSqlValue> IntoOperand for T {
    fn into_operand(self) -> Operand {
        Operand::Value(self.to_sql_value())
    }
}

impl IntoOperand for Field {
    fn into_operand(self) -> Operand {
        Operand::Field(self)
    }
}

impl IntoOperand for QueryBuilder {
    fn into_operand(self) -> Operand {
        Operand::Query(Box::new(self))
    }
}

// ============================================================================
// Condition
// ============================================================================

/// A single comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    field: Field,
    operator: ConditionOperator,
    operand: Operand,
}

impl Condition {
    /// Creates a condition, checking that the operand fits the operator.
    ///
    /// # Errors
    ///
    /// - [`BuildError::InvalidMatchOperand`] for `Match` without a pattern.
    /// - [`BuildError::InvalidRange`] for a range without exactly two bounds.
    /// - [`BuildError::InvalidListOperand`] for `In`/`NotIn` without a list
    ///   or subquery.
    /// - [`BuildError::InvalidOperand`] for any other mismatch.
    pub fn new(field: impl Into<Field>, operator: ConditionOperator, operand: Operand) -> Result<Self> {
        use ConditionOperator as Op;

        match (operator, &operand) {
            (Op::Match, Operand::Pattern { .. })
            | (Op::In | Op::NotIn, Operand::List(_) | Operand::Query(_))
            | (Op::IsNull | Op::IsNotNull, Operand::None)
            | (
                Op::Equal
                | Op::NotEqual
                | Op::GreaterThan
                | Op::GreaterThanOrEqual
                | Op::LessThan
                | Op::LessThanOrEqual
                | Op::Like
                | Op::StartsWith
                | Op::EndsWith,
                Operand::Value(_) | Operand::Field(_) | Operand::Query(_),
            ) => {}
            (Op::Between | Op::NotBetween, Operand::List(values)) if values.len() == 2 => {}
            (Op::Between | Op::NotBetween, Operand::List(values)) => {
                return Err(BuildError::InvalidRange { len: values.len() });
            }
            (Op::Match, _) => return Err(BuildError::InvalidMatchOperand),
            (Op::In | Op::NotIn, _) => return Err(BuildError::InvalidListOperand { operator }),
            _ => return Err(BuildError::InvalidOperand { operator }),
        }

        if let Operand::Pattern { placeholder, .. } = &operand {
            if !placeholder.contains(['_', '%']) {
                warn!(placeholder = %placeholder, "match template has no wildcard");
            }
        }

        Ok(Self::from_parts(field.into(), operator, operand))
    }

    /// Assembles a condition whose shape is guaranteed by the caller.
    pub(crate) const fn from_parts(field: Field, operator: ConditionOperator, operand: Operand) -> Self {
        Self {
            field,
            operator,
            operand,
        }
    }

    /// The compared field.
    #[must_use]
    pub const fn field(&self) -> &Field {
        &self.field
    }

    /// The operator.
    #[must_use]
    pub const fn operator(&self) -> ConditionOperator {
        self.operator
    }

    /// The operand.
    #[must_use]
    pub const fn operand(&self) -> &Operand {
        &self.operand
    }

    fn placeholder(&self) -> String {
        use ConditionOperator as Op;

        match &self.operand {
            Operand::Field(other) => return other.to_sql(),
            Operand::Query(query) => return format!("({})", query.to_sql()),
            _ => {}
        }
        match self.operator {
            Op::Equal
            | Op::NotEqual
            | Op::GreaterThan
            | Op::GreaterThanOrEqual
            | Op::LessThan
            | Op::LessThanOrEqual => String::from("?"),
            Op::IsNull | Op::IsNotNull => String::new(),
            Op::Like => String::from("concat('%',?,'%')"),
            Op::StartsWith => String::from("concat(?,'%')"),
            Op::EndsWith => String::from("concat('%',?)"),
            Op::Match => match &self.operand {
                Operand::Pattern { placeholder, .. } => placeholder.clone(),
                _ => String::from("?"),
            },
            Op::In | Op::NotIn => {
                let marks = vec!["?"; self.values().len()];
                format!("({})", marks.join(", "))
            }
            Op::Between | Op::NotBetween => String::from("? and ?"),
        }
    }
}

impl Sqlifiable for Condition {
    fn to_sql(&self) -> String {
        // `in ()` is invalid SQL; an empty set matches nothing.
        if let (ConditionOperator::In | ConditionOperator::NotIn, Operand::List(values)) =
            (self.operator, &self.operand)
        {
            if values.is_empty() {
                return if self.operator == ConditionOperator::In {
                    String::from("1 = 0")
                } else {
                    String::from("1 = 1")
                };
            }
        }
        let placeholder = self.placeholder();
        let mut sql = format!("{} {}", self.field.to_sql(), self.operator.token());
        if !placeholder.is_empty() {
            sql.push(' ');
            sql.push_str(&placeholder);
        }
        sql
    }

    fn values(&self) -> Vec<SqlValue> {
        match &self.operand {
            Operand::Value(value) | Operand::Pattern { value, .. } => vec![value.clone()],
            Operand::List(values) => values.clone(),
            Operand::Query(query) => query.values(),
            Operand::Field(_) | Operand::None => Vec::new(),
        }
    }
}

// ============================================================================
// ConditionBuilder
// ============================================================================

/// A child of a [`ConditionBuilder`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionNode {
    /// A single comparison.
    Condition(Condition),
    /// A parenthesized group.
    Group(ConditionBuilder),
}

/// A tree of conditions sharing one logic operator per level.
///
/// The same type renders `where`, `on` and `having` clauses; only the
/// keyword differs. Nested groups carry no keyword.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConditionBuilder {
    keyword: &'static str,
    logic: Logic,
    children: Vec<ConditionNode>,
}

macro_rules! comparison_methods {
    ($($(#[$doc:meta])* $name:ident, $name_if:ident => $op:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self, field: impl Into<Field>, value: impl IntoOperand) -> &mut Self {
                self.push_condition(field.into(), ConditionOperator::$op, value.into_operand())
            }

            #[doc = concat!("[`Self::", stringify!($name), "`] applied only when `when` returns `true`.")]
            pub fn $name_if(
                &mut self,
                field: impl Into<Field>,
                value: impl IntoOperand,
                when: impl FnOnce() -> bool,
            ) -> &mut Self {
                if when() {
                    self.$name(field, value)
                } else {
                    self
                }
            }
        )*
    };
}

macro_rules! pattern_methods {
    ($($(#[$doc:meta])* $name:ident, $name_if:ident => $op:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self, field: impl Into<Field>, value: impl ToSqlValue) -> &mut Self {
                self.push_condition(field.into(), ConditionOperator::$op, Operand::Value(value.to_sql_value()))
            }

            #[doc = concat!("[`Self::", stringify!($name), "`] applied only when `when` returns `true`.")]
            pub fn $name_if(
                &mut self,
                field: impl Into<Field>,
                value: impl ToSqlValue,
                when: impl FnOnce() -> bool,
            ) -> &mut Self {
                if when() {
                    self.$name(field, value)
                } else {
                    self
                }
            }
        )*
    };
}

impl ConditionBuilder {
    /// A `where` clause builder.
    #[must_use]
    pub fn where_clause() -> Self {
        Self::with_keyword("where")
    }

    /// An `on` clause builder.
    #[must_use]
    pub fn on() -> Self {
        Self::with_keyword("on")
    }

    /// A `having` clause builder.
    #[must_use]
    pub fn having() -> Self {
        Self::with_keyword("having")
    }

    /// A keyword-less group, rendered in parentheses when nested.
    #[must_use]
    pub fn nested(logic: Logic) -> Self {
        Self {
            keyword: "",
            logic,
            children: Vec::new(),
        }
    }

    fn with_keyword(keyword: &'static str) -> Self {
        Self {
            keyword,
            logic: Logic::And,
            children: Vec::new(),
        }
    }

    /// The same tree rendered as a `where` clause.
    pub(crate) fn into_where(self) -> Self {
        Self {
            keyword: "where",
            ..self
        }
    }

    /// Current logic.
    #[must_use]
    pub const fn logic(&self) -> Logic {
        self.logic
    }

    /// Direct children.
    #[must_use]
    pub fn children(&self) -> &[ConditionNode] {
        &self.children
    }

    /// Returns `true` when nothing renders.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.iter().all(|child| match child {
            ConditionNode::Condition(_) => false,
            ConditionNode::Group(group) => group.is_empty(),
        })
    }

    /// Opens an `and` scope.
    ///
    /// On an empty builder this switches the builder's own logic and returns
    /// it; otherwise it appends a nested `and` group and returns the group.
    pub fn and(&mut self) -> &mut Self {
        self.scope(Logic::And)
    }

    /// Opens an `or` scope. See [`Self::and`].
    pub fn or(&mut self) -> &mut Self {
        self.scope(Logic::Or)
    }

    fn scope(&mut self, logic: Logic) -> &mut Self {
        if self.children.is_empty() {
            self.logic = logic;
            return self;
        }
        self.children.push(ConditionNode::Group(Self::nested(logic)));
        match self.children.last_mut() {
            Some(ConditionNode::Group(group)) => group,
            _ => unreachable!("a group was just pushed"),
        }
    }

    /// Appends a prebuilt condition.
    pub fn push(&mut self, condition: Condition) -> &mut Self {
        self.children.push(ConditionNode::Condition(condition));
        self
    }

    /// Appends a prebuilt group.
    pub fn push_group(&mut self, group: Self) -> &mut Self {
        self.children.push(ConditionNode::Group(Self {
            keyword: "",
            ..group
        }));
        self
    }

    fn push_condition(&mut self, field: Field, operator: ConditionOperator, operand: Operand) -> &mut Self {
        self.push(Condition::from_parts(field, operator, operand))
    }

    comparison_methods! {
        /// `field = value`
        equal, equal_if => Equal;
        /// `field <> value`
        not_equal, not_equal_if => NotEqual;
        /// `field > value`
        gt, gt_if => GreaterThan;
        /// `field >= value`
        gte, gte_if => GreaterThanOrEqual;
        /// `field < value`
        lt, lt_if => LessThan;
        /// `field <= value`
        lte, lte_if => LessThanOrEqual;
    }

    pattern_methods! {
        /// `field like concat('%',?,'%')`
        like, like_if => Like;
        /// `field like concat(?,'%')`
        starts_with, starts_with_if => StartsWith;
        /// `field like concat('%',?)`
        ends_with, ends_with_if => EndsWith;
    }

    /// `field like <placeholder>`, e.g. `matches("code", "'A_'?", "1")`.
    pub fn matches(&mut self, field: impl Into<Field>, placeholder: &str, value: impl ToSqlValue) -> &mut Self {
        if !placeholder.contains(['_', '%']) {
            warn!(placeholder = %placeholder, "match template has no wildcard");
        }
        self.push_condition(field.into(), ConditionOperator::Match, Operand::pattern(placeholder, value))
    }

    /// [`Self::matches`] applied only when `when` returns `true`.
    pub fn matches_if(
        &mut self,
        field: impl Into<Field>,
        placeholder: &str,
        value: impl ToSqlValue,
        when: impl FnOnce() -> bool,
    ) -> &mut Self {
        if when() {
            self.matches(field, placeholder, value)
        } else {
            self
        }
    }

    /// `field in (?, ...)`
    pub fn in_list<I, V>(&mut self, field: impl Into<Field>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        self.push_condition(field.into(), ConditionOperator::In, Operand::list(values))
    }

    /// [`Self::in_list`] applied only when `when` returns `true`.
    pub fn in_list_if<I, V>(&mut self, field: impl Into<Field>, values: I, when: impl FnOnce() -> bool) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        if when() {
            self.in_list(field, values)
        } else {
            self
        }
    }

    /// `field in (subquery)`
    pub fn in_query(&mut self, field: impl Into<Field>, query: QueryBuilder) -> &mut Self {
        self.push_condition(field.into(), ConditionOperator::In, query.into_operand())
    }

    /// `field not in (?, ...)`
    pub fn not_in_list<I, V>(&mut self, field: impl Into<Field>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        self.push_condition(field.into(), ConditionOperator::NotIn, Operand::list(values))
    }

    /// [`Self::not_in_list`] applied only when `when` returns `true`.
    pub fn not_in_list_if<I, V>(&mut self, field: impl Into<Field>, values: I, when: impl FnOnce() -> bool) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        if when() {
            self.not_in_list(field, values)
        } else {
            self
        }
    }

    /// `field not in (subquery)`
    pub fn not_in_query(&mut self, field: impl Into<Field>, query: QueryBuilder) -> &mut Self {
        self.push_condition(field.into(), ConditionOperator::NotIn, query.into_operand())
    }

    /// `field is null`
    pub fn is_null(&mut self, field: impl Into<Field>) -> &mut Self {
        self.push_condition(field.into(), ConditionOperator::IsNull, Operand::None)
    }

    /// [`Self::is_null`] applied only when `when` returns `true`.
    pub fn is_null_if(&mut self, field: impl Into<Field>, when: impl FnOnce() -> bool) -> &mut Self {
        if when() {
            self.is_null(field)
        } else {
            self
        }
    }

    /// `field is not null`
    pub fn not_null(&mut self, field: impl Into<Field>) -> &mut Self {
        self.push_condition(field.into(), ConditionOperator::IsNotNull, Operand::None)
    }

    /// [`Self::not_null`] applied only when `when` returns `true`.
    pub fn not_null_if(&mut self, field: impl Into<Field>, when: impl FnOnce() -> bool) -> &mut Self {
        if when() {
            self.not_null(field)
        } else {
            self
        }
    }

    /// `field between ? and ?`
    pub fn between(&mut self, field: impl Into<Field>, low: impl ToSqlValue, high: impl ToSqlValue) -> &mut Self {
        let operand = Operand::List(vec![low.to_sql_value(), high.to_sql_value()]);
        self.push_condition(field.into(), ConditionOperator::Between, operand)
    }

    /// [`Self::between`] applied only when `when` returns `true`.
    pub fn between_if(
        &mut self,
        field: impl Into<Field>,
        low: impl ToSqlValue,
        high: impl ToSqlValue,
        when: impl FnOnce() -> bool,
    ) -> &mut Self {
        if when() {
            self.between(field, low, high)
        } else {
            self
        }
    }

    /// `field not between ? and ?`
    pub fn not_between(&mut self, field: impl Into<Field>, low: impl ToSqlValue, high: impl ToSqlValue) -> &mut Self {
        let operand = Operand::List(vec![low.to_sql_value(), high.to_sql_value()]);
        self.push_condition(field.into(), ConditionOperator::NotBetween, operand)
    }

    /// [`Self::not_between`] applied only when `when` returns `true`.
    pub fn not_between_if(
        &mut self,
        field: impl Into<Field>,
        low: impl ToSqlValue,
        high: impl ToSqlValue,
        when: impl FnOnce() -> bool,
    ) -> &mut Self {
        if when() {
            self.not_between(field, low, high)
        } else {
            self
        }
    }

    /// Removes every child and restores `and` logic.
    pub fn reset(&mut self) -> &mut Self {
        self.children.clear();
        self.logic = Logic::And;
        self
    }

    fn render_body(&self) -> String {
        let separator = format!(" {} ", self.logic.as_str());
        let parts = self.children.iter().filter_map(|child| match child {
            ConditionNode::Condition(condition) => Some(condition.to_sql()),
            ConditionNode::Group(group) if group.is_empty() => None,
            ConditionNode::Group(group) => Some(format!("({})", group.render_body())),
        });
        parts.collect::<Vec<_>>().join(&separator)
    }
}

impl Sqlifiable for ConditionBuilder {
    fn to_sql(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        let body = self.render_body();
        if self.keyword.is_empty() {
            body
        } else {
            format!("{} {body}", self.keyword)
        }
    }

    fn values(&self) -> Vec<SqlValue> {
        self.children
            .iter()
            .flat_map(|child| match child {
                ConditionNode::Condition(condition) => condition.values(),
                ConditionNode::Group(group) => group.values(),
            })
            .collect()
    }
}
