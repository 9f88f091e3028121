//! # wink-sql-builder
//!
//! Fluent construction of parameterized MySQL statements.
//!
//! Every fragment implements [`Sqlifiable`]: it renders SQL text with `?`
//! placeholders and returns the values bound to them, in placeholder order.
//! Fragments compose bottom-up:
//!
//! - [`Field`] and [`Table`] reference columns and tables
//! - [`Condition`] compares a field against a value, list, column or subquery
//! - [`ConditionBuilder`] arranges conditions into `and`/`or` groups for
//!   `where`, `on` and `having`
//! - clause builders render `select`, `from`/joins, `group by`, `order by`
//!   and `limit`
//! - [`QueryBuilder`] aggregates the clauses and forwards their methods
//!
//! ## Example
//!
//! ```rust
//! use wink_sql_builder::{QueryBuilder, Sqlifiable, SqlValue};
//!
//! let mut query = QueryBuilder::new();
//! query.from("user", None);
//! query.or().like("name", "文").starts_with("name", "向");
//!
//! let (sql, values) = query.build();
//! assert_eq!(
//!     sql,
//!     "select * from `user` where `name` like concat('%',?,'%') or `name` like concat(?,'%')"
//! );
//! assert_eq!(values, vec![SqlValue::Text("文".into()), SqlValue::Text("向".into())]);
//! ```

pub mod clause;
pub mod condition;
pub mod error;
pub mod field;
pub mod query;
pub mod sqlify;
pub mod statement;
pub mod table;
pub mod utils;
pub mod value;

pub use clause::{
    Direction, GroupByBuilder, Limit, LimitBuilder, OrderBy, OrderByBuilder, SelectBuilder, TableBuilder,
};
pub use condition::{Condition, ConditionBuilder, ConditionNode, ConditionOperator, IntoOperand, Logic, Operand};
pub use error::{BuildError, Result};
pub use field::Field;
pub use query::QueryBuilder;
pub use sqlify::Sqlifiable;
pub use statement::{DeleteBuilder, InsertBuilder, UpdateBuilder};
pub use table::{JoinTable, JoinType, Table};
pub use value::{SqlValue, ToSqlValue};
