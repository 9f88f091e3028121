//! Statement hooks.
//!
//! An [`OrmHooks`] implementation installed with
//! [`Orm::with_hooks`](crate::Orm::with_hooks) sees every statement a
//! repository builds before it runs, and every selected record before it is
//! deserialized. Every method defaults to doing nothing.
//!
//! ```
//! use serde_json::{Map, Value};
//! use wink_orm::OrmHooks;
//! use wink_sql_builder::QueryBuilder;
//!
//! struct TenantScope(i64);
//!
//! impl OrmHooks for TenantScope {
//!     fn before_select(&self, _table: &str, query: &mut QueryBuilder) {
//!         query.equal("tenant_id", self.0);
//!     }
//!
//!     fn before_insert(&self, _table: &str, records: &mut [Map<String, Value>]) {
//!         for record in records {
//!             record.insert(String::from("tenantId"), Value::from(self.0));
//!         }
//!     }
//! }
//! ```

use serde_json::{Map, Value};
use wink_sql_builder::{ConditionBuilder, QueryBuilder, UpdateBuilder};

/// Callbacks around repository statements.
///
/// Records are passed as JSON objects keyed by the serialized field names.
pub trait OrmHooks: Send + Sync {
    /// Called with every select, count and page query.
    fn before_select(&self, _table: &str, _query: &mut QueryBuilder) {}

    /// Called with every selected record.
    fn after_select(&self, _table: &str, _record: &mut Map<String, Value>) {}

    /// Called with the records of an insert.
    fn before_insert(&self, _table: &str, _records: &mut [Map<String, Value>]) {}

    /// Called with the record and conditions of an update.
    fn before_update(&self, _table: &str, _record: &mut Map<String, Value>, _conditions: &mut ConditionBuilder) {}

    /// Called with the statement of a logical delete.
    fn before_remove(&self, _table: &str, _statement: &mut UpdateBuilder) {}

    /// Called with the statement of a logical restore.
    fn before_revoke(&self, _table: &str, _statement: &mut UpdateBuilder) {}
}
