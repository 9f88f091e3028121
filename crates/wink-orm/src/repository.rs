//! Repositories: CRUD operations over one registered table.
//!
//! Records are any `serde` type. They are written through their JSON object
//! form and read back from result rows, with `camelCase` field names mapped
//! to `snake_case` columns when name normalization is on.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;
use wink_sql_builder::utils::camel_to_underline;
use wink_sql_builder::{
    ConditionBuilder, DeleteBuilder, Direction, InsertBuilder, QueryBuilder, SqlValue, Sqlifiable, ToSqlValue,
    UpdateBuilder,
};

use crate::config::{ConnectionConfig, OrmOptions};
use crate::error::{OrmError, Result};
use crate::executor::{ExecOutput, Executor, MySqlExecutor, Row};
use crate::hooks::OrmHooks;
use crate::lifecycle::{SchemaManager, TableAction};
use crate::schema::{TableDefine, ID_COLUMN};

// ============================================================================
// Orm
// ============================================================================

/// Entry point: owns the executor and the schema manager and hands out
/// repositories.
pub struct Orm<E> {
    executor: Arc<E>,
    schema: SchemaManager<E>,
    hooks: Option<Arc<dyn OrmHooks>>,
}

impl Orm<MySqlExecutor> {
    /// Connects to the database named by a `mysql://` URL and runs the
    /// configured init statements.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::InvalidConfig`] for a malformed URL and
    /// [`OrmError::Database`] when the pool cannot connect or an init
    /// statement fails.
    pub async fn connect(url: &str, options: OrmOptions) -> Result<Self> {
        let config = ConnectionConfig::from_url(url)?;
        let executor = MySqlExecutor::connect(&config).await?;
        let orm = Self::new(Arc::new(executor), config.database, options);
        orm.init().await?;
        Ok(orm)
    }
}

impl<E: Executor> Orm<E> {
    /// Creates an ORM over `executor` for `database`.
    pub fn new(executor: Arc<E>, database: impl Into<String>, options: OrmOptions) -> Self {
        Self {
            schema: SchemaManager::new(Arc::clone(&executor), database, options),
            executor,
            hooks: None,
        }
    }

    /// Installs hooks shared by every repository registered afterwards.
    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn OrmHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Runs [`OrmOptions::init_sql`] concurrently.
    ///
    /// # Errors
    ///
    /// Returns the first failing statement's error.
    pub async fn init(&self) -> Result<()> {
        let statements = &self.schema.options().init_sql;
        if statements.is_empty() {
            return Ok(());
        }
        info!(count = statements.len(), "running init statements");
        futures::future::try_join_all(statements.iter().map(|sql| self.executor.exec(sql, &[]))).await?;
        Ok(())
    }

    /// The schema manager.
    #[must_use]
    pub const fn schema(&self) -> &SchemaManager<E> {
        &self.schema
    }

    /// The shared executor.
    #[must_use]
    pub const fn executor(&self) -> &Arc<E> {
        &self.executor
    }

    /// Prepares `table`, applies the table policy and returns a repository
    /// bound to the normalized table.
    ///
    /// # Errors
    ///
    /// Propagates normalization and lifecycle errors.
    pub async fn register_repository<T>(&self, table: &TableDefine) -> Result<Repository<T, E>>
    where
        T: Serialize + DeserializeOwned,
    {
        self.register_repository_with(table, RepositoryOptions::default()).await
    }

    /// [`Self::register_repository`] with field projection options.
    ///
    /// # Errors
    ///
    /// Propagates normalization and lifecycle errors.
    pub async fn register_repository_with<T>(
        &self,
        table: &TableDefine,
        projection: RepositoryOptions,
    ) -> Result<Repository<T, E>>
    where
        T: Serialize + DeserializeOwned,
    {
        let define = self.schema.prepare(table)?;
        let action = self.schema.ensure(&define).await?;
        info!(table = %define.name, action = ?action, "repository registered");
        Ok(Repository {
            executor: Arc::clone(&self.executor),
            options: self.schema.options().clone(),
            define,
            projection,
            hooks: self.hooks.clone(),
            marker: PhantomData,
        })
    }

    /// Applies the table policy to several tables concurrently.
    ///
    /// # Errors
    ///
    /// Returns the first error; the other tables may or may not have been
    /// processed.
    pub async fn register_all(&self, tables: &[TableDefine]) -> Result<Vec<TableAction>> {
        let prepared = tables
            .iter()
            .map(|table| self.schema.prepare(table))
            .collect::<Result<Vec<_>>>()?;
        futures::future::try_join_all(prepared.iter().map(|table| self.schema.ensure(table))).await
    }
}

// ============================================================================
// Options and results
// ============================================================================

/// Per-repository field projection, by serialized field name.
///
/// `fields`, when not empty, is the default select list and limits the
/// fields written by `create` and `update`. `ignores` are never written and
/// are dropped from [`Repository::build_where`] filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryOptions {
    /// Default select list and writable fields.
    pub fields: Vec<String>,
    /// Fields never written or filtered on.
    pub ignores: Vec<String>,
}

impl RepositoryOptions {
    /// Sets the field list.
    #[must_use]
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the ignored fields.
    #[must_use]
    pub fn ignores<I, S>(mut self, ignores: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignores = ignores.into_iter().map(Into::into).collect();
        self
    }

    fn is_ignored(&self, key: &str) -> bool {
        self.ignores.iter().any(|ignored| ignored == key)
    }

    fn is_writable(&self, key: &str) -> bool {
        (self.fields.is_empty() || self.fields.iter().any(|field| field == key)) && !self.is_ignored(key)
    }
}

/// Options of [`Repository::select`].
#[derive(Debug, Clone, Default)]
pub struct SelectOptions {
    /// Selected fields; empty selects the repository's fields, or `*`.
    pub fields: Vec<String>,
    /// `where` conditions.
    pub conditions: Option<ConditionBuilder>,
    /// `order by` keys.
    pub order_by: Vec<(String, Direction)>,
    /// 1-based page number and page size; a size of 0 selects every row.
    pub page: Option<(u64, u64)>,
}

/// One page of records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Records of the page.
    pub list: Vec<T>,
    /// Number of records matching the conditions.
    pub total: u64,
    /// 1-based page number.
    pub page_no: u64,
    /// Page size.
    pub page_size: u64,
}

// ============================================================================
// Repository
// ============================================================================

/// CRUD operations over one table.
pub struct Repository<T, E> {
    executor: Arc<E>,
    options: OrmOptions,
    define: TableDefine,
    projection: RepositoryOptions,
    hooks: Option<Arc<dyn OrmHooks>>,
    marker: PhantomData<fn() -> T>,
}

fn json_to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Bool(*b),
        Value::Number(n) => n
            .as_i64()
            .map(SqlValue::Int)
            .or_else(|| n.as_u64().map(ToSqlValue::to_sql_value))
            .or_else(|| n.as_f64().map(SqlValue::Float))
            .unwrap_or(SqlValue::Null),
        Value::String(s) => SqlValue::Text(s.clone()),
        other @ (Value::Array(_) | Value::Object(_)) => SqlValue::Text(other.to_string()),
    }
}

impl<T, E> Repository<T, E>
where
    T: Serialize + DeserializeOwned,
    E: Executor,
{
    /// The normalized table name.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.define.name
    }

    /// The normalized table definition.
    #[must_use]
    pub const fn define(&self) -> &TableDefine {
        &self.define
    }

    fn column_name(&self, key: &str) -> String {
        if self.options.normalize_name {
            camel_to_underline(key)
        } else {
            key.to_string()
        }
    }

    fn to_object(item: &T) -> Result<Map<String, Value>> {
        match serde_json::to_value(item)? {
            Value::Object(object) => Ok(object),
            other => Err(OrmError::UnexpectedResult(format!(
                "records must serialize to objects, got {other}"
            ))),
        }
    }

    fn from_row(&self, row: Row) -> Result<T> {
        let mut record = row.into_json(self.options.normalize_name);
        if let (Some(hooks), Value::Object(object)) = (&self.hooks, &mut record) {
            hooks.after_select(&self.define.name, object);
        }
        Ok(serde_json::from_value(record)?)
    }

    /// Builds `where` conditions from a filter object: arrays become `in`,
    /// other values `=`. Ignored fields are skipped.
    #[must_use]
    pub fn build_where(&self, filter: &Map<String, Value>) -> ConditionBuilder {
        let mut conditions = ConditionBuilder::where_clause();
        for (key, value) in filter {
            if self.projection.is_ignored(key) {
                continue;
            }
            let column = self.column_name(key);
            match value {
                Value::Array(items) => {
                    conditions.in_list(column.as_str(), items.iter().map(json_to_sql_value));
                }
                other => {
                    conditions.equal(column.as_str(), json_to_sql_value(other));
                }
            }
        }
        conditions
    }

    /// Runs raw SQL.
    ///
    /// # Errors
    ///
    /// Propagates executor errors.
    pub async fn exec(&self, sql: &str, values: &[SqlValue]) -> Result<ExecOutput> {
        self.executor.exec(sql, values).await
    }

    /// Runs a query and decodes its rows.
    ///
    /// # Errors
    ///
    /// Propagates executor and decoding errors.
    pub async fn query(&self, query: &QueryBuilder) -> Result<Vec<T>> {
        let rows = self.fetch_rows(query.clone()).await?;
        rows.into_iter().map(|row| self.from_row(row)).collect()
    }

    async fn fetch_rows(&self, mut query: QueryBuilder) -> Result<Vec<Row>> {
        if let Some(hooks) = &self.hooks {
            hooks.before_select(&self.define.name, &mut query);
        }
        let (sql, values) = query.build();
        self.executor.exec(&sql, &values).await?.into_rows()
    }

    fn base_query(&self, conditions: Option<ConditionBuilder>) -> QueryBuilder {
        let mut query = QueryBuilder::new();
        query.from(&self.define.name, None);
        if let Some(conditions) = conditions {
            query.conditions(conditions);
        }
        query
    }

    /// Selects records of this table.
    ///
    /// # Errors
    ///
    /// Propagates executor and decoding errors.
    pub async fn select(&self, options: SelectOptions) -> Result<Vec<T>> {
        let mut query = self.base_query(options.conditions);
        let fields = if options.fields.is_empty() {
            &self.projection.fields
        } else {
            &options.fields
        };
        query.select(fields.iter().map(String::as_str));
        for (field, direction) in &options.order_by {
            query.order_by(field.as_str(), *direction);
        }
        if let Some((page_no, page_size)) = options.page.filter(|&(_, size)| size > 0) {
            query.page(page_no, page_size);
        }
        self.query(&query).await
    }

    /// Returns the first record matching `conditions`.
    ///
    /// # Errors
    ///
    /// Propagates executor and decoding errors.
    pub async fn get(&self, conditions: ConditionBuilder) -> Result<Option<T>> {
        let mut query = self.base_query(Some(conditions));
        query.page(1, 1);
        Ok(self.query(&query).await?.into_iter().next())
    }

    /// Returns the live (not removed) record with primary key `id`.
    ///
    /// # Errors
    ///
    /// Propagates executor and decoding errors.
    pub async fn detail(&self, id: impl ToSqlValue) -> Result<Option<T>> {
        let mut conditions = ConditionBuilder::where_clause();
        conditions
            .equal(ID_COLUMN, id.to_sql_value())
            .equal(self.options.remove.control_field.as_str(), self.options.remove.normal_value);
        self.get(conditions).await
    }

    /// Counts the records matching `conditions`.
    ///
    /// # Errors
    ///
    /// Propagates executor errors; returns [`OrmError::UnexpectedResult`]
    /// when the count is missing.
    pub async fn count(&self, conditions: Option<ConditionBuilder>) -> Result<u64> {
        let mut query = self.base_query(conditions);
        query.select(["count(1) as count"]);
        let rows = self.fetch_rows(query).await?;
        rows.first()
            .and_then(|row| row.get("count"))
            .and_then(SqlValue::as_i64)
            .and_then(|n| u64::try_from(n).ok())
            .ok_or_else(|| OrmError::UnexpectedResult(format!("no count returned for '{}'", self.define.name)))
    }

    /// Returns one page of records plus the total count. A `page_size` of 0
    /// returns every matching record.
    ///
    /// # Errors
    ///
    /// Propagates executor and decoding errors.
    pub async fn page(&self, conditions: Option<ConditionBuilder>, page_no: u64, page_size: u64) -> Result<Page<T>> {
        let total = self.count(conditions.clone()).await?;
        let list = self
            .select(SelectOptions {
                conditions,
                page: Some((page_no, page_size)),
                ..SelectOptions::default()
            })
            .await?;
        Ok(Page {
            list,
            total,
            page_no,
            page_size,
        })
    }

    /// Inserts records and returns the first generated id.
    ///
    /// Columns are every writable field that is non-null in at least one
    /// record; records lacking a value bind `null` there. Fields null in
    /// every record are left to their column defaults.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::NoData`] when `items` is empty or has no field to
    /// write, and propagates serialization and executor errors.
    pub async fn create(&self, items: &[T]) -> Result<u64> {
        let mut objects = items.iter().map(Self::to_object).collect::<Result<Vec<_>>>()?;
        if objects.is_empty() {
            return Err(OrmError::NoData("nothing to insert"));
        }
        if let Some(hooks) = &self.hooks {
            hooks.before_insert(&self.define.name, &mut objects);
        }

        let mut keys: Vec<&String> = Vec::new();
        for (key, value) in objects.iter().flatten() {
            if !value.is_null() && self.projection.is_writable(key) && !keys.contains(&key) {
                keys.push(key);
            }
        }
        if keys.is_empty() {
            return Err(OrmError::NoData("no fields to insert"));
        }

        let mut insert = InsertBuilder::new(self.define.name.as_str());
        insert.fields(keys.iter().map(|key| self.column_name(key)));
        for object in &objects {
            insert.row(keys.iter().map(|key| object.get(*key).map_or(SqlValue::Null, json_to_sql_value)));
        }
        let (sql, values) = insert.build();
        let summary = self.executor.exec(&sql, &values).await?.into_summary()?;
        Ok(summary.insert_id)
    }

    /// Updates the non-null fields of `item` (except the primary key) on
    /// the records matching `conditions`. Returns the affected row count.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::NoData`] when `conditions` are empty or `item`
    /// has nothing to set, and propagates serialization and executor errors.
    pub async fn update(&self, item: &T, mut conditions: ConditionBuilder) -> Result<u64> {
        let mut object = Self::to_object(item)?;
        if let Some(hooks) = &self.hooks {
            hooks.before_update(&self.define.name, &mut object, &mut conditions);
        }
        if conditions.is_empty() {
            return Err(OrmError::NoData("update conditions are empty"));
        }

        let mut update = UpdateBuilder::new(self.define.name.as_str());
        for (key, value) in &object {
            let column = self.column_name(key);
            if value.is_null() || column == ID_COLUMN || !self.projection.is_writable(key) {
                continue;
            }
            update.set(column, json_to_sql_value(value));
        }
        if update.is_empty() {
            return Err(OrmError::NoData("nothing to update"));
        }
        update.conditions(conditions);
        self.modify(&update).await
    }

    fn control_statement<I, V>(&self, ids: I, value: i64) -> UpdateBuilder
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        let mut update = UpdateBuilder::new(self.define.name.as_str());
        update.set(self.options.remove.control_field.as_str(), value);
        update.where_clause().in_list(ID_COLUMN, ids);
        update
    }

    /// Marks records as removed (logical delete).
    ///
    /// # Errors
    ///
    /// Propagates executor errors.
    pub async fn remove<I, V>(&self, ids: I) -> Result<u64>
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        let mut statement = self.control_statement(ids, self.options.remove.removed_value);
        if let Some(hooks) = &self.hooks {
            hooks.before_remove(&self.define.name, &mut statement);
        }
        self.modify(&statement).await
    }

    /// Restores logically deleted records.
    ///
    /// # Errors
    ///
    /// Propagates executor errors.
    pub async fn revoke<I, V>(&self, ids: I) -> Result<u64>
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        let mut statement = self.control_statement(ids, self.options.remove.normal_value);
        if let Some(hooks) = &self.hooks {
            hooks.before_revoke(&self.define.name, &mut statement);
        }
        self.modify(&statement).await
    }

    /// Physically deletes records.
    ///
    /// # Errors
    ///
    /// Propagates executor errors.
    pub async fn deletion<I, V>(&self, ids: I) -> Result<u64>
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        let mut delete = DeleteBuilder::new(self.define.name.as_str());
        delete.where_clause().in_list(ID_COLUMN, ids);
        self.modify(&delete).await
    }

    async fn modify(&self, statement: &impl Sqlifiable) -> Result<u64> {
        let (sql, values) = statement.build();
        let summary = self.executor.exec(&sql, &values).await?.into_summary()?;
        Ok(summary.affected_rows)
    }
}
