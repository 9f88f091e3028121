//! Table lifecycle: create or synchronize a table according to its policy.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OnceCell;
use tracing::{debug, info};
use wink_sql_builder::utils::secure_name;
use wink_sql_builder::SqlValue;

use crate::config::{OrmOptions, TablePolicy};
use crate::error::{OrmError, Result};
use crate::executor::{Executor, Row};
use crate::schema::{
    check_drift, gen_table_alter_sql, gen_table_define_sql, needs_update, normalize_table_define,
    parse_table_define_sql, ConstraintSequence, TableDefine,
};

/// What [`SchemaManager::ensure`] did to a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableAction {
    /// The policy is [`TablePolicy::Manual`]; nothing was checked.
    Skipped,
    /// The table was missing and has been created.
    Created,
    /// The table exists and the policy does not alter existing tables.
    Existing,
    /// The table already matches its definition.
    Unchanged,
    /// The table has been altered to match its definition.
    Altered,
}

/// Creates and synchronizes tables of one database.
///
/// The list of existing tables is read with `show tables` once, on first
/// use; concurrent first lookups share that single query. Tables created
/// through the manager are added to the cached list.
pub struct SchemaManager<E> {
    executor: Arc<E>,
    database: String,
    options: OrmOptions,
    tables: OnceCell<Mutex<BTreeSet<String>>>,
    sequence: ConstraintSequence,
}

impl<E: Executor> SchemaManager<E> {
    /// Creates a manager for `database`.
    pub fn new(executor: Arc<E>, database: impl Into<String>, options: OrmOptions) -> Self {
        Self {
            executor,
            database: database.into(),
            options,
            tables: OnceCell::new(),
            sequence: ConstraintSequence::new(),
        }
    }

    /// The managed database.
    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    /// The options in effect.
    #[must_use]
    pub const fn options(&self) -> &OrmOptions {
        &self.options
    }

    /// The unique-index name sequence.
    #[must_use]
    pub const fn sequence(&self) -> &ConstraintSequence {
        &self.sequence
    }

    /// Applies the configured charset and the implicit columns, then
    /// normalizes.
    ///
    /// # Errors
    ///
    /// Propagates normalization errors.
    pub fn prepare(&self, table: &TableDefine) -> Result<TableDefine> {
        let mut table = table.with_implicit_columns();
        if table.charset.is_none() {
            table.charset.clone_from(&self.options.charset);
        }
        normalize_table_define(&table, self.options.normalize_name)
    }

    async fn table_names(&self) -> Result<&Mutex<BTreeSet<String>>> {
        self.tables
            .get_or_try_init(|| async {
                let rows = self.executor.exec("show tables", &[]).await?.into_rows()?;
                let names: BTreeSet<String> = rows
                    .iter()
                    .filter_map(|row| row.first().and_then(SqlValue::as_str))
                    .map(str::to_string)
                    .collect();
                debug!(database = %self.database, count = names.len(), "loaded table names");
                Ok::<_, OrmError>(Mutex::new(names))
            })
            .await
    }

    /// Returns `true` when `name` exists in the database.
    ///
    /// # Errors
    ///
    /// Propagates the error of the initial `show tables`.
    pub async fn has_table(&self, name: &str) -> Result<bool> {
        let names = self.table_names().await?;
        let names = names.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(names.contains(name))
    }

    /// Reads the live DDL of `name` with `show create table`.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::UnexpectedResult`] when the result carries no DDL,
    /// and propagates executor errors.
    pub async fn table_define_sql(&self, name: &str) -> Result<String> {
        let sql = format!("show create table {}", secure_name(name));
        let rows = self.executor.exec(&sql, &[]).await?.into_rows()?;
        rows.first()
            .and_then(create_table_text)
            .map(str::to_string)
            .ok_or_else(|| OrmError::UnexpectedResult(format!("no DDL returned for table '{name}'")))
    }

    /// Issues `create table if not exists` for a prepared definition.
    ///
    /// # Errors
    ///
    /// Propagates executor errors.
    pub async fn create_table(&self, table: &TableDefine) -> Result<()> {
        let sql = gen_table_define_sql(&self.database, table, &self.sequence);
        info!(table = %table.name, "creating table");
        self.executor.exec(&sql, &[]).await?;
        let names = self.table_names().await?;
        names
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(table.name.clone());
        Ok(())
    }

    /// Alters an existing table to match a prepared definition.
    ///
    /// Returns `false` when the live table already matches.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::UnhandledSchemaDrift`] when the change would lose
    /// data, and propagates executor errors.
    pub async fn update_table(&self, table: &TableDefine) -> Result<bool> {
        let live = self.table_define_sql(&table.name).await?;
        let old = normalize_table_define(
            &parse_table_define_sql(&live, table.is_relation_table),
            self.options.normalize_name,
        )?;
        check_drift(&old, table)?;
        if !needs_update(&old, table) {
            debug!(table = %table.name, "table is up to date");
            return Ok(false);
        }
        let sql = gen_table_alter_sql(&self.database, &old, table, &self.sequence);
        info!(table = %table.name, "altering table");
        self.executor.exec(&sql, &[]).await?;
        Ok(true)
    }

    /// Applies the table policy to a prepared definition.
    ///
    /// # Errors
    ///
    /// Propagates errors of the lookup, creation or update.
    pub async fn ensure(&self, table: &TableDefine) -> Result<TableAction> {
        let policy = self.options.table_policy;
        if policy == TablePolicy::Manual {
            return Ok(TableAction::Skipped);
        }
        if !self.has_table(&table.name).await? {
            self.create_table(table).await?;
            return Ok(TableAction::Created);
        }
        if policy == TablePolicy::Create {
            return Ok(TableAction::Existing);
        }
        if self.update_table(table).await? {
            Ok(TableAction::Altered)
        } else {
            Ok(TableAction::Unchanged)
        }
    }
}

/// The DDL column of a `show create table` row.
fn create_table_text(row: &Row) -> Option<&str> {
    row.get("Create Table")
        .or_else(|| row.columns().get(1).and_then(|column| row.get(column)))
        .and_then(SqlValue::as_str)
}
