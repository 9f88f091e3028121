//! DDL generation: `create table`, `alter table` and the diff that drives it.

use std::sync::atomic::{AtomicU64, Ordering};

use wink_sql_builder::utils::secure_name;

use super::define::{ColumnDefine, TableDefine};

/// Generator of unique-index names (`uk_1`, `uk_2`, ...).
///
/// Shared by every statement generated through one schema manager; tests
/// create their own and may [`reset`](Self::reset) it.
#[derive(Debug)]
pub struct ConstraintSequence {
    next: AtomicU64,
}

impl Default for ConstraintSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstraintSequence {
    /// A sequence starting at `uk_1`.
    #[must_use]
    pub const fn new() -> Self {
        Self::starting_at(1)
    }

    /// A sequence starting at `uk_<start>`.
    #[must_use]
    pub const fn starting_at(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }

    /// Returns the next name not contained in `taken`.
    pub fn next_name(&self, taken: &[String]) -> String {
        loop {
            let n = self.next.fetch_add(1, Ordering::Relaxed);
            let name = format!("uk_{n}");
            if !taken.contains(&name) {
                return name;
            }
        }
    }

    /// Restarts the sequence at `uk_1`.
    pub fn reset(&self) {
        self.next.store(1, Ordering::Relaxed);
    }
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
}

/// Renders one column definition.
///
/// `` `name` type(len,...) [unsigned] [not null] [default x] [auto_increment] [comment 'x'] ``
#[must_use]
pub fn gen_column_define_sql(column: &ColumnDefine) -> String {
    let mut sql = format!("{} {}", secure_name(&column.name), column.column_type.sql_name());
    if !column.length.is_empty() {
        let parts: Vec<String> = column.length.iter().map(ToString::to_string).collect();
        sql.push_str(&format!("({})", parts.join(",")));
    }
    if column.auto_increment {
        sql.push_str(" unsigned");
    }
    if column.required {
        sql.push_str(" not null");
    }
    if let Some(default) = &column.default_value {
        sql.push_str(" default ");
        if column.column_type.is_string_family() {
            sql.push_str(&quote_literal(default));
        } else {
            sql.push_str(default);
        }
    }
    if column.auto_increment {
        sql.push_str(" auto_increment");
    }
    if let Some(comment) = &column.comment {
        sql.push_str(" comment ");
        sql.push_str(&quote_literal(comment));
    }
    sql
}

/// Renders `primary key (...)`, or `None` when no column is primary.
#[must_use]
pub fn gen_primary_key_sql(columns: &[ColumnDefine]) -> Option<String> {
    let keys: Vec<String> = columns
        .iter()
        .filter(|c| c.primary)
        .map(|c| secure_name(&c.name))
        .collect();
    (!keys.is_empty()).then(|| format!("primary key ({})", keys.join(",")))
}

/// Renders one `unique index` per unique column.
fn gen_unique_keys_sql(columns: &[ColumnDefine], taken: &[String], sequence: &ConstraintSequence) -> Vec<String> {
    columns
        .iter()
        .filter(|c| c.unique)
        .map(|c| {
            format!(
                "unique index {} ({})",
                secure_name(&sequence.next_name(taken)),
                secure_name(&c.name)
            )
        })
        .collect()
}

/// Renders `create table if not exists` for a normalized definition.
#[must_use]
pub fn gen_table_define_sql(database: &str, table: &TableDefine, sequence: &ConstraintSequence) -> String {
    let mut lines: Vec<String> = table.column_defines.iter().map(gen_column_define_sql).collect();
    lines.extend(gen_primary_key_sql(&table.column_defines));
    lines.extend(gen_unique_keys_sql(&table.column_defines, &[], sequence));

    let mut sql = format!(
        "create table if not exists {}.{} (\n  {}\n) engine={}",
        secure_name(database),
        secure_name(&table.name),
        lines.join(",\n  "),
        table.engine.as_deref().unwrap_or("InnoDB"),
    );
    if let Some(charset) = &table.charset {
        sql.push_str(" default charset=");
        sql.push_str(charset);
    }
    sql.push(';');
    sql
}

/// Renders the `alter table` statement turning `old` into `new`.
///
/// Columns are added or modified, never dropped. The primary key is always
/// dropped (when `old` has one) and re-added (when `new` has one); every
/// unique column gets a fresh index and every index recorded in
/// `old.constraints` is dropped.
#[must_use]
pub fn gen_table_alter_sql(
    database: &str,
    old: &TableDefine,
    new: &TableDefine,
    sequence: &ConstraintSequence,
) -> String {
    let mut clauses: Vec<String> = Vec::new();

    for column in &new.column_defines {
        match old.find_column(&column.name) {
            None => clauses.push(format!("add column {}", gen_column_define_sql(column))),
            Some(existing) if !existing.same_shape(column) => {
                clauses.push(format!("modify column {}", gen_column_define_sql(column)));
            }
            Some(_) => {}
        }
    }

    if old.column_defines.iter().any(|c| c.primary) {
        clauses.push(String::from("drop primary key"));
    }
    if let Some(pk) = gen_primary_key_sql(&new.column_defines) {
        clauses.push(format!("add {pk}"));
    }
    clauses.extend(
        gen_unique_keys_sql(&new.column_defines, &old.constraints, sequence)
            .into_iter()
            .map(|uk| format!("add {uk}")),
    );
    clauses.extend(old.constraints.iter().map(|name| format!("drop index {}", secure_name(name))));

    format!(
        "alter table {}.{}\n{};",
        secure_name(database),
        secure_name(&new.name),
        clauses.join(",\n")
    )
}

/// Returns `true` when `old` must be altered to match `new`.
#[must_use]
pub fn needs_update(old: &TableDefine, new: &TableDefine) -> bool {
    let column_differs = new.column_defines.iter().any(|column| {
        !matches!(old.find_column(&column.name), Some(existing) if existing.same_definition(column))
    });
    column_differs || old.primary_key() != new.primary_key()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::define::ColumnType;
    use crate::schema::normalize::normalize_table_define;

    fn user_table() -> TableDefine {
        let table = TableDefine::new("user")
            .column(ColumnDefine::new("name", ColumnType::String).required().comment("display name"))
            .column(ColumnDefine::new("email", ColumnType::String).length([128]).unique())
            .column(ColumnDefine::new("balance", ColumnType::Decimal).length([12, 2]).default_value("0"))
            .column(ColumnDefine::new("bio", ColumnType::Text).default_value("it's me"))
            .with_implicit_columns();
        normalize_table_define(&table, true).unwrap()
    }

    #[test]
    fn test_column_sql() {
        let table = user_table();
        assert_eq!(
            gen_column_define_sql(&table.column_defines[0]),
            "`id` int(4) unsigned not null auto_increment"
        );
        let bio = table.find_column("bio").unwrap();
        assert_eq!(gen_column_define_sql(bio), "`bio` text default 'it''s me'");
        let del_flag = table.find_column("del_flag").unwrap();
        assert_eq!(gen_column_define_sql(del_flag), "`del_flag` tinyint(1) not null default 0");
    }

    #[test]
    fn test_create_table_sql() {
        let sequence = ConstraintSequence::new();
        let sql = gen_table_define_sql("shop", &user_table(), &sequence);
        assert_eq!(
            sql,
            "create table if not exists `shop`.`user` (\n  \
             `id` int(4) unsigned not null auto_increment,\n  \
             `name` varchar(255) not null comment 'display name',\n  \
             `email` varchar(128),\n  \
             `balance` decimal(12,2) default 0,\n  \
             `bio` text default 'it''s me',\n  \
             `del_flag` tinyint(1) not null default 0,\n  \
             primary key (`id`),\n  \
             unique index `uk_1` (`email`)\n\
             ) engine=InnoDB default charset=utf8mb4;"
        );
    }

    #[test]
    fn test_self_diff_only_rebuilds_primary_key() {
        let table = TableDefine {
            name: String::from("my_table"),
            charset: None,
            engine: None,
            column_defines: vec![
                ColumnDefine::new("a", ColumnType::Int).primary().required().length([4]),
                ColumnDefine::new("b", ColumnType::String).length([255]),
            ],
            constraints: Vec::new(),
            is_relation_table: false,
        };
        let sql = gen_table_alter_sql("my_database", &table, &table, &ConstraintSequence::new());
        assert_eq!(
            sql,
            "alter table `my_database`.`my_table`\ndrop primary key,\nadd primary key (`a`);"
        );
        assert!(!needs_update(&table, &table));
    }

    #[test]
    fn test_alter_adds_and_modifies() {
        let new = user_table();
        let mut old = new.clone();
        old.column_defines.retain(|c| c.name != "del_flag");
        old.column_defines[1].length = vec![100];
        old.column_defines[2].unique = false;

        assert!(needs_update(&old, &new));
        let sql = gen_table_alter_sql("shop", &old, &new, &ConstraintSequence::new());
        assert_eq!(
            sql,
            "alter table `shop`.`user`\n\
             modify column `name` varchar(255) not null comment 'display name',\n\
             add column `del_flag` tinyint(1) not null default 0,\n\
             drop primary key,\n\
             add primary key (`id`),\n\
             add unique index `uk_1` (`email`);"
        );
    }

    #[test]
    fn test_alter_skips_taken_index_names_and_drops_old_ones() {
        let new = user_table();
        let mut old = new.clone();
        old.constraints = vec![String::from("uk_1")];
        let sql = gen_table_alter_sql("shop", &old, &new, &ConstraintSequence::new());
        assert!(sql.contains("add unique index `uk_2` (`email`)"), "{sql}");
        assert!(sql.ends_with("drop index `uk_1`;"), "{sql}");
    }

    #[test]
    fn test_unique_flag_change_needs_update_without_modify() {
        let new = user_table();
        let mut old = new.clone();
        old.column_defines[2].unique = false;
        assert!(needs_update(&old, &new));
        let sql = gen_table_alter_sql("shop", &old, &new, &ConstraintSequence::new());
        assert!(!sql.contains("modify column"));
    }

    #[test]
    fn test_sequence_reset() {
        let sequence = ConstraintSequence::new();
        assert_eq!(sequence.next_name(&[]), "uk_1");
        assert_eq!(sequence.next_name(&[String::from("uk_2")]), "uk_3");
        sequence.reset();
        assert_eq!(sequence.next_name(&[]), "uk_1");
    }
}
