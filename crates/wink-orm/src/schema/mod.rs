//! The schema engine: definitions, normalization, DDL generation, DDL
//! parsing and drift checks.
//!
//! The pieces compose into the update path of the table lifecycle:
//!
//! ```
//! use wink_orm::schema::{
//!     gen_table_alter_sql, needs_update, normalize_table_define, parse_table_define_sql,
//!     ColumnDefine, ColumnType, ConstraintSequence, TableDefine,
//! };
//!
//! let live = "CREATE TABLE `user` (
//!   `id` int unsigned NOT NULL AUTO_INCREMENT,
//!   `name` varchar(100) DEFAULT NULL,
//!   PRIMARY KEY (`id`)
//! ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4";
//!
//! let target = TableDefine::new("user")
//!     .column(ColumnDefine::new("name", ColumnType::String))
//!     .with_implicit_columns();
//! let target = normalize_table_define(&target, true).unwrap();
//! let old = normalize_table_define(&parse_table_define_sql(live, false), true).unwrap();
//!
//! assert!(needs_update(&old, &target));
//! let sql = gen_table_alter_sql("shop", &old, &target, &ConstraintSequence::new());
//! assert!(sql.contains("modify column `name` varchar(255)"));
//! assert!(sql.contains("add column `del_flag` tinyint(1) not null default 0"));
//! ```

pub mod ddl;
pub mod define;
pub mod drift;
pub mod normalize;
pub mod parse;

pub use ddl::{
    gen_column_define_sql, gen_primary_key_sql, gen_table_alter_sql, gen_table_define_sql, needs_update,
    ConstraintSequence,
};
pub use define::{ColumnDefine, ColumnReference, ColumnType, TableDefine, DEL_FLAG_COLUMN, ID_COLUMN};
pub use drift::check_drift;
pub use normalize::{normalize_column_define, normalize_table_define, DEFAULT_CHARSET, DEFAULT_ENGINE};
pub use parse::parse_table_define_sql;
