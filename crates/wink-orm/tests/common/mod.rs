#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use wink_orm::{ExecOutput, ExecSummary, Executor, OrmError, Result, Row};
use wink_sql_builder::SqlValue;

/// An executor that records statements and answers from a script.
///
/// - `show tables` lists the tables registered with [`MockExecutor::with_table`]
/// - `show create table` returns their DDL, or `NoSuchTable`
/// - other reads pop the next scripted result set (empty when none is left)
/// - writes return a summary with the configured insert id
#[derive(Default)]
pub struct MockExecutor {
    tables: BTreeMap<String, String>,
    results: Mutex<VecDeque<Vec<Row>>>,
    log: Mutex<Vec<(String, Vec<SqlValue>)>>,
    insert_id: u64,
    affected_rows: u64,
    latency: Option<Duration>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self {
            affected_rows: 1,
            ..Self::default()
        }
    }

    pub fn with_table(mut self, name: &str, ddl: &str) -> Self {
        self.tables.insert(name.to_string(), ddl.to_string());
        self
    }

    pub fn with_insert_id(mut self, insert_id: u64) -> Self {
        self.insert_id = insert_id;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn push_rows(&self, rows: Vec<Row>) {
        self.results.lock().unwrap().push_back(rows);
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Every executed statement, in order.
    pub fn statements(&self) -> Vec<String> {
        self.log.lock().unwrap().iter().map(|(sql, _)| sql.clone()).collect()
    }

    /// Statements and their bound values, in order.
    pub fn calls(&self) -> Vec<(String, Vec<SqlValue>)> {
        self.log.lock().unwrap().clone()
    }

    pub fn count_of(&self, prefix: &str) -> usize {
        self.statements().iter().filter(|sql| sql.starts_with(prefix)).count()
    }
}

#[async_trait]
impl Executor for MockExecutor {
    async fn exec(&self, sql: &str, values: &[SqlValue]) -> Result<ExecOutput> {
        self.log.lock().unwrap().push((sql.to_string(), values.to_vec()));
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if sql == "show tables" {
            let rows = self
                .tables
                .keys()
                .map(|name| Row::new([("Tables_in_test", SqlValue::Text(name.clone()))]))
                .collect();
            return Ok(ExecOutput::Rows(rows));
        }
        if let Some(name) = sql.strip_prefix("show create table ") {
            let name = name.trim_matches('`');
            return match self.tables.get(name) {
                Some(ddl) => Ok(ExecOutput::Rows(vec![Row::new([
                    ("Table", SqlValue::Text(name.to_string())),
                    ("Create Table", SqlValue::Text(ddl.clone())),
                ])])),
                None => Err(OrmError::NoSuchTable(name.to_string())),
            };
        }
        if sql.starts_with("select") {
            let rows = self.results.lock().unwrap().pop_front().unwrap_or_default();
            return Ok(ExecOutput::Rows(rows));
        }
        Ok(ExecOutput::Summary(ExecSummary {
            insert_id: self.insert_id,
            affected_rows: self.affected_rows,
        }))
    }
}

/// Live DDL of a `user` table as MySQL 8 prints it.
pub const LIVE_USER_DDL: &str = "CREATE TABLE `user` (
  `id` int unsigned NOT NULL AUTO_INCREMENT,
  `name` varchar(100) DEFAULT NULL,
  `age` int DEFAULT NULL,
  PRIMARY KEY (`id`)
) ENGINE=InnoDB AUTO_INCREMENT=3 DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_0900_ai_ci";

pub fn text(s: &str) -> SqlValue {
    SqlValue::Text(s.to_string())
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
