//! Best-effort parser for `show create table` output.
//!
//! Only the grammar produced by [`super::ddl`] and by MySQL itself for the
//! supported column types is understood. Anything else is logged and
//! skipped; parsing never fails.

use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

use super::define::{ColumnDefine, ColumnType, TableDefine};

// ============================================================================
// Patterns
// ============================================================================

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($re).expect(concat!("Invalid ", stringify!($name), " regex")))
        }
    };
}

pattern!(
    header_regex,
    r"(?i)^\s*create\s+table\s+(?:if\s+not\s+exists\s+)?(?:`[^`]+`\.)?`([^`]+)`\s*\(\s*$"
);
pattern!(footer_regex, r"(?i)^\s*\)\s*engine\s*=\s*(\w+)");
pattern!(charset_regex, r"(?i)(?:default\s+)?charset\s*=\s*(\w+)");
pattern!(
    column_regex,
    r"(?i)^\s*`([^`]+)`\s+([a-z]+)(?:\(([\d,\s]+)\))?(.*?),?\s*$"
);
pattern!(comment_regex, r"(?i)\bcomment\s+'((?:[^']|'')*)'");
pattern!(default_regex, r"(?i)\bdefault\s+('(?:[^']|'')*'|[^\s,]+)");
pattern!(not_null_regex, r"(?i)\bnot\s+null\b");
pattern!(auto_increment_regex, r"(?i)\bauto_increment\b");
pattern!(
    unique_regex,
    r"(?i)^\s*unique\s+(?:key|index)\s+`([^`]+)`\s*\(([^)]*)\)"
);
pattern!(primary_regex, r"(?i)^\s*primary\s+key\s*\(([^)]*)\)");
pattern!(quoted_name_regex, r"`([^`]+)`");

fn quoted_names(list: &str) -> Vec<String> {
    quoted_name_regex()
        .captures_iter(list)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Decodes the body of a single-quoted MySQL literal (`''` and `\` escapes).
fn unescape_literal(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some('0') => out.push('\0'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            },
            '\'' if chars.peek() == Some(&'\'') => {
                chars.next();
                out.push('\'');
            }
            other => out.push(other),
        }
    }
    out
}

// ============================================================================
// Parser
// ============================================================================

fn parse_column(line: &str) -> Option<ColumnDefine> {
    let caps = column_regex().captures(line)?;
    let name = &caps[1];
    let column_type = match caps[2].parse::<ColumnType>() {
        Ok(column_type) => column_type,
        Err(reason) => {
            warn!(column = %name, reason = %reason, "skipping column");
            return None;
        }
    };

    let mut column = ColumnDefine::new(name, column_type);
    if let Some(length) = caps.get(3) {
        column.length = length
            .as_str()
            .split(',')
            .filter_map(|part| part.trim().parse().ok())
            .collect();
    }

    let mut rest = caps.get(4).map_or("", |m| m.as_str()).to_string();
    if let Some(comment) = comment_regex().captures(&rest) {
        column.comment = Some(unescape_literal(&comment[1]));
        rest = comment_regex().replace(&rest, "").into_owned();
    }
    if let Some(default) = default_regex().captures(&rest) {
        let raw = &default[1];
        column.default_value = Some(match raw.strip_prefix('\'').and_then(|r| r.strip_suffix('\'')) {
            Some(inner) => format!("'{}'", unescape_literal(inner)),
            None => raw.to_string(),
        });
        rest = default_regex().replace(&rest, "").into_owned();
    }
    column.required = not_null_regex().is_match(&rest);
    column.auto_increment = auto_increment_regex().is_match(&rest);
    Some(column)
}

/// Parses the text of `show create table` into a raw [`TableDefine`].
///
/// The result is not normalized. Single-column unique keys set
/// [`ColumnDefine::unique`] and record the index name in
/// [`TableDefine::constraints`]; composite unique keys are ignored.
#[must_use]
pub fn parse_table_define_sql(sql: &str, is_relation_table: bool) -> TableDefine {
    let lines: Vec<&str> = sql.lines().filter(|line| !line.trim().is_empty()).collect();
    let mut table = TableDefine {
        is_relation_table,
        ..TableDefine::new("")
    };
    let Some((first, rest)) = lines.split_first() else {
        warn!("empty table definition");
        return table;
    };

    match header_regex().captures(first) {
        Some(caps) => table.name = caps[1].to_string(),
        None => warn!(line = %first, "unrecognized table header"),
    }

    let body = match rest.split_last() {
        Some((last, body)) if footer_regex().is_match(last) => {
            table.engine = footer_regex().captures(last).map(|caps| caps[1].to_string());
            table.charset = charset_regex().captures(last).map(|caps| caps[1].to_string());
            body
        }
        _ => {
            warn!(table = %table.name, "unrecognized table footer");
            rest
        }
    };

    let mut primary_key: Vec<String> = Vec::new();
    for line in body {
        if let Some(column) = parse_column(line) {
            table.column_defines.push(column);
        } else if let Some(caps) = unique_regex().captures(line) {
            let columns = quoted_names(&caps[2]);
            match columns.as_slice() {
                [name] => {
                    table.constraints.push(caps[1].to_string());
                    match table.column_defines.iter_mut().find(|c| &c.name == name) {
                        Some(column) => column.unique = true,
                        None => warn!(table = %table.name, column = %name, "unique key on unknown column"),
                    }
                }
                _ => warn!(table = %table.name, index = %&caps[1], "composite unique key is not tracked"),
            }
        } else if let Some(caps) = primary_regex().captures(line) {
            primary_key = quoted_names(&caps[1]);
        } else if !column_regex().is_match(line) {
            warn!(table = %table.name, line = %line.trim(), "unrecognized table definition line");
        }
    }

    for name in &primary_key {
        match table.column_defines.iter_mut().find(|c| &c.name == name) {
            Some(column) => column.primary = true,
            None => warn!(table = %table.name, column = %name, "primary key on unknown column"),
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ddl::{gen_table_define_sql, ConstraintSequence};
    use crate::schema::normalize::normalize_table_define;

    const MYSQL_USER: &str = "CREATE TABLE `user` (
  `id` int unsigned NOT NULL AUTO_INCREMENT,
  `name` varchar(100) COLLATE utf8mb4_bin DEFAULT NULL COMMENT 'user''s name',
  `email` varchar(128) NOT NULL DEFAULT '',
  `balance` decimal(12,2) DEFAULT '0.00',
  `created_at` datetime DEFAULT CURRENT_TIMESTAMP,
  `status` enum('a','b') DEFAULT 'a',
  `del_flag` tinyint(1) NOT NULL DEFAULT '0',
  PRIMARY KEY (`id`),
  UNIQUE KEY `uk_3` (`email`),
  UNIQUE KEY `uk_pair` (`name`,`email`),
  KEY `idx_name` (`name`)
) ENGINE=InnoDB AUTO_INCREMENT=12 DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_0900_ai_ci";

    #[test]
    fn test_parse_mysql_output() {
        let table = parse_table_define_sql(MYSQL_USER, false);
        assert_eq!(table.name, "user");
        assert_eq!(table.engine.as_deref(), Some("InnoDB"));
        assert_eq!(table.charset.as_deref(), Some("utf8mb4"));
        assert_eq!(table.constraints, ["uk_3"]);

        let names: Vec<&str> = table.column_defines.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["id", "name", "email", "balance", "created_at", "del_flag"]);

        let id = table.find_column("id").unwrap();
        assert!(id.primary && id.required && id.auto_increment);
        assert!(id.length.is_empty());

        let name = table.find_column("name").unwrap();
        assert_eq!(name.length, vec![100]);
        assert!(!name.required);
        assert_eq!(name.default_value.as_deref(), Some("NULL"));
        assert_eq!(name.comment.as_deref(), Some("user's name"));

        let email = table.find_column("email").unwrap();
        assert!(email.unique && email.required);
        assert_eq!(email.default_value.as_deref(), Some("''"));

        let balance = table.find_column("balance").unwrap();
        assert_eq!(balance.length, vec![12, 2]);
        assert_eq!(balance.default_value.as_deref(), Some("'0.00'"));

        let created_at = table.find_column("created_at").unwrap();
        assert_eq!(created_at.default_value.as_deref(), Some("CURRENT_TIMESTAMP"));
    }

    #[test]
    fn test_parse_then_normalize() {
        let table = normalize_table_define(&parse_table_define_sql(MYSQL_USER, false), true).unwrap();
        let id = table.find_column("id").unwrap();
        assert_eq!(id.length, vec![4]);
        assert_eq!(table.find_column("name").unwrap().default_value, None);
        assert_eq!(table.find_column("balance").unwrap().default_value.as_deref(), Some("0"));
        assert_eq!(table.find_column("del_flag").unwrap().default_value.as_deref(), Some("0"));
    }

    #[test]
    fn test_round_trip() {
        let target = TableDefine::new("orderItem")
            .column(ColumnDefine::new("orderNo", ColumnType::String).length([32]).required().unique())
            .column(ColumnDefine::new("amount", ColumnType::Decimal).length([12, 2]).default_value("0"))
            .column(ColumnDefine::new("note", ColumnType::Text).comment("free, text"))
            .column(ColumnDefine::new("paidAt", ColumnType::DateTime))
            .column(ColumnDefine::new("label", ColumnType::String).default_value("it's"))
            .with_implicit_columns();
        let target = normalize_table_define(&target, true).unwrap();

        let sql = gen_table_define_sql("shop", &target, &ConstraintSequence::new());
        let parsed = normalize_table_define(&parse_table_define_sql(&sql, false), true).unwrap();

        assert_eq!(parsed.constraints, ["uk_1"]);
        let parsed = TableDefine {
            constraints: Vec::new(),
            ..parsed
        };
        assert_eq!(parsed, target);
    }

    #[test]
    fn test_backslashes_round_trip() {
        let target = TableDefine::new("upload")
            .column(ColumnDefine::new("dir", ColumnType::String).default_value(r"C:\tmp").comment(r"a\b 'c'"))
            .with_implicit_columns();
        let target = normalize_table_define(&target, true).unwrap();

        let sql = gen_table_define_sql("shop", &target, &ConstraintSequence::new());
        assert!(sql.contains(r"`dir` varchar(255) default 'C:\\tmp' comment 'a\\b ''c'''"));

        let parsed = normalize_table_define(&parse_table_define_sql(&sql, false), true).unwrap();
        let dir = parsed.find_column("dir").unwrap();
        assert_eq!(dir.default_value.as_deref(), Some(r"C:\tmp"));
        assert_eq!(dir.comment.as_deref(), Some(r"a\b 'c'"));
        assert_eq!(parsed, target);
    }

    #[test]
    fn test_relation_table_round_trip() {
        let target = TableDefine::relation("user_role")
            .column(ColumnDefine::new("user_id", ColumnType::Int))
            .column(ColumnDefine::new("role_id", ColumnType::Int))
            .with_implicit_columns();
        let target = normalize_table_define(&target, true).unwrap();
        let sql = gen_table_define_sql("shop", &target, &ConstraintSequence::new());
        let parsed = normalize_table_define(&parse_table_define_sql(&sql, true), true).unwrap();
        assert_eq!(parsed, target);
        assert_eq!(parsed.primary_key(), ["user_id", "role_id"]);
    }

    #[test]
    fn test_garbage_is_skipped() {
        let table = parse_table_define_sql("not ddl\n  whatever\n", false);
        assert_eq!(table.name, "");
        assert!(table.column_defines.is_empty());
        assert!(parse_table_define_sql("", false).column_defines.is_empty());
    }
}
