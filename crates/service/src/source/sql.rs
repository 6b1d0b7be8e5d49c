//! SQL text for uploads and introspection. Identifiers are quoted here and
//! nowhere else; cell values always travel as bind parameters.

use std::fmt;

use sea_orm::{DbBackend, Statement, Value};

/// MySQL caps prepared statements at 65535 placeholders.
pub const MAX_PLACEHOLDERS: usize = 65_535;

/// Column type inferred from uploaded data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    BigInt,
    Double,
    Date,
    DateTime,
    Varchar,
    Text,
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SqlType::BigInt => "BIGINT",
            SqlType::Double => "DOUBLE",
            SqlType::Date => "DATE",
            SqlType::DateTime => "DATETIME",
            SqlType::Varchar => "VARCHAR(255)",
            SqlType::Text => "TEXT",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub sql_type: SqlType,
}

/// Backtick-quote a MySQL identifier, doubling embedded backticks.
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// MySQL identifier length limit, in characters.
const MAX_IDENT_CHARS: usize = 64;

/// `idx_<column>`, or `idx_<position>_<column prefix>` when that would exceed the identifier limit.
fn index_name(position: usize, column: &str) -> String {
    let name = format!("idx_{column}");
    if name.chars().count() <= MAX_IDENT_CHARS {
        return quote_ident(&name);
    }
    let prefix = format!("idx_{position}_");
    let room = MAX_IDENT_CHARS - prefix.len();
    quote_ident(&format!("{prefix}{}", column.chars().take(room).collect::<String>()))
}

pub fn create_table(table: &str, columns: &[ColumnSpec], primary_keys: &[String], index_keys: &[String]) -> String {
    let mut parts: Vec<String> = columns
        .iter()
        .map(|c| {
            // primary key columns cannot be NULL and TEXT cannot be a key without a prefix
            let is_key = primary_keys.contains(&c.name) || index_keys.contains(&c.name);
            let sql_type = if is_key && c.sql_type == SqlType::Text { SqlType::Varchar } else { c.sql_type };
            let null = if primary_keys.contains(&c.name) { " NOT NULL" } else { " NULL" };
            format!("{} {}{}", quote_ident(&c.name), sql_type, null)
        })
        .collect();
    if !primary_keys.is_empty() {
        let cols: Vec<String> = primary_keys.iter().map(|k| quote_ident(k)).collect();
        parts.push(format!("PRIMARY KEY ({})", cols.join(", ")));
    }
    for (i, key) in index_keys.iter().enumerate() {
        parts.push(format!("KEY {} ({})", index_name(i, key), quote_ident(key)));
    }
    format!(
        "CREATE TABLE {} ({}) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
        quote_ident(table),
        parts.join(", ")
    )
}

pub fn drop_table_if_exists(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", quote_ident(table))
}

/// One multi-row parameterised `INSERT`.
#[derive(Debug, Clone)]
pub struct InsertStatement {
    pub sql: String,
    pub values: Vec<Value>,
    pub rows: usize,
}

impl InsertStatement {
    pub fn into_statement(self, backend: DbBackend) -> Statement {
        Statement::from_sql_and_values(backend, self.sql, self.values)
    }
}

pub fn insert_rows(table: &str, headers: &[String], rows: &[Vec<Option<String>>]) -> InsertStatement {
    let cols: Vec<String> = headers.iter().map(|h| quote_ident(h)).collect();
    let tuple = format!("({})", vec!["?"; headers.len()].join(", "));
    let mut sql = format!("INSERT INTO {} ({}) VALUES ", quote_ident(table), cols.join(", "));
    let mut values = Vec::with_capacity(rows.len() * headers.len());
    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        sql.push_str(&tuple);
        for idx in 0..headers.len() {
            let cell: Option<String> = row.get(idx).cloned().flatten();
            values.push(cell.into());
        }
    }
    InsertStatement { sql, values, rows: rows.len() }
}

/// Rows per statement: the configured batch size, capped by the placeholder limit.
pub fn rows_per_batch(batch_size: usize, column_count: usize) -> usize {
    let cap = MAX_PLACEHOLDERS / column_count.max(1);
    batch_size.min(cap).max(1)
}

/// `information_schema` queries per connection dialect.
pub mod introspect {
    use sea_orm::DbBackend;

    pub fn list_tables(backend: DbBackend) -> &'static str {
        match backend {
            DbBackend::Postgres => {
                "SELECT table_name::text AS name FROM information_schema.tables \
                 WHERE table_schema = current_schema() ORDER BY table_name"
            }
            _ => {
                "SELECT CAST(TABLE_NAME AS CHAR) AS name FROM information_schema.TABLES \
                 WHERE TABLE_SCHEMA = DATABASE() ORDER BY TABLE_NAME"
            }
        }
    }

    pub fn table_exists(backend: DbBackend) -> &'static str {
        match backend {
            DbBackend::Postgres => {
                "SELECT COUNT(*)::bigint AS cnt FROM information_schema.tables \
                 WHERE table_schema = current_schema() AND table_name = $1"
            }
            _ => {
                "SELECT CAST(COUNT(*) AS SIGNED) AS cnt FROM information_schema.TABLES \
                 WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?"
            }
        }
    }

    pub fn table_columns(backend: DbBackend) -> &'static str {
        match backend {
            DbBackend::Postgres => {
                "SELECT c.column_name::text AS name, c.data_type::text AS type_name, \
                 CASE WHEN k.column_name IS NULL THEN '' ELSE 'PRI' END AS col_key \
                 FROM information_schema.columns c \
                 LEFT JOIN (SELECT kcu.column_name FROM information_schema.table_constraints tc \
                   JOIN information_schema.key_column_usage kcu \
                     ON tc.constraint_name = kcu.constraint_name AND tc.table_schema = kcu.table_schema \
                   WHERE tc.constraint_type = 'PRIMARY KEY' AND tc.table_schema = current_schema() \
                     AND tc.table_name = $1) k ON k.column_name = c.column_name \
                 WHERE c.table_schema = current_schema() AND c.table_name = $1 \
                 ORDER BY c.ordinal_position"
            }
            _ => {
                "SELECT CAST(COLUMN_NAME AS CHAR) AS name, CAST(COLUMN_TYPE AS CHAR) AS type_name, \
                 CAST(COLUMN_KEY AS CHAR) AS col_key FROM information_schema.COLUMNS \
                 WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? ORDER BY ORDINAL_POSITION"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_doubles_backticks() {
        assert_eq!(quote_ident("order"), "`order`");
        assert_eq!(quote_ident("we`ird"), "`we``ird`");
    }

    #[test]
    fn create_table_with_keys() {
        let cols = vec![
            ColumnSpec { name: "id".into(), sql_type: SqlType::BigInt },
            ColumnSpec { name: "city".into(), sql_type: SqlType::Text },
            ColumnSpec { name: "day".into(), sql_type: SqlType::Date },
        ];
        let sql = create_table("t", &cols, &["id".into()], &["city".into()]);
        assert_eq!(
            sql,
            "CREATE TABLE `t` (`id` BIGINT NOT NULL, `city` VARCHAR(255) NULL, `day` DATE NULL, \
             PRIMARY KEY (`id`), KEY `idx_city` (`city`)) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4"
        );
    }

    #[test]
    fn long_index_names_fit_mysql_limit() {
        let a = format!("{}a", "x".repeat(70));
        let b = format!("{}b", "x".repeat(70));
        let cols = vec![
            ColumnSpec { name: a.clone(), sql_type: SqlType::Text },
            ColumnSpec { name: b.clone(), sql_type: SqlType::Text },
        ];
        let sql = create_table("t", &cols, &[], &[a.clone(), b.clone()]);
        let first = format!("KEY `idx_0_{}` (`{a}`)", "x".repeat(58));
        let second = format!("KEY `idx_1_{}` (`{b}`)", "x".repeat(58));
        assert!(sql.contains(&first), "{sql}");
        assert!(sql.contains(&second), "{sql}");
        assert_eq!(index_name(0, &"y".repeat(60)), format!("`idx_{}`", "y".repeat(60)));
    }

    #[test]
    fn insert_binds_every_cell() {
        let rows = vec![vec![Some("1".into()), None], vec![Some("2".into())]];
        let stmt = insert_rows("t", &["a".into(), "b".into()], &rows);
        assert_eq!(stmt.sql, "INSERT INTO `t` (`a`, `b`) VALUES (?, ?), (?, ?)");
        assert_eq!(stmt.values.len(), 4);
        assert_eq!(stmt.rows, 2);
    }

    #[test]
    fn batch_capped_by_placeholders() {
        assert_eq!(rows_per_batch(1000, 10), 1000);
        assert_eq!(rows_per_batch(1000, 100), 655);
        assert_eq!(rows_per_batch(0, 3), 1);
    }
}
