use anyhow::{bail, Result};
use rusqlite::{params, types::Type, Connection};

/// Offset added to every schema version stored in `PRAGMA user_version`,
/// so that databases not created by us are easy to tell apart.
pub const BASE_DB_VERSION: usize = 70000;

#[macro_export]
macro_rules! sqlite_column {
    ($name:expr, $sql_type:expr $(, $field:ident = $value:expr)*) => {
        {
            #[allow(unused_mut)]
            let mut column = Column {
                name: $name,
                sql_type: $sql_type,
                is_primary_key: false,
                non_null: false,
                is_unique: false,
                default_value: None,
            };
            $(
                column.$field = $value;
            )*
            column
        }
    };
}

#[derive(Debug, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
}

impl SqlType {
    fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
        }
    }

    fn from_sql(s: &str) -> Option<&'static SqlType> {
        match s {
            "TEXT" => Some(&SqlType::Text),
            "INTEGER" => Some(&SqlType::Integer),
            _ => None,
        }
    }
}

pub struct Column<'a, S: AsRef<str>> {
    pub name: S,
    pub sql_type: &'a SqlType,
    pub is_primary_key: bool,
    pub non_null: bool,
    pub is_unique: bool,
    pub default_value: Option<S>,
}

pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column<'static, &'static str>],
    pub indices: &'static [(&'static str, &'static str)],
}

impl Table {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        let column_defs: Vec<String> = self
            .columns
            .iter()
            .map(|column| {
                let mut def = format!("{} {}", column.name, column.sql_type.as_sql());
                if column.is_primary_key {
                    def.push_str(" PRIMARY KEY");
                }
                if column.non_null {
                    def.push_str(" NOT NULL");
                }
                if column.is_unique {
                    def.push_str(" UNIQUE");
                }
                if let Some(default_value) = column.default_value {
                    def.push_str(&format!(" DEFAULT {}", default_value));
                }
                def
            })
            .collect();

        conn.execute(
            &format!("CREATE TABLE {} ({});", self.name, column_defs.join(", ")),
            params![],
        )?;

        for (index_name, column_name) in self.indices {
            conn.execute(
                &format!(
                    "CREATE INDEX {} ON {}({});",
                    index_name, self.name, column_name
                ),
                params![],
            )?;
        }
        Ok(())
    }

    fn validate(&self, conn: &Connection) -> Result<()> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", self.name))?;
        let actual_columns = stmt
            .query_map(params![], |row| {
                let sql_type_name: String = row.get(2)?;
                let sql_type = SqlType::from_sql(&sql_type_name).ok_or_else(|| {
                    rusqlite::Error::InvalidColumnType(2, sql_type_name.clone(), Type::Text)
                })?;
                Ok(Column {
                    name: row.get::<_, String>(1)?,
                    sql_type,
                    non_null: row.get::<_, i32>(3)? == 1,
                    default_value: row.get::<_, Option<String>>(4)?,
                    is_primary_key: row.get::<_, i32>(5)? == 1,
                    is_unique: false,
                })
            })?
            .collect::<rusqlite::Result<Vec<Column<'_, String>>>>()?;

        if actual_columns.len() != self.columns.len() {
            bail!(
                "Table {} has {} columns, expected {}. Found: [{}], expected: [{}]",
                self.name,
                actual_columns.len(),
                self.columns.len(),
                actual_columns
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                self.columns
                    .iter()
                    .map(|c| c.name)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        for (actual, expected) in actual_columns.iter().zip(self.columns.iter()) {
            if actual.name != expected.name {
                bail!(
                    "Table {} column name mismatch: expected {}, got {}",
                    self.name,
                    expected.name,
                    actual.name
                );
            }
            if actual.sql_type != expected.sql_type {
                bail!(
                    "Table {} column {} type mismatch: expected {:?}, got {:?}",
                    self.name,
                    expected.name,
                    expected.sql_type,
                    actual.sql_type
                );
            }
            if actual.non_null != expected.non_null {
                bail!(
                    "Table {} column {} non-null mismatch: expected {}, got {}",
                    self.name,
                    expected.name,
                    expected.non_null,
                    actual.non_null
                );
            }
            if actual.is_primary_key != expected.is_primary_key {
                bail!(
                    "Table {} column {} primary key mismatch: expected {}, got {}",
                    self.name,
                    expected.name,
                    expected.is_primary_key,
                    actual.is_primary_key
                );
            }
            if actual.default_value.as_deref().map(strip_parentheses)
                != expected.default_value.map(strip_parentheses)
            {
                bail!(
                    "Table {} column {} default value mismatch: expected {:?}, got {:?}",
                    self.name,
                    expected.name,
                    expected.default_value,
                    actual.default_value
                );
            }
        }

        for (index_name, _) in self.indices {
            let exists = conn
                .query_row(
                    "SELECT 1 FROM sqlite_master WHERE type='index' AND name=?1 AND tbl_name=?2",
                    params![index_name, self.name],
                    |_| Ok(true),
                )
                .unwrap_or(false);
            if !exists {
                bail!("Table {} is missing index '{}'", self.name, index_name);
            }
        }

        let unique_columns = self.single_column_unique_indices(conn)?;
        for column in self.columns.iter().filter(|c| c.is_unique) {
            if !unique_columns.iter().any(|c| c == column.name) {
                bail!(
                    "Table {} is missing unique constraint on column {}",
                    self.name,
                    column.name
                );
            }
        }

        Ok(())
    }

    /// Columns covered by a unique index on exactly that one column.
    fn single_column_unique_indices(&self, conn: &Connection) -> Result<Vec<String>> {
        let mut stmt = conn.prepare(&format!("PRAGMA index_list({})", self.name))?;
        let unique_indices: Vec<String> = stmt
            .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, i32>(2)?)))?
            .filter_map(|r| r.ok())
            .filter(|(_, is_unique)| *is_unique == 1)
            .map(|(name, _)| name)
            .collect();

        let mut columns = Vec::new();
        for index_name in unique_indices {
            let mut idx_stmt = conn.prepare(&format!("PRAGMA index_info({})", index_name))?;
            let cols: Vec<String> = idx_stmt
                .query_map([], |row| row.get::<_, String>(2))?
                .filter_map(|r| r.ok())
                .collect();
            if let [single] = cols.as_slice() {
                columns.push(single.clone());
            }
        }
        Ok(columns)
    }
}

fn strip_parentheses(s: &str) -> String {
    if s.starts_with('(') && s.ends_with(')') {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

pub struct VersionedSchema {
    pub version: usize,
    pub tables: &'static [Table],
    /// Brings a database at `version - 1` up to this version.
    pub migration: Option<fn(&Connection) -> Result<()>>,
}

impl VersionedSchema {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            table.create(conn)?;
        }
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + self.version),
            [],
        )?;
        Ok(())
    }

    pub fn validate(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            table.validate(conn)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PEOPLE_TABLE: Table = Table {
        name: "people",
        columns: &[
            sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
            sqlite_column!("name", &SqlType::Text, non_null = true, is_unique = true),
            sqlite_column!(
                "age",
                &SqlType::Integer,
                non_null = true,
                default_value = Some("0")
            ),
        ],
        indices: &[("idx_people_age", "age")],
    };

    const PEOPLE_SCHEMA: VersionedSchema = VersionedSchema {
        version: 1,
        tables: &[PEOPLE_TABLE],
        migration: None,
    };

    #[test]
    fn created_schema_validates() {
        let conn = Connection::open_in_memory().unwrap();
        PEOPLE_SCHEMA.create(&conn).unwrap();
        PEOPLE_SCHEMA.validate(&conn).unwrap();

        let version: i64 = conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version as usize, BASE_DB_VERSION + 1);
    }

    #[test]
    fn validate_detects_missing_column() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE)",
            [],
        )
        .unwrap();
        conn.execute("CREATE INDEX idx_people_age ON people(name)", [])
            .unwrap();

        let err = PEOPLE_SCHEMA.validate(&conn).unwrap_err().to_string();
        assert!(err.contains("has 2 columns, expected 3"));
    }

    #[test]
    fn validate_detects_missing_index() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE, age INTEGER NOT NULL DEFAULT 0)",
            [],
        )
        .unwrap();

        let err = PEOPLE_SCHEMA.validate(&conn).unwrap_err().to_string();
        assert!(err.contains("missing index"));
        assert!(err.contains("idx_people_age"));
    }

    #[test]
    fn validate_detects_missing_unique_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT NOT NULL, age INTEGER NOT NULL DEFAULT 0)",
            [],
        )
        .unwrap();
        conn.execute("CREATE INDEX idx_people_age ON people(age)", [])
            .unwrap();

        let err = PEOPLE_SCHEMA.validate(&conn).unwrap_err().to_string();
        assert!(err.contains("missing unique constraint on column name"));
    }

    #[test]
    fn validate_detects_type_mismatch() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE people (id INTEGER PRIMARY KEY, name INTEGER NOT NULL UNIQUE, age INTEGER NOT NULL DEFAULT 0)",
            [],
        )
        .unwrap();

        let err = PEOPLE_SCHEMA.validate(&conn).unwrap_err().to_string();
        assert!(err.contains("type mismatch"));
    }
}
