//! Idempotent schema creation and column migrations.

use rusqlite::Connection;
use tracing::{debug, info};

use super::error::{SqliteDaoError, SqliteResult};

const CREATE_TABLES: &str = "
    CREATE TABLE IF NOT EXISTS active_rounds (
        key TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL,
        updated_at INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS rounds (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT NOT NULL,
        holes_count INTEGER NOT NULL,
        total_strokes INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS round_holes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        round_id INTEGER NOT NULL,
        hole_number INTEGER NOT NULL,
        strokes INTEGER NOT NULL,
        FOREIGN KEY(round_id) REFERENCES rounds(id) ON DELETE CASCADE
    );
";

/// Columns added after the first release; each is applied only when missing.
const COLUMN_MIGRATIONS: [(&str, &str, &str); 12] = [
    ("rounds", "course", "TEXT"),
    ("rounds", "weather_temp_c", "REAL"),
    ("rounds", "weather_wind_mps", "REAL"),
    ("rounds", "weather_code", "INTEGER"),
    ("rounds", "weather_desc", "TEXT"),
    ("rounds", "weather_time", "TEXT"),
    ("rounds", "weather_lat", "REAL"),
    ("rounds", "weather_lon", "REAL"),
    ("round_holes", "putts", "INTEGER NOT NULL DEFAULT 0"),
    ("round_holes", "fairway_hit", "INTEGER NOT NULL DEFAULT 0"),
    ("round_holes", "green_in_reg", "INTEGER NOT NULL DEFAULT 0"),
    ("round_holes", "penalties", "INTEGER NOT NULL DEFAULT 0"),
];

/// Create tables and add missing columns. Safe to call on every open.
pub fn ensure_schema(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|source| SqliteDaoError::Schema {
            step: "foreign_keys",
            source,
        })?;
    conn.execute_batch(CREATE_TABLES)
        .map_err(|source| SqliteDaoError::Schema {
            step: "create_tables",
            source,
        })?;

    let mut added = 0;
    for (table, column, definition) in COLUMN_MIGRATIONS {
        if has_column(conn, table, column)? {
            continue;
        }
        conn.execute_batch(&format!(
            "ALTER TABLE {table} ADD COLUMN {column} {definition};"
        ))
        .map_err(|source| SqliteDaoError::Schema {
            step: "add_column",
            source,
        })?;
        added += 1;
    }

    if added > 0 {
        info!(added, "migrated SQLite schema");
    } else {
        debug!("SQLite schema is up to date");
    }
    Ok(())
}

fn has_column(conn: &Connection, table: &str, column: &str) -> SqliteResult<bool> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .map_err(|source| SqliteDaoError::Schema {
            step: "table_info",
            source,
        })?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(|source| SqliteDaoError::Schema {
            step: "table_info",
            source,
        })?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| SqliteDaoError::Schema {
            step: "table_info",
            source,
        })?;
    Ok(names.iter().any(|name| name == column))
}
