use std::path::Path;

use rusqlite::Connection;

use crate::db::schema::CREATE_SCHEMA;
use crate::error::Result;

/// Database wrapper for the persisted program model.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database at the given path and apply schema.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;\
             PRAGMA foreign_keys=ON;\
             PRAGMA synchronous=NORMAL;",
        )?;
        if Self::needs_schema_migration(&conn) {
            conn.execute_batch(
                "DROP TABLE IF EXISTS bodies;\
                 DROP TABLE IF EXISTS refs;\
                 DROP TABLE IF EXISTS contents;\
                 DROP TABLE IF EXISTS elements;",
            )?;
        }
        conn.execute_batch(CREATE_SCHEMA)?;
        Ok(Self { conn })
    }

    /// Tables from an older layout without sibling ordering.
    fn needs_schema_migration(conn: &Connection) -> bool {
        let tables_exist = conn.prepare("SELECT id FROM elements LIMIT 0").is_ok();
        let has_seq = conn.prepare("SELECT seq FROM elements LIMIT 0").is_ok();
        tables_exist && !has_seq
    }

    /// Create an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(CREATE_SCHEMA)?;
        Ok(Self { conn })
    }

    /// Access the underlying connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Access the underlying connection mutably.
    pub fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}
