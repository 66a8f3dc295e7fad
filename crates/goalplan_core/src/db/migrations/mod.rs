//! Versioned goalplan schema.
//!
//! # Invariants
//! - `version` values start at 1 and increase by one per entry.
//! - `PRAGMA user_version` always equals the last applied version.
//! - After a successful run every table in `REQUIRED_TABLES` exists.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::{Connection, Transaction};

#[derive(Debug, Clone, Copy)]
pub(crate) struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "accounts_goals_steps",
    sql: include_str!("0001_init.sql"),
}];

/// Tables the repositories read from.
pub const REQUIRED_TABLES: &[&str] = &["users", "goals", "steps"];

/// Returns the latest schema version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Reads the schema version recorded in the database.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Brings the schema up to `latest_version` and checks the goalplan tables.
///
/// Pending migrations run in one transaction; a failing migration leaves the
/// database at its previous version.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    run(conn, MIGRATIONS)?;
    verify_tables(conn)
}

pub(crate) fn run(conn: &mut Connection, migrations: &[Migration]) -> DbResult<()> {
    let current = schema_version(conn)?;
    let latest = migrations.last().map_or(0, |migration| migration.version);

    if current > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: latest,
        });
    }

    let pending: Vec<&Migration> = migrations
        .iter()
        .filter(|migration| migration.version > current)
        .collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in pending {
        apply_one(&tx, migration)?;
    }
    tx.commit()?;
    Ok(())
}

fn apply_one(tx: &Transaction<'_>, migration: &Migration) -> DbResult<()> {
    let result = tx.execute_batch(migration.sql).and_then(|()| {
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))
    });

    match result {
        Ok(()) => {
            info!(
                "event=db_migrate module=db status=ok version={} name={}",
                migration.version, migration.name
            );
            Ok(())
        }
        Err(source) => {
            error!(
                "event=db_migrate module=db status=error version={} name={} error={}",
                migration.version, migration.name, source
            );
            Err(DbError::Migration {
                version: migration.version,
                name: migration.name,
                source,
            })
        }
    }
}

fn verify_tables(conn: &Connection) -> DbResult<()> {
    let mut stmt = conn.prepare(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
    )?;
    for table in REQUIRED_TABLES {
        let exists: bool = stmt.query_row([*table], |row| row.get(0))?;
        if !exists {
            return Err(DbError::MissingTable(*table));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{run, schema_version, Migration};
    use crate::db::DbError;
    use rusqlite::Connection;

    const HISTORY: &[Migration] = &[
        Migration {
            version: 1,
            name: "create_notes",
            sql: "CREATE TABLE notes (body TEXT NOT NULL);",
        },
        Migration {
            version: 2,
            name: "broken_index",
            sql: "CREATE INDEX idx_missing ON no_such_table(body);",
        },
    ];

    #[test]
    fn failing_migration_is_named_and_rolled_back() {
        let mut conn = Connection::open_in_memory().unwrap();

        let err = run(&mut conn, HISTORY).unwrap_err();
        match err {
            DbError::Migration { version, name, .. } => {
                assert_eq!(version, 2);
                assert_eq!(name, "broken_index");
            }
            other => panic!("unexpected error: {other}"),
        }

        assert_eq!(schema_version(&conn).unwrap(), 0);
        let notes: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'notes';",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(notes, 0);
    }

    #[test]
    fn only_pending_versions_run() {
        let mut conn = Connection::open_in_memory().unwrap();
        run(&mut conn, &HISTORY[..1]).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 1);

        // A second run with the same history must not re-create `notes`.
        run(&mut conn, &HISTORY[..1]).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 1);
    }
}
