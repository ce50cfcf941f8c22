use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, Transaction};

use crate::lesson::normalize_time;

const CURRENT_SCHEMA_VERSION: i32 = 2;

pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let mut version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read user_version pragma")?;

    if version > CURRENT_SCHEMA_VERSION {
        bail!(
            "database version ({}) is newer than supported schema ({})",
            version,
            CURRENT_SCHEMA_VERSION
        );
    }

    if version == CURRENT_SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn
        .transaction()
        .context("failed to open migration transaction")?;

    while version < CURRENT_SCHEMA_VERSION {
        let next_version = version + 1;
        apply_migration(&tx, next_version)
            .with_context(|| format!("migration to version {next_version} failed"))?;
        version = next_version;
    }

    tx.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)
        .context("failed to update user_version pragma")?;
    tx.commit().context("failed to commit migrations")?;

    Ok(())
}

fn apply_migration(tx: &Transaction<'_>, version: i32) -> Result<()> {
    match version {
        1 => {
            tx.execute_batch(include_str!("schemas/schema_v1.sql"))
                .context("failed to execute schema_v1.sql")?;
            Ok(())
        }
        2 => {
            tx.execute_batch(include_str!("schemas/schema_v2.sql"))
                .context("failed to execute schema_v2.sql")?;
            split_embedded_locations(tx)
        }
        _ => bail!("unknown migration target version: {version}"),
    }
}

/// Backfill for the v2 location column: times stored before the column
/// existed still carry their " - <location>" suffix. Split it out once.
/// Rerunning finds nothing to do because clean times contain no " - ".
fn split_embedded_locations(tx: &Transaction<'_>) -> Result<()> {
    let legacy_rows: Vec<(i64, String)> = {
        let mut stmt = tx
            .prepare("SELECT id, lesson_time FROM lessons WHERE lesson_time LIKE '% - %'")
            .context("failed to prepare location backfill query")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        rows
    };

    for (id, raw_time) in legacy_rows {
        let normalized = normalize_time(&raw_time);
        tx.execute(
            "UPDATE lessons
             SET lesson_time = ?1,
                 location = COALESCE(location, ?2)
             WHERE id = ?3",
            params![normalized.clean, normalized.location, id],
        )
        .with_context(|| format!("failed to backfill location for lesson row {id}"))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v1_database_with_legacy_row() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        let tx = conn.transaction().unwrap();
        tx.execute_batch(include_str!("schemas/schema_v1.sql")).unwrap();
        tx.execute(
            "INSERT INTO lessons (school, lesson_key, instructor, lesson_date, lesson_time, lesson_type, students)
             VALUES ('westu-sor', 'k1', 'Zach Jones', '2025-06-19', '3:00pm - Room 2', 'Private Lesson', 'Jane Doe')",
            [],
        )
        .unwrap();
        tx.pragma_update(None, "user_version", 1).unwrap();
        tx.commit().unwrap();
        conn
    }

    fn time_and_location(conn: &Connection) -> (String, Option<String>) {
        conn.query_row(
            "SELECT lesson_time, location FROM lessons WHERE lesson_key = 'k1'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap()
    }

    #[test]
    fn v2_migration_splits_embedded_location() {
        let mut conn = v1_database_with_legacy_row();
        run_migrations(&mut conn).unwrap();

        let (time, location) = time_and_location(&conn);
        assert_eq!(time, "3:00pm");
        assert_eq!(location.as_deref(), Some("Room 2"));

        let version: i32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn location_backfill_is_idempotent() {
        let mut conn = v1_database_with_legacy_row();
        run_migrations(&mut conn).unwrap();
        let first = time_and_location(&conn);

        // Force the backfill again; clean times carry no " - " so there is
        // nothing left to split.
        let tx = conn.transaction().unwrap();
        split_embedded_locations(&tx).unwrap();
        tx.commit().unwrap();

        assert_eq!(time_and_location(&conn), first);
    }

    #[test]
    fn fresh_database_migrates_to_current_version() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        run_migrations(&mut conn).unwrap();

        let version: i32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn newer_database_is_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", 99).unwrap();
        assert!(run_migrations(&mut conn).is_err());
    }
}
