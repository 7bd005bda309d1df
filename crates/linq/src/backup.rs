// SPDX-FileCopyrightText: 2026 Linq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `linq backup` and `linq restore` command implementation.
//!
//! Uses rusqlite's Backup API, so copies stay consistent even while a
//! `linq watch` process is writing to the database in WAL mode.

use std::path::Path;
use std::time::Duration;

use linq_core::LinqError;
use rusqlite::{Connection, OpenFlags};

const PAGES_PER_STEP: std::ffi::c_int = 100;
const STEP_PAUSE: Duration = Duration::from_millis(10);

/// Tables a file must contain to be accepted by `restore`.
const REQUIRED_TABLES: [&str; 3] = ["turns", "preferences", "schedules"];

fn not_found(what: &str, path: &Path) -> LinqError {
    LinqError::storage(
        format!("{what} not found: {}", path.display()),
        std::io::Error::new(std::io::ErrorKind::NotFound, path.display().to_string()),
    )
}

fn copy_database(from: &Path, to: &Path) -> Result<u64, LinqError> {
    let src = Connection::open_with_flags(
        from,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| LinqError::storage(format!("cannot open {}", from.display()), e))?;
    let mut dst = Connection::open(to)
        .map_err(|e| LinqError::storage(format!("cannot open {}", to.display()), e))?;

    let backup = rusqlite::backup::Backup::new(&src, &mut dst)
        .map_err(|e| LinqError::storage("cannot start backup", e))?;
    backup
        .run_to_completion(PAGES_PER_STEP, STEP_PAUSE, None)
        .map_err(|e| LinqError::storage("backup step failed", e))?;
    drop(backup);

    let metadata = std::fs::metadata(to)
        .map_err(|e| LinqError::storage(format!("cannot stat {}", to.display()), e))?;
    Ok(metadata.len())
}

/// Checks that `path` is a SQLite file holding the three linq tables.
fn validate_backup(path: &Path) -> Result<(), LinqError> {
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(|e| LinqError::storage(format!("cannot open {}", path.display()), e))?;
    for table in REQUIRED_TABLES {
        let present: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [table],
                |row| row.get(0),
            )
            .map_err(|e| LinqError::storage(format!("{} is not a database", path.display()), e))?;
        if present == 0 {
            return Err(LinqError::Validation(format!(
                "{} has no `{table}` table; not a linq backup",
                path.display()
            )));
        }
    }
    Ok(())
}

/// Copy the database at `db_path` to `backup_path`.
pub fn run_backup(db_path: &str, backup_path: &Path) -> Result<(), LinqError> {
    let src = Path::new(db_path);
    if !src.exists() {
        return Err(not_found("database", src));
    }
    let size = copy_database(src, backup_path)?;
    let size_kb = size as f64 / 1024.0;
    eprintln!("Backup complete: {size_kb:.1} KB written to {}", backup_path.display());
    Ok(())
}

/// Replace the database at `db_path` with the contents of `restore_from`.
///
/// The current database, if any, is first copied to `<db_path>.pre-restore`.
pub fn run_restore(db_path: &str, restore_from: &Path) -> Result<(), LinqError> {
    if !restore_from.exists() {
        return Err(not_found("backup file", restore_from));
    }
    validate_backup(restore_from)?;

    let dst = Path::new(db_path);
    if dst.exists() {
        let pre_restore = format!("{db_path}.pre-restore");
        eprintln!("Creating safety backup: {pre_restore}");
        copy_database(dst, Path::new(&pre_restore))?;
    }

    let size = copy_database(restore_from, dst)?;
    let size_kb = size as f64 / 1024.0;
    eprintln!(
        "Restore complete: {size_kb:.1} KB restored from {}",
        restore_from.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded_db(path: &Path, user_input: &str) {
        let db = linq_storage::Database::open(path.to_str().unwrap())
            .await
            .unwrap();
        linq_storage::queries::turns::append(&db, user_input, "ok")
            .await
            .unwrap();
        db.close().await.unwrap();
    }

    fn first_turn(path: &Path) -> String {
        let conn = Connection::open(path).unwrap();
        conn.query_row("SELECT user_input FROM turns ORDER BY id LIMIT 1", [], |row| {
            row.get(0)
        })
        .unwrap()
    }

    #[test]
    fn backup_nonexistent_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.db");
        let err = run_backup(missing.to_str().unwrap(), &dir.path().join("out.db")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn restore_nonexistent_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target.db");
        let err = run_restore(target.to_str().unwrap(), &dir.path().join("nope.db")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn backup_copies_all_turns() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("linq.db");
        let out = dir.path().join("backup.db");
        seeded_db(&src, "我喜欢篮球").await;

        run_backup(src.to_str().unwrap(), &out).unwrap();
        assert_eq!(first_turn(&out), "我喜欢篮球");
    }

    #[tokio::test]
    async fn restore_keeps_pre_restore_copy() {
        let dir = tempfile::tempdir().unwrap();
        let current = dir.path().join("linq.db");
        let backup = dir.path().join("backup.db");
        seeded_db(&current, "现在").await;
        seeded_db(&backup, "以前").await;

        run_restore(current.to_str().unwrap(), &backup).unwrap();

        let pre_restore = dir.path().join("linq.db.pre-restore");
        assert_eq!(first_turn(&pre_restore), "现在");
        assert_eq!(first_turn(&current), "以前");
    }

    #[test]
    fn restore_rejects_non_sqlite_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target.db");
        let invalid = dir.path().join("invalid.db");
        std::fs::write(&invalid, b"this is not a sqlite file").unwrap();

        assert!(run_restore(target.to_str().unwrap(), &invalid).is_err());
        assert!(!target.exists());
    }

    #[test]
    fn restore_rejects_foreign_database() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target.db");
        let foreign = dir.path().join("foreign.db");
        Connection::open(&foreign)
            .unwrap()
            .execute_batch("CREATE TABLE other (id INTEGER PRIMARY KEY);")
            .unwrap();

        let err = run_restore(target.to_str().unwrap(), &foreign).unwrap_err();
        assert!(matches!(err, LinqError::Validation(_)));
    }
}
