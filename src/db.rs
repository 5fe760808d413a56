// ==========================================
// 赛事报名管理系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout,减少并发写入时的偶发 busy 错误
// ==========================================

use rusqlite::Connection;
use std::path::PathBuf;
use std::time::Duration;

/// 默认 busy_timeout(毫秒)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明:
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化导入核心所需的表结构(幂等)
///
/// 赛事/比赛目录由外部系统维护,这里只携带其标识列,不建目录表
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS athlete (
            athlete_id   INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name   TEXT NOT NULL,
            last_name    TEXT NOT NULL,
            gender       TEXT NOT NULL DEFAULT 'F',
            birth_date   TEXT,
            birth_year   INTEGER,
            city         TEXT,
            club         TEXT,
            email        TEXT,
            phone        TEXT,
            created_at   TEXT NOT NULL,
            updated_at   TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_athlete_name
            ON athlete (LOWER(first_name), LOWER(last_name));

        CREATE TABLE IF NOT EXISTS registration (
            registration_id INTEGER PRIMARY KEY AUTOINCREMENT,
            athlete_id      INTEGER NOT NULL REFERENCES athlete(athlete_id),
            event_id        TEXT NOT NULL,
            race_id         TEXT NOT NULL,
            bib_number      INTEGER,
            category        TEXT,
            finish_time     TEXT,
            overall_rank    INTEGER,
            gender_rank     INTEGER,
            category_rank   INTEGER,
            payment_amount  REAL,
            notes           TEXT,
            created_at      TEXT NOT NULL,
            UNIQUE (athlete_id, race_id)
        );

        CREATE INDEX IF NOT EXISTS idx_registration_race
            ON registration (race_id);

        CREATE TABLE IF NOT EXISTS import_batch (
            batch_id           TEXT PRIMARY KEY,
            race_id            TEXT NOT NULL,
            source_label       TEXT,
            total_rows         INTEGER NOT NULL,
            imported           INTEGER NOT NULL,
            skipped_duplicates INTEGER NOT NULL,
            error_rows         INTEGER NOT NULL,
            elapsed_ms         INTEGER,
            imported_at        TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            key        TEXT PRIMARY KEY,
            value      TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        "#,
    )
}

/// 默认数据库路径: <数据目录>/race-registration/race.db
pub fn default_db_path() -> PathBuf {
    let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("race-registration").join("race.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        initialize_schema(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('athlete','registration','import_batch','config_kv')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 4);
    }
}
