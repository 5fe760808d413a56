// ==========================================
// 赛事报名管理系统 - 组别名次重算引擎
// ==========================================
// 依据: Import_Pipeline_Spec_v1.0.md - 4.6 批次收尾钩子
// 职责: 按完赛成绩重算一场比赛的组别名次与性别名次
// 说明: 批次结束后对整场比赛调用一次,不逐行调用
// ==========================================

use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use crate::engine::error::{EngineError, EngineResult};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

// ==========================================
// CategoryRecalculator Trait
// ==========================================
// 用途: 导入编排器消费的收尾钩子接口
// 实现者: SqliteCategoryRecalc
#[async_trait]
pub trait CategoryRecalculator: Send + Sync {
    /// 重算指定比赛的组别/性别名次
    ///
    /// # 返回
    /// - Ok(usize): 更新的报名记录数
    async fn recalculate_categories(&self, race_id: &str) -> EngineResult<usize>;
}

// ==========================================
// SqliteCategoryRecalc
// ==========================================
pub struct SqliteCategoryRecalc {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCategoryRecalc {
    pub fn new(db_path: &str) -> EngineResult<Self> {
        let conn =
            open_sqlite_connection(db_path).map_err(|e| EngineError::QueryError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> EngineResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| EngineError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)
                .map_err(|e| EngineError::QueryError(e.to_string()))?;
        }
        Ok(Self { conn })
    }
}

#[async_trait]
impl CategoryRecalculator for SqliteCategoryRecalc {
    async fn recalculate_categories(&self, race_id: &str) -> EngineResult<usize> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| EngineError::LockError(e.to_string()))?;

        let tx = conn.transaction().map_err(EngineError::from)?;

        // 成绩为 HH:MM:SS 零填充格式,字典序即时间序
        let rows: Vec<(i64, Option<String>, String)> = {
            let mut stmt = tx.prepare(
                r#"
                SELECT r.registration_id, r.category, a.gender
                FROM registration r
                JOIN athlete a ON a.athlete_id = r.athlete_id
                WHERE r.race_id = ?1 AND r.finish_time IS NOT NULL
                ORDER BY r.finish_time, r.registration_id
                "#,
            )?;

            let mapped = stmt.query_map(params![race_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?;

            let mut rows = Vec::new();
            for row in mapped {
                rows.push(row?);
            }
            rows
        };

        let mut category_counters: HashMap<String, i64> = HashMap::new();
        let mut gender_counters: HashMap<String, i64> = HashMap::new();
        let mut updated = 0usize;

        for (registration_id, category, gender) in &rows {
            let gender_rank = {
                let counter = gender_counters.entry(gender.clone()).or_insert(0);
                *counter += 1;
                *counter
            };

            let category_rank = category.as_ref().map(|cat| {
                let counter = category_counters.entry(cat.clone()).or_insert(0);
                *counter += 1;
                *counter
            });

            tx.execute(
                "UPDATE registration SET gender_rank = ?1, category_rank = ?2 WHERE registration_id = ?3",
                params![gender_rank, category_rank, registration_id],
            )?;
            updated += 1;
        }

        tx.commit().map_err(EngineError::from)?;

        debug!(race_id = %race_id, updated = updated, "组别名次重算完成");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::initialize_schema;
    use chrono::Utc;

    fn seed(conn: &Connection, first: &str, gender: &str, category: &str, time: &str) {
        let now = Utc::now();
        conn.execute(
            "INSERT INTO athlete (first_name, last_name, gender, created_at, updated_at)
             VALUES (?1, 'Test', ?2, ?3, ?3)",
            params![first, gender, now],
        )
        .unwrap();
        let athlete_id = conn.last_insert_rowid();
        conn.execute(
            "INSERT INTO registration (athlete_id, event_id, race_id, category, finish_time, created_at)
             VALUES (?1, 'EVT', '10K', ?2, ?3, ?4)",
            params![athlete_id, category, time, now],
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_recalculate_ranks_by_finish_time() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        seed(&conn, "A", "M", "SE", "01:02:00");
        seed(&conn, "B", "M", "SE", "00:58:30");
        seed(&conn, "C", "F", "SE", "01:00:10");
        seed(&conn, "D", "M", "V1", "01:05:00");

        let shared = Arc::new(Mutex::new(conn));
        let recalc = SqliteCategoryRecalc::from_connection(shared.clone()).unwrap();
        let updated = recalc.recalculate_categories("10K").await.unwrap();
        assert_eq!(updated, 4);

        let conn = shared.lock().unwrap();
        let ranks: Vec<(String, i64, i64)> = {
            let mut stmt = conn
                .prepare(
                    "SELECT a.first_name, r.gender_rank, r.category_rank
                     FROM registration r JOIN athlete a ON a.athlete_id = r.athlete_id
                     WHERE r.race_id = '10K' ORDER BY a.first_name",
                )
                .unwrap();
            stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
                .unwrap()
                .collect::<Result<_, _>>()
                .unwrap()
        };

        // 成绩序: B 58:30, C 1:00:10, A 1:02:00, D 1:05:00
        // 男子: B 1, A 2, D 3;女子: C 1;SE 组: B 1, C 2, A 3;V1 组: D 1
        assert_eq!(ranks[0], ("A".to_string(), 2, 3));
        assert_eq!(ranks[1], ("B".to_string(), 1, 1));
        assert_eq!(ranks[2], ("C".to_string(), 1, 2));
        assert_eq!(ranks[3], ("D".to_string(), 3, 1));
    }

    #[tokio::test]
    async fn test_recalculate_ignores_missing_finish_time() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        let now = Utc::now();
        conn.execute(
            "INSERT INTO athlete (first_name, last_name, gender, created_at, updated_at)
             VALUES ('X', 'Test', 'M', ?1, ?1)",
            params![now],
        )
        .unwrap();
        let athlete_id = conn.last_insert_rowid();
        conn.execute(
            "INSERT INTO registration (athlete_id, event_id, race_id, created_at)
             VALUES (?1, 'EVT', '10K', ?2)",
            params![athlete_id, now],
        )
        .unwrap();

        let recalc =
            SqliteCategoryRecalc::from_connection(Arc::new(Mutex::new(conn))).unwrap();
        assert_eq!(recalc.recalculate_categories("10K").await.unwrap(), 0);
    }
}
