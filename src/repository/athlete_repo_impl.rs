// ==========================================
// 赛事报名管理系统 - 选手仓储 rusqlite 实现
// ==========================================
// 职责: athlete / registration / import_batch 表的数据访问
// ==========================================

use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use crate::domain::athlete::Athlete;
use crate::domain::entry::{ImportBatch, ImportTarget, RawEntryRecord};
use crate::domain::types::Gender;
use crate::repository::athlete_repo::AthleteRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// SqliteAthleteRepository
// ==========================================
pub struct SqliteAthleteRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteAthleteRepository {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::ConnectionError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建(对传入连接再次应用统一 PRAGMA,幂等)
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)
                .map_err(|e| RepositoryError::ConnectionError(e.to_string()))?;
        }

        Ok(Self { conn })
    }

    fn lock(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

#[async_trait]
impl AthleteRepository for SqliteAthleteRepository {
    async fn find_athletes_by_name(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> RepositoryResult<Vec<Athlete>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT athlete_id, first_name, last_name, gender, birth_date, birth_year,
                   city, club, email, phone, created_at, updated_at
            FROM athlete
            WHERE LOWER(first_name) = LOWER(?1) AND LOWER(last_name) = LOWER(?2)
            ORDER BY athlete_id
            "#,
        )?;

        let rows = stmt.query_map(params![first_name.trim(), last_name.trim()], |row| {
            Ok(Athlete {
                athlete_id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                gender: Gender::from_db_str(&row.get::<_, String>(3)?),
                birth_date: row.get(4)?,
                birth_year: row.get(5)?,
                city: row.get(6)?,
                club: row.get(7)?,
                email: row.get(8)?,
                phone: row.get(9)?,
                created_at: row.get(10)?,
                updated_at: row.get(11)?,
            })
        })?;

        let mut athletes = Vec::new();
        for row in rows {
            athletes.push(row?);
        }

        Ok(athletes)
    }

    async fn is_registered(&self, athlete_id: i64, race_id: &str) -> RepositoryResult<bool> {
        let conn = self.lock()?;

        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM registration WHERE athlete_id = ?1 AND race_id = ?2 LIMIT 1",
                params![athlete_id, race_id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(found.is_some())
    }

    async fn create_athlete(&self, record: &RawEntryRecord) -> RepositoryResult<i64> {
        let conn = self.lock()?;
        let now = Utc::now();

        conn.execute(
            r#"
            INSERT INTO athlete (
                first_name, last_name, gender, birth_date, birth_year,
                city, club, email, phone, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                record.first_name.as_deref().unwrap_or("").trim(),
                record.last_name.as_deref().unwrap_or("").trim(),
                record.gender.as_str(),
                record.birth_date,
                record.birth_year,
                record.city,
                record.club,
                record.email,
                record.phone,
                now,
                now,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    async fn create_registration(
        &self,
        athlete_id: i64,
        target: &ImportTarget,
        record: &RawEntryRecord,
    ) -> RepositoryResult<i64> {
        let conn = self.lock()?;

        let result = conn.execute(
            r#"
            INSERT INTO registration (
                athlete_id, event_id, race_id, bib_number, category, finish_time,
                overall_rank, gender_rank, category_rank, payment_amount, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                athlete_id,
                target.event_id,
                target.race_id,
                record.bib_number,
                record.category,
                record.finish_time,
                record.overall_rank,
                record.gender_rank,
                record.category_rank,
                record.payment_amount,
                record.notes,
                Utc::now(),
            ],
        );

        match result {
            Ok(_) => Ok(conn.last_insert_rowid()),
            // 唯一约束兜底: 同一选手同一比赛的重复报名显式暴露给调用方
            Err(rusqlite::Error::SqliteFailure(_, Some(msg)))
                if msg.contains("UNIQUE constraint failed: registration") =>
            {
                Err(RepositoryError::DuplicateRegistration {
                    athlete_id,
                    race_id: target.race_id.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn insert_import_batch(&self, batch: &ImportBatch) -> RepositoryResult<()> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT INTO import_batch (
                batch_id, race_id, source_label, total_rows, imported,
                skipped_duplicates, error_rows, elapsed_ms, imported_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                batch.batch_id,
                batch.race_id,
                batch.source_label,
                batch.total_rows,
                batch.imported,
                batch.skipped_duplicates,
                batch.error_rows,
                batch.elapsed_ms,
                batch.imported_at,
            ],
        )?;

        Ok(())
    }

    async fn count_athletes(&self) -> RepositoryResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM athlete", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    async fn count_registrations(&self, race_id: &str) -> RepositoryResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM registration WHERE race_id = ?1",
            params![race_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::initialize_schema;
    use crate::domain::entry::RawEntryRecord;
    use chrono::NaiveDate;

    fn test_repo() -> SqliteAthleteRepository {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        SqliteAthleteRepository::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    fn record(first: &str, last: &str, birth: Option<NaiveDate>) -> RawEntryRecord {
        let mut record = RawEntryRecord::empty(1);
        record.first_name = Some(first.to_string());
        record.last_name = Some(last.to_string());
        record.birth_date = birth;
        record
    }

    fn target() -> ImportTarget {
        ImportTarget {
            event_id: "EVT-2024".to_string(),
            race_id: "10K-2024".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_find_case_insensitive() {
        let repo = test_repo();
        let birth = NaiveDate::from_ymd_opt(1990, 3, 5);

        let id = repo.create_athlete(&record("Marie", "Dupont", birth)).await.unwrap();
        assert!(id > 0);

        let found = repo.find_athletes_by_name("marie", "DUPONT").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].athlete_id, id);
        assert_eq!(found[0].birth_date, birth);
    }

    #[tokio::test]
    async fn test_duplicate_registration_rejected() {
        let repo = test_repo();
        let rec = record("Marie", "Dupont", NaiveDate::from_ymd_opt(1990, 3, 5));

        let athlete_id = repo.create_athlete(&rec).await.unwrap();
        repo.create_registration(athlete_id, &target(), &rec).await.unwrap();

        // 第二次关联同一比赛: 唯一约束兜底
        let err = repo
            .create_registration(athlete_id, &target(), &rec)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::DuplicateRegistration { .. }
        ));

        // 另一场比赛仍可报名
        let other = ImportTarget {
            event_id: "EVT-2024".to_string(),
            race_id: "SEMI-2024".to_string(),
        };
        assert!(repo.create_registration(athlete_id, &other, &rec).await.is_ok());
    }

    #[tokio::test]
    async fn test_is_registered() {
        let repo = test_repo();
        let rec = record("Luc", "Martin", NaiveDate::from_ymd_opt(1985, 7, 1));

        let athlete_id = repo.create_athlete(&rec).await.unwrap();
        assert!(!repo.is_registered(athlete_id, "10K-2024").await.unwrap());

        repo.create_registration(athlete_id, &target(), &rec).await.unwrap();
        assert!(repo.is_registered(athlete_id, "10K-2024").await.unwrap());
    }
}
