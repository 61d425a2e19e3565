// 数据库服务模块
// 提供 SQLite 存储：题库分类与题目的持久化，以及收藏/进度表结构

use crate::error::{AppError, AppResult};
use crate::models::{CatalogStats, Category, ImportReport, NewCategory, NewQuestion, Question};
use chrono::Utc;
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, OptionalExtension, Row, Transaction};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// 默认分类，对应题库覆盖的面试主题
pub const DEFAULT_CATEGORIES: [NewCategory<'static>; 7] = [
    NewCategory { name: "C# Language Fundamentals", display_rank: 1 },
    NewCategory { name: "Generics & Variance", display_rank: 2 },
    NewCategory { name: "Nullable Types", display_rank: 3 },
    NewCategory { name: "Iterators & yield", display_rank: 4 },
    NewCategory { name: "ASP.NET Core MVC", display_rank: 5 },
    NewCategory { name: "Dependency Injection & Hosting", display_rank: 6 },
    NewCategory { name: "Configuration & Logging", display_rank: 7 },
];

pub(crate) const QUESTION_COLUMNS: &str =
    "q.id, q.number, q.title, q.body, q.category_id, q.difficulty, q.is_published, q.view_count, q.created_at";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS categories (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        display_rank INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS questions (
        id TEXT PRIMARY KEY,
        number INTEGER NOT NULL UNIQUE,
        title TEXT NOT NULL,
        body TEXT NOT NULL,
        category_id TEXT NOT NULL,
        difficulty TEXT NOT NULL CHECK(difficulty IN ('Beginner', 'Intermediate', 'Advanced')),
        is_published INTEGER NOT NULL DEFAULT 1,
        view_count INTEGER NOT NULL DEFAULT 0 CHECK(view_count >= 0),
        created_at TEXT NOT NULL,
        FOREIGN KEY (category_id) REFERENCES categories(id)
    );

    CREATE INDEX IF NOT EXISTS idx_questions_category ON questions(category_id);
    CREATE INDEX IF NOT EXISTS idx_questions_difficulty ON questions(difficulty);

    CREATE TABLE IF NOT EXISTS favorites (
        user_id TEXT NOT NULL,
        question_id TEXT NOT NULL,
        created_at TEXT NOT NULL,
        PRIMARY KEY (user_id, question_id),
        FOREIGN KEY (question_id) REFERENCES questions(id)
    );

    CREATE TABLE IF NOT EXISTS progress_records (
        user_id TEXT NOT NULL,
        question_id TEXT NOT NULL,
        completed_at TEXT NOT NULL,
        PRIMARY KEY (user_id, question_id),
        FOREIGN KEY (question_id) REFERENCES questions(id)
    );
";

/// 数据库服务
pub struct DatabaseService {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl DatabaseService {
    /// 打开（必要时创建）数据库文件
    pub fn open(db_path: &Path) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;

        let service = Self {
            conn: Mutex::new(conn),
            db_path: Some(db_path.to_path_buf()),
        };
        service.initialize()?;
        log::info!("Opened question bank at {}", db_path.display());
        Ok(service)
    }

    /// 内存数据库，用于测试与临时会话
    pub fn open_in_memory() -> AppResult<Self> {
        let service = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
            db_path: None,
        };
        service.initialize()?;
        Ok(service)
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// 初始化表结构
    pub fn initialize(&self) -> AppResult<()> {
        let conn = self.conn()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        register_fold(&conn)?;
        conn.execute_batch(SCHEMA)?;
        log::debug!("Schema initialized");
        Ok(())
    }

    pub(crate) fn conn(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| AppError::LockPoisoned)
    }

    // ==================== 分类管理 ====================

    /// 写入种子分类，已存在的同名分类跳过；返回新增数量
    pub fn seed_categories(&self, categories: &[NewCategory<'_>]) -> AppResult<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO categories (id, name, display_rank) VALUES (?, ?, ?)",
            )?;
            for category in categories {
                let name = category.name.trim();
                if name.is_empty() {
                    return Err(AppError::validation("category name must not be blank"));
                }
                inserted += stmt.execute(rusqlite::params![
                    Uuid::new_v4().to_string(),
                    name,
                    category.display_rank,
                ])?;
            }
        }
        tx.commit()?;

        log::info!("Seeded {} of {} categories", inserted, categories.len());
        Ok(inserted)
    }

    /// 按显示顺序列出所有分类
    pub fn list_categories(&self) -> AppResult<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, display_rank FROM categories ORDER BY display_rank, name",
        )?;
        let rows = stmt.query_map([], Self::row_to_category)?;

        let mut categories = Vec::new();
        for row in rows {
            categories.push(row?);
        }
        Ok(categories)
    }

    pub fn get_category(&self, id: &str) -> AppResult<Option<Category>> {
        let conn = self.conn()?;
        let category = conn
            .query_row(
                "SELECT id, name, display_rank FROM categories WHERE id = ?",
                rusqlite::params![id],
                Self::row_to_category,
            )
            .optional()?;
        Ok(category)
    }

    // ==================== 题目管理 ====================

    /// 添加单道题目，自动分配编号
    pub fn add_question(&self, question: &NewQuestion) -> AppResult<Question> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let created = Self::insert_question(&tx, question)?;
        tx.commit()?;

        log::debug!("Added question #{} ({})", created.number, created.id);
        Ok(created)
    }

    /// 批量导入题目；无效条目跳过并记录原因
    pub fn import_questions(&self, questions: &[NewQuestion]) -> AppResult<ImportReport> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let mut imported = Vec::new();
        let mut errors = Vec::new();
        for (idx, question) in questions.iter().enumerate() {
            match Self::insert_question(&tx, question) {
                Ok(created) => imported.push(created),
                Err(AppError::Database(e)) => return Err(AppError::Database(e)),
                Err(e) => {
                    log::warn!("Skipping question {}: {}", idx + 1, e);
                    errors.push(format!("Question {}: {}", idx + 1, e));
                }
            }
        }
        tx.commit()?;

        log::info!(
            "Imported {} questions, {} skipped",
            imported.len(),
            errors.len()
        );
        Ok(ImportReport { imported, errors })
    }

    fn insert_question(tx: &Transaction<'_>, question: &NewQuestion) -> AppResult<Question> {
        let title = question.title.trim();
        if title.is_empty() {
            return Err(AppError::validation("question title must not be blank"));
        }

        let category_exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM categories WHERE id = ?)",
            rusqlite::params![question.category_id],
            |row| row.get(0),
        )?;
        if !category_exists {
            return Err(AppError::not_found("category", question.category_id.as_str()));
        }

        let number: i64 = tx.query_row(
            "SELECT COALESCE(MAX(number), 0) + 1 FROM questions",
            [],
            |row| row.get(0),
        )?;

        let created = Question {
            id: Uuid::new_v4().to_string(),
            number,
            title: title.to_string(),
            body: question.body.clone(),
            category_id: question.category_id.clone(),
            difficulty: question.difficulty,
            is_published: question.is_published,
            view_count: 0,
            created_at: Utc::now(),
        };

        tx.execute(
            "INSERT INTO questions
             (id, number, title, body, category_id, difficulty, is_published, view_count, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?)",
            rusqlite::params![
                created.id,
                created.number,
                created.title,
                created.body,
                created.category_id,
                created.difficulty,
                created.is_published,
                created.created_at,
            ],
        )?;

        Ok(created)
    }

    /// 获取单道题目
    pub fn get_question(&self, id: &str) -> AppResult<Option<Question>> {
        let conn = self.conn()?;
        Self::find_question(&conn, id)
    }

    pub(crate) fn find_question(conn: &Connection, id: &str) -> AppResult<Option<Question>> {
        let question = conn
            .query_row(
                &format!("SELECT {} FROM questions q WHERE q.id = ?", QUESTION_COLUMNS),
                rusqlite::params![id],
                Self::row_to_question,
            )
            .optional()?;
        Ok(question)
    }

    pub(crate) fn question_exists(conn: &Connection, id: &str) -> AppResult<bool> {
        let exists = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM questions WHERE id = ?)",
            rusqlite::params![id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// 浏览次数 +1，返回更新后的题目
    pub fn increment_view_count(&self, id: &str) -> AppResult<Question> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE questions SET view_count = view_count + 1 WHERE id = ?",
            rusqlite::params![id],
        )?;
        if changed == 0 {
            return Err(AppError::not_found("question", id));
        }
        Self::find_question(&conn, id)?.ok_or_else(|| AppError::not_found("question", id))
    }

    /// 设置发布状态
    pub fn set_published(&self, id: &str, published: bool) -> AppResult<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE questions SET is_published = ? WHERE id = ?",
            rusqlite::params![published, id],
        )?;
        if changed == 0 {
            return Err(AppError::not_found("question", id));
        }
        log::debug!("Question {} published = {}", id, published);
        Ok(())
    }

    pub fn count_questions(&self) -> AppResult<i64> {
        let conn = self.conn()?;
        Self::question_total(&conn)
    }

    pub(crate) fn question_total(conn: &Connection) -> AppResult<i64> {
        let total = conn.query_row("SELECT COUNT(*) FROM questions", [], |row| row.get(0))?;
        Ok(total)
    }

    /// 题库概况统计
    pub fn stats(&self) -> AppResult<CatalogStats> {
        let conn = self.conn()?;
        let stats = conn.query_row(
            "SELECT
                (SELECT COUNT(*) FROM categories),
                (SELECT COUNT(*) FROM questions),
                (SELECT COUNT(*) FROM questions WHERE is_published = 1)",
            [],
            |row| {
                Ok(CatalogStats {
                    categories: row.get(0)?,
                    questions: row.get(1)?,
                    published_questions: row.get(2)?,
                })
            },
        )?;
        Ok(stats)
    }

    // ==================== 辅助方法 ====================

    pub(crate) fn row_to_category(row: &Row) -> rusqlite::Result<Category> {
        Ok(Category {
            id: row.get(0)?,
            name: row.get(1)?,
            display_rank: row.get(2)?,
        })
    }

    /// 列顺序与 QUESTION_COLUMNS 一致
    pub(crate) fn row_to_question(row: &Row) -> rusqlite::Result<Question> {
        Ok(Question {
            id: row.get(0)?,
            number: row.get(1)?,
            title: row.get(2)?,
            body: row.get(3)?,
            category_id: row.get(4)?,
            difficulty: row.get(5)?,
            is_published: row.get(6)?,
            view_count: row.get(7)?,
            created_at: row.get(8)?,
        })
    }
}

/// 注册 `fold(text)`：Unicode 小写折叠，内置 LIKE 只折叠 ASCII
fn register_fold(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "fold",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text = ctx.get::<Option<String>>(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Difficulty;

    fn seeded() -> (DatabaseService, Vec<Category>) {
        let db = DatabaseService::open_in_memory().unwrap();
        db.seed_categories(&DEFAULT_CATEGORIES).unwrap();
        let categories = db.list_categories().unwrap();
        (db, categories)
    }

    fn new_question(category_id: &str, title: &str) -> NewQuestion {
        NewQuestion {
            title: title.to_string(),
            body: "Explain it.".to_string(),
            category_id: category_id.to_string(),
            difficulty: Difficulty::Intermediate,
            is_published: true,
        }
    }

    #[test]
    fn seeding_is_idempotent_and_ordered_by_rank() {
        let (db, categories) = seeded();
        assert_eq!(categories.len(), 7);
        assert_eq!(categories[0].name, "C# Language Fundamentals");
        assert!(categories.windows(2).all(|w| w[0].display_rank <= w[1].display_rank));
        assert_eq!(db.get_category(&categories[4].id).unwrap().unwrap().name, "ASP.NET Core MVC");
        assert!(db.get_category("missing").unwrap().is_none());

        assert_eq!(db.seed_categories(&DEFAULT_CATEGORIES).unwrap(), 0);
        assert_eq!(db.list_categories().unwrap().len(), 7);
    }

    #[test]
    fn blank_category_name_is_rejected() {
        let db = DatabaseService::open_in_memory().unwrap();
        let err = db
            .seed_categories(&[NewCategory { name: "  ", display_rank: 1 }])
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn questions_get_sequential_numbers() {
        let (db, categories) = seeded();
        let first = db.add_question(&new_question(&categories[0].id, "What is yield?")).unwrap();
        let second = db.add_question(&new_question(&categories[1].id, "What is covariance?")).unwrap();

        assert_eq!(first.number, 1);
        assert_eq!(second.number, 2);
        assert_eq!(first.view_count, 0);

        let stored = db.get_question(&second.id).unwrap().unwrap();
        assert_eq!(stored.title, "What is covariance?");
        assert_eq!(stored.category_id, categories[1].id);
        assert_eq!(stored.difficulty, Difficulty::Intermediate);
        assert_eq!(
            stored.created_at.timestamp_millis(),
            second.created_at.timestamp_millis()
        );
    }

    #[test]
    fn question_requires_existing_category() {
        let (db, _) = seeded();
        let err = db.add_question(&new_question("missing", "Orphan")).unwrap_err();
        assert!(matches!(err, AppError::NotFound { entity: "category", .. }));
        assert_eq!(db.count_questions().unwrap(), 0);
    }

    #[test]
    fn import_skips_invalid_entries() {
        let (db, categories) = seeded();
        let report = db
            .import_questions(&[
                new_question(&categories[0].id, "Valid one"),
                new_question(&categories[0].id, "   "),
                new_question("nope", "Bad category"),
                new_question(&categories[2].id, "Valid two"),
            ])
            .unwrap();

        assert_eq!(report.imported.len(), 2);
        assert_eq!(report.errors.len(), 2);
        assert!(!report.success());
        assert!(report.errors[0].starts_with("Question 2:"));
        assert_eq!(report.imported[1].number, 2);
    }

    #[test]
    fn view_count_only_increases() {
        let (db, categories) = seeded();
        let q = db.add_question(&new_question(&categories[0].id, "Views")).unwrap();

        assert_eq!(db.increment_view_count(&q.id).unwrap().view_count, 1);
        assert_eq!(db.increment_view_count(&q.id).unwrap().view_count, 2);
        assert!(matches!(
            db.increment_view_count("missing"),
            Err(AppError::NotFound { .. })
        ));
    }

    #[test]
    fn publication_toggle_and_stats() {
        let (db, categories) = seeded();
        let q = db.add_question(&new_question(&categories[0].id, "Toggle")).unwrap();
        db.set_published(&q.id, false).unwrap();

        assert!(!db.get_question(&q.id).unwrap().unwrap().is_published);
        let stats = db.stats().unwrap();
        assert_eq!(stats.categories, 7);
        assert_eq!(stats.questions, 1);
        assert_eq!(stats.published_questions, 0);

        assert!(db.set_published("missing", true).is_err());
    }

    #[test]
    fn file_database_persists_between_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("bank.db");
        {
            let db = DatabaseService::open(&path).unwrap();
            db.seed_categories(&DEFAULT_CATEGORIES[..2]).unwrap();
        }
        let db = DatabaseService::open(&path).unwrap();
        assert_eq!(db.list_categories().unwrap().len(), 2);
        assert_eq!(db.db_path(), Some(path.as_path()));
    }
}
