// 用户状态服务
// 收藏与完成记录，与题库内容相互独立

use crate::error::{AppError, AppResult};
use crate::models::{CategoryProgress, Favorite, ProgressRecord, ProgressSummary, Question};
use crate::services::database::{DatabaseService, QUESTION_COLUMNS};
use chrono::Utc;
use rusqlite::Connection;
use std::sync::Arc;

pub struct UserStateTracker {
    db: Arc<DatabaseService>,
}

impl UserStateTracker {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    // ==================== 收藏 ====================

    /// 切换收藏状态，返回切换后是否处于收藏
    pub fn toggle_favorite(&self, user_id: &str, question_id: &str) -> AppResult<bool> {
        let user_id = validate_user(user_id)?;
        let mut conn = self.db.conn()?;
        ensure_question(&conn, question_id)?;

        let tx = conn.transaction()?;
        let removed = tx.execute(
            "DELETE FROM favorites WHERE user_id = ? AND question_id = ?",
            rusqlite::params![user_id, question_id],
        )?;
        if removed == 0 {
            tx.execute(
                "INSERT INTO favorites (user_id, question_id, created_at) VALUES (?, ?, ?)",
                rusqlite::params![user_id, question_id, Utc::now()],
            )?;
        }
        tx.commit()?;

        let favorited = removed == 0;
        log::debug!("User {} favorite {} -> {}", user_id, question_id, favorited);
        Ok(favorited)
    }

    pub fn is_favorite(&self, user_id: &str, question_id: &str) -> AppResult<bool> {
        let user_id = validate_user(user_id)?;
        let conn = self.db.conn()?;
        let exists = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM favorites WHERE user_id = ? AND question_id = ?)",
            rusqlite::params![user_id, question_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// 用户收藏列表，最新在前
    pub fn favorites(&self, user_id: &str) -> AppResult<Vec<Favorite>> {
        let user_id = validate_user(user_id)?;
        let conn = self.db.conn()?;
        let mut stmt = conn.prepare(
            "SELECT user_id, question_id, created_at FROM favorites
             WHERE user_id = ? ORDER BY created_at DESC, question_id",
        )?;
        let rows = stmt.query_map(rusqlite::params![user_id], |row| {
            Ok(Favorite {
                user_id: row.get(0)?,
                question_id: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?;

        let mut favorites = Vec::new();
        for row in rows {
            favorites.push(row?);
        }
        Ok(favorites)
    }

    /// 收藏列表连同题目内容，一次查询完成
    pub fn favorite_questions(&self, user_id: &str) -> AppResult<Vec<(Favorite, Question)>> {
        let user_id = validate_user(user_id)?;
        let conn = self.db.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {}, f.created_at FROM favorites f
             JOIN questions q ON q.id = f.question_id
             WHERE f.user_id = ? ORDER BY f.created_at DESC, f.question_id",
            QUESTION_COLUMNS
        ))?;
        let rows = stmt.query_map(rusqlite::params![user_id], |row| {
            let question = DatabaseService::row_to_question(row)?;
            let favorite = Favorite {
                user_id: user_id.to_string(),
                question_id: question.id.clone(),
                created_at: row.get(9)?,
            };
            Ok((favorite, question))
        })?;

        let mut favorites = Vec::new();
        for row in rows {
            favorites.push(row?);
        }
        Ok(favorites)
    }

    // ==================== 学习进度 ====================

    /// 标记完成；仅首次写入，返回是否新建了记录
    pub fn mark_completed(&self, user_id: &str, question_id: &str) -> AppResult<bool> {
        let user_id = validate_user(user_id)?;
        let conn = self.db.conn()?;
        ensure_question(&conn, question_id)?;

        let inserted = conn.execute(
            "INSERT OR IGNORE INTO progress_records (user_id, question_id, completed_at)
             VALUES (?, ?, ?)",
            rusqlite::params![user_id, question_id, Utc::now()],
        )?;

        log::debug!("User {} completed {} (new: {})", user_id, question_id, inserted > 0);
        Ok(inserted > 0)
    }

    pub fn is_completed(&self, user_id: &str, question_id: &str) -> AppResult<bool> {
        let user_id = validate_user(user_id)?;
        let conn = self.db.conn()?;
        let exists = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM progress_records WHERE user_id = ? AND question_id = ?)",
            rusqlite::params![user_id, question_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// 完成记录，最新在前
    pub fn completed_records(&self, user_id: &str) -> AppResult<Vec<ProgressRecord>> {
        let user_id = validate_user(user_id)?;
        let conn = self.db.conn()?;
        let mut stmt = conn.prepare(
            "SELECT user_id, question_id, completed_at FROM progress_records
             WHERE user_id = ? ORDER BY completed_at DESC, question_id",
        )?;
        let rows = stmt.query_map(rusqlite::params![user_id], |row| {
            Ok(ProgressRecord {
                user_id: row.get(0)?,
                question_id: row.get(1)?,
                completed_at: row.get(2)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// 总体进度：已完成 / 已发布题目总数
    ///
    /// 只统计已发布题目，与默认浏览范围一致；题目下架后其完成记录保留但不计入。
    pub fn progress(&self, user_id: &str) -> AppResult<ProgressSummary> {
        let user_id = validate_user(user_id)?;
        let conn = self.db.conn()?;

        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM questions WHERE is_published = 1",
            [],
            |row| row.get(0),
        )?;
        let completed: i64 = conn.query_row(
            "SELECT COUNT(*) FROM progress_records p
             JOIN questions q ON q.id = p.question_id
             WHERE p.user_id = ? AND q.is_published = 1",
            rusqlite::params![user_id],
            |row| row.get(0),
        )?;

        Ok(ProgressSummary::new(completed, total))
    }

    /// 按分类统计进度（仅已发布题目），按分类显示顺序排列
    pub fn progress_by_category(&self, user_id: &str) -> AppResult<Vec<CategoryProgress>> {
        let user_id = validate_user(user_id)?;
        let conn = self.db.conn()?;
        let mut stmt = conn.prepare(
            "SELECT c.id, c.name, c.display_rank,
                    COUNT(q.id),
                    COUNT(p.question_id)
             FROM categories c
             LEFT JOIN questions q ON q.category_id = c.id AND q.is_published = 1
             LEFT JOIN progress_records p ON p.question_id = q.id AND p.user_id = ?
             GROUP BY c.id, c.name, c.display_rank
             ORDER BY c.display_rank, c.name",
        )?;
        let rows = stmt.query_map(rusqlite::params![user_id], |row| {
            let category = DatabaseService::row_to_category(row)?;
            let total: i64 = row.get(3)?;
            let completed: i64 = row.get(4)?;
            Ok(CategoryProgress {
                category,
                progress: ProgressSummary::new(completed, total),
            })
        })?;

        let mut breakdown = Vec::new();
        for row in rows {
            breakdown.push(row?);
        }
        Ok(breakdown)
    }
}

pub(crate) fn validate_user(user_id: &str) -> AppResult<&str> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("user id must not be blank"));
    }
    Ok(trimmed)
}

fn ensure_question(conn: &Connection, question_id: &str) -> AppResult<()> {
    if DatabaseService::question_exists(conn, question_id)? {
        Ok(())
    } else {
        Err(AppError::not_found("question", question_id))
    }
}
