//! 题库浏览服务
//!
//! 按分类、难度、关键字组合筛选题目，按题号排序分页。

use crate::error::{AppError, AppResult};
use crate::models::{CatalogStats, Category, Page, Question, QuestionFilter};
use crate::services::database::{DatabaseService, QUESTION_COLUMNS};
use crate::utils::escape_like;
use rusqlite::types::ToSql;
use std::sync::Arc;

pub struct CatalogService {
    db: Arc<DatabaseService>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    /// 列出题目（分页+筛选）
    ///
    /// `page` 从 1 开始；`page` 或 `page_size` 小于等于 0 时返回校验错误。
    /// 未知分类不是错误，结果为空。
    pub fn list(&self, filter: &QuestionFilter, page: i64, page_size: i64) -> AppResult<Page<Question>> {
        if page <= 0 {
            return Err(AppError::validation(format!("page must be positive, got {}", page)));
        }
        if page_size <= 0 {
            return Err(AppError::validation(format!(
                "page_size must be positive, got {}",
                page_size
            )));
        }
        let offset = (page - 1)
            .checked_mul(page_size)
            .ok_or_else(|| AppError::validation("page offset out of range"))?;

        // 构建 WHERE 子句
        let mut conditions: Vec<&str> = Vec::new();
        let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();

        if filter.published_only {
            conditions.push("q.is_published = 1");
        }
        if let Some(category_id) = &filter.category_id {
            conditions.push("q.category_id = ?");
            params_vec.push(Box::new(category_id.clone()));
        }
        if let Some(difficulty) = filter.difficulty {
            conditions.push("q.difficulty = ?");
            params_vec.push(Box::new(difficulty));
        }
        if let Some(search) = filter.search_text.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            conditions.push("(fold(q.title) LIKE ? ESCAPE '\\' OR fold(q.body) LIKE ? ESCAPE '\\')");
            let pattern = format!("%{}%", escape_like(&search.to_lowercase()));
            params_vec.push(Box::new(pattern.clone()));
            params_vec.push(Box::new(pattern));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let conn = self.db.conn()?;

        let total_count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM questions q {}", where_clause),
            rusqlite::params_from_iter(params_vec.iter()),
            |row| row.get(0),
        )?;

        let mut items = Vec::new();
        if total_count > offset {
            params_vec.push(Box::new(page_size));
            params_vec.push(Box::new(offset));

            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM questions q {} ORDER BY q.number ASC LIMIT ? OFFSET ?",
                QUESTION_COLUMNS, where_clause
            ))?;
            let rows = stmt.query_map(
                rusqlite::params_from_iter(params_vec.iter()),
                DatabaseService::row_to_question,
            )?;
            for row in rows {
                items.push(row?);
            }
        }

        log::debug!(
            "Listed {} of {} questions (page {}, size {})",
            items.len(),
            total_count,
            page,
            page_size
        );

        Ok(Page {
            items,
            total_count,
            page,
            page_size,
        })
    }

    /// 只读获取题目
    pub fn get_question(&self, id: &str) -> AppResult<Question> {
        self.db
            .get_question(id)?
            .ok_or_else(|| AppError::not_found("question", id))
    }

    /// 打开题目详情，浏览次数 +1
    pub fn open_question(&self, id: &str) -> AppResult<Question> {
        self.db.increment_view_count(id)
    }

    pub fn set_published(&self, id: &str, published: bool) -> AppResult<()> {
        self.db.set_published(id, published)
    }

    pub fn categories(&self) -> AppResult<Vec<Category>> {
        self.db.list_categories()
    }

    pub fn stats(&self) -> AppResult<CatalogStats> {
        self.db.stats()
    }
}
