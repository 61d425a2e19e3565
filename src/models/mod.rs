use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 题目分类
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub display_rank: i32,
}

/// 待写入的分类（种子数据）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewCategory<'a> {
    pub name: &'a str,
    pub display_rank: i32,
}

/// 题目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub number: i64,
    pub title: String,
    pub body: String,              // Markdown 原文
    pub category_id: String,
    pub difficulty: Difficulty,
    pub is_published: bool,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
}

/// 导入用的题目数据，编号与 ID 由存储层分配
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewQuestion {
    pub title: String,
    pub body: String,
    pub category_id: String,
    pub difficulty: Difficulty,
    #[serde(default = "default_published")]
    pub is_published: bool,
}

fn default_published() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown difficulty: {0}")]
pub struct ParseDifficultyError(String);

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseDifficultyError(s.to_string()))
    }
}

impl ToSql for Difficulty {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Difficulty {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// 收藏记录，(user_id, question_id) 唯一
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    pub user_id: String,
    pub question_id: String,
    pub created_at: DateTime<Utc>,
}

/// 完成记录，每个用户每道题只写入一次
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub user_id: String,
    pub question_id: String,
    pub completed_at: DateTime<Utc>,
}

/// 浏览筛选条件，各字段之间为“与”关系
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionFilter {
    pub category_id: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub search_text: Option<String>,
    #[serde(default = "default_published")]
    pub published_only: bool,
}

impl Default for QuestionFilter {
    fn default() -> Self {
        Self {
            category_id: None,
            difficulty: None,
            search_text: None,
            published_only: true,
        }
    }
}

/// 分页结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: i64,
    pub page: i64,
    pub page_size: i64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> i64 {
        if self.page_size <= 0 {
            return 0;
        }
        self.total_count / self.page_size + i64::from(self.total_count % self.page_size != 0)
    }
}

/// 学习进度汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub completed: i64,
    pub total: i64,
    pub percentage: f64,
}

impl ProgressSummary {
    pub fn new(completed: i64, total: i64) -> Self {
        let percentage = if total > 0 {
            completed as f64 * 100.0 / total as f64
        } else {
            0.0
        };
        Self {
            completed,
            total,
            percentage,
        }
    }
}

/// 按分类统计的进度
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryProgress {
    pub category: Category,
    pub progress: ProgressSummary,
}

/// 批量导入结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub imported: Vec<Question>,
    pub errors: Vec<String>,
}

impl ImportReport {
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// 题库概况
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub categories: i64,
    pub questions: i64,
    pub published_questions: i64,
}
