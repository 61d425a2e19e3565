// 收藏与进度命令

use super::catalog::{category_names, to_summary, CategoryDto, QuestionSummaryDto};
use super::{AppState, CommandResult};
use crate::models::CategoryProgress;
use serde::{Deserialize, Serialize};

/// 收藏传输对象
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteDto {
    pub question: QuestionSummaryDto,
    pub favorited_at: String,
}

/// 分类进度传输对象
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryProgressDto {
    pub category: CategoryDto,
    pub completed: i64,
    pub total: i64,
    pub percentage: f64,
}

/// 进度统计传输对象，只统计已发布题目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressDto {
    pub completed: i64,
    pub total: i64,
    pub percentage: f64,
    pub categories: Vec<CategoryProgressDto>,
}

impl From<CategoryProgress> for CategoryProgressDto {
    fn from(cp: CategoryProgress) -> Self {
        Self {
            category: cp.category.into(),
            completed: cp.progress.completed,
            total: cp.progress.total,
            percentage: cp.progress.percentage,
        }
    }
}

/// 切换收藏，返回切换后是否已收藏
pub fn toggle_favorite(state: &AppState, user_id: &str, question_id: &str) -> CommandResult<bool> {
    Ok(state.tracker.toggle_favorite(user_id, question_id)?)
}

/// 标记题目完成，返回是否为首次完成
pub fn mark_completed(state: &AppState, user_id: &str, question_id: &str) -> CommandResult<bool> {
    Ok(state.tracker.mark_completed(user_id, question_id)?)
}

/// 获取收藏列表
pub fn get_favorites(state: &AppState, user_id: &str) -> CommandResult<Vec<FavoriteDto>> {
    let favorites = state.tracker.favorite_questions(user_id)?;
    let names = category_names(state)?;

    Ok(favorites
        .into_iter()
        .map(|(favorite, question)| FavoriteDto {
            favorited_at: favorite.created_at.to_rfc3339(),
            question: to_summary(question, &names),
        })
        .collect())
}

/// 获取学习进度（总体 + 分类）
pub fn get_progress(state: &AppState, user_id: &str) -> CommandResult<ProgressDto> {
    let summary = state.tracker.progress(user_id)?;
    let categories = state
        .tracker
        .progress_by_category(user_id)?
        .into_iter()
        .map(CategoryProgressDto::from)
        .collect();

    Ok(ProgressDto {
        completed: summary.completed,
        total: summary.total,
        percentage: summary.percentage,
        categories,
    })
}
