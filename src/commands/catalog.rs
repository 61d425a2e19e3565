// 题库浏览命令

use super::{AppState, CommandResult};
use crate::error::AppError;
use crate::models::{Category, Difficulty, Question, QuestionFilter};
use crate::services::tracker::validate_user;
use crate::services::{plain_excerpt, render_markdown};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const EXCERPT_CHARS: usize = 160;

/// 分类传输对象
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryDto {
    pub id: String,
    pub name: String,
    pub display_rank: i32,
}

/// 列表项传输对象
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSummaryDto {
    pub id: String,
    pub number: i64,
    pub title: String,
    pub excerpt: String,
    pub category_id: String,
    pub category_name: String,
    pub difficulty: String,
    pub view_count: i64,
    pub created_at: String,
}

/// 分页列表传输对象
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionPageDto {
    pub items: Vec<QuestionSummaryDto>,
    pub total_count: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

/// 题目详情传输对象
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionDetailDto {
    pub id: String,
    pub number: i64,
    pub title: String,
    pub body: String,
    pub body_html: String,
    pub category_id: String,
    pub category_name: String,
    pub difficulty: String,
    pub is_published: bool,
    pub view_count: i64,
    pub created_at: String,
    pub is_favorite: Option<bool>,
    pub is_completed: Option<bool>,
}

/// 浏览请求（前端传入）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowseRequest {
    pub category_id: Option<String>,
    pub difficulty: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub include_unpublished: bool,
}

impl From<Category> for CategoryDto {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            display_rank: c.display_rank,
        }
    }
}

pub(crate) fn category_names(state: &AppState) -> Result<HashMap<String, String>, AppError> {
    Ok(state
        .catalog
        .categories()?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect())
}

pub(crate) fn to_summary(q: Question, names: &HashMap<String, String>) -> QuestionSummaryDto {
    QuestionSummaryDto {
        excerpt: plain_excerpt(&q.body, EXCERPT_CHARS),
        category_name: names.get(&q.category_id).cloned().unwrap_or_default(),
        id: q.id,
        number: q.number,
        title: q.title,
        category_id: q.category_id,
        difficulty: q.difficulty.to_string(),
        view_count: q.view_count,
        created_at: q.created_at.to_rfc3339(),
    }
}

/// 获取分类列表
pub fn get_categories(state: &AppState) -> CommandResult<Vec<CategoryDto>> {
    let categories = state.catalog.categories()?;
    Ok(categories.into_iter().map(CategoryDto::from).collect())
}

/// 浏览题目
pub fn browse_questions(state: &AppState, request: BrowseRequest) -> CommandResult<QuestionPageDto> {
    let page_size = request.page_size.unwrap_or(state.config.default_page_size);
    if page_size > state.config.max_page_size {
        return Err(AppError::validation(format!(
            "page_size must not exceed {}",
            state.config.max_page_size
        ))
        .into());
    }

    let difficulty = request
        .difficulty
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .map(|d| d.parse::<Difficulty>())
        .transpose()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let filter = QuestionFilter {
        category_id: request.category_id.filter(|c| !c.is_empty()),
        difficulty,
        search_text: request.search,
        published_only: !request.include_unpublished,
    };

    let page = state
        .catalog
        .list(&filter, request.page.unwrap_or(1), page_size)?;
    let names = category_names(state)?;
    let total_pages = page.total_pages();

    Ok(QuestionPageDto {
        items: page
            .items
            .into_iter()
            .map(|q| to_summary(q, &names))
            .collect(),
        total_count: page.total_count,
        page: page.page,
        page_size: page.page_size,
        total_pages,
    })
}

/// 打开题目详情（浏览次数 +1）；传入 user_id 时附带收藏与完成状态
pub fn get_question_detail(
    state: &AppState,
    id: &str,
    user_id: Option<&str>,
) -> CommandResult<QuestionDetailDto> {
    // 先校验用户，避免无效请求计入浏览次数
    let user_id = user_id.map(validate_user).transpose()?;
    let q = state.catalog.open_question(id)?;
    let names = category_names(state)?;

    let (is_favorite, is_completed) = match user_id {
        Some(user) => (
            Some(state.tracker.is_favorite(user, &q.id)?),
            Some(state.tracker.is_completed(user, &q.id)?),
        ),
        None => (None, None),
    };

    Ok(QuestionDetailDto {
        body_html: render_markdown(&q.body),
        category_name: names.get(&q.category_id).cloned().unwrap_or_default(),
        id: q.id,
        number: q.number,
        title: q.title,
        body: q.body,
        category_id: q.category_id,
        difficulty: q.difficulty.to_string(),
        is_published: q.is_published,
        view_count: q.view_count,
        created_at: q.created_at.to_rfc3339(),
        is_favorite,
        is_completed,
    })
}

/// 设置题目发布状态
pub fn set_question_published(state: &AppState, id: &str, published: bool) -> CommandResult<()> {
    state.catalog.set_published(id, published)?;
    Ok(())
}
