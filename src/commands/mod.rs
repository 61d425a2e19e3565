// 命令模块
// 提供供前端调用的命令接口：领域类型转换为可序列化的 DTO，错误转换为 CommandError

pub mod catalog;
pub mod user_state;

use crate::config::Config;
use crate::error::AppError;
use crate::services::{CatalogService, DatabaseService, UserStateTracker};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use catalog::{
    browse_questions,
    get_categories,
    get_question_detail,
    set_question_published,
    BrowseRequest,
    CategoryDto,
    QuestionDetailDto,
    QuestionPageDto,
    QuestionSummaryDto,
};

pub use user_state::{
    get_favorites,
    get_progress,
    mark_completed,
    toggle_favorite,
    CategoryProgressDto,
    FavoriteDto,
    ProgressDto,
};

/// 应用状态，命令之间共享
pub struct AppState {
    pub db: Arc<DatabaseService>,
    pub catalog: CatalogService,
    pub tracker: UserStateTracker,
    pub config: Config,
}

impl AppState {
    pub fn new(db: Arc<DatabaseService>, config: Config) -> Self {
        Self {
            catalog: CatalogService::new(db.clone()),
            tracker: UserStateTracker::new(db.clone()),
            db,
            config,
        }
    }
}

/// 返回给前端的错误
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandError {
    pub code: String,
    pub message: String,
}

impl From<AppError> for CommandError {
    fn from(err: AppError) -> Self {
        if err.code() == "internal" {
            log::error!("Command failed: {}", err);
        }
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

pub type CommandResult<T> = Result<T, CommandError>;
