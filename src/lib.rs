//! 面试题库核心库
//! 题目分类浏览、收藏与学习进度追踪，基于 SQLite 存储

pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod utils;

pub use commands::AppState;
pub use config::Config;
pub use error::{AppError, AppResult};
