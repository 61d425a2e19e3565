// 服务模块
// 提供核心业务逻辑服务

pub mod catalog;
pub mod database;
pub mod markdown;
pub mod tracker;

pub use catalog::CatalogService;
pub use database::{DatabaseService, DEFAULT_CATEGORIES};
pub use markdown::{plain_excerpt, render_markdown};
pub use tracker::UserStateTracker;
