use anyhow::Context;
use interview_bank::services::{DatabaseService, DEFAULT_CATEGORIES};
use interview_bank::{logging, AppState, Config};
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    logging::setup_logger(&config.log_level).context("Failed to initialize logger")?;

    log::info!(
        "Starting interview-bank {} on {}",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS
    );

    // 初始化数据库
    let db = DatabaseService::open(&config.database_path).with_context(|| {
        format!("Failed to open database at {}", config.database_path.display())
    })?;
    let db = Arc::new(db);

    if config.seed_default_categories {
        db.seed_categories(&DEFAULT_CATEGORIES)
            .context("Failed to seed default categories")?;
    }

    let state = AppState::new(db, config);
    let stats = state.catalog.stats().context("Failed to read catalog stats")?;
    log::info!(
        "Question bank ready: {} categories, {} questions ({} published)",
        stats.categories,
        stats.questions,
        stats.published_questions
    );

    Ok(())
}
