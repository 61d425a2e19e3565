use log::LevelFilter;

/// 初始化 fern 日志，输出到 stderr
pub fn setup_logger(level: &str) -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(parse_level(level))
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}

/// 无法识别的级别回退为 info
pub fn parse_level(level: &str) -> LevelFilter {
    level.trim().parse().unwrap_or(LevelFilter::Info)
}
