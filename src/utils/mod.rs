use std::path::PathBuf;

const APP_DIR_NAME: &str = "interview-bank";
const DB_FILE_NAME: &str = "interview-bank.db";

/// 应用数据目录，优先 XDG_DATA_HOME，其次 $HOME/.local/share
pub fn get_app_data_dir() -> PathBuf {
    let base = std::env::var_os("XDG_DATA_HOME")
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var_os("HOME").map(|home| {
                let mut path = PathBuf::from(home);
                path.push(".local/share");
                path
            })
        })
        .unwrap_or_else(|| PathBuf::from("."));

    base.join(APP_DIR_NAME)
}

pub fn get_database_path() -> PathBuf {
    let mut path = get_app_data_dir();
    path.push(DB_FILE_NAME);
    path
}

/// 转义 LIKE 通配符，配合 `ESCAPE '\'` 使用
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
