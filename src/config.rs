use directories::ProjectDirs;
use std::fs;
use tracing::debug;

// Include the JSON file at compile time
const MIRRORS_JSON: &str = include_str!("../assets/mirrors.json");

/// 单个探测的超时时间 (秒); 悬挂的节点按失败落定, 不会拖住整轮
pub const PROBE_TIMEOUT_SECS: u64 = 5;

/// 延迟缓存有效期: 30 分钟
pub const CACHE_TTL_MS: u64 = 30 * 60 * 1000;

/// Retrieve the mirror URL list
/// Strategy:
/// 1. Try to load from User Config (~/.config/ghmirror/mirrors.json)
/// 2. Fallback to built-in assets/mirrors.json
pub fn load_mirror_urls() -> Vec<String> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "ghmirror") {
        let config_path = proj_dirs.config_dir().join("mirrors.json");
        if config_path.exists() {
            if let Ok(content) = fs::read_to_string(&config_path) {
                if let Ok(parsed) = serde_json::from_str::<Vec<String>>(&content) {
                    debug!(path = ?config_path, "loaded mirrors from local config");
                    return parsed;
                }
            }
        }
    }

    serde_json::from_str(MIRRORS_JSON)
        .expect("Failed to parse assets/mirrors.json. This is a compile-time error.")
}
