use std::time::{SystemTime, UNIX_EPOCH};

/// 当前 epoch 毫秒; 系统时钟早于 epoch 时按 0 处理
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
