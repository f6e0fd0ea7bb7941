//! 客户端 key/value 持久化 (JSON 文件)
//!
//! 数据目录不可用时返回纯内存模式, 上层在会话内继续工作

use crate::error::Result;
use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: Option<PathBuf>,
}

impl JsonStore {
    /// 默认数据目录 (~/.cache/ghmirror)
    pub fn open_default() -> Self {
        let dir = ProjectDirs::from("", "", "ghmirror").map(|d| d.cache_dir().to_path_buf());
        if dir.is_none() {
            warn!("no usable home directory, persistence disabled for this session");
        }
        Self { dir }
    }

    pub fn at(dir: PathBuf) -> Self {
        Self { dir: Some(dir) }
    }

    /// 不落盘, 仅用于降级和测试
    pub fn in_memory() -> Self {
        Self { dir: None }
    }

    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(ref dir) = self.dir else {
            return Ok(None);
        };
        let path = dir.join(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let Some(ref dir) = self.dir else {
            return Ok(());
        };
        fs::create_dir_all(dir)?;
        fs::write(dir.join(key), serde_json::to_string(value)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn save_then_load() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonStore::at(dir.path().to_path_buf());

        assert_eq!(store.load::<Vec<u32>>("missing.json")?, None);

        store.save("nums.json", &vec![1u32, 2, 3])?;
        assert_eq!(store.load::<Vec<u32>>("nums.json")?, Some(vec![1, 2, 3]));
        Ok(())
    }

    #[test]
    fn in_memory_swallows_writes() -> Result<()> {
        let store = JsonStore::in_memory();
        store.save("nums.json", &vec![1u32])?;
        assert_eq!(store.load::<Vec<u32>>("nums.json")?, None);
        Ok(())
    }
}
