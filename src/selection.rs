//! 用户选中节点的持久记录
//!
//! 没有过期时间, 只随显式选择事件更新, 可以跨过任意多次缓存刷新

use crate::error::{GhMirrorError, Result};
use crate::storage::JsonStore;
use crate::types::{MirrorEndpoint, SelectedMirror};
use crate::utils::now_ms;
use std::sync::RwLock;
use tracing::warn;

const SELECTION_KEY: &str = "selected_mirror.json";

pub struct SelectionStore {
    store: JsonStore,
    mem: RwLock<Option<SelectedMirror>>,
}

impl SelectionStore {
    pub fn new(store: JsonStore) -> Self {
        Self {
            store,
            mem: RwLock::new(None),
        }
    }

    pub fn get_selected(&self) -> Option<SelectedMirror> {
        self.mem
            .read()
            .ok()
            .and_then(|m| (*m).clone())
            .or_else(|| match self.store.load(SELECTION_KEY) {
                Ok(s) => s,
                Err(e) => {
                    warn!("selection record unreadable: {e}");
                    None
                }
            })
    }

    /// 校验后无条件覆盖持久化; 非法 URL 返回错误且不碰原有选择
    pub fn set_selected(&self, hostname: &str, url: &str) -> Result<SelectedMirror> {
        validate_endpoint_url(url)?;
        let selected = SelectedMirror {
            hostname: hostname.to_string(),
            url: url.to_string(),
            timestamp: now_ms(),
        };
        if let Ok(mut mem) = self.mem.write() {
            *mem = Some(selected.clone());
        }
        if let Err(e) = self.store.save(SELECTION_KEY, &selected) {
            warn!("failed to persist selection, keeping in-memory only: {e}");
        }
        Ok(selected)
    }

    /// 启动引导: 没有持久化的选择时写入静态默认节点,
    /// 保证探测开始前就存在一个确定的活动节点
    pub fn bootstrap(&self, default: &MirrorEndpoint) -> Result<SelectedMirror> {
        if let Some(existing) = self.get_selected() {
            return Ok(existing);
        }
        self.set_selected(&default.hostname(), &default.url)
    }
}

/// 合法节点 URL: 绝对地址, http(s), 带 host
pub fn validate_endpoint_url(url: &str) -> Result<()> {
    let parsed = reqwest::Url::parse(url).map_err(|e| GhMirrorError::MalformedUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(GhMirrorError::MalformedUrl {
            url: url.to_string(),
            reason: "scheme must be http or https".to_string(),
        });
    }
    if parsed.host_str().is_none() {
        return Err(GhMirrorError::MalformedUrl {
            url: url.to_string(),
            reason: "missing host".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn set_then_get() -> Result<()> {
        let dir = tempdir()?;
        let store = SelectionStore::new(JsonStore::at(dir.path().to_path_buf()));

        assert!(store.get_selected().is_none());

        let sel = store.set_selected("gh-proxy.com", "https://gh-proxy.com")?;
        assert_eq!(sel.hostname, "gh-proxy.com");
        assert_eq!(store.get_selected(), Some(sel));
        Ok(())
    }

    #[test]
    fn malformed_url_leaves_prior_selection() -> Result<()> {
        let dir = tempdir()?;
        let store = SelectionStore::new(JsonStore::at(dir.path().to_path_buf()));
        let prior = store.set_selected("gh-proxy.com", "https://gh-proxy.com")?;

        for bad in ["not a url", "ftp://x.example.com", "https://"] {
            let err = store.set_selected("x", bad).unwrap_err();
            assert!(matches!(err, GhMirrorError::MalformedUrl { .. }), "{bad}");
            assert_eq!(store.get_selected(), Some(prior.clone()));
        }
        Ok(())
    }

    #[test]
    fn bootstrap_writes_default_once() -> Result<()> {
        let dir = tempdir()?;
        let store = SelectionStore::new(JsonStore::at(dir.path().to_path_buf()));
        let default = MirrorEndpoint::new("https://github.akams.cn");

        let first = store.bootstrap(&default)?;
        assert_eq!(first.hostname, "github.akams.cn");

        // 已有选择时 bootstrap 不覆盖
        store.set_selected("gh-proxy.com", "https://gh-proxy.com")?;
        let again = store.bootstrap(&default)?;
        assert_eq!(again.hostname, "gh-proxy.com");
        Ok(())
    }

    #[test]
    fn selection_outlives_restart() -> Result<()> {
        let dir = tempdir()?;
        {
            let store = SelectionStore::new(JsonStore::at(dir.path().to_path_buf()));
            store.set_selected("gh-proxy.com", "https://gh-proxy.com")?;
        }
        let store = SelectionStore::new(JsonStore::at(dir.path().to_path_buf()));
        assert_eq!(
            store.get_selected().map(|s| s.url),
            Some("https://gh-proxy.com".to_string())
        );
        Ok(())
    }
}
