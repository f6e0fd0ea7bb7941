//! 延迟结果缓存
//!
//! 每次完整的探测轮整体覆盖写入 (last-writer-wins), 从不合并;
//! 过期是读取时的逻辑判断, 不做主动删除

use crate::config::CACHE_TTL_MS;
use crate::storage::JsonStore;
use crate::types::{CachedProbeSet, ProbeResultSet};
use crate::utils::now_ms;
use std::sync::RwLock;
use tracing::warn;

const CACHE_KEY: &str = "latency_cache.json";

pub struct ResultCache {
    store: JsonStore,
    ttl_ms: u64,
    /// 存储不可用时的会话内回退; 本进程写入过的最新一轮优先于磁盘
    mem: RwLock<Option<CachedProbeSet>>,
}

impl ResultCache {
    pub fn new(store: JsonStore) -> Self {
        Self {
            store,
            ttl_ms: CACHE_TTL_MS,
            mem: RwLock::new(None),
        }
    }

    /// TTL 内返回最近一轮的完整结果, 否则报 miss
    pub fn get(&self) -> Option<CachedProbeSet> {
        self.get_at(now_ms())
    }

    pub(crate) fn get_at(&self, now: u64) -> Option<CachedProbeSet> {
        let cached = self
            .mem
            .read()
            .ok()
            .and_then(|m| (*m).clone())
            .or_else(|| match self.store.load(CACHE_KEY) {
                Ok(c) => c,
                Err(e) => {
                    warn!("latency cache unreadable, treating as miss: {e}");
                    None
                }
            })?;

        if now.saturating_sub(cached.timestamp) < self.ttl_ms {
            Some(cached)
        } else {
            None
        }
    }

    /// 原子整轮覆盖
    pub fn put(&self, results: ProbeResultSet) {
        self.put_at(now_ms(), results)
    }

    pub(crate) fn put_at(&self, now: u64, results: ProbeResultSet) {
        let cached = CachedProbeSet {
            timestamp: now,
            results,
        };
        if let Ok(mut mem) = self.mem.write() {
            *mem = Some(cached.clone());
        }
        if let Err(e) = self.store.save(CACHE_KEY, &cached) {
            warn!("failed to persist latency cache, keeping in-memory only: {e}");
        }
    }
}
