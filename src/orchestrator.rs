//! 会话协调器
//!
//! 状态机: BOOTSTRAP -> SHOWING_PLACEHOLDER -> PROBING -> SHOWING_RESULTS,
//! 刷新请求可以从任一展示状态重新进入 PROBING。
//! 每个会话构造一次, 注册表 / 缓存 / 选择 / 执行器 / 展示器全部注入,
//! 不依赖任何全局可变状态。
//!
//! 已知并接受的竞争: 被新刷新取代的旧轮如果更晚落定, 会以 last-settled-wins
//! 覆盖缓存里更新的一轮。没有针对在飞探测的取消机制, 按最终一致处理。

use crate::cache::ResultCache;
use crate::error::Result;
use crate::probe::ProbeExecutor;
use crate::rank::rank;
use crate::registry::MirrorRegistry;
use crate::selection::SelectionStore;
use crate::traits::Presenter;
use crate::types::{ErrorKind, ProbeResult, RankedEntry, RankedList, SelectedMirror};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::{debug, warn};

/// 状态机状态; 任何失败路径都必须停在一个可渲染的状态上
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckerState {
    Bootstrap,
    ShowingPlaceholder,
    Probing,
    ShowingResults,
}

pub struct Orchestrator {
    registry: MirrorRegistry,
    cache: ResultCache,
    selection: SelectionStore,
    executor: ProbeExecutor,
    presenter: Box<dyn Presenter>,
    state: Mutex<CheckerState>,
    /// 幂等初始化保护: 同一进程内最多一轮探测在飞
    in_flight: AtomicBool,
}

impl Orchestrator {
    pub fn new(
        registry: MirrorRegistry,
        cache: ResultCache,
        selection: SelectionStore,
        executor: ProbeExecutor,
        presenter: Box<dyn Presenter>,
    ) -> Self {
        Self {
            registry,
            cache,
            selection,
            executor,
            presenter,
            state: Mutex::new(CheckerState::Bootstrap),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn registry(&self) -> &MirrorRegistry {
        &self.registry
    }

    pub fn selection(&self) -> &SelectionStore {
        &self.selection
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn state(&self) -> CheckerState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, next: CheckerState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = next;
    }

    /// BOOTSTRAP: 确定活动节点并立即渲染占位列表, 不等待任何网络 IO
    pub fn bootstrap(&self) -> RankedList {
        let selected = match self.resolve_selection() {
            Ok(Some(s)) => s,
            Ok(None) => return self.publish(Vec::new(), CheckerState::ShowingPlaceholder),
            Err(e) => {
                warn!("cannot resolve active mirror: {e}");
                return self.publish_degraded(CheckerState::ShowingPlaceholder);
            }
        };

        let list = rank(None, &selected, Some(&selected), &self.registry);
        self.publish(list, CheckerState::ShowingPlaceholder)
    }

    /// 初始化或显式刷新: 非强制时先查缓存, 命中就直接出结果; 否则进入探测
    pub async fn refresh(&self, force: bool) -> RankedList {
        let selected = match self.resolve_selection() {
            Ok(Some(s)) => s,
            Ok(None) => return self.publish(Vec::new(), CheckerState::ShowingResults),
            Err(e) => {
                warn!("cannot resolve active mirror: {e}");
                return self.publish_degraded(CheckerState::ShowingResults);
            }
        };

        if !force {
            if let Some(cached) = self.cache.get() {
                let list = rank(Some(&cached.results), &selected, Some(&selected), &self.registry);
                return self.publish(list, CheckerState::ShowingResults);
            }
        }

        // 去重: 已有一轮在飞时不再发起, 用当前可用的数据渲染
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("probe round already in flight, deduplicating");
            let cached = self.cache.get();
            let list = rank(
                cached.as_ref().map(|c| c.results.as_slice()),
                &selected,
                Some(&selected),
                &self.registry,
            );
            return self.publish(list, self.state());
        }

        self.set_state(CheckerState::Probing);
        let results = self.executor.probe_all(&self.registry).await;
        self.in_flight.store(false, Ordering::SeqCst);

        // 整轮落定后才写缓存并发布, 中途不暴露任何部分结果
        self.cache.put(results.clone());
        let list = rank(Some(&results), &selected, Some(&selected), &self.registry);
        self.publish(list, CheckerState::ShowingResults)
    }

    /// 用户显式选择: 更新选择状态后立即重排重渲染, 不触发新一轮探测
    ///
    /// 非法 URL 返回错误, 原有选择和当前状态都不变
    pub fn on_user_select(&self, hostname: &str, url: &str) -> Result<RankedList> {
        // 本轮开始时的选择快照, 渲染时作为 last-used 标记
        let previous = self.selection.get_selected();
        let selected = self.selection.set_selected(hostname, url)?;

        let cached = self.cache.get();
        let list = rank(
            cached.as_ref().map(|c| c.results.as_slice()),
            &selected,
            previous.as_ref(),
            &self.registry,
        );
        Ok(self.publish(list, CheckerState::ShowingResults))
    }

    /// 当前活动节点; 没有持久化的选择时落到静态默认节点并立即持久化
    fn resolve_selection(&self) -> Result<Option<SelectedMirror>> {
        if let Some(s) = self.selection.get_selected() {
            return Ok(Some(s));
        }
        match self.registry.default_endpoint() {
            Some(ep) => Ok(Some(self.selection.bootstrap(ep)?)),
            None => Ok(None),
        }
    }

    fn publish(&self, list: RankedList, state: CheckerState) -> RankedList {
        self.set_state(state);
        self.presenter.render_ranked_list(&list);
        list
    }

    /// 降级列表: 全部条目统一标记为 error, 保证仍有东西可渲染
    fn publish_degraded(&self, state: CheckerState) -> RankedList {
        let list: RankedList = self
            .registry
            .endpoints()
            .iter()
            .map(|ep| RankedEntry {
                result: ProbeResult::failed(&ep.url, ErrorKind::Error),
                is_selected: false,
                is_last_used: false,
            })
            .collect();
        self.publish(list, state)
    }
}
