//! 排序引擎
//!
//! 把探测结果 / 缓存 / 用户选择合并成一个可展示的有序列表。
//! 纯函数: 从不修改选择状态、缓存或注册表

use crate::registry::MirrorRegistry;
use crate::types::{ErrorKind, ProbeResult, RankedEntry, RankedList, SelectedMirror};
use std::cmp::Ordering;

/// 排序规则: 成功者在前且按延迟升序, 失败者保持原有相对顺序
///
/// 稳定排序, 重复应用结果不变
pub fn sort_results(results: &mut [ProbeResult]) {
    results.sort_by(|a, b| match (a.success, b.success) {
        (true, true) => a.latency_ms.cmp(&b.latency_ms),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => Ordering::Equal,
    });
}

/// 合并出最终的 RankedList
///
/// - 有探测结果: 按延迟排序后把选中节点强制置顶; 选中节点不在结果里时
///   (尚未测过或不在注册表) 合成一个 pending 占位插到最前
/// - 无探测结果 (缓存 miss / 引导阶段): 按注册表顺序全量 probing 占位
/// - `last_used` 是本轮开始时捕获的选择快照, 只影响展示标记
/// - 空注册表直接返回空列表
pub fn rank(
    probe_set: Option<&[ProbeResult]>,
    selected: &SelectedMirror,
    last_used: Option<&SelectedMirror>,
    registry: &MirrorRegistry,
) -> RankedList {
    if registry.is_empty() {
        return Vec::new();
    }

    let mut results: Vec<ProbeResult> = match probe_set {
        Some(set) => {
            let mut sorted = set.to_vec();
            sort_results(&mut sorted);
            sorted
        }
        None => registry
            .endpoints()
            .iter()
            .map(|ep| ProbeResult::failed(&ep.url, ErrorKind::Probing))
            .collect(),
    };

    // 选择优先于测速排名: 选中节点置顶
    match results.iter().position(|r| r.url == selected.url) {
        Some(pos) => {
            let mut entry = results.remove(pos);
            if probe_set.is_some() && !entry.success {
                // 用户选了一个本轮探测失败的节点, 展示为待定而不是错误
                entry.error = Some(ErrorKind::Pending);
            }
            results.insert(0, entry);
        }
        None => {
            results.insert(0, ProbeResult::failed(&selected.url, ErrorKind::Pending));
        }
    }

    results
        .into_iter()
        .map(|result| RankedEntry {
            is_selected: result.url == selected.url,
            is_last_used: last_used.is_some_and(|lu| lu.url == result.url),
            result,
        })
        .collect()
}
