use crate::types::{MirrorEndpoint, ProbeResult, RankedEntry};
use async_trait::async_trait;
use std::time::Duration;

/// 探测传输层: 核心逻辑只依赖这个接口, 不绑定具体 HTTP 实现
#[async_trait]
pub trait ProbeTransport: Send + Sync {
    /// 对单个节点发起一次限时探测, 不重试
    ///
    /// 超时和传输错误归类进返回的结果, 永不返回 Err,
    /// 因此单个节点的失败不会中断整轮
    async fn test_endpoint(&self, endpoint: &MirrorEndpoint, timeout: Duration) -> ProbeResult;
}

/// 展示适配器: 每产出一个新的排序列表就被调用一次
///
/// 由宿主 (CLI / 测试) 实现, 核心从不接触渲染表面
pub trait Presenter: Send + Sync {
    fn render_ranked_list(&self, list: &[RankedEntry]);
}
