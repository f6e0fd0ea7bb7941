use serde::{Deserialize, Serialize};

/// 失败哨兵值: 延迟不可用时设为 u64::MAX, 排序时自然沉底
pub const LATENCY_FAIL: u64 = u64::MAX;

/// 候选镜像节点定义
///
/// hostname 总是从 URL 派生, 不重复存储
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorEndpoint {
    pub url: String, // 例如: "https://github.akams.cn"
}

impl MirrorEndpoint {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
        }
    }

    pub fn hostname(&self) -> String {
        host_of(&self.url)
    }
}

/// 取 URL 的 host 部分; 解析失败时退回原始字符串
pub fn host_of(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .unwrap_or_else(|| url.to_string())
}

/// 探测失败或占位状态的分类标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// 单个探测超时
    Timeout,
    /// 连接失败 / DNS 解析失败 / 非 2xx 响应
    Network,
    /// 已被选中但本轮没有它的探测结果
    Pending,
    /// 探测尚未开始或进行中的占位
    Probing,
    /// 整轮降级时的统一标记
    Error,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::Network => "network",
            ErrorKind::Pending => "pending",
            ErrorKind::Probing => "probing",
            ErrorKind::Error => "error",
        }
    }
}

/// 单个节点的测速结果
///
/// latency_ms 只在 success=true 时有意义
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub url: String,
    #[serde(rename = "latency")]
    pub latency_ms: u64,
    pub success: bool,
    pub error: Option<ErrorKind>,
}

impl ProbeResult {
    pub fn ok(url: &str, latency_ms: u64) -> Self {
        Self {
            url: url.to_string(),
            latency_ms,
            success: true,
            error: None,
        }
    }

    pub fn failed(url: &str, kind: ErrorKind) -> Self {
        Self {
            url: url.to_string(),
            latency_ms: LATENCY_FAIL,
            success: false,
            error: Some(kind),
        }
    }
}

/// 一整轮探测的结果, 每个注册表条目对应一项, 整轮落定后才对外可见
pub type ProbeResultSet = Vec<ProbeResult>;

/// 持久化的测速缓存记录 (latency_cache.json)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedProbeSet {
    /// epoch 毫秒
    pub timestamp: u64,
    pub results: ProbeResultSet,
}

/// 用户当前选中的镜像, 持久化且无过期时间
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedMirror {
    pub hostname: String,
    pub url: String,
    pub timestamp: u64,
}

/// 排序输出的条目: 只用于展示, 从不持久化
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    pub result: ProbeResult,
    pub is_selected: bool,
    /// 本轮开始时选择快照的展示标记, 与 is_selected 含义不同
    pub is_last_used: bool,
}

pub type RankedList = Vec<RankedEntry>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_is_derived_from_url() {
        let ep = MirrorEndpoint::new("https://github.akams.cn/some/path");
        assert_eq!(ep.hostname(), "github.akams.cn");
        // 解析不了就原样返回
        assert_eq!(host_of("not a url"), "not a url");
    }

    #[test]
    fn probe_result_wire_format() {
        let res = ProbeResult::failed("https://gh-proxy.com", ErrorKind::Timeout);
        let json = serde_json::to_value(&res).unwrap();
        assert_eq!(json["url"], "https://gh-proxy.com");
        assert_eq!(json["latency"], u64::MAX);
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "timeout");
    }

    #[test]
    fn cached_set_roundtrip() {
        let cached = CachedProbeSet {
            timestamp: 1_700_000_000_000,
            results: vec![
                ProbeResult::ok("https://a.example.com", 120),
                ProbeResult::failed("https://b.example.com", ErrorKind::Network),
            ],
        };
        let json = serde_json::to_string(&cached).unwrap();
        let back: CachedProbeSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cached);
    }
}
