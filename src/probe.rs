//! 并发测速
//!
//! 逻辑:
//! 1. 构建带有超时设置的 HTTP Client
//! 2. 为每个注册表条目生成一个探测 Future
//! 3. 并行等待所有探测落定 (join_all), all-settle 而非 fail-fast
//! 4. 结果顺序与注册表一致, 整轮落定后才返回

use crate::config::PROBE_TIMEOUT_SECS;
use crate::registry::MirrorRegistry;
use crate::traits::ProbeTransport;
use crate::types::{ErrorKind, MirrorEndpoint, ProbeResult, ProbeResultSet};
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::debug;

/// 基于 reqwest 的 HEAD 探测实现
pub struct HttpProber {
    client: Client,
}

impl HttpProber {
    pub fn new(timeout: Duration) -> Self {
        // Client 级超时兜底, 防止单个慢节点卡住整轮
        let client = Client::builder().timeout(timeout).build().unwrap_or_default();
        Self { client }
    }
}

#[async_trait]
impl ProbeTransport for HttpProber {
    async fn test_endpoint(&self, endpoint: &MirrorEndpoint, timeout: Duration) -> ProbeResult {
        let start = Instant::now();

        // 使用 HEAD 请求而不是 GET, 只取元数据, 量的是 TTFB
        let request = self.client.head(&endpoint.url).timeout(timeout).send();

        match request.await {
            Ok(resp) => {
                if resp.status().is_success() {
                    ProbeResult::ok(&endpoint.url, start.elapsed().as_millis() as u64)
                } else {
                    // 连上了但返回 4xx/5xx, 视为不可用
                    ProbeResult::failed(&endpoint.url, ErrorKind::Network)
                }
            }
            Err(e) if e.is_timeout() => ProbeResult::failed(&endpoint.url, ErrorKind::Timeout),
            Err(_) => ProbeResult::failed(&endpoint.url, ErrorKind::Network),
        }
    }
}

/// 一整轮探测的执行器
pub struct ProbeExecutor {
    transport: Box<dyn ProbeTransport>,
    timeout: Duration,
}

impl ProbeExecutor {
    pub fn new(transport: Box<dyn ProbeTransport>) -> Self {
        Self::with_timeout(transport, Duration::from_secs(PROBE_TIMEOUT_SECS))
    }

    pub fn with_timeout(transport: Box<dyn ProbeTransport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// 同一时刻发起全部探测, 等每一个都落定再返回
    ///
    /// 单个节点的失败或超时不会中断也不会拖延其它节点
    pub async fn probe_all(&self, registry: &MirrorRegistry) -> ProbeResultSet {
        let tasks = registry
            .endpoints()
            .iter()
            .map(|ep| self.transport.test_endpoint(ep, self.timeout));

        let results = futures::future::join_all(tasks).await;

        debug!(
            total = results.len(),
            ok = results.iter().filter(|r| r.success).count(),
            "probe round settled"
        );
        results
    }
}

/// 测试用的查表式假传输层, 按节点模拟延迟和失败
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    pub(crate) struct FakeTransport {
        outcomes: HashMap<String, ProbeResult>,
        pub delay: Duration,
        pub calls: Arc<AtomicUsize>,
    }

    impl FakeTransport {
        pub(crate) fn new(outcomes: Vec<ProbeResult>) -> Self {
            Self {
                outcomes: outcomes.into_iter().map(|r| (r.url.clone(), r)).collect(),
                delay: Duration::from_millis(0),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl ProbeTransport for FakeTransport {
        async fn test_endpoint(&self, endpoint: &MirrorEndpoint, _timeout: Duration) -> ProbeResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.outcomes
                .get(&endpoint.url)
                .cloned()
                .unwrap_or_else(|| ProbeResult::failed(&endpoint.url, ErrorKind::Network))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeTransport;
    use super::*;

    fn registry() -> MirrorRegistry {
        MirrorRegistry::new(vec![
            "https://a.example.com".to_string(),
            "https://b.example.com".to_string(),
            "https://c.example.com".to_string(),
        ])
    }

    #[tokio::test]
    async fn round_settles_all_in_registry_order() {
        let transport = FakeTransport::new(vec![
            ProbeResult::ok("https://a.example.com", 120),
            ProbeResult::failed("https://b.example.com", ErrorKind::Timeout),
            ProbeResult::ok("https://c.example.com", 900),
        ]);
        let executor = ProbeExecutor::new(Box::new(transport));

        let results = executor.probe_all(&registry()).await;

        // 一个节点失败, 其余照常落定, 顺序与注册表一致
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].url, "https://a.example.com");
        assert!(results[0].success);
        assert!(!results[1].success);
        assert_eq!(results[1].error, Some(ErrorKind::Timeout));
        assert!(results[2].success);
    }

    #[tokio::test]
    async fn slow_probes_run_concurrently() {
        let mut transport = FakeTransport::new(vec![
            ProbeResult::ok("https://a.example.com", 1),
            ProbeResult::ok("https://b.example.com", 1),
            ProbeResult::ok("https://c.example.com", 1),
        ]);
        transport.delay = Duration::from_millis(50);
        let executor = ProbeExecutor::new(Box::new(transport));

        let start = Instant::now();
        let results = executor.probe_all(&registry()).await;
        let elapsed = start.elapsed();

        assert_eq!(results.len(), 3);
        // 串行执行要 150ms 以上, 并发下远低于此
        assert!(elapsed < Duration::from_millis(140), "took {elapsed:?}");
    }

    #[tokio::test]
    async fn empty_registry_yields_empty_round() {
        let executor = ProbeExecutor::new(Box::new(FakeTransport::new(vec![])));
        let results = executor.probe_all(&MirrorRegistry::new(vec![])).await;
        assert!(results.is_empty());
    }
}
