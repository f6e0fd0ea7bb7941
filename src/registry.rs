use crate::types::MirrorEndpoint;

/// 镜像注册表: 宿主启动时提供一次, 进程生命周期内不可变
#[derive(Debug, Clone)]
pub struct MirrorRegistry {
    endpoints: Vec<MirrorEndpoint>,
}

impl MirrorRegistry {
    pub fn new(urls: Vec<String>) -> Self {
        Self {
            endpoints: urls.iter().map(|u| MirrorEndpoint::new(u)).collect(),
        }
    }

    pub fn endpoints(&self) -> &[MirrorEndpoint] {
        &self.endpoints
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// 静态默认节点: 注册表第一项
    pub fn default_endpoint(&self) -> Option<&MirrorEndpoint> {
        self.endpoints.first()
    }

    /// 按 hostname 或完整 URL 查找 (URL 比较时忽略尾部斜杠)
    pub fn find(&self, needle: &str) -> Option<&MirrorEndpoint> {
        self.endpoints.iter().find(|ep| {
            ep.url.trim_end_matches('/') == needle.trim_end_matches('/')
                || ep.hostname().eq_ignore_ascii_case(needle)
        })
    }
}
