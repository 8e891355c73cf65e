// ==========================================
// 农业天气图抓取系统 - HTTP 抓取能力
// ==========================================
// 职责: 抽象的 "按 URL 获取字节" 能力
// 引擎层只依赖 HttpFetcher trait，传输细节留在此处
// ==========================================

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::error::{SpiderError, SpiderResult};

/// 浏览器 User-Agent（远端站点会拒绝默认 UA）
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// HTTP 响应（状态码 + 完整响应体）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 响应体按 UTF-8 解读（非法字节替换）
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

// ==========================================
// HttpFetcher Trait
// ==========================================

/// 获取字节的能力
///
/// 传输层错误（DNS、超时、连接断开）统一返回 TransientNetworkFailure；
/// 非 2xx 状态码作为正常响应返回，由调用方判断
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    async fn get(&self, url: &str) -> SpiderResult<HttpResponse>;
}

// ==========================================
// ReqwestFetcher - reqwest 实现
// ==========================================
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    /// 创建客户端
    ///
    /// # 参数
    /// - timeout: 单次请求超时
    pub fn new(timeout: Duration) -> SpiderResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .map_err(|e| SpiderError::Other(anyhow::anyhow!("HTTP 客户端初始化失败: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn get(&self, url: &str) -> SpiderResult<HttpResponse> {
        let transient = |e: reqwest::Error| SpiderError::TransientNetworkFailure {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(transient)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(transient)?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}
