// ==========================================
// 日志系统初始化 + 运行报告接口
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 支持环境变量配置日志级别
// 各组件通过注入的 RunReporter 输出进度，不读取全局日志路径
// ==========================================

use std::sync::{Arc, Mutex};
use tracing_subscriber::{fmt, EnvFilter};

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器（默认: info）
///   例如: RUST_LOG=debug 或 RUST_LOG=weather_spider=trace
///
/// # 示例
/// ```no_run
/// use weather_spider::logging;
/// logging::init();
/// ```
pub fn init() {
    // 从环境变量读取日志级别，默认为 info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // 配置日志格式
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();
}

/// 初始化测试环境的日志系统
///
/// 使用更详细的日志级别，便于调试
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

// ==========================================
// RunReporter Trait
// ==========================================

/// 运行报告接口
///
/// 流水线各组件持有 `Arc<dyn RunReporter>`，显式注入
pub trait RunReporter: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// 转发到 tracing 的报告器（默认实现）
#[derive(Debug, Clone, Default)]
pub struct TracingReporter;

impl RunReporter for TracingReporter {
    fn info(&self, message: &str) {
        tracing::info!(target: "weather_spider::report", "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "weather_spider::report", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "weather_spider::report", "{}", message);
    }
}

/// 报告级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportLevel {
    Info,
    Warn,
    Error,
}

/// 内存报告器
///
/// 记录所有消息，供测试断言使用
#[derive(Debug, Default)]
pub struct MemoryReporter {
    entries: Mutex<Vec<(ReportLevel, String)>>,
}

impl MemoryReporter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn entries(&self) -> Vec<(ReportLevel, String)> {
        self.entries
            .lock()
            .map(|e| e.clone())
            .unwrap_or_default()
    }

    /// 某级别的消息数量
    pub fn count(&self, level: ReportLevel) -> usize {
        self.entries().iter().filter(|(l, _)| *l == level).count()
    }

    fn push(&self, level: ReportLevel, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push((level, message.to_string()));
        }
    }
}

impl RunReporter for MemoryReporter {
    fn info(&self, message: &str) {
        self.push(ReportLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.push(ReportLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.push(ReportLevel::Error, message);
    }
}

/// 默认报告器
pub fn default_reporter() -> Arc<dyn RunReporter> {
    Arc::new(TracingReporter)
}
