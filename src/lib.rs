// ==========================================
// 农业天气图抓取系统 - 核心库
// ==========================================
// 职责: 日期索引的天气图采集与对比流水线
// 流程: 目录 → 时间解析 → 下载 → 配对 → 拼图
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 目录与值类型
pub mod domain;

// 引擎层 - 时间解析 / 定位 / 下载 / 配对 / 拼图 / 每日汇总
pub mod engine;

// 外部能力 - HTTP 与文字渲染
pub mod external;

// 报告层 - HTML 对比报告
pub mod report;

// 配置层 - 系统配置
pub mod config;

// 错误类型
pub mod error;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    Catalog, CatalogEntry, ComparisonDateSet, ForecastHorizon, GroupFilter, ImageNumberSet,
    ImagePair, WeatherVariable,
};

// 引擎
pub use engine::{
    CompositeSettings, Compositor, CutoffState, DailySummary, FetchOrchestrator, FetchReport,
    ImageLocator, PairingMatcher, RetryPolicy, RunSummary, TemporalResolver,
};

// 配置与错误
pub use config::{ConfigManager, SpiderConfig};
pub use error::{SpiderError, SpiderResult};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "农业天气图抓取系统";
