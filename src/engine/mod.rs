// ==========================================
// 农业天气图抓取系统 - 引擎层
// ==========================================
// 职责: 流水线各阶段
// - temporal: 19:30 分界的日期解析
// - locator: URL 与保存路径构造（纯函数）
// - fetcher: 图片编号 + 重试下载 + 结果汇总
// - pairing: 前一天/当天目录按文件名配对
// - compositor: 动态画布拼图
// - summary: 每日汇总编排
// ==========================================

pub mod compositor;
pub mod fetcher;
pub mod locator;
pub mod pairing;
pub mod summary;
pub mod temporal;

// 重导出核心引擎
pub use compositor::{
    composite_path, CompositeArtifact, CompositeRequest, CompositeSettings, Compositor, RowMeasure,
};
pub use fetcher::{FetchOrchestrator, FetchReport, RetryPolicy};
pub use locator::{ImageLocator, IMAGE_NUMBER_PATH};
pub use pairing::{parse_image_name, PairingMatcher};
pub use summary::{DailySummary, DownloadStats, RunSummary, VariableSummary, RUN_SUMMARY_FILE};
pub use temporal::{CutoffState, TemporalResolution, TemporalResolver};
