// ==========================================
// 农业天气图抓取系统 - 类型化配置
// ==========================================

use crate::config::config_manager::config_keys;
use crate::domain::ForecastHorizon;
use crate::engine::compositor::CompositeSettings;
use crate::engine::fetcher::RetryPolicy;
use chrono::{FixedOffset, Offset, Utc};
use std::path::PathBuf;
use std::time::Duration;

/// 运行配置（由 ConfigManager 加载）
#[derive(Debug, Clone)]
pub struct SpiderConfig {
    /// 远端站点根地址（无末尾斜杠）
    pub base_url: String,
    pub download_root: PathBuf,
    pub output_root: PathBuf,

    /// 截止时间判定所用时区
    pub utc_offset: FixedOffset,

    /// 单次请求超时
    pub request_timeout: Duration,
    pub retry: RetryPolicy,

    /// 下载并发度（1 = 顺序执行）
    pub concurrency: usize,

    // ===== 每日汇总 =====
    pub crop_index: usize,
    pub horizon: ForecastHorizon,
    pub focus_region: String,
    pub include_all_group: bool,
    pub html_report: bool,

    // ===== 拼图 =====
    pub composite: CompositeSettings,
    pub font_path: Option<PathBuf>,

    pub locale: String,
}

impl Default for SpiderConfig {
    fn default() -> Self {
        Self {
            base_url: config_keys::default_of(config_keys::BASE_URL).to_string(),
            download_root: PathBuf::from("downloads"),
            output_root: PathBuf::from("output"),
            utc_offset: FixedOffset::east_opt(8 * 3600).unwrap_or_else(|| Utc.fix()),
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            concurrency: 1,
            crop_index: 1,
            horizon: ForecastHorizon::Days15,
            focus_region: "usa".to_string(),
            include_all_group: false,
            html_report: true,
            composite: CompositeSettings::default(),
            font_path: None,
            locale: "zh-CN".to_string(),
        }
    }
}
