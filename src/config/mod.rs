// ==========================================
// 农业天气图抓取系统 - 配置层
// ==========================================
// 职责: 环境变量 → 类型化配置，带默认值与校验
// ==========================================

pub mod config_manager;
pub mod spider_config;

// 重导出核心配置类型
pub use config_manager::{config_keys, parse_utc_offset, ConfigManager};
pub use spider_config::SpiderConfig;
