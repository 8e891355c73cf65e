// ==========================================
// 农业天气图抓取系统 - 配置管理器
// ==========================================
// 职责: 配置加载、默认值、类型化校验
// 来源: 进程环境变量（或测试注入的键值表）
// ==========================================

use crate::config::spider_config::SpiderConfig;
use crate::domain::{Catalog, ForecastHorizon};
use crate::engine::compositor::{CompositeSettings, RowMeasure};
use crate::engine::fetcher::RetryPolicy;
use crate::error::{SpiderError, SpiderResult};
use chrono::FixedOffset;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    values: HashMap<String, String>,
}

impl ConfigManager {
    /// 从进程环境变量创建（仅收集已知配置键）
    pub fn from_env() -> Self {
        let values = config_keys::ALL
            .iter()
            .filter_map(|key| std::env::var(key).ok().map(|v| (key.to_string(), v)))
            .collect();
        Self { values }
    }

    /// 从键值表创建（测试/嵌入场景）
    pub fn from_map(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// 读取配置值（空白视为未设置）
    ///
    /// # 返回
    /// - Some(&str): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// 读取配置值，缺省时取默认值表
    fn get_config_or_default(&self, key: &str) -> String {
        self.get_config_value(key)
            .map(|v| v.to_string())
            .unwrap_or_else(|| config_keys::default_of(key).to_string())
    }

    fn parse_value<T>(&self, key: &str) -> SpiderResult<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.get_config_or_default(key);
        raw.parse::<T>().map_err(|e| SpiderError::Config {
            key: key.to_string(),
            message: format!("无法解析 '{}': {}", raw, e),
        })
    }

    fn parse_bool(&self, key: &str) -> SpiderResult<bool> {
        let raw = self.get_config_or_default(key);
        match raw.to_lowercase().as_str() {
            "1" | "true" | "yes" | "y" | "on" => Ok(true),
            "0" | "false" | "no" | "n" | "off" => Ok(false),
            _ => Err(SpiderError::Config {
                key: key.to_string(),
                message: format!("布尔值无效: {}", raw),
            }),
        }
    }

    /// 加载完整配置
    pub fn load(&self) -> SpiderResult<SpiderConfig> {
        let max_attempts: u32 = self.parse_value(config_keys::MAX_RETRIES)?;
        if max_attempts == 0 {
            return Err(SpiderError::Config {
                key: config_keys::MAX_RETRIES.to_string(),
                message: "重试次数至少为 1".to_string(),
            });
        }

        let concurrency: usize = self.parse_value(config_keys::CONCURRENCY)?;
        let horizon_days: u32 = self.parse_value(config_keys::HORIZON)?;
        let horizon = ForecastHorizon::from_days(horizon_days).ok_or_else(|| SpiderError::Config {
            key: config_keys::HORIZON.to_string(),
            message: format!("预报天数无效: {}（仅支持 15/60/180）", horizon_days),
        })?;

        let scale_factor: f32 = self.parse_value(config_keys::COMPOSITE_SCALE_FACTOR)?;
        if !(scale_factor > 0.0 && scale_factor <= MAX_SCALE_FACTOR) {
            return Err(SpiderError::Config {
                key: config_keys::COMPOSITE_SCALE_FACTOR.to_string(),
                message: format!("放大倍数超出范围 (0, {}]: {}", MAX_SCALE_FACTOR, scale_factor),
            });
        }

        let canvas_width: u32 = self.parse_value(config_keys::COMPOSITE_CANVAS_WIDTH)?;
        if !CANVAS_WIDTH_RANGE.contains(&canvas_width) {
            return Err(SpiderError::Config {
                key: config_keys::COMPOSITE_CANVAS_WIDTH.to_string(),
                message: format!(
                    "画布宽度超出范围 [{}, {}]: {}",
                    CANVAS_WIDTH_RANGE.start(),
                    CANVAS_WIDTH_RANGE.end(),
                    canvas_width
                ),
            });
        }

        // 间距不得超过画布宽度的一半，否则两张图没有位置
        let gap: u32 = self.parse_value(config_keys::COMPOSITE_GAP)?;
        if gap > canvas_width / 2 {
            return Err(SpiderError::Config {
                key: config_keys::COMPOSITE_GAP.to_string(),
                message: format!("图片间距 {} 超过画布宽度的一半 ({})", gap, canvas_width / 2),
            });
        }

        let composite = CompositeSettings {
            canvas_width,
            scale_factor,
            gap,
            row_measure: if self.parse_bool(config_keys::COMPOSITE_STRICT_ROWS)? {
                RowMeasure::PerRow
            } else {
                RowMeasure::FirstSample
            },
            ..CompositeSettings::default()
        };

        Ok(SpiderConfig {
            base_url: self
                .get_config_or_default(config_keys::BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            download_root: PathBuf::from(self.get_config_or_default(config_keys::DOWNLOAD_ROOT)),
            output_root: PathBuf::from(self.get_config_or_default(config_keys::OUTPUT_ROOT)),
            utc_offset: self.parse_timezone()?,
            request_timeout: Duration::from_secs(self.parse_value(config_keys::REQUEST_TIMEOUT)?),
            retry: RetryPolicy {
                max_attempts,
                delay: Duration::from_secs(self.parse_value(config_keys::RETRY_DELAY)?),
            },
            concurrency: concurrency.max(1),
            crop_index: self.parse_crop()?,
            horizon,
            focus_region: self.get_config_or_default(config_keys::FOCUS_REGION).to_lowercase(),
            include_all_group: self.parse_bool(config_keys::INCLUDE_ALL_GROUP)?,
            html_report: self.parse_bool(config_keys::HTML_REPORT)?,
            composite,
            font_path: self.get_config_value(config_keys::COMPOSITE_FONT_PATH).map(PathBuf::from),
            locale: self.get_config_or_default(config_keys::LOCALE),
        })
    }

    /// 时区: UTC_OFFSET 优先，其次 TIMEZONE（IANA 名称或偏移），最后取默认值
    fn parse_timezone(&self) -> SpiderResult<FixedOffset> {
        if self.get_config_value(config_keys::UTC_OFFSET).is_none() {
            if let Some(name) = self.get_config_value(config_keys::TIMEZONE) {
                return parse_timezone_name(name)
                    .or_else(|| parse_utc_offset(name))
                    .ok_or_else(|| SpiderError::Config {
                        key: config_keys::TIMEZONE.to_string(),
                        message: format!(
                            "无法识别的时区: {}（可写 ±HH:MM，或 {}）",
                            name,
                            KNOWN_TIMEZONES
                                .iter()
                                .map(|(n, _)| *n)
                                .collect::<Vec<_>>()
                                .join(", ")
                        ),
                    });
            }
        }
        parse_utc_offset(&self.get_config_or_default(config_keys::UTC_OFFSET)).ok_or_else(|| {
            SpiderError::Config {
                key: config_keys::UTC_OFFSET.to_string(),
                message: "时区偏移格式应为 ±HH:MM".to_string(),
            }
        })
    }

    /// 作物既可写名称也可写索引
    fn parse_crop(&self) -> SpiderResult<usize> {
        let raw = self.get_config_or_default(config_keys::CROP);
        let catalog = Catalog::global();
        let index = match raw.parse::<usize>() {
            Ok(i) if catalog.crop_name(i).is_some() => Some(i),
            Ok(_) => None,
            Err(_) => catalog.find_crop(&raw),
        };
        index.ok_or_else(|| SpiderError::Config {
            key: config_keys::CROP.to_string(),
            message: format!("未知作物: {}（可选: {}）", raw, catalog.crops().join(", ")),
        })
    }

    /// 获取生效配置快照（JSON格式）
    ///
    /// # 用途
    /// - 写入运行汇总，便于复现某次运行
    pub fn snapshot_json(&self) -> SpiderResult<serde_json::Value> {
        let effective: BTreeMap<&str, String> = config_keys::ALL
            .iter()
            .map(|key| (*key, self.get_config_or_default(key)))
            .collect();
        Ok(json!(effective))
    }
}

/// 放大倍数上限
pub const MAX_SCALE_FACTOR: f32 = 20.0;

/// 画布宽度允许范围
pub const CANVAS_WIDTH_RANGE: std::ops::RangeInclusive<u32> = 200..=20_000;

// 不使用夏令时的常见 IANA 时区 → 固定偏移（秒）
const KNOWN_TIMEZONES: &[(&str, i32)] = &[
    ("UTC", 0),
    ("Etc/UTC", 0),
    ("Asia/Shanghai", 8 * 3600),
    ("Asia/Chongqing", 8 * 3600),
    ("Asia/Hong_Kong", 8 * 3600),
    ("Asia/Taipei", 8 * 3600),
    ("Asia/Singapore", 8 * 3600),
    ("Asia/Tokyo", 9 * 3600),
    ("Asia/Seoul", 9 * 3600),
    ("Asia/Kolkata", 5 * 3600 + 1800),
    ("America/Sao_Paulo", -3 * 3600),
    ("America/Argentina/Buenos_Aires", -3 * 3600),
];

/// 解析 IANA 时区名（仅限无夏令时的常见时区）
pub fn parse_timezone_name(name: &str) -> Option<FixedOffset> {
    let name = name.trim();
    KNOWN_TIMEZONES
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .and_then(|(_, secs)| FixedOffset::east_opt(*secs))
}

/// 解析 ±HH:MM / ±HHMM / ±HH 形式的 UTC 偏移
pub fn parse_utc_offset(value: &str) -> Option<FixedOffset> {
    let value = value.trim();
    let (sign, rest) = match value.chars().next()? {
        '+' => (1, &value[1..]),
        '-' => (-1, &value[1..]),
        _ => (1, value),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.is_empty() || digits.len() > 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = if digits.len() <= 2 {
        (digits.parse::<i32>().ok()?, 0)
    } else {
        let split = digits.len() - 2;
        (digits[..split].parse::<i32>().ok()?, digits[split..].parse::<i32>().ok()?)
    };
    if hours > 14 || minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 站点与目录
    pub const BASE_URL: &str = "WEATHER_SPIDER_BASE_URL";
    pub const DOWNLOAD_ROOT: &str = "WEATHER_SPIDER_DOWNLOAD_ROOT";
    pub const OUTPUT_ROOT: &str = "WEATHER_SPIDER_OUTPUT_ROOT";

    // 时区（固定 UTC 偏移）
    pub const UTC_OFFSET: &str = "WEATHER_SPIDER_UTC_OFFSET";
    /// IANA 时区名（如 Asia/Shanghai），UTC_OFFSET 未设置时生效
    pub const TIMEZONE: &str = "WEATHER_SPIDER_TIMEZONE";

    // 网络
    pub const REQUEST_TIMEOUT: &str = "REQUEST_TIMEOUT";
    pub const MAX_RETRIES: &str = "MAX_RETRIES";
    pub const RETRY_DELAY: &str = "RETRY_DELAY";
    pub const CONCURRENCY: &str = "WEATHER_SPIDER_CONCURRENCY";

    // 每日汇总
    pub const CROP: &str = "WEATHER_SPIDER_CROP";
    pub const HORIZON: &str = "WEATHER_SPIDER_HORIZON";
    pub const FOCUS_REGION: &str = "WEATHER_SPIDER_FOCUS_REGION";
    pub const INCLUDE_ALL_GROUP: &str = "WEATHER_SPIDER_INCLUDE_ALL_GROUP";
    pub const HTML_REPORT: &str = "WEATHER_SPIDER_HTML_REPORT";
    pub const LOCALE: &str = "WEATHER_SPIDER_LOCALE";

    // 拼图
    pub const COMPOSITE_CANVAS_WIDTH: &str = "COMPOSITE_CANVAS_WIDTH";
    pub const COMPOSITE_SCALE_FACTOR: &str = "COMPOSITE_SCALE_FACTOR";
    pub const COMPOSITE_GAP: &str = "COMPOSITE_GAP";
    pub const COMPOSITE_STRICT_ROWS: &str = "COMPOSITE_STRICT_ROWS";
    pub const COMPOSITE_FONT_PATH: &str = "COMPOSITE_FONT_PATH";

    pub const ALL: &[&str] = &[
        BASE_URL,
        DOWNLOAD_ROOT,
        OUTPUT_ROOT,
        UTC_OFFSET,
        TIMEZONE,
        REQUEST_TIMEOUT,
        MAX_RETRIES,
        RETRY_DELAY,
        CONCURRENCY,
        CROP,
        HORIZON,
        FOCUS_REGION,
        INCLUDE_ALL_GROUP,
        HTML_REPORT,
        LOCALE,
        COMPOSITE_CANVAS_WIDTH,
        COMPOSITE_SCALE_FACTOR,
        COMPOSITE_GAP,
        COMPOSITE_STRICT_ROWS,
        COMPOSITE_FONT_PATH,
    ];

    /// 默认值（空串表示未设置）
    pub fn default_of(key: &str) -> &'static str {
        match key {
            BASE_URL => "http://www.worldagweather.com",
            DOWNLOAD_ROOT => "downloads",
            OUTPUT_ROOT => "output",
            UTC_OFFSET => "+08:00",
            REQUEST_TIMEOUT => "30",
            MAX_RETRIES => "3",
            RETRY_DELAY => "2",
            CONCURRENCY => "1",
            CROP => "soybeans",
            HORIZON => "15",
            FOCUS_REGION => "usa",
            INCLUDE_ALL_GROUP => "false",
            HTML_REPORT => "true",
            LOCALE => "zh-CN",
            COMPOSITE_CANVAS_WIDTH => "3200",
            COMPOSITE_SCALE_FACTOR => "2.5",
            COMPOSITE_GAP => "20",
            COMPOSITE_STRICT_ROWS => "false",
            _ => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(pairs: &[(&str, &str)]) -> ConfigManager {
        ConfigManager::from_map(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_defaults() {
        let config = manager(&[]).load().unwrap();
        assert_eq!(config.base_url, "http://www.worldagweather.com");
        assert_eq!(config.download_root, PathBuf::from("downloads"));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.delay, Duration::from_secs(2));
        assert_eq!(config.crop_index, 1);
        assert_eq!(config.horizon, ForecastHorizon::Days15);
        assert_eq!(config.utc_offset.local_minus_utc(), 8 * 3600);
        assert_eq!(config.composite.canvas_width, 3200);
        assert_eq!(config.composite.row_measure, RowMeasure::FirstSample);
        assert!(config.font_path.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = manager(&[
            (config_keys::BASE_URL, "http://mirror.local/"),
            (config_keys::MAX_RETRIES, "5"),
            (config_keys::CROP, "2"),
            (config_keys::HORIZON, "60"),
            (config_keys::UTC_OFFSET, "-05:30"),
            (config_keys::COMPOSITE_STRICT_ROWS, "yes"),
            (config_keys::CONCURRENCY, "0"),
        ])
        .load()
        .unwrap();
        assert_eq!(config.base_url, "http://mirror.local");
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.crop_index, 2);
        assert_eq!(config.horizon, ForecastHorizon::Days60);
        assert_eq!(config.utc_offset.local_minus_utc(), -(5 * 3600 + 30 * 60));
        assert_eq!(config.composite.row_measure, RowMeasure::PerRow);
        assert_eq!(config.concurrency, 1);
    }

    #[test]
    fn test_invalid_values_name_the_key() {
        let err = manager(&[(config_keys::HORIZON, "30")]).load().unwrap_err();
        assert!(matches!(err, SpiderError::Config { ref key, .. } if key == config_keys::HORIZON));

        let err = manager(&[(config_keys::MAX_RETRIES, "0")]).load().unwrap_err();
        assert!(matches!(err, SpiderError::Config { ref key, .. } if key == config_keys::MAX_RETRIES));

        let err = manager(&[(config_keys::CROP, "rice")]).load().unwrap_err();
        assert!(matches!(err, SpiderError::Config { ref key, .. } if key == config_keys::CROP));
    }

    #[test]
    fn test_parse_utc_offset() {
        assert_eq!(parse_utc_offset("+08:00").unwrap().local_minus_utc(), 28800);
        assert_eq!(parse_utc_offset("0530").unwrap().local_minus_utc(), 19800);
        assert_eq!(parse_utc_offset("-3").unwrap().local_minus_utc(), -10800);
        assert!(parse_utc_offset("Asia/Shanghai").is_none());
        assert!(parse_utc_offset("+25:00").is_none());
    }

    #[test]
    fn test_out_of_range_composite_values_are_rejected() {
        let err = manager(&[(config_keys::COMPOSITE_SCALE_FACTOR, "1e12")])
            .load()
            .unwrap_err();
        assert!(
            matches!(err, SpiderError::Config { ref key, .. } if key == config_keys::COMPOSITE_SCALE_FACTOR)
        );

        let err = manager(&[(config_keys::COMPOSITE_SCALE_FACTOR, "NaN")])
            .load()
            .unwrap_err();
        assert!(
            matches!(err, SpiderError::Config { ref key, .. } if key == config_keys::COMPOSITE_SCALE_FACTOR)
        );

        let err = manager(&[(config_keys::COMPOSITE_CANVAS_WIDTH, "4000000000")])
            .load()
            .unwrap_err();
        assert!(
            matches!(err, SpiderError::Config { ref key, .. } if key == config_keys::COMPOSITE_CANVAS_WIDTH)
        );

        let err = manager(&[(config_keys::COMPOSITE_GAP, "4000000000")])
            .load()
            .unwrap_err();
        assert!(matches!(err, SpiderError::Config { ref key, .. } if key == config_keys::COMPOSITE_GAP));

        let config = manager(&[
            (config_keys::COMPOSITE_SCALE_FACTOR, "20"),
            (config_keys::COMPOSITE_CANVAS_WIDTH, "200"),
            (config_keys::COMPOSITE_GAP, "100"),
        ])
        .load()
        .unwrap();
        assert_eq!(config.composite.scale_factor, 20.0);
        assert_eq!(config.composite.gap, 100);
    }

    #[test]
    fn test_timezone_name_alias() {
        let config = manager(&[(config_keys::TIMEZONE, "Asia/Shanghai")]).load().unwrap();
        assert_eq!(config.utc_offset.local_minus_utc(), 8 * 3600);

        let config = manager(&[(config_keys::TIMEZONE, "America/Sao_Paulo")]).load().unwrap();
        assert_eq!(config.utc_offset.local_minus_utc(), -3 * 3600);

        let config = manager(&[(config_keys::TIMEZONE, "+09:00")]).load().unwrap();
        assert_eq!(config.utc_offset.local_minus_utc(), 9 * 3600);

        // 显式偏移优先
        let config = manager(&[
            (config_keys::TIMEZONE, "Asia/Shanghai"),
            (config_keys::UTC_OFFSET, "+00:00"),
        ])
        .load()
        .unwrap();
        assert_eq!(config.utc_offset.local_minus_utc(), 0);

        let err = manager(&[(config_keys::TIMEZONE, "Europe/Berlin")]).load().unwrap_err();
        assert!(matches!(err, SpiderError::Config { ref key, .. } if key == config_keys::TIMEZONE));
    }

    #[test]
    fn test_snapshot_contains_all_keys() {
        let snapshot = manager(&[(config_keys::CROP, "corn")]).snapshot_json().unwrap();
        assert_eq!(snapshot[config_keys::CROP], "corn");
        assert_eq!(snapshot[config_keys::MAX_RETRIES], "3");
        assert_eq!(snapshot.as_object().unwrap().len(), config_keys::ALL.len());
    }
}
