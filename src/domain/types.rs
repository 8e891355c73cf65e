// ==========================================
// 农业天气图抓取系统 - 领域类型定义
// ==========================================
// 天气变量 / 预报天数 / 图片编号 / 对比日期 / 图片对 / 分组筛选
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::SpiderError;

/// 目录与文件名中使用的日期格式
pub const DATE_FORMAT: &str = "%Y%m%d";

/// 按 YYYYMMDD 格式化日期
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// 解析 YYYYMMDD 日期字符串
pub fn parse_date(value: &str) -> Result<NaiveDate, SpiderError> {
    let trimmed = value.trim();
    if trimmed.len() != 8 {
        return Err(SpiderError::InvalidCoordinate(format!(
            "日期格式错误: 期望 YYYYMMDD，实际 {}",
            value
        )));
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| {
        SpiderError::InvalidCoordinate(format!("日期格式错误: 期望 YYYYMMDD，实际 {}", value))
    })
}

// ==========================================
// 天气变量 (Weather Variable)
// ==========================================
// 序列化格式: "pcp" / "tmp"（与远端站点及目录名一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WeatherVariable {
    #[serde(rename = "pcp")]
    Precipitation, // 降水
    #[serde(rename = "tmp")]
    Temperature, // 温度
}

impl WeatherVariable {
    pub const ALL: [WeatherVariable; 2] = [WeatherVariable::Precipitation, WeatherVariable::Temperature];

    /// 外部编码
    pub fn code(&self) -> &'static str {
        match self {
            WeatherVariable::Precipitation => "pcp",
            WeatherVariable::Temperature => "tmp",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "pcp" => Some(WeatherVariable::Precipitation),
            "tmp" => Some(WeatherVariable::Temperature),
            _ => None,
        }
    }
}

impl fmt::Display for WeatherVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for WeatherVariable {
    type Err = SpiderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WeatherVariable::from_code(s)
            .ok_or_else(|| SpiderError::InvalidCoordinate(format!("天气变量无效: {}", s)))
    }
}

// ==========================================
// 预报天数 (Forecast Horizon)
// ==========================================
// 15 天 → 预报图；60/180 天 → 历史图
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ForecastHorizon {
    Days15,
    Days60,
    Days180,
}

impl ForecastHorizon {
    pub fn days(&self) -> u32 {
        match self {
            ForecastHorizon::Days15 => 15,
            ForecastHorizon::Days60 => 60,
            ForecastHorizon::Days180 => 180,
        }
    }

    pub fn from_days(days: u32) -> Option<Self> {
        match days {
            15 => Some(ForecastHorizon::Days15),
            60 => Some(ForecastHorizon::Days60),
            180 => Some(ForecastHorizon::Days180),
            _ => None,
        }
    }

    /// 是否为预报图（否则为历史图）
    pub fn is_forecast(&self) -> bool {
        matches!(self, ForecastHorizon::Days15)
    }

    /// 保存文件名后缀: "forecast" 或 "{nday}day"
    pub fn file_suffix(&self) -> String {
        if self.is_forecast() {
            "forecast".to_string()
        } else {
            format!("{}day", self.days())
        }
    }
}

impl TryFrom<u32> for ForecastHorizon {
    type Error = SpiderError;

    fn try_from(days: u32) -> Result<Self, Self::Error> {
        ForecastHorizon::from_days(days).ok_or_else(|| {
            SpiderError::InvalidCoordinate(format!("预报天数无效: {}（仅支持 15/60/180）", days))
        })
    }
}

impl From<ForecastHorizon> for u32 {
    fn from(horizon: ForecastHorizon) -> Self {
        horizon.days()
    }
}

impl fmt::Display for ForecastHorizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.days())
    }
}

// ==========================================
// 图片编号集合 (Image Number Set)
// ==========================================
// 远端返回格式: forecast|pastPrecipitation|pastTemperature
// 每个下载批次开头获取一次，批次结束即丢弃
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageNumberSet {
    pub forecast: String,
    pub past_precipitation: String,
    pub past_temperature: String,
}

impl ImageNumberSet {
    /// 解析管道分隔的三元组
    ///
    /// # 返回
    /// - Some: 至少三个非空字段
    /// - None: 格式不正确
    pub fn parse(text: &str) -> Option<Self> {
        let fields: Vec<&str> = text.trim().split('|').map(|s| s.trim()).collect();
        if fields.len() < 3 || fields[..3].iter().any(|f| f.is_empty()) {
            return None;
        }
        Some(Self {
            forecast: fields[0].to_string(),
            past_precipitation: fields[1].to_string(),
            past_temperature: fields[2].to_string(),
        })
    }

    /// 按变量与天数选择图片编号
    pub fn number_for(&self, variable: WeatherVariable, horizon: ForecastHorizon) -> &str {
        if horizon.is_forecast() {
            return &self.forecast;
        }
        match variable {
            WeatherVariable::Precipitation => &self.past_precipitation,
            WeatherVariable::Temperature => &self.past_temperature,
        }
    }
}

// ==========================================
// 对比日期 (Comparison Date Set)
// ==========================================
// 每次运行由时间解析器生成一次，运行期间不可变
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonDateSet {
    pub previous: NaiveDate,
    pub current: NaiveDate,
}

impl ComparisonDateSet {
    pub fn previous_str(&self) -> String {
        format_date(self.previous)
    }

    pub fn current_str(&self) -> String {
        format_date(self.current)
    }
}

// ==========================================
// 图片对 (Image Pair)
// ==========================================
// previous_path 可能等于 current_path（前一天目录缺失时的退化对）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePair {
    pub previous_path: PathBuf,
    pub current_path: PathBuf,
    pub region: String,
    pub subregion: String,
    pub degenerate: bool,
}

// ==========================================
// 分组筛选 (Group Filter)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupFilter {
    /// 指定国家代码
    Region(String),
    /// 除指定集合外的其他国家
    Others(Vec<String>),
    /// 全部
    All,
}

impl GroupFilter {
    pub fn matches(&self, pair: &ImagePair) -> bool {
        match self {
            GroupFilter::Region(code) => pair.region == *code,
            GroupFilter::Others(excluded) => !excluded.iter().any(|c| *c == pair.region),
            GroupFilter::All => true,
        }
    }

    /// 输出文件名中的分组标识
    pub fn label(&self) -> String {
        match self {
            GroupFilter::Region(code) => code.clone(),
            GroupFilter::Others(_) => "others".to_string(),
            GroupFilter::All => "all".to_string(),
        }
    }

    pub fn filter<'a>(&self, pairs: &'a [ImagePair]) -> Vec<&'a ImagePair> {
        pairs.iter().filter(|p| self.matches(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(region: &str) -> ImagePair {
        ImagePair {
            previous_path: PathBuf::from("a.png"),
            current_path: PathBuf::from("a.png"),
            region: region.to_string(),
            subregion: region.to_string(),
            degenerate: false,
        }
    }

    #[test]
    fn test_variable_codes() {
        assert_eq!(WeatherVariable::Precipitation.code(), "pcp");
        assert_eq!("TMP".parse::<WeatherVariable>().unwrap(), WeatherVariable::Temperature);
        assert!("wind".parse::<WeatherVariable>().is_err());
        assert_eq!(
            serde_json::to_string(&WeatherVariable::Precipitation).unwrap(),
            "\"pcp\""
        );
    }

    #[test]
    fn test_horizon_suffix() {
        assert_eq!(ForecastHorizon::Days15.file_suffix(), "forecast");
        assert_eq!(ForecastHorizon::Days60.file_suffix(), "60day");
        assert_eq!(ForecastHorizon::Days180.file_suffix(), "180day");
        assert!(ForecastHorizon::from_days(30).is_none());
        assert!(ForecastHorizon::try_from(7).is_err());
    }

    #[test]
    fn test_image_number_parse() {
        let set = ImageNumberSet::parse(" 4890|1203|1204\n").unwrap();
        assert_eq!(set.forecast, "4890");
        assert_eq!(set.number_for(WeatherVariable::Temperature, ForecastHorizon::Days15), "4890");
        assert_eq!(set.number_for(WeatherVariable::Precipitation, ForecastHorizon::Days60), "1203");
        assert_eq!(set.number_for(WeatherVariable::Temperature, ForecastHorizon::Days180), "1204");

        assert!(ImageNumberSet::parse("4890|1203").is_none());
        assert!(ImageNumberSet::parse("4890||1204").is_none());
        assert!(ImageNumberSet::parse("").is_none());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("20251224").unwrap(),
            NaiveDate::from_ymd_opt(2025, 12, 24).unwrap()
        );
        assert!(parse_date("2025-12-24").is_err());
        assert!(parse_date("20251340").is_err());
    }

    #[test]
    fn test_group_filter() {
        let pairs = vec![pair("usa"), pair("brazil"), pair("argentina")];
        assert_eq!(GroupFilter::Region("usa".into()).filter(&pairs).len(), 1);
        assert_eq!(GroupFilter::Others(vec!["usa".into()]).filter(&pairs).len(), 2);
        assert_eq!(GroupFilter::All.filter(&pairs).len(), 3);
        assert_eq!(GroupFilter::Others(vec![]).label(), "others");
    }
}
