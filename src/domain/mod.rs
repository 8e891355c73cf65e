// ==========================================
// 农业天气图抓取系统 - 领域层
// ==========================================
// 职责: 静态目录 + 值类型，不做任何 I/O
// ==========================================

pub mod catalog;
pub mod types;

pub use catalog::{Catalog, CatalogEntry, CropEntry, RegionEntry};
pub use types::{
    format_date, parse_date, ComparisonDateSet, ForecastHorizon, GroupFilter, ImageNumberSet,
    ImagePair, WeatherVariable, DATE_FORMAT,
};
