// ==========================================
// 农业天气图抓取系统 - 图片定位器
// ==========================================
// 职责: 由目录坐标构造远端 URL 与本地保存路径
// 纯函数，不做 I/O；坐标非法时返回 InvalidCoordinate
// ==========================================

use std::path::{Path, PathBuf};

use crate::domain::{parse_date, Catalog, CatalogEntry, ForecastHorizon, WeatherVariable};
use crate::error::{SpiderError, SpiderResult};

/// 图片编号查询接口路径
pub const IMAGE_NUMBER_PATH: &str = "cgi-bin/ag/getcropimglabs.pl";

// ==========================================
// ImageLocator - URL 与路径构造
// ==========================================
#[derive(Debug, Clone)]
pub struct ImageLocator {
    base_url: String,
    catalog: &'static Catalog,
}

impl ImageLocator {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            catalog: Catalog::global(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 图片编号查询地址
    pub fn image_number_url(&self) -> String {
        format!("{}/{}", self.base_url, IMAGE_NUMBER_PATH)
    }

    /// 构造图片 URL
    ///
    /// # 格式
    /// - 15 天: {base}/crops/fcstwx/fcst{var}_{crop}_{sub}_{num}.png
    /// - 60/180 天: {base}/crops/pastwx/past{var}_{crop}_{sub}_{nday}day_{num}.png
    pub fn build_image_url(
        &self,
        crop_index: usize,
        region_index: usize,
        subregion_index: usize,
        variable: WeatherVariable,
        horizon: ForecastHorizon,
        image_number: &str,
    ) -> SpiderResult<String> {
        let entry = self.catalog.resolve(crop_index, region_index, subregion_index)?;
        self.url_for(&entry, variable, horizon, image_number)
    }

    /// 已校验坐标的 URL
    pub fn url_for(
        &self,
        entry: &CatalogEntry,
        variable: WeatherVariable,
        horizon: ForecastHorizon,
        image_number: &str,
    ) -> SpiderResult<String> {
        let image_number = image_number.trim();
        if image_number.is_empty() {
            return Err(SpiderError::InvalidCoordinate("图片编号为空".to_string()));
        }

        let url = if horizon.is_forecast() {
            format!(
                "{}/crops/fcstwx/fcst{}_{}_{}_{}.png",
                self.base_url,
                variable.code(),
                entry.crop,
                entry.subregion,
                image_number
            )
        } else {
            format!(
                "{}/crops/pastwx/past{}_{}_{}_{}day_{}.png",
                self.base_url,
                variable.code(),
                entry.crop,
                entry.subregion,
                horizon.days(),
                image_number
            )
        };
        Ok(url)
    }

    /// 构造保存路径
    ///
    /// root/{var}/{YYYYMMDD}/{var}_{crop}_{region}_{sub}_{forecast|Nday}.png
    /// 文件名不含图片编号，同一天重复下载会覆盖
    pub fn generate_save_path(
        &self,
        crop_index: usize,
        region_index: usize,
        subregion_index: usize,
        variable: WeatherVariable,
        horizon: ForecastHorizon,
        date_str: &str,
        root: &Path,
    ) -> SpiderResult<PathBuf> {
        let entry = self.catalog.resolve(crop_index, region_index, subregion_index)?;
        parse_date(date_str)?;
        Ok(save_path_for(&entry, variable, horizon, date_str, root))
    }
}

/// 已校验坐标的保存路径
pub fn save_path_for(
    entry: &CatalogEntry,
    variable: WeatherVariable,
    horizon: ForecastHorizon,
    date_str: &str,
    root: &Path,
) -> PathBuf {
    root.join(variable.code())
        .join(date_str.trim())
        .join(image_file_name(entry, variable, horizon))
}

/// 保存文件名
pub fn image_file_name(
    entry: &CatalogEntry,
    variable: WeatherVariable,
    horizon: ForecastHorizon,
) -> String {
    format!(
        "{}_{}_{}_{}_{}.png",
        variable.code(),
        entry.crop,
        entry.region,
        entry.subregion,
        horizon.file_suffix()
    )
}

/// 某变量某日期的目录
pub fn date_dir(root: &Path, variable: WeatherVariable, date_str: &str) -> PathBuf {
    root.join(variable.code()).join(date_str)
}
