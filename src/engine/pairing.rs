// ==========================================
// 农业天气图抓取系统 - 图片配对
// ==========================================
// 输入: root/{var}/{previous}/ 与 root/{var}/{current}/ 两个目录
// 规则:
// - 按文件名精确匹配，两边都存在才成对
// - 前一天目录不存在 → 视为当天目录的别名（每张图与自身配对）
// - 当天目录不存在 → 无配对
// - 文件名格式变化导致无法匹配时静默跳过
// ==========================================

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::{ComparisonDateSet, ImagePair, WeatherVariable};
use crate::engine::locator::date_dir;
use crate::logging::RunReporter;

/// 从文件名中解析 (国家, 子地区)
///
/// 格式: {var}_{crop}_{region}_{subregion}_{suffix}.png
pub fn parse_image_name(file_name: &str) -> Option<(String, String)> {
    let stem = file_name.strip_suffix(".png")?;
    let parts: Vec<&str> = stem.split('_').collect();
    if parts.len() < 5 || parts[2].is_empty() || parts[3].is_empty() {
        return None;
    }
    Some((parts[2].to_string(), parts[3].to_string()))
}

// ==========================================
// PairingMatcher - 配对器
// ==========================================
pub struct PairingMatcher {
    root: PathBuf,
    reporter: Arc<dyn RunReporter>,
}

impl PairingMatcher {
    /// # 参数
    /// - root: 下载根目录
    pub fn new(root: impl Into<PathBuf>, reporter: Arc<dyn RunReporter>) -> Self {
        Self {
            root: root.into(),
            reporter,
        }
    }

    /// 查找某变量在两个日期间的图片对
    pub fn find_pairs(&self, variable: WeatherVariable, dates: &ComparisonDateSet) -> Vec<ImagePair> {
        let previous_dir = date_dir(&self.root, variable, &dates.previous_str());
        let current_dir = date_dir(&self.root, variable, &dates.current_str());

        let pairs = self.match_directories(&previous_dir, &current_dir);
        info!(
            variable = %variable,
            previous = %dates.previous_str(),
            current = %dates.current_str(),
            pairs = pairs.len(),
            "图片配对完成"
        );
        pairs
    }

    /// 匹配两个目录（结果按文件名排序）
    pub fn match_directories(&self, previous_dir: &Path, current_dir: &Path) -> Vec<ImagePair> {
        if !current_dir.is_dir() {
            self.reporter
                .warn(&format!("当天目录不存在: {}", current_dir.display()));
            return Vec::new();
        }

        let current_names = self.list_png(current_dir);

        let aliased = !previous_dir.is_dir();
        let previous_names = if aliased {
            self.reporter.warn(&format!(
                "前一天目录不存在，使用当天图片自身配对: {}",
                previous_dir.display()
            ));
            current_names.clone()
        } else {
            self.list_png(previous_dir)
        };
        let previous_base = if aliased { current_dir } else { previous_dir };

        current_names
            .intersection(&previous_names)
            .filter_map(|name| {
                let Some((region, subregion)) = parse_image_name(name) else {
                    debug!(file = %name, "文件名格式无法识别，跳过");
                    return None;
                };
                Some(ImagePair {
                    previous_path: previous_base.join(name),
                    current_path: current_dir.join(name),
                    region,
                    subregion,
                    degenerate: aliased,
                })
            })
            .collect()
    }

    fn list_png(&self, dir: &Path) -> BTreeSet<String> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                self.reporter
                    .warn(&format!("读取目录失败 {}: {}", dir.display(), e));
                return BTreeSet::new();
            }
        };

        entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().to_str().map(|s| s.to_string()))
            .filter(|name| name.ends_with(".png"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_image_name() {
        assert_eq!(
            parse_image_name("pcp_soybeans_usa_iowa_forecast.png"),
            Some(("usa".to_string(), "iowa".to_string()))
        );
        assert_eq!(
            parse_image_name("tmp_corn_brazil_parana_60day.png"),
            Some(("brazil".to_string(), "parana".to_string()))
        );
        assert_eq!(parse_image_name("pcp_soybeans_usa.png"), None);
        assert_eq!(parse_image_name("pcp_soybeans_usa_iowa_forecast.jpg"), None);
    }
}
