// ==========================================
// 农业天气图抓取系统 - HTML 对比报告
// ==========================================
// 输出: {output}/{current}/weather_summary_{var}_{group}_{current}.html
// 每个图片对一个两列表格：左 = 前一天，右 = 当天
// 图片以相对报告目录的路径引用
// ==========================================

use std::fmt::Write as _;
use std::path::{Component, Path, PathBuf};
use tracing::info;

use crate::domain::{Catalog, ComparisonDateSet, ForecastHorizon, GroupFilter, ImagePair, WeatherVariable};
use crate::engine::compositor::group_title;
use crate::error::SpiderResult;
use crate::i18n::{t, t_with_args, weather_label};

/// HTML 转义
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// 相对路径按当前目录补全为绝对路径，并去掉 "." 分量（不解析符号链接）
fn lexical_absolute(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    absolute
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// 计算 target 相对 base_dir 的路径（统一使用 '/' 分隔）
///
/// 纯字面计算：两端按同一规则补全，符号链接根目录下结果一致
pub fn relative_path(base_dir: &Path, target: &Path) -> String {
    let base = lexical_absolute(base_dir);
    let target = lexical_absolute(target);

    let base_parts: Vec<Component> = base.components().collect();
    let target_parts: Vec<Component> = target.components().collect();
    let common = base_parts
        .iter()
        .zip(target_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    // 无公共前缀（如不同盘符）时直接使用目标路径
    if common == 0 {
        return target.to_string_lossy().replace('\\', "/");
    }

    let mut parts: Vec<String> = Vec::new();
    for _ in common..base_parts.len() {
        parts.push("..".to_string());
    }
    for c in &target_parts[common..] {
        parts.push(c.as_os_str().to_string_lossy().into_owned());
    }
    parts.join("/")
}

// ==========================================
// HtmlReportWriter
// ==========================================
#[derive(Debug, Clone)]
pub struct HtmlReportWriter {
    crop: String,
    horizon: ForecastHorizon,
}

impl HtmlReportWriter {
    pub fn new(crop: impl Into<String>, horizon: ForecastHorizon) -> Self {
        Self {
            crop: crop.into(),
            horizon,
        }
    }

    pub fn report_path(
        output_root: &Path,
        variable: WeatherVariable,
        group: &GroupFilter,
        current: &str,
    ) -> PathBuf {
        output_root.join(current).join(format!(
            "weather_summary_{}_{}_{}.html",
            variable.code(),
            group.label(),
            current
        ))
    }

    /// 写出报告
    ///
    /// # 返回
    /// - Ok(None): 分组内没有图片对，不生成文件
    pub fn write(
        &self,
        pairs: &[ImagePair],
        variable: WeatherVariable,
        group: &GroupFilter,
        dates: &ComparisonDateSet,
        output_root: &Path,
    ) -> SpiderResult<Option<PathBuf>> {
        let selected = group.filter(pairs);
        if selected.is_empty() {
            return Ok(None);
        }

        let current = dates.current_str();
        let path = Self::report_path(output_root, variable, group, &current);
        let report_dir = output_root.join(&current);
        std::fs::create_dir_all(&report_dir)?;

        let html = self.render(&selected, variable, group, dates, &report_dir);
        std::fs::write(&path, html)?;

        info!(path = %path.display(), pairs = selected.len(), "HTML 报告已生成");
        Ok(Some(path))
    }

    fn render(
        &self,
        pairs: &[&ImagePair],
        variable: WeatherVariable,
        group: &GroupFilter,
        dates: &ComparisonDateSet,
        report_dir: &Path,
    ) -> String {
        let catalog = Catalog::global();
        let days = self.horizon.days().to_string();
        let title = t_with_args(
            "report.title",
            &[
                ("crop", catalog.name_of(&self.crop)),
                ("days", days.as_str()),
                ("weather", weather_label(variable, self.horizon).as_str()),
                ("group", group_title(group).as_str()),
            ],
        );
        let date_line = t_with_args(
            "composite.date_line",
            &[
                ("current", dates.current_str().as_str()),
                ("previous", dates.previous_str().as_str()),
            ],
        );

        let mut html = String::new();
        let _ = writeln!(html, "<!DOCTYPE html>");
        let _ = writeln!(html, "<html>\n<head>\n<meta charset=\"utf-8\">");
        let _ = writeln!(html, "<title>{}</title>", escape_html(&title));
        let _ = writeln!(
            html,
            "<style>body{{font-family:sans-serif;margin:20px}}table{{width:100%}}td{{width:50%;text-align:center}}img{{max-width:100%}}</style>"
        );
        let _ = writeln!(html, "</head>\n<body>");
        let _ = writeln!(html, "<h1>{}</h1>", escape_html(&title));
        let _ = writeln!(html, "<p>{}</p>", escape_html(&date_line));

        for pair in pairs {
            let sub_label = if pair.subregion == pair.region {
                t("report.national")
            } else {
                catalog.name_of(&pair.subregion).to_string()
            };
            let heading = format!("{} - {}", catalog.name_of(&pair.region), sub_label);

            let _ = writeln!(html, "<h2>{}</h2>", escape_html(&heading));
            let _ = writeln!(html, "<table>\n<tr>");
            for (date, path) in [
                (dates.previous_str(), &pair.previous_path),
                (dates.current_str(), &pair.current_path),
            ] {
                let _ = writeln!(
                    html,
                    "<td><div>{}</div><img src=\"{}\" alt=\"{}\"></td>",
                    escape_html(&date),
                    escape_html(&relative_path(report_dir, path)),
                    escape_html(&heading)
                );
            }
            let _ = writeln!(html, "</tr>\n</table>");
        }

        let _ = writeln!(html, "</body>\n</html>");
        html
    }
}
