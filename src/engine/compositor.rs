// ==========================================
// 农业天气图抓取系统 - 对比拼图
// ==========================================
// 布局（自上而下）:
// - 居中标题 (y=40)
// - 右对齐生成时间 + 居中日期行 (y=110)
// - 每个图片对: 居中粗体地区标题，下方左右并排两张图
//   左 = 前一天，右 = 当天（固定约定）
// 画布: 宽度固定；高度 = 顶部 + 底部 + 行数 × 行高 + 2 × 边距
// 行高默认取第一对前一天图片的尺寸（FirstSample），
// 严格模式（PerRow）逐行测量
// ==========================================

use chrono::NaiveDateTime;
use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgb, RgbImage};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::{Catalog, ComparisonDateSet, ForecastHorizon, GroupFilter, ImagePair, WeatherVariable};
use crate::error::{SpiderError, SpiderResult};
use crate::external::text::TextRenderer;
use crate::i18n::{t, t_with_args, weather_label};
use crate::logging::RunReporter;

const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const RED: Rgb<u8> = Rgb([255, 0, 0]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// 行高测量方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RowMeasure {
    /// 所有行共用第一对图片的尺寸
    FirstSample,
    /// 逐行按各自图片尺寸计算
    PerRow,
}

// ==========================================
// CompositeSettings - 拼图参数
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeSettings {
    pub canvas_width: u32,
    pub scale_factor: f32,
    /// 两张图片之间的间距
    pub gap: u32,
    pub top_title_height: u32,
    pub bottom_info_height: u32,
    pub margin: u32,
    /// 无法读取样本图片时的行内图片高度
    pub default_sample_height: u32,
    // 行高组成: 标题 + 图片 + 间距 + 标签
    pub row_heading_height: u32,
    pub row_spacing: u32,
    pub row_label_height: u32,
    pub title_font_size: f32,
    pub header_font_size: f32,
    pub error_font_size: f32,
    pub row_measure: RowMeasure,
}

impl Default for CompositeSettings {
    fn default() -> Self {
        Self {
            canvas_width: 3200,
            scale_factor: 2.5,
            gap: 20,
            top_title_height: 100,
            bottom_info_height: 60,
            margin: 30,
            default_sample_height: 400,
            row_heading_height: 40,
            row_spacing: 20,
            row_label_height: 25,
            title_font_size: 60.0,
            header_font_size: 48.0,
            error_font_size: 36.0,
            row_measure: RowMeasure::FirstSample,
        }
    }
}

// 绘制游标位置
const TITLE_Y: i32 = 40;
const INFO_Y: i32 = 110;
const ROWS_START_Y: u32 = 160;
const TIME_RIGHT_MARGIN: u32 = 50;
const HEADING_ADVANCE: u32 = 50;
const IMAGE_BOTTOM_SPACING: u32 = 20;
const ERROR_TEXT_X: i32 = 100;
const ERROR_ADVANCE: u32 = 100;

/// 画布像素上限（约 1.6 GB RGB）
pub const MAX_CANVAS_PIXELS: u64 = 536_870_912;

impl CompositeSettings {
    /// 样本高度（已放大）；无样本时取默认值
    pub fn sample_row_height(&self, native_height: Option<u32>) -> u32 {
        native_height
            .map(|h| (h as f32 * self.scale_factor).min(u32::MAX as f32) as u32)
            .unwrap_or(self.default_sample_height)
    }

    /// 单行高度
    pub fn row_height(&self, sample_row_height: u32) -> u32 {
        self.row_heading_height
            .saturating_add(sample_row_height)
            .saturating_add(self.row_spacing)
            .saturating_add(self.row_label_height)
    }

    /// 画布高度（行高之和）
    pub fn canvas_height(&self, row_heights: &[u32]) -> u32 {
        let rows = row_heights
            .iter()
            .fold(0u32, |acc, h| acc.saturating_add(*h));
        self.top_title_height
            .saturating_add(self.bottom_info_height)
            .saturating_add(rows)
            .saturating_add(self.margin.saturating_mul(2))
    }

    /// 单张图片的最大显示宽度
    pub fn max_display_width(&self) -> u32 {
        (self.canvas_width.saturating_sub(self.gap) / 2).max(1)
    }

    /// 显示尺寸: min(原始 × 放大倍数, (画布宽 − 间距) / 2)，保持宽高比
    pub fn display_size(&self, width: u32, height: u32) -> (u32, u32) {
        if width == 0 || height == 0 {
            return (1, 1);
        }
        let mut display_w = ((width as f32 * self.scale_factor) as u32).max(1);
        let mut display_h = ((height as f32 * self.scale_factor) as u32).max(1);

        let max_w = self.max_display_width();
        if display_w > max_w {
            display_w = max_w;
            display_h = (height as u64 * display_w as u64 / width as u64).clamp(1, u32::MAX as u64) as u32;
        }
        (display_w, display_h)
    }

    /// 并排两张图片的 x 坐标 (左, 右)，整体居中
    pub fn pair_positions(&self, display_width: u32) -> (u32, u32) {
        let total = display_width.saturating_mul(2).saturating_add(self.gap);
        let start = self.canvas_width.saturating_sub(total) / 2;
        (start, start.saturating_add(display_width).saturating_add(self.gap))
    }
}

/// 拼图请求
#[derive(Debug, Clone, Copy)]
pub struct CompositeRequest<'a> {
    pub pairs: &'a [ImagePair],
    pub variable: WeatherVariable,
    pub horizon: ForecastHorizon,
    pub group: &'a GroupFilter,
    pub dates: &'a ComparisonDateSet,
    pub generated_at: NaiveDateTime,
}

/// 拼图产物
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompositeArtifact {
    pub path: PathBuf,
    pub group: String,
    pub width: u32,
    pub height: u32,
    /// 成功绘制的行
    pub rendered_rows: usize,
    /// 文件缺失而跳过的行
    pub skipped_rows: usize,
    /// 解码失败而绘制错误提示的行
    pub failed_rows: usize,
}

/// 拼图输出路径: {output}/{current}/weather_summary_{var}_{group}_{current}.png
pub fn composite_path(
    output_root: &Path,
    variable: WeatherVariable,
    group_label: &str,
    current: &str,
) -> PathBuf {
    output_root.join(current).join(format!(
        "weather_summary_{}_{}_{}.png",
        variable.code(),
        group_label,
        current
    ))
}

/// 分组显示名
pub fn group_title(group: &GroupFilter) -> String {
    match group {
        GroupFilter::Region(code) => Catalog::global().name_of(code).to_string(),
        GroupFilter::Others(_) => t("group.others"),
        GroupFilter::All => t("group.all"),
    }
}

/// 行标题: "{国家} - {子地区} {天气}"
pub fn row_heading(pair: &ImagePair, variable: WeatherVariable, horizon: ForecastHorizon) -> String {
    let catalog = Catalog::global();
    format!(
        "{} - {} {}",
        catalog.name_of(&pair.region),
        catalog.name_of(&pair.subregion),
        weather_label(variable, horizon)
    )
}

/// 拼图渲染结果（尚未写盘）
#[derive(Debug)]
pub struct RenderedComposite {
    pub canvas: RgbImage,
    pub rendered_rows: usize,
    pub skipped_rows: usize,
    pub failed_rows: usize,
}

// ==========================================
// Compositor - 拼图器
// ==========================================
pub struct Compositor {
    settings: CompositeSettings,
    text: Arc<dyn TextRenderer>,
    reporter: Arc<dyn RunReporter>,
}

impl Compositor {
    pub fn new(
        settings: CompositeSettings,
        text: Arc<dyn TextRenderer>,
        reporter: Arc<dyn RunReporter>,
    ) -> Self {
        Self {
            settings,
            text,
            reporter,
        }
    }

    pub fn settings(&self) -> &CompositeSettings {
        &self.settings
    }

    /// 生成并保存拼图
    ///
    /// # 返回
    /// - Ok(Some): 拼图已写入
    /// - Ok(None): 分组内没有图片对，未生成文件
    pub fn compose(
        &self,
        request: CompositeRequest<'_>,
        output_root: &Path,
    ) -> SpiderResult<Option<CompositeArtifact>> {
        let selected: Vec<&ImagePair> = request.group.filter(request.pairs);
        let label = request.group.label();
        if selected.is_empty() {
            self.reporter.warn(&format!(
                "{} {} 分组没有可对比的图片",
                request.variable, label
            ));
            return Ok(None);
        }

        let rendered = self.render(&selected, &request)?;

        let current = request.dates.current_str();
        let path = composite_path(output_root, request.variable, &label, &current);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        rendered
            .canvas
            .save_with_format(&path, ImageFormat::Png)
            .map_err(SpiderError::from)?;

        info!(
            path = %path.display(),
            rows = rendered.rendered_rows,
            skipped = rendered.skipped_rows,
            failed = rendered.failed_rows,
            "拼图已生成"
        );
        self.reporter.info(&format!("成功生成对比图片: {}", path.display()));

        Ok(Some(CompositeArtifact {
            path,
            group: label,
            width: rendered.canvas.width(),
            height: rendered.canvas.height(),
            rendered_rows: rendered.rendered_rows,
            skipped_rows: rendered.skipped_rows,
            failed_rows: rendered.failed_rows,
        }))
    }

    /// 计算各行高度
    pub fn measure_rows(&self, pairs: &[&ImagePair]) -> Vec<u32> {
        let s = &self.settings;
        match s.row_measure {
            RowMeasure::FirstSample => {
                let native = pairs
                    .first()
                    .and_then(|p| image::image_dimensions(&p.previous_path).ok())
                    .map(|(_, h)| h);
                let row = s.row_height(s.sample_row_height(native));
                vec![row; pairs.len()]
            }
            RowMeasure::PerRow => pairs
                .iter()
                .map(|p| {
                    let display_h = image::image_dimensions(&p.previous_path)
                        .ok()
                        .map(|(w, h)| s.display_size(w, h).1);
                    s.row_height(display_h.unwrap_or(s.default_sample_height))
                })
                .collect(),
        }
    }

    /// 在内存中渲染拼图
    ///
    /// 画布超过 MAX_CANVAS_PIXELS 时返回 Image 错误，不分配内存
    pub fn render(
        &self,
        pairs: &[&ImagePair],
        request: &CompositeRequest<'_>,
    ) -> SpiderResult<RenderedComposite> {
        let s = &self.settings;
        let row_heights = self.measure_rows(pairs);
        let height = s.canvas_height(&row_heights);
        let pixels = s.canvas_width as u64 * height as u64;
        if pixels > MAX_CANVAS_PIXELS {
            return Err(SpiderError::Image(format!(
                "画布尺寸过大: {} × {}（上限 {} 像素）",
                s.canvas_width, height, MAX_CANVAS_PIXELS
            )));
        }
        let mut canvas = RgbImage::from_pixel(s.canvas_width, height, WHITE);

        self.draw_header(&mut canvas, request);

        let mut rendered_rows = 0;
        let mut skipped_rows = 0;
        let mut failed_rows = 0;
        let mut y = ROWS_START_Y;

        for pair in pairs {
            for path in [&pair.previous_path, &pair.current_path] {
                if !path.exists() {
                    self.reporter
                        .warn(&SpiderError::MissingLocalFile(path.clone()).to_string());
                }
            }
            if !pair.previous_path.exists() || !pair.current_path.exists() {
                skipped_rows += 1;
                continue;
            }

            let heading = row_heading(pair, request.variable, request.horizon);
            self.draw_centered(&mut canvas, &heading, y as i32, s.header_font_size, true);
            y = y.saturating_add(HEADING_ADVANCE);

            match self.paste_pair(&mut canvas, pair, y) {
                Ok(display_h) => {
                    rendered_rows += 1;
                    y = y.saturating_add(display_h).saturating_add(IMAGE_BOTTOM_SPACING);
                }
                Err(e) => {
                    self.reporter.error(&format!("处理图片失败: {}", e));
                    let text = t_with_args(
                        "composite.image_failed",
                        &[("region", pair.region.as_str()), ("subregion", pair.subregion.as_str())],
                    );
                    self.text
                        .draw(&mut canvas, &text, ERROR_TEXT_X, y as i32, s.error_font_size, RED);
                    failed_rows += 1;
                    y = y.saturating_add(ERROR_ADVANCE);
                }
            }
        }

        Ok(RenderedComposite {
            canvas,
            rendered_rows,
            skipped_rows,
            failed_rows,
        })
    }

    fn draw_header(&self, canvas: &mut RgbImage, request: &CompositeRequest<'_>) {
        let s = &self.settings;

        let title = t_with_args(
            "composite.title",
            &[
                ("group", group_title(request.group).as_str()),
                ("weather", weather_label(request.variable, request.horizon).as_str()),
            ],
        );
        self.draw_centered(canvas, &title, TITLE_Y, s.title_font_size, true);

        let time_text = t_with_args(
            "composite.generated_at",
            &[("time", request.generated_at.format("%Y-%m-%d %H:%M:%S").to_string().as_str())],
        );
        let (time_w, _) = self.text.measure(&time_text, s.header_font_size);
        let time_x = s.canvas_width as i32 - time_w as i32 - TIME_RIGHT_MARGIN as i32;
        self.text
            .draw(canvas, &time_text, time_x, INFO_Y, s.header_font_size, BLACK);

        let date_text = t_with_args(
            "composite.date_line",
            &[
                ("current", request.dates.current_str().as_str()),
                ("previous", request.dates.previous_str().as_str()),
            ],
        );
        self.draw_centered(canvas, &date_text, INFO_Y, s.header_font_size, false);
    }

    fn draw_centered(&self, canvas: &mut RgbImage, text: &str, y: i32, size: f32, bold: bool) {
        let (w, _) = self.text.measure(text, size);
        let x = (self.settings.canvas_width as i32 - w as i32) / 2;
        if bold {
            self.text.draw_bold(canvas, text, x, y, size, BLACK);
        } else {
            self.text.draw(canvas, text, x, y, size, BLACK);
        }
    }

    /// 粘贴一对图片，返回显示高度
    ///
    /// 两张图都按前一天图片的原始尺寸缩放
    fn paste_pair(&self, canvas: &mut RgbImage, pair: &ImagePair, y: u32) -> SpiderResult<u32> {
        let previous = image::open(&pair.previous_path)?.to_rgb8();
        let current = image::open(&pair.current_path)?.to_rgb8();

        let (display_w, display_h) = self.settings.display_size(previous.width(), previous.height());
        let previous = imageops::resize(&previous, display_w, display_h, FilterType::Lanczos3);
        let current = imageops::resize(&current, display_w, display_h, FilterType::Lanczos3);

        let (left_x, right_x) = self.settings.pair_positions(display_w);
        imageops::replace(canvas, &previous, left_x as i64, y as i64);
        imageops::replace(canvas, &current, right_x as i64, y as i64);

        debug!(
            region = %pair.region,
            subregion = %pair.subregion,
            display_w,
            display_h,
            left_x,
            right_x,
            "图片对已绘制"
        );
        Ok(display_h)
    }
}
