// ==========================================
// 农业天气图抓取系统 - 文字渲染能力
// ==========================================
// 职责: 在 RGB 画布上测量/绘制文字
// 实现:
// - FontTextRenderer: ab_glyph 字体 + imageproc 绘制，粗体用 1px 双重绘制
// - NullTextRenderer: 按字符数估算宽度，不绘制（无可用字体时的降级方案）
// ==========================================

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{SpiderError, SpiderResult};

/// 文字渲染接口
pub trait TextRenderer: Send + Sync {
    /// 测量文字尺寸 (宽, 高)
    fn measure(&self, text: &str, size: f32) -> (u32, u32);

    /// 在 (x, y) 处绘制文字（左上角）
    fn draw(&self, canvas: &mut RgbImage, text: &str, x: i32, y: i32, size: f32, color: Rgb<u8>);

    /// 粗体: 水平错开 1px 绘制两次
    fn draw_bold(&self, canvas: &mut RgbImage, text: &str, x: i32, y: i32, size: f32, color: Rgb<u8>) {
        self.draw(canvas, text, x, y, size, color);
        self.draw(canvas, text, x + 1, y, size, color);
    }
}

// ==========================================
// FontTextRenderer
// ==========================================
pub struct FontTextRenderer {
    font: FontVec,
    source: PathBuf,
}

impl FontTextRenderer {
    /// 从字体文件加载（.ttf/.otf/.ttc，集合文件取第 0 个）
    pub fn from_file(path: &Path) -> SpiderResult<Self> {
        let data = std::fs::read(path)?;
        let font = FontVec::try_from_vec_and_index(data, 0)
            .map_err(|e| SpiderError::Image(format!("字体无效 {}: {}", path.display(), e)))?;
        Ok(Self {
            font,
            source: path.to_path_buf(),
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

impl TextRenderer for FontTextRenderer {
    fn measure(&self, text: &str, size: f32) -> (u32, u32) {
        text_size(PxScale::from(size), &self.font, text)
    }

    fn draw(&self, canvas: &mut RgbImage, text: &str, x: i32, y: i32, size: f32, color: Rgb<u8>) {
        draw_text_mut(canvas, color, x, y, PxScale::from(size), &self.font, text);
    }
}

// ==========================================
// NullTextRenderer
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTextRenderer;

impl TextRenderer for NullTextRenderer {
    fn measure(&self, text: &str, size: f32) -> (u32, u32) {
        // 全角字符按整格，其余按半格
        let width: f32 = text
            .chars()
            .map(|c| if c.is_ascii() { size * 0.5 } else { size })
            .sum();
        (width.round() as u32, size.round() as u32)
    }

    fn draw(&self, _canvas: &mut RgbImage, _text: &str, _x: i32, _y: i32, _size: f32, _color: Rgb<u8>) {}
}

// ==========================================
// 字体查找
// ==========================================

// 支持中文的常见字体文件名
const CJK_FONT_NAMES: &[&str] = &[
    "simhei.ttf",
    "msyh.ttc",
    "PingFang.ttc",
    "NotoSansCJK-Regular.ttc",
    "NotoSansCJKsc-Regular.otf",
    "NotoSansSC-Regular.otf",
    "wqy-microhei.ttc",
    "wqy-zenhei.ttc",
    "DroidSansFallbackFull.ttf",
];

fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs_list = Vec::new();
    if let Some(dir) = dirs::font_dir() {
        dirs_list.push(dir);
    }
    for dir in [
        "C:\\Windows\\Fonts",
        "/System/Library/Fonts",
        "/Library/Fonts",
        "/usr/share/fonts",
        "/usr/local/share/fonts",
    ] {
        dirs_list.push(PathBuf::from(dir));
    }
    dirs_list
}

fn find_in_dir(dir: &Path, depth: usize) -> Option<PathBuf> {
    for name in CJK_FONT_NAMES {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    if depth == 0 {
        return None;
    }
    // Linux 字体通常位于子目录（如 truetype/wqy/）
    let mut subdirs: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    subdirs.sort();
    subdirs.iter().find_map(|sub| find_in_dir(sub, depth - 1))
}

/// 查找可用字体
///
/// 顺序: 配置路径 → 用户字体目录 → 系统字体目录
pub fn discover_font(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.is_file() {
            return Some(path.to_path_buf());
        }
        warn!(path = %path.display(), "配置的字体文件不存在，尝试系统字体");
    }
    system_font_dirs()
        .iter()
        .filter(|d| d.is_dir())
        .find_map(|d| find_in_dir(d, 3))
}

/// 构造文字渲染器；找不到可用字体时降级为 NullTextRenderer
pub fn load_text_renderer(configured: Option<&Path>) -> Box<dyn TextRenderer> {
    if let Some(path) = discover_font(configured) {
        match FontTextRenderer::from_file(&path) {
            Ok(renderer) => {
                debug!(font = %path.display(), "已加载字体");
                return Box::new(renderer);
            }
            Err(e) => warn!(error = %e, "字体加载失败"),
        }
    }
    warn!("未找到可用字体，拼图将不包含文字");
    Box::new(NullTextRenderer)
}
