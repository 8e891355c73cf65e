// ==========================================
// 农业天气图抓取系统 - 错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分类: 坐标无效 / 网络瞬时失败 / 图片编号缺失 / 本地文件缺失
// ==========================================

use std::path::PathBuf;
use thiserror::Error;

/// 流水线错误类型
#[derive(Error, Debug)]
pub enum SpiderError {
    // ===== 调用方错误（不重试） =====
    #[error("坐标无效: {0}")]
    InvalidCoordinate(String),

    // ===== 网络错误（按重试预算重试） =====
    #[error("网络请求失败 ({url}): {message}")]
    TransientNetworkFailure { url: String, message: String },

    // ===== 批次级错误（仅中止当前变量/天数批次） =====
    #[error("无法获取图片编号: {0}")]
    MissingImageNumbers(String),

    // ===== 本地文件错误（跳过，不中止） =====
    #[error("本地文件不存在: {}", .0.display())]
    MissingLocalFile(PathBuf),

    #[error("图片处理失败: {0}")]
    Image(String),

    #[error("文件读写失败: {0}")]
    Io(String),

    // ===== 配置错误 =====
    #[error("配置值格式错误 (key: {key}): {message}")]
    Config { key: String, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SpiderError {
    /// 是否属于可重试的网络错误
    pub fn is_transient(&self) -> bool {
        matches!(self, SpiderError::TransientNetworkFailure { .. })
    }
}

impl From<std::io::Error> for SpiderError {
    fn from(err: std::io::Error) -> Self {
        SpiderError::Io(err.to_string())
    }
}

impl From<image::ImageError> for SpiderError {
    fn from(err: image::ImageError) -> Self {
        SpiderError::Image(err.to_string())
    }
}

/// Result 类型别名
pub type SpiderResult<T> = Result<T, SpiderError>;
