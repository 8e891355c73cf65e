// ==========================================
// 农业天气图抓取系统 - 报告层
// ==========================================

pub mod html;

pub use html::{escape_html, relative_path, HtmlReportWriter};
