// ==========================================
// 农业天气图抓取系统 - 外部能力层
// ==========================================
// 职责: 网络获取与文字渲染的抽象及默认实现
// ==========================================

pub mod http;
pub mod text;

pub use http::{HttpFetcher, HttpResponse, ReqwestFetcher};
pub use text::{discover_font, load_text_renderer, FontTextRenderer, NullTextRenderer, TextRenderer};
