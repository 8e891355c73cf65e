// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持中文（默认）和英文
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

use crate::domain::{ForecastHorizon, WeatherVariable};

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言
///
/// # 参数
/// - locale: 语言代码（"zh-CN" 或 "en"）
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// 翻译消息（无参数）
///
/// # 示例
/// ```no_run
/// use weather_spider::i18n::t;
/// let msg = t("group.others");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数）
///
/// # 示例
/// ```no_run
/// use weather_spider::i18n::t_with_args;
/// let msg = t_with_args("composite.generated_at", &[("time", "2025-01-01 20:00:00")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

/// 天气变量的描述文字: 预报为 "降水预报"，历史为 "降水实况"
pub fn weather_label(variable: WeatherVariable, horizon: ForecastHorizon) -> String {
    let kind = if horizon.is_forecast() { "forecast" } else { "history" };
    t(&format!("weather.{}.{}", variable.code(), kind))
}

// rust-i18n 的 locale 为全局状态，且 Rust 测试默认并行执行；
// 读取或切换语言的测试需持有此锁。
#[cfg(test)]
pub(crate) static LOCALE_TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
