// ==========================================
// 农业天气图抓取系统 - 命令行入口
// ==========================================
// 用法:
//   weather-spider summary
//   weather-spider download <crop> <pcp|tmp> <15|60|180> [YYYYMMDD]
//   weather-spider catalog
// 退出码: 仅用法/配置错误为非零；部分下载失败不影响退出码
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use std::sync::Arc;

use weather_spider::config::ConfigManager;
use weather_spider::domain::{format_date, parse_date, Catalog, ForecastHorizon, WeatherVariable};
use weather_spider::engine::{DailySummary, FetchOrchestrator, ImageLocator, TemporalResolver};
use weather_spider::external::{load_text_renderer, ReqwestFetcher, TextRenderer};
use weather_spider::{i18n, logging, SpiderConfig};

const USAGE: &str = "用法:
  weather-spider summary
  weather-spider download <crop> <pcp|tmp> <15|60|180> [YYYYMMDD]
  weather-spider catalog

时区: WEATHER_SPIDER_UTC_OFFSET=±HH:MM（默认 +08:00），
      或 WEATHER_SPIDER_TIMEZONE=Asia/Shanghai 等无夏令时的 IANA 名称";

/// 子命令
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Summary,
    Download,
    Catalog,
    Help,
    Unknown(String),
}

impl Command {
    fn parse(arg: Option<&str>) -> Self {
        match arg.unwrap_or("summary") {
            "summary" => Command::Summary,
            "download" => Command::Download,
            "catalog" => Command::Catalog,
            "help" | "-h" | "--help" => Command::Help,
            other => Command::Unknown(other.to_string()),
        }
    }

    /// catalog/help 不读取配置，环境变量有误时也能使用
    fn needs_config(&self) -> bool {
        matches!(self, Command::Summary | Command::Download)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(args.first().map(|s| s.as_str()));

    if !command.needs_config() {
        return match command {
            Command::Catalog => {
                print_catalog();
                Ok(())
            }
            Command::Unknown(other) => bail!("未知命令: {}\n{}", other, USAGE),
            _ => {
                println!("{}", USAGE);
                Ok(())
            }
        };
    }

    let manager = ConfigManager::from_env();
    let config = manager.load().context("配置加载失败")?;
    i18n::set_locale(&config.locale);

    tracing::info!("==================================================");
    tracing::info!("{} v{}", weather_spider::APP_NAME, weather_spider::VERSION);
    tracing::info!("==================================================");

    match command {
        Command::Download => run_download(config, &args[1..]).await,
        _ => run_summary(config, manager.snapshot_json()?).await,
    }
}

async fn run_summary(config: SpiderConfig, snapshot: serde_json::Value) -> Result<()> {
    let http = Arc::new(ReqwestFetcher::new(config.request_timeout)?);
    let text: Arc<dyn TextRenderer> = Arc::from(load_text_renderer(config.font_path.as_deref()));
    let now = TemporalResolver::new(config.utc_offset).local_now();

    let summary = DailySummary::new(config, http, text, logging::default_reporter())
        .with_config_snapshot(snapshot);
    let result = summary.run(now).await?;

    for variable in &result.variables {
        if let Some(stats) = &variable.download {
            println!(
                "{}: {}/{} 下载成功, {} 对图片",
                variable.variable, stats.succeeded, stats.attempted, variable.pairs
            );
        }
        for artifact in &variable.composites {
            println!("  {}", artifact.path.display());
        }
    }
    println!("{}", result.summary_path.display());
    Ok(())
}

async fn run_download(config: SpiderConfig, args: &[String]) -> Result<()> {
    if args.len() < 3 {
        bail!("参数不足\n{}", USAGE);
    }

    let catalog = Catalog::global();
    let crop_index = args[0]
        .parse::<usize>()
        .ok()
        .filter(|i| catalog.crop_name(*i).is_some())
        .or_else(|| catalog.find_crop(&args[0]))
        .ok_or_else(|| anyhow!("未知作物: {}（可选: {}）", args[0], catalog.crops().join(", ")))?;
    let variable: WeatherVariable = args[1].parse()?;
    let days: u32 = args[2].parse().context("预报天数必须为数字")?;
    let horizon = ForecastHorizon::try_from(days)?;
    let date_str = match args.get(3) {
        Some(d) => format_date(parse_date(d)?),
        None => TemporalResolver::new(config.utc_offset)
            .resolve_now()
            .save_date_str(),
    };

    let http = Arc::new(ReqwestFetcher::new(config.request_timeout)?);
    let orchestrator = FetchOrchestrator::new(
        http,
        ImageLocator::new(config.base_url.clone()),
        logging::default_reporter(),
    )
    .with_retry(config.retry)
    .with_concurrency(config.concurrency);

    match orchestrator
        .download_crop(crop_index, variable, horizon, &date_str, &config.download_root)
        .await
    {
        Ok(report) => {
            println!(
                "尝试: {}  成功: {}  失败: {}",
                report.attempted,
                report.succeeded,
                report.failed()
            );
            for path in report.failed_paths() {
                println!("  失败: {}", path.display());
            }
        }
        // 图片编号缺失只影响本批次，不作为进程失败
        Err(e) => tracing::warn!(error = %e, "下载批次未执行"),
    }
    Ok(())
}

fn print_catalog() {
    let catalog = Catalog::global();
    for (ci, crop) in catalog.crops().iter().enumerate() {
        println!("[{}] {} ({})", ci, crop, catalog.name_of(crop));
        for (ri, region) in catalog.regions_of(ci).iter().enumerate() {
            println!("  [{}] {} ({})", ri, region, catalog.name_of(region));
            for (si, sub) in catalog.subregions_of(ci, ri).iter().enumerate() {
                println!("    [{}] {} ({})", si, sub, catalog.name_of(sub));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parsing() {
        assert_eq!(Command::parse(None), Command::Summary);
        assert_eq!(Command::parse(Some("download")), Command::Download);
        assert_eq!(Command::parse(Some("--help")), Command::Help);
        assert_eq!(Command::parse(Some("merge")), Command::Unknown("merge".to_string()));
    }

    #[test]
    fn test_catalog_and_help_skip_config() {
        assert!(!Command::parse(Some("catalog")).needs_config());
        assert!(!Command::parse(Some("help")).needs_config());
        assert!(!Command::parse(Some("merge")).needs_config());
        assert!(Command::parse(None).needs_config());
        assert!(Command::parse(Some("download")).needs_config());
    }
}
