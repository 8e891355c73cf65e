// ==========================================
// 农业天气图抓取系统 - 每日汇总流水线
// ==========================================
// 流程:
// 1. 时间解析（每次运行重新计算）
// 2. 逐变量下载 save_date 的图片（图片编号缺失 → 跳过该变量下载）
// 3. 配对前一天/当天目录
// 4. 逐分组生成拼图（可选 HTML 报告）
// 5. 写出 run_summary.json
// 红线: 不重新下载前一天的图片，缺失时由配对的别名规则兜底
// ==========================================

use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::SpiderConfig;
use crate::domain::{
    Catalog, ComparisonDateSet, ForecastHorizon, GroupFilter, ImagePair, WeatherVariable,
};
use crate::engine::compositor::{CompositeArtifact, CompositeRequest, Compositor};
use crate::engine::fetcher::FetchOrchestrator;
use crate::engine::locator::ImageLocator;
use crate::engine::pairing::PairingMatcher;
use crate::engine::temporal::{CutoffState, TemporalResolver};
use crate::error::{SpiderError, SpiderResult};
use crate::external::http::HttpFetcher;
use crate::external::text::TextRenderer;
use crate::logging::RunReporter;
use crate::report::HtmlReportWriter;

/// 运行汇总文件名
pub const RUN_SUMMARY_FILE: &str = "run_summary.json";

/// 单个变量的下载统计
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadStats {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed_paths: Vec<PathBuf>,
}

/// 单个变量的运行结果
#[derive(Debug, Clone, Serialize)]
pub struct VariableSummary {
    pub variable: WeatherVariable,
    pub download: Option<DownloadStats>,
    pub download_error: Option<String>,
    pub pairs: usize,
    pub degenerate_pairs: usize,
    pub composites: Vec<CompositeArtifact>,
    pub reports: Vec<PathBuf>,
}

/// 一次运行的完整汇总
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub crop: String,
    pub horizon: ForecastHorizon,
    pub cutoff_state: CutoffState,
    pub save_date: String,
    pub dates: ComparisonDateSet,
    pub variables: Vec<VariableSummary>,
    pub config: serde_json::Value,
    pub summary_path: PathBuf,
}

impl RunSummary {
    pub fn composite_count(&self) -> usize {
        self.variables.iter().map(|v| v.composites.len()).sum()
    }
}

// ==========================================
// DailySummary - 每日汇总
// ==========================================
pub struct DailySummary<H>
where
    H: HttpFetcher,
{
    config: SpiderConfig,
    resolver: TemporalResolver,
    fetcher: FetchOrchestrator<H>,
    pairing: PairingMatcher,
    compositor: Compositor,
    reporter: Arc<dyn RunReporter>,
    config_snapshot: serde_json::Value,
}

impl<H> DailySummary<H>
where
    H: HttpFetcher,
{
    /// 按配置装配流水线
    ///
    /// # 参数
    /// - config: 生效配置
    /// - http: 字节获取能力
    /// - text: 文字渲染能力
    /// - reporter: 运行报告器
    pub fn new(
        config: SpiderConfig,
        http: Arc<H>,
        text: Arc<dyn TextRenderer>,
        reporter: Arc<dyn RunReporter>,
    ) -> Self {
        let fetcher = FetchOrchestrator::new(
            http,
            ImageLocator::new(config.base_url.clone()),
            reporter.clone(),
        )
        .with_retry(config.retry)
        .with_concurrency(config.concurrency);

        Self {
            resolver: TemporalResolver::new(config.utc_offset),
            pairing: PairingMatcher::new(config.download_root.clone(), reporter.clone()),
            compositor: Compositor::new(config.composite.clone(), text, reporter.clone()),
            fetcher,
            reporter,
            config,
            config_snapshot: serde_json::Value::Null,
        }
    }

    /// 附加写入运行汇总的配置快照
    pub fn with_config_snapshot(mut self, snapshot: serde_json::Value) -> Self {
        self.config_snapshot = snapshot;
        self
    }

    /// 需要生成的分组
    pub fn groups(&self) -> Vec<GroupFilter> {
        let focus = self.config.focus_region.clone();
        let mut groups = vec![
            GroupFilter::Region(focus.clone()),
            GroupFilter::Others(vec![focus]),
        ];
        if self.config.include_all_group {
            groups.push(GroupFilter::All);
        }
        groups
    }

    /// 执行一次完整汇总
    ///
    /// # 参数
    /// - now: 配置时区下的本地时刻
    pub async fn run(&self, now: NaiveDateTime) -> SpiderResult<RunSummary> {
        let crop = Catalog::global()
            .crop_name(self.config.crop_index)
            .ok_or_else(|| {
                SpiderError::InvalidCoordinate(format!("作物索引越界: {}", self.config.crop_index))
            })?;

        let resolution = self.resolver.resolve_at(now);
        let save_date = resolution.save_date_str();
        let dates = resolution.dates;

        info!(
            crop = crop,
            state = ?resolution.state,
            save_date = %save_date,
            previous = %dates.previous_str(),
            "开始每日汇总"
        );

        let mut variables = Vec::with_capacity(WeatherVariable::ALL.len());
        for variable in WeatherVariable::ALL {
            variables.push(self.run_variable(crop, variable, &save_date, &dates, now).await);
        }

        let summary_dir = self.config.output_root.join(&save_date);
        std::fs::create_dir_all(&summary_dir)?;
        let summary_path = summary_dir.join(RUN_SUMMARY_FILE);

        let summary = RunSummary {
            crop: crop.to_string(),
            horizon: self.config.horizon,
            cutoff_state: resolution.state,
            save_date,
            dates,
            variables,
            config: self.config_snapshot.clone(),
            summary_path: summary_path.clone(),
        };

        let json = serde_json::to_string_pretty(&summary)
            .map_err(|e| SpiderError::Other(anyhow::anyhow!("运行汇总序列化失败: {}", e)))?;
        std::fs::write(&summary_path, json)?;

        self.reporter.info(&format!(
            "每日汇总完成: 生成 {} 张对比图，汇总文件 {}",
            summary.composite_count(),
            summary_path.display()
        ));
        Ok(summary)
    }

    async fn run_variable(
        &self,
        crop: &str,
        variable: WeatherVariable,
        save_date: &str,
        dates: &ComparisonDateSet,
        now: NaiveDateTime,
    ) -> VariableSummary {
        let mut summary = VariableSummary {
            variable,
            download: None,
            download_error: None,
            pairs: 0,
            degenerate_pairs: 0,
            composites: Vec::new(),
            reports: Vec::new(),
        };

        // 步骤1: 下载当天图片
        match self
            .fetcher
            .download_crop(
                self.config.crop_index,
                variable,
                self.config.horizon,
                save_date,
                &self.config.download_root,
            )
            .await
        {
            Ok(report) => {
                summary.download = Some(DownloadStats {
                    attempted: report.attempted,
                    succeeded: report.succeeded,
                    failed_paths: report.failed_paths().iter().map(|p| p.to_path_buf()).collect(),
                });
            }
            Err(e @ SpiderError::MissingImageNumbers(_)) => {
                warn!(variable = %variable, error = %e, "图片编号不可用，跳过下载");
                self.reporter
                    .warn(&format!("{} {}: 无法获取图片编号，跳过下载", crop, variable));
                summary.download_error = Some(e.to_string());
            }
            Err(e) => {
                error!(variable = %variable, error = %e, "下载批次失败");
                self.reporter.error(&format!("{} {}: {}", crop, variable, e));
                summary.download_error = Some(e.to_string());
            }
        }

        // 步骤2: 配对
        let pairs: Vec<ImagePair> = self.pairing.find_pairs(variable, dates);
        summary.pairs = pairs.len();
        summary.degenerate_pairs = pairs.iter().filter(|p| p.degenerate).count();

        // 步骤3: 分组拼图 + 报告
        let html = self
            .config
            .html_report
            .then(|| HtmlReportWriter::new(crop, self.config.horizon));

        for group in self.groups() {
            let request = CompositeRequest {
                pairs: &pairs,
                variable,
                horizon: self.config.horizon,
                group: &group,
                dates,
                generated_at: now,
            };
            match self.compositor.compose(request, &self.config.output_root) {
                Ok(Some(artifact)) => summary.composites.push(artifact),
                Ok(None) => {}
                Err(e) => {
                    self.reporter
                        .error(&format!("{} {} 拼图失败: {}", variable, group.label(), e));
                }
            }

            if let Some(writer) = &html {
                match writer.write(&pairs, variable, &group, dates, &self.config.output_root) {
                    Ok(Some(path)) => summary.reports.push(path),
                    Ok(None) => {}
                    Err(e) => {
                        self.reporter
                            .error(&format!("{} {} 报告写入失败: {}", variable, group.label(), e));
                    }
                }
            }
        }

        summary
    }
}
