// ==========================================
// 农业天气图抓取系统 - 下载编排器
// ==========================================
// 流程: 图片编号 → 枚举坐标 → URL/路径 → 建目录 → 重试下载 → 汇总
// 重试: 固定间隔，不区分网络错误类型（DNS/超时/5xx 一视同仁）
// 红线: 单个坐标失败不中止批次；图片编号获取失败中止整个批次
// 并发: buffer_unordered 限流，结果只在一处汇总
// ==========================================

use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::domain::{parse_date, Catalog, CatalogEntry, ForecastHorizon, ImageNumberSet, WeatherVariable};
use crate::engine::locator::{save_path_for, ImageLocator};
use crate::error::{SpiderError, SpiderResult};
use crate::external::http::HttpFetcher;
use crate::i18n::t_with_args;
use crate::logging::RunReporter;

// ==========================================
// RetryPolicy - 重试策略
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最大尝试次数（含首次）
    pub max_attempts: u32,
    /// 两次尝试之间的固定间隔
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

// ==========================================
// FetchReport - 下载结果汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchReport {
    /// 保存路径 → 是否成功
    pub results: BTreeMap<PathBuf, bool>,
    /// 生成了有效路径的坐标数
    pub attempted: usize,
    pub succeeded: usize,
}

impl FetchReport {
    fn record(&mut self, path: PathBuf, ok: bool) {
        self.attempted += 1;
        if ok {
            self.succeeded += 1;
        }
        self.results.insert(path, ok);
    }

    pub fn failed(&self) -> usize {
        self.attempted - self.succeeded
    }

    pub fn failed_paths(&self) -> Vec<&Path> {
        self.results
            .iter()
            .filter(|(_, ok)| !**ok)
            .map(|(p, _)| p.as_path())
            .collect()
    }
}

/// 单个下载任务
#[derive(Debug, Clone)]
struct DownloadJob {
    url: String,
    path: PathBuf,
}

// ==========================================
// FetchOrchestrator - 下载编排器
// ==========================================
pub struct FetchOrchestrator<H>
where
    H: HttpFetcher,
{
    http: Arc<H>,
    locator: ImageLocator,
    retry: RetryPolicy,
    concurrency: usize,
    reporter: Arc<dyn RunReporter>,
}

impl<H> FetchOrchestrator<H>
where
    H: HttpFetcher,
{
    /// 创建编排器
    ///
    /// # 参数
    /// - http: 字节获取能力
    /// - locator: URL/路径构造器
    /// - reporter: 运行报告器
    pub fn new(http: Arc<H>, locator: ImageLocator, reporter: Arc<dyn RunReporter>) -> Self {
        Self {
            http,
            locator,
            retry: RetryPolicy::default(),
            concurrency: 1,
            reporter,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// 并发度（1 = 顺序执行）
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// 获取当前图片编号
    ///
    /// 不重试；任何失败都归为 MissingImageNumbers
    pub async fn fetch_image_numbers(&self) -> SpiderResult<ImageNumberSet> {
        let url = self.locator.image_number_url();
        debug!(url = %url, "获取图片编号");

        let response = self
            .http
            .get(&url)
            .await
            .map_err(|e| SpiderError::MissingImageNumbers(e.to_string()))?;

        if !response.is_success() {
            return Err(SpiderError::MissingImageNumbers(format!(
                "HTTP 状态码 {}",
                response.status
            )));
        }

        let text = response.text();
        let numbers = ImageNumberSet::parse(&text).ok_or_else(|| {
            SpiderError::MissingImageNumbers(format!("响应格式无效: {}", text.trim()))
        })?;

        info!(
            forecast = %numbers.forecast,
            past_pcp = %numbers.past_precipitation,
            past_tmp = %numbers.past_temperature,
            "图片编号获取成功"
        );
        Ok(numbers)
    }

    /// 下载某作物全部 (国家, 子地区) 的图片
    ///
    /// # 返回
    /// - Ok(FetchReport): 逐坐标结果（部分失败也是 Ok）
    /// - Err(InvalidCoordinate): 作物索引或日期无效
    /// - Err(MissingImageNumbers): 图片编号不可用，整个批次跳过
    pub async fn download_crop(
        &self,
        crop_index: usize,
        variable: WeatherVariable,
        horizon: ForecastHorizon,
        date_str: &str,
        root: &Path,
    ) -> SpiderResult<FetchReport> {
        let catalog = Catalog::global();
        let crop = catalog.crop_name(crop_index).ok_or_else(|| {
            SpiderError::InvalidCoordinate(format!("作物索引越界: {}", crop_index))
        })?;
        parse_date(date_str)?;

        info!(
            crop = crop,
            variable = %variable,
            horizon = horizon.days(),
            date = date_str,
            "开始下载作物图片"
        );

        let numbers = self.fetch_image_numbers().await?;
        let entries = catalog.entries_of(crop_index);
        let report = self
            .download_entries(&entries, &numbers, variable, horizon, date_str, root)
            .await;

        self.reporter.info(&t_with_args(
            "download.summary",
            &[
                ("crop", crop),
                ("variable", variable.code()),
                ("succeeded", report.succeeded.to_string().as_str()),
                ("attempted", report.attempted.to_string().as_str()),
            ],
        ));
        Ok(report)
    }

    /// 下载某作物单个国家的全部子地区
    pub async fn download_region(
        &self,
        crop_index: usize,
        region_index: usize,
        variable: WeatherVariable,
        horizon: ForecastHorizon,
        date_str: &str,
        root: &Path,
    ) -> SpiderResult<FetchReport> {
        let catalog = Catalog::global();
        // 借 resolve 校验作物与国家索引
        catalog.resolve(crop_index, region_index, 0)?;
        parse_date(date_str)?;

        let numbers = self.fetch_image_numbers().await?;
        let entries: Vec<CatalogEntry> = catalog
            .entries_of(crop_index)
            .into_iter()
            .filter(|e| e.region_index == region_index)
            .collect();

        Ok(self
            .download_entries(&entries, &numbers, variable, horizon, date_str, root)
            .await)
    }

    async fn download_entries(
        &self,
        entries: &[CatalogEntry],
        numbers: &ImageNumberSet,
        variable: WeatherVariable,
        horizon: ForecastHorizon,
        date_str: &str,
        root: &Path,
    ) -> FetchReport {
        let image_number = numbers.number_for(variable, horizon);

        let mut jobs = Vec::with_capacity(entries.len());
        for entry in entries {
            match self.locator.url_for(entry, variable, horizon, image_number) {
                Ok(url) => jobs.push(DownloadJob {
                    url,
                    path: save_path_for(entry, variable, horizon, date_str, root),
                }),
                Err(e) => {
                    self.reporter
                        .warn(&format!("跳过 {}/{}: {}", entry.region, entry.subregion, e));
                }
            }
        }

        let outcomes: Vec<(PathBuf, bool)> = stream::iter(jobs)
            .map(|job| async move {
                let ok = self.download_one(&job).await;
                (job.path, ok)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        // 唯一汇总点
        let mut report = FetchReport::default();
        for (path, ok) in outcomes {
            report.record(path, ok);
        }
        report
    }

    async fn download_one(&self, job: &DownloadJob) -> bool {
        if let Some(parent) = job.path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                self.reporter
                    .error(&format!("创建目录失败 {}: {}", parent.display(), e));
                return false;
            }
        }
        self.download_with_retry(&job.url, &job.path).await
    }

    /// 按重试策略下载单张图片
    ///
    /// 返回 false 表示重试预算耗尽，不向上抛错
    pub async fn download_with_retry(&self, url: &str, path: &Path) -> bool {
        let max_attempts = self.retry.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match self.attempt_once(url, path).await {
                Ok(bytes) => {
                    debug!(url = url, path = %path.display(), attempt, bytes, "图片下载成功");
                    return true;
                }
                Err(e) => {
                    warn!(url = url, attempt, max_attempts, error = %e, "图片下载失败");
                    if attempt < max_attempts {
                        tokio::time::sleep(self.retry.delay).await;
                    }
                }
            }
        }

        self.reporter.warn(&format!(
            "下载失败（已重试 {} 次）: {}",
            max_attempts, url
        ));
        false
    }

    /// 单次尝试: 状态码成功、响应体非空、写盘成功
    async fn attempt_once(&self, url: &str, path: &Path) -> SpiderResult<usize> {
        let response = self.http.get(url).await?;
        if !response.is_success() {
            return Err(SpiderError::TransientNetworkFailure {
                url: url.to_string(),
                message: format!("HTTP 状态码 {}", response.status),
            });
        }
        if response.body.is_empty() {
            return Err(SpiderError::TransientNetworkFailure {
                url: url.to_string(),
                message: "响应体为空".to_string(),
            });
        }
        tokio::fs::write(path, &response.body).await?;
        Ok(response.body.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_retry_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay, Duration::from_secs(2));
    }

    #[test]
    fn test_report_accounting() {
        let mut report = FetchReport::default();
        report.record(PathBuf::from("a.png"), true);
        report.record(PathBuf::from("b.png"), false);
        report.record(PathBuf::from("c.png"), true);
        assert_eq!(report.attempted, 3);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.failed_paths(), vec![Path::new("b.png")]);
    }
}
