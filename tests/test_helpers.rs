// ==========================================
// 测试辅助函数
// ==========================================
// 职责: PNG 夹具生成、脚本化 HTTP 桩、常用构造器
// ==========================================

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use image::{Rgb, RgbImage};
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;

use weather_spider::external::{HttpFetcher, HttpResponse};
use weather_spider::{SpiderError, SpiderResult};

pub const RED: Rgb<u8> = Rgb([255, 0, 0]);
pub const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// 生成纯色 PNG 文件（自动创建父目录）
pub fn write_png(path: &Path, width: u32, height: u32, color: Rgb<u8>) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    RgbImage::from_pixel(width, height, color).save(path).unwrap();
}

/// 纯色 PNG 的字节
pub fn png_bytes(width: u32, height: u32, color: Rgb<u8>) -> Vec<u8> {
    let mut buf = std::io::Cursor::new(Vec::new());
    RgbImage::from_pixel(width, height, color)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn datetime(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, min, s).unwrap()
}

/// 单次脚本化响应
#[derive(Debug, Clone)]
pub enum Scripted {
    Ok(Vec<u8>),
    Status(u16),
    NetworkError,
}

// ==========================================
// ScriptedFetcher - 脚本化 HTTP 桩
// ==========================================
// 按 URL 依次消费脚本；脚本耗尽后使用默认响应
pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    fixed: HashMap<String, Scripted>,
    fallback: Scripted,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new(fallback: Scripted) -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            fixed: HashMap::new(),
            fallback,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// 默认对所有图片返回一张小 PNG
    pub fn serving_png() -> Self {
        Self::new(Scripted::Ok(png_bytes(4, 3, BLUE)))
    }

    pub fn script(self, url: &str, responses: Vec<Scripted>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), responses.into());
        self
    }

    /// 某 URL 的固定响应（脚本耗尽后生效）
    pub fn respond(mut self, url: &str, response: Scripted) -> Self {
        self.fixed.insert(url.to_string(), response);
        self
    }

    /// 固定返回图片编号
    pub fn with_numbers(self, base_url: &str, body: &str) -> Self {
        let url = format!("{}/cgi-bin/ag/getcropimglabs.pl", base_url);
        self.respond(&url, Scripted::Ok(body.as_bytes().to_vec()))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl HttpFetcher for ScriptedFetcher {
    async fn get(&self, url: &str) -> SpiderResult<HttpResponse> {
        self.calls.lock().unwrap().push(url.to_string());
        let next = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(|q| q.pop_front())
            .or_else(|| self.fixed.get(url).cloned())
            .unwrap_or_else(|| self.fallback.clone());

        match next {
            Scripted::Ok(body) => Ok(HttpResponse { status: 200, body }),
            Scripted::Status(status) => Ok(HttpResponse {
                status,
                body: Vec::new(),
            }),
            Scripted::NetworkError => Err(SpiderError::TransientNetworkFailure {
                url: url.to_string(),
                message: "connection reset".to_string(),
            }),
        }
    }
}
