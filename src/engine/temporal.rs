// ==========================================
// 农业天气图抓取系统 - 时间解析器
// ==========================================
// 职责: 以每日 19:30 为分界，决定保存日期与对比日期
// 规则: 每次运行重新计算，无持久化状态
// 边界: 19:30:00.000 本身属于分界后 (PostCutoff)
// ==========================================

use chrono::{Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{format_date, ComparisonDateSet};

/// 每日分界时间
pub const CUTOFF_HOUR: u32 = 19;
pub const CUTOFF_MINUTE: u32 = 30;

/// 分界时间点
pub fn cutoff_time() -> NaiveTime {
    NaiveTime::from_hms_opt(CUTOFF_HOUR, CUTOFF_MINUTE, 0).unwrap_or(NaiveTime::MIN)
}

/// 分界状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CutoffState {
    /// 当日 19:30 之前
    PreCutoff,
    /// 当日 19:30 及之后
    PostCutoff,
}

/// 一次解析的完整结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalResolution {
    pub state: CutoffState,
    pub save_date: NaiveDate,
    pub dates: ComparisonDateSet,
}

impl TemporalResolution {
    pub fn save_date_str(&self) -> String {
        format_date(self.save_date)
    }
}

// ==========================================
// TemporalResolver - 时间解析器
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct TemporalResolver {
    offset: FixedOffset,
}

impl TemporalResolver {
    /// 创建解析器
    ///
    /// # 参数
    /// - offset: 配置的时区（固定 UTC 偏移）
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// 配置时区下的当前本地时刻
    pub fn local_now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.offset).naive_local()
    }

    /// 按当前时刻解析
    pub fn resolve_now(&self) -> TemporalResolution {
        self.resolve_at(self.local_now())
    }

    /// 按指定的本地时刻解析
    pub fn resolve_at(&self, local_now: NaiveDateTime) -> TemporalResolution {
        let today = local_now.date();
        let state = if local_now.time() < cutoff_time() {
            CutoffState::PreCutoff
        } else {
            CutoffState::PostCutoff
        };

        let save_date = match state {
            CutoffState::PreCutoff => today - Duration::days(1),
            CutoffState::PostCutoff => today,
        };

        // current 恒等于 save_date，previous 恒为其前一天
        TemporalResolution {
            state,
            save_date,
            dates: ComparisonDateSet {
                previous: save_date - Duration::days(1),
                current: save_date,
            },
        }
    }
}
