// ==========================================
// TemporalResolver 集成测试
// ==========================================

mod test_helpers;

use chrono::{Duration, FixedOffset};
use test_helpers::{date, datetime};
use weather_spider::engine::{CutoffState, TemporalResolver};

fn resolver() -> TemporalResolver {
    TemporalResolver::new(FixedOffset::east_opt(8 * 3600).unwrap())
}

#[test]
fn test_one_second_before_cutoff() {
    let r = resolver().resolve_at(datetime(2025, 12, 24, 19, 29, 59));
    assert_eq!(r.state, CutoffState::PreCutoff);
    assert_eq!(r.dates.current, date(2025, 12, 23));
    assert_eq!(r.dates.previous, date(2025, 12, 22));
    assert_eq!(r.save_date, r.dates.current);
}

#[test]
fn test_exactly_at_cutoff() {
    let r = resolver().resolve_at(datetime(2025, 12, 24, 19, 30, 0));
    assert_eq!(r.state, CutoffState::PostCutoff);
    assert_eq!(r.dates.current, date(2025, 12, 24));
    assert_eq!(r.dates.previous, date(2025, 12, 23));
    assert_eq!(r.save_date_str(), "20251224");
}

#[test]
fn test_previous_is_always_one_day_before_current() {
    let start = datetime(2024, 2, 27, 0, 0, 0);
    for step in 0..(4 * 24 * 4) {
        let now = start + Duration::minutes(15 * step);
        let r = resolver().resolve_at(now);
        assert_eq!(r.dates.current, r.save_date);
        assert_eq!(r.dates.current - r.dates.previous, Duration::days(1));
    }
}

#[test]
fn test_runs_straddling_cutoff_have_distinct_targets() {
    let before = resolver().resolve_at(datetime(2025, 1, 1, 19, 0, 0));
    let after = resolver().resolve_at(datetime(2025, 1, 1, 20, 0, 0));
    assert_ne!(before.save_date, after.save_date);
    assert_eq!(after.dates.previous, before.dates.current);
}

#[test]
fn test_resolve_now_is_consistent() {
    let r = resolver().resolve_now();
    assert_eq!(r.dates.current, r.save_date);
    assert_eq!(r.dates.current - r.dates.previous, Duration::days(1));
}
